mod grid;
mod widget;
pub(crate) use self::grid::{generate, MonthGrid};
pub(crate) use self::widget::YearView;
