use crate::datekit::{DayCell, Year};
use std::iter::successors;
use time::{Date, Month};

const DAYS_IN_WEEK: u16 = 7;

/// The cells of one month, left-padded with blanks so that the first of the
/// month lands in its weekday's column (Sunday first)
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MonthGrid {
    month: Month,
    cells: Vec<DayCell>,
}

impl MonthGrid {
    fn starting(first: Date) -> MonthGrid {
        let blanks = usize::from(first.weekday().number_days_from_sunday());
        let mut cells = Vec::with_capacity(blanks + 31);
        cells.resize(blanks, DayCell::Blank);
        MonthGrid {
            month: first.month(),
            cells,
        }
    }

    pub(crate) fn month(&self) -> Month {
        self.month
    }

    pub(crate) fn days(&self) -> impl Iterator<Item = Date> + '_ {
        self.cells.iter().filter_map(|c| c.date())
    }

    /// Number of grid rows needed to show the month
    pub(crate) fn weeks(&self) -> u16 {
        u16::try_from(self.cells.len())
            .unwrap_or(u16::MAX)
            .div_ceil(DAYS_IN_WEEK)
    }

    /// Row and column (weekday) of each cell, in grid order
    pub(crate) fn positions(&self) -> impl Iterator<Item = (u16, u16, DayCell)> + '_ {
        (0u16..)
            .zip(&self.cells)
            .map(|(i, &c)| (i / DAYS_IN_WEEK, i % DAYS_IN_WEEK, c))
    }
}

/// Lay out every month of `year`, January first.  Month lengths come from
/// stepping through the year one day at a time, so leap years need no special
/// casing.
pub(crate) fn generate(year: Year) -> Vec<MonthGrid> {
    let mut months: Vec<MonthGrid> = Vec::with_capacity(12);
    for date in iter_days_from(year.start()).take_while(|&d| d <= year.end()) {
        if date.day() == 1 {
            months.push(MonthGrid::starting(date));
        }
        if let Some(grid) = months.last_mut() {
            grid.cells.push(DayCell::Day(date));
        }
    }
    months
}

fn iter_days_from(date: Date) -> impl Iterator<Item = Date> {
    successors(Some(date), |&d| d.next_day())
}
