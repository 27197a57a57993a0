use super::grid::MonthGrid;
use crate::datekit::DateKey;
use crate::palette::DayColor;
use crate::store::ReadDayMap;
use crate::streak::is_missed_day;
use crate::theme::{
    BASE_STYLE, CURSOR_MODIFIER, FALLBACK_READ_STYLE, MISSED_STYLE, MONTH_STYLE, TODAY_MODIFIER,
    UNREAD_STYLE, WEEKDAY_STYLE,
};
use ratatui::{prelude::*, widgets::*};
use time::Date;

static WEEKDAY_HEADER: &str = "Su Mo Tu We Th Fr Sa";

/// Number of columns per day of week
const DAY_WIDTH: u16 = 3;

/// Width of one month, not counting the space after Saturday
const MONTH_WIDTH: u16 = DAY_WIDTH * 7 - 1;

/// Columns between the months in one row
const MONTH_GUTTER: u16 = 3;

/// Lines above a month's first week: its name and the weekday header
const MONTH_HEADER_LINES: u16 = 2;

/// Blank lines below each row of months
const MONTH_SPACING: u16 = 1;

const MAX_COLUMNS: u16 = 6;

const READ_MARK: &str = "●";
const UNREAD_MARK: &str = "○";
const MISSED_MARK: &str = "×";

/// The year's months laid out side by side, each day drawn as a dot that is
/// filled with the day's color once it has been read
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct YearView<'a> {
    months: &'a [MonthGrid],
    read_days: &'a ReadDayMap,
    today: Date,
    cursor: Option<Date>,
}

impl<'a> YearView<'a> {
    pub(crate) fn new(months: &'a [MonthGrid], read_days: &'a ReadDayMap, today: Date) -> Self {
        YearView {
            months,
            read_days,
            today,
            cursor: None,
        }
    }

    pub(crate) fn cursor(mut self, date: Date) -> Self {
        self.cursor = Some(date);
        self
    }

    /// How many months fit side by side in `width` columns
    pub(crate) fn columns_for_width(width: u16) -> u16 {
        (width.saturating_add(MONTH_GUTTER) / (MONTH_WIDTH + MONTH_GUTTER)).clamp(1, MAX_COLUMNS)
    }

    fn mark(&self, key: DateKey) -> (&'static str, Style) {
        match self.read_days.get(&key) {
            Some(color) => (READ_MARK, color_style(color)),
            None if is_missed_day(key.date(), self.read_days, self.today) => {
                (MISSED_MARK, MISSED_STYLE)
            }
            None => (UNREAD_MARK, UNREAD_STYLE),
        }
    }

    fn draw_month(&self, canvas: &mut BufferCanvas<'_>, y: u16, x: u16, grid: &MonthGrid) {
        canvas.mvprint(y, x, grid.month().to_string(), MONTH_STYLE);
        canvas.mvprint(y + 1, x, WEEKDAY_HEADER, WEEKDAY_STYLE);
        // Padding before the first of the month stays empty
        let days = grid.positions().filter(|&(_, _, cell)| cell.is_valid());
        for (week, weekday, cell) in days {
            let Ok(key) = cell.key() else {
                continue;
            };
            let date = key.date();
            let (mark, mut style) = self.mark(key);
            if date == self.today {
                style = style.add_modifier(TODAY_MODIFIER);
            }
            if Some(date) == self.cursor {
                style = style.add_modifier(CURSOR_MODIFIER);
            }
            canvas.mvprint(
                y + MONTH_HEADER_LINES + week,
                x + DAY_WIDTH * weekday,
                mark,
                style,
            );
        }
    }
}

impl Widget for YearView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let columns = Self::columns_for_width(area.width);
        let total_width = columns * MONTH_WIDTH + (columns - 1) * MONTH_GUTTER;
        let left = area.width.saturating_sub(total_width) / 2;
        let mut canvas = BufferCanvas::new(area, buf);
        let mut y = 0;
        for row in self.months.chunks(usize::from(columns)) {
            for (i, grid) in std::iter::zip(0u16.., row) {
                let x = left + i * (MONTH_WIDTH + MONTH_GUTTER);
                self.draw_month(&mut canvas, y, x, grid);
            }
            // A row is as tall as its longest month
            let weeks = row.iter().map(MonthGrid::weeks).max().unwrap_or_default();
            y += MONTH_HEADER_LINES + weeks + MONTH_SPACING;
        }
    }
}

fn color_style(color: &DayColor) -> Style {
    match color.rgb() {
        Some((r, g, b)) => BASE_STYLE.fg(Color::Rgb(r, g, b)),
        None => FALLBACK_READ_STYLE,
    }
}

#[derive(Debug, Eq, PartialEq)]
struct BufferCanvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl<'a> BufferCanvas<'a> {
    fn new(area: Rect, buf: &'a mut Buffer) -> Self {
        Self { area, buf }
    }

    fn mvprint<S: AsRef<str>>(&mut self, y: u16, x: u16, s: S, style: Style) {
        if y < self.area.height && x < self.area.width {
            let text = Text::styled(s.as_ref(), style);
            let width = u16::try_from(text.width()).unwrap_or(u16::MAX);
            // Clip to the area so that the Paragraph never renders outside
            // the buffer
            Paragraph::new(text).render(
                Rect {
                    x: x + self.area.x,
                    y: y + self.area.y,
                    width: (self.area.width - x).min(width),
                    height: 1,
                },
                self.buf,
            );
        }
    }
}
