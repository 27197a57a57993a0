use crate::calendar::{generate, MonthGrid, YearView};
use crate::datekit::{format_key, Year};
use crate::help::Help;
use crate::palette::ColorPicker;
use crate::remote::RemoteDocuments;
use crate::store::{ReadDayMap, ReadDayStore, ReadDaysEvent, Toggle};
use crate::streak::{calculate_streak, is_missed_day};
use crate::theme::{BASE_STYLE, ERROR_STYLE, STATUS_STYLE, STREAK_STYLE, TITLE_STYLE};
use crossterm::event::{read, KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::Line,
    widgets::{Paragraph, Widget},
    DefaultTerminal,
};
use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use time::{Date, Duration};
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct App<R, P> {
    store: ReadDayStore<R, P>,
    months: Vec<MonthGrid>,
    year: Year,
    today: Date,
    cursor: Date,
    state: AppState,
    status: Option<Status>,
    /// False after a failed write, until the store next sends a snapshot
    synced: Rc<Cell<bool>>,
}

impl<R: RemoteDocuments, P: ColorPicker> App<R, P> {
    /// `store` should already be subscribed to `year`; until its first
    /// snapshot arrives the calendar is replaced by a loading message.
    pub(crate) fn new(store: ReadDayStore<R, P>, year: Year, today: Date) -> App<R, P> {
        let synced = Rc::new(Cell::new(true));
        let flag = Rc::clone(&synced);
        store.watch(move |event: &ReadDaysEvent| match event {
            ReadDaysEvent::Snapshot(read_days) => {
                trace!(marked = read_days.len(), "calendar refreshed");
                flag.set(true);
            }
            ReadDaysEvent::Error(message) => {
                debug!(%message, "calendar may be out of date");
            }
        });
        App {
            store,
            months: generate(year),
            year,
            today,
            cursor: year.clamp(today),
            state: AppState::Calendar,
            status: None,
            synced,
        }
    }

    pub(crate) fn run(mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        while !self.quitting() {
            self.draw(&mut terminal)?;
            self.handle_input()?;
        }
        self.store.unsubscribe();
        Ok(())
    }

    fn draw(&self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        terminal.draw(|frame| frame.render_widget(self, frame.area()))?;
        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let normal_modifiers = KeyModifiers::NONE | KeyModifiers::SHIFT;
        if let Some(KeyEvent {
            code, modifiers, ..
        }) = read()?.as_key_press_event()
        {
            if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
                self.state = AppState::Quitting;
            } else if !normal_modifiers.contains(modifiers) || !self.handle_key(code) {
                self.beep()?;
            }
        }
        // else: Redraw on resize, and we might as well redraw on other stuff
        // too
        Ok(())
    }

    // Returns `false` if the user pressed an invalid key or tried to move off
    // the edge of the year
    fn handle_key(&mut self, key: KeyCode) -> bool {
        match self.state {
            AppState::Calendar => {
                self.status = None;
                match key {
                    KeyCode::Char('h') | KeyCode::Left => self.move_days(-1),
                    KeyCode::Char('l') | KeyCode::Right => self.move_days(1),
                    KeyCode::Char('k') | KeyCode::Up => self.move_days(-7),
                    KeyCode::Char('j') | KeyCode::Down => self.move_days(7),
                    KeyCode::Char('w') | KeyCode::PageUp => self.move_month(false),
                    KeyCode::Char('z') | KeyCode::PageDown => self.move_month(true),
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        self.toggle();
                        true
                    }
                    KeyCode::Char('0') | KeyCode::Home => {
                        self.cursor = self.year.clamp(self.today);
                        true
                    }
                    KeyCode::Char('r') => {
                        self.resync();
                        true
                    }
                    KeyCode::Char('?') => {
                        self.state = AppState::Helping;
                        true
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        self.state = AppState::Quitting;
                        true
                    }
                    _ => false,
                }
            }
            AppState::Helping => {
                self.state = AppState::Calendar;
                true
            }
            AppState::Quitting => false,
        }
    }

    fn beep(&self) -> io::Result<()> {
        io::stdout().write_all(b"\x07")
    }

    fn quitting(&self) -> bool {
        self.state == AppState::Quitting
    }

    fn move_days(&mut self, days: i64) -> bool {
        match self
            .cursor
            .checked_add(Duration::days(days))
            .filter(|&d| self.year.contains(d))
        {
            Some(date) => {
                self.cursor = date;
                true
            }
            None => false,
        }
    }

    /// Move to the same day of the next or previous month, or to that month's
    /// last day if it is shorter
    fn move_month(&mut self, forwards: bool) -> bool {
        // `months` holds January through December of the cursor's year
        let index = usize::from(u8::from(self.cursor.month())) - 1;
        let target = if forwards {
            Some(index + 1)
        } else {
            index.checked_sub(1)
        };
        let Some(grid) = target.and_then(|i| self.months.get(i)) else {
            return false;
        };
        match grid.days().take(usize::from(self.cursor.day())).last() {
            Some(date) => {
                self.cursor = date;
                true
            }
            None => false,
        }
    }

    fn toggle(&mut self) {
        let key = format_key(self.cursor);
        self.status = Some(match self.store.toggle_day(key) {
            Ok(Toggle::Marked(_)) => Status::Info(format!("Marked {key} as read")),
            Ok(Toggle::Unmarked) => Status::Info(format!("Unmarked {key}")),
            Err(e) => {
                self.synced.set(false);
                Status::Error(format!("{:#}", anyhow::Error::new(e)))
            }
        });
    }

    fn resync(&mut self) {
        self.status = Some(match self.store.resync() {
            Ok(()) => Status::Info(String::from("Reloaded read days")),
            Err(e) => Status::Error(format!("{:#}", anyhow::Error::new(e))),
        });
    }

    fn footer(&self, read_days: &ReadDayMap) -> (String, Style) {
        if let Some(status) = &self.status {
            match status {
                Status::Info(msg) => (msg.clone(), STATUS_STYLE),
                Status::Error(msg) => (msg.clone(), ERROR_STYLE),
            }
        } else if let Some(e) = self.store.last_error() {
            (format!("Sync failed: {e}"), ERROR_STYLE)
        } else {
            let key = format_key(self.cursor);
            let state = match self.store.color_of(key) {
                Some(color) => format!("read ({color})"),
                None if is_missed_day(self.cursor, read_days, self.today) => {
                    String::from("missed")
                }
                None => String::from("not read"),
            };
            (
                format!("{} {key}: {state}    (Press ? for help)", self.cursor.weekday()),
                STATUS_STYLE,
            )
        }
    }
}

impl<R: RemoteDocuments, P: ColorPicker> Widget for &App<R, P> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, BASE_STYLE);
        let [header, body, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);
        let read_days = self.store.read_days();
        let streak = calculate_streak(&*read_days, self.year, self.today);
        Paragraph::new(vec![
            Line::styled(format!("Reading Tracker {}", self.year), TITLE_STYLE),
            Line::styled(streak_text(streak, self.synced.get()), STREAK_STYLE),
        ])
        .alignment(Alignment::Center)
        .render(header, buf);
        if self.store.is_loading() {
            Paragraph::new(Line::styled("Loading...", STATUS_STYLE))
                .alignment(Alignment::Center)
                .render(body, buf);
        } else {
            YearView::new(&self.months, &read_days, self.today)
                .cursor(self.cursor)
                .render(body, buf);
        }
        let (text, style) = self.footer(&read_days);
        Paragraph::new(Line::styled(text, style)).render(footer, buf);
        if self.state == AppState::Helping {
            Help(BASE_STYLE).render(area, buf);
        }
    }
}

fn streak_text(streak: u32, synced: bool) -> String {
    let mut text = if streak == 1 {
        String::from("Current Streak: 1 day")
    } else {
        format!("Current Streak: {streak} days")
    };
    if !synced {
        text.push_str("  (unsaved changes)");
    }
    text
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum AppState {
    Calendar,
    Helping,
    Quitting,
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum Status {
    Info(String),
    Error(String),
}
