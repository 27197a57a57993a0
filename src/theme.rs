use ratatui::style::{Color, Modifier, Style};

pub(crate) const BASE_STYLE: Style = Style::new().fg(Color::White).bg(Color::Black);

pub(crate) const TITLE_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const STREAK_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .bg(Color::Black)
    .add_modifier(Modifier::BOLD);

pub(crate) const MONTH_STYLE: Style = BASE_STYLE.add_modifier(Modifier::BOLD);

pub(crate) const WEEKDAY_STYLE: Style = BASE_STYLE.fg(Color::Gray);

pub(crate) const UNREAD_STYLE: Style = BASE_STYLE.fg(Color::DarkGray);

pub(crate) const MISSED_STYLE: Style = BASE_STYLE.fg(Color::LightRed);

/// Used for marked days whose stored color cannot be displayed
pub(crate) const FALLBACK_READ_STYLE: Style = BASE_STYLE.fg(Color::LightGreen);

pub(crate) const STATUS_STYLE: Style = BASE_STYLE.fg(Color::Gray);

pub(crate) const ERROR_STYLE: Style = BASE_STYLE
    .fg(Color::LightRed)
    .add_modifier(Modifier::BOLD);

/// Added on top of a day's style
pub(crate) const TODAY_MODIFIER: Modifier = Modifier::UNDERLINED;

/// Added on top of a day's style
pub(crate) const CURSOR_MODIFIER: Modifier = Modifier::REVERSED;
