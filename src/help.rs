use ratatui::{
    buffer::Buffer,
    layout::Flex,
    layout::{Alignment, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};

static TEXT: &[&str] = &[
    "h, LEFT         Move back one day\n",
    "l, RIGHT        Move forward one day\n",
    "k, UP           Move back one week\n",
    "j, DOWN         Move forward one week\n",
    "w, PAGE UP      Move back one month\n",
    "z, PAGE DOWN    Move forward one month\n",
    "SPACE, ENTER    Mark or unmark the day as read\n",
    "0, HOME         Jump to today\n",
    "r               Reload from storage\n",
    "?               Show this help\n",
    "q, ESC          Quit\n",
    "\n",
    "Press the Any Key to dismiss.\n",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = TEXT.iter().map(|&s| Line::raw(s)).collect::<Vec<_>>();
        let text = Text::from(lines);
        let height = u16::try_from(text.height())
            .unwrap_or(u16::MAX)
            .min(area.height)
            .saturating_add(2);
        let width = u16::try_from(text.width())
            .unwrap_or(u16::MAX)
            .min(area.width)
            .saturating_add(2);
        let para = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title(" Commands ")
                    .title_alignment(Alignment::Center),
            )
            .style(self.0);
        let [help_area] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
        let [help_area] = Layout::vertical([height])
            .flex(Flex::Center)
            .areas(help_area);
        let outer_area = Rect {
            x: help_area.x.saturating_sub(1),
            y: help_area.y,
            width: help_area.width.saturating_add(2),
            height: help_area.height,
        };
        Clear.render(outer_area, buf);
        Block::new().style(self.0).render(outer_area, buf);
        para.render(help_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::BASE_STYLE;

    #[test]
    fn test_centered_box() {
        let area = Rect::new(0, 0, 60, 21);
        let mut buffer = Buffer::empty(area);
        Help(BASE_STYLE).render(area, &mut buffer);
        let lines = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        // 13 lines of text plus the border, centered in 21 rows
        let top = lines[3].trim();
        assert!(top.starts_with('┌') && top.ends_with('┐'), "{top:?}");
        assert!(top.contains(" Commands "));
        assert!(lines[4].contains("│h, LEFT         Move back one day"));
        assert!(lines[10].contains("│SPACE, ENTER    Mark or unmark the day as read│"));
        assert!(lines[16].contains("│Press the Any Key to dismiss."));
        assert!(lines[17].trim().starts_with('└'));
        assert_eq!(lines[2].trim(), "");
        assert_eq!(lines[18].trim(), "");
    }
}
