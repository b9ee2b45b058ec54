//! Keybinding overlay, toggled with `?`.

use crate::commands::COMMAND_HELP;
use crate::event::KeyMap;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Cell, Clear, Row, Table, Widget},
};

pub struct HelpPopup<'a> {
    keys: &'a KeyMap,
    theme: &'a Theme,
}

impl<'a> HelpPopup<'a> {
    pub fn new(keys: &'a KeyMap, theme: &'a Theme) -> Self {
        Self { keys, theme }
    }

    fn rows(&self) -> Vec<(String, &'static str)> {
        let mut rows = vec![
            (self.keys.clear.to_string(), "Clear the feed (no undo)"),
            (self.keys.scroll_to_newest.to_string(), "Jump to the newest event"),
            ("↑ k / ↓ j".to_string(), "Select a newer / older event"),
            ("PgUp Ctrl+u".to_string(), "Page towards newer events"),
            ("PgDn Ctrl+d".to_string(), "Page towards older events"),
            (":".to_string(), "Open the command line"),
            ("q Ctrl+c".to_string(), "Quit"),
        ];
        rows.extend(COMMAND_HELP.iter().map(|(k, d)| (k.to_string(), *d)));
        rows
    }
}

impl Widget for HelpPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = self.rows();
        // Borders take two rows.
        let height = rows.len() as u16 + 2;
        let [popup] = Layout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = Layout::horizontal([Constraint::Length(60)])
            .flex(Flex::Center)
            .areas(popup);

        Clear.render(popup, buf);
        let key_style = Style::new().add_modifier(Modifier::BOLD);
        let table = Table::new(
            rows.into_iter().map(|(key, desc)| {
                Row::new([Cell::from(key).style(key_style), Cell::from(desc)])
                    .style(self.theme.feed_detail)
            }),
            [Constraint::Length(18), Constraint::Fill(1)],
        )
        .block(
            Block::bordered()
                .title(" Keys · ? to close ")
                .border_style(self.theme.border_focused),
        );
        table.render(popup, buf);
    }
}
