//! `:` command line drawn over the bottom row.
//!
//! Editing keeps a char-indexed cursor so multi-byte input behaves. `↑`/`↓`
//! walk through previously submitted commands.

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Widget},
};

/// Oldest commands are forgotten past this many.
const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Default)]
pub struct CommandBarState {
    pub input: String,
    /// Cursor position in chars, `0..=input.chars().count()`.
    pub cursor: usize,
    /// Message from the last rejected command. Any key dismisses it.
    pub error: Option<String>,
    history: Vec<String>,
    /// Index into `history` while recalling; `None` while editing fresh text.
    recall: Option<usize>,
}

impl CommandBarState {
    /// Blank the line for a new command. History is kept.
    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
        self.error = None;
        self.recall = None;
    }

    /// Take the typed text, remembering it for recall.
    pub fn submit(&mut self) -> String {
        let line = std::mem::take(&mut self.input);
        let trimmed = line.trim();
        if !trimmed.is_empty() && self.history.last().map(String::as_str) != Some(trimmed) {
            if self.history.len() == HISTORY_LIMIT {
                self.history.remove(0);
            }
            self.history.push(trimmed.to_string());
        }
        self.clear();
        line
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn load(&mut self, idx: Option<usize>) {
        self.recall = idx;
        self.input = idx
            .and_then(|i| self.history.get(i).cloned())
            .unwrap_or_default();
        self.cursor = self.char_len();
    }

    /// Apply an editing key. `Enter`/`Escape` belong to the app shell.
    pub fn handle(&mut self, event: &AppEvent) {
        self.error = None;
        match event {
            AppEvent::Char(c) => {
                let at = self.byte_at(self.cursor);
                self.input.insert(at, *c);
                self.cursor += 1;
            }
            AppEvent::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_at(self.cursor);
                self.input.remove(at);
            }
            AppEvent::Nav(Direction::Left) => self.cursor = self.cursor.saturating_sub(1),
            AppEvent::Nav(Direction::Right) => self.cursor = (self.cursor + 1).min(self.char_len()),
            AppEvent::Nav(Direction::Up) if !self.history.is_empty() => {
                let prev = match self.recall {
                    Some(i) => i.saturating_sub(1),
                    None => self.history.len() - 1,
                };
                self.load(Some(prev));
            }
            AppEvent::Nav(Direction::Down) => {
                if let Some(i) = self.recall {
                    let next = i + 1;
                    self.load((next < self.history.len()).then_some(next));
                }
            }
            _ => {}
        }
    }

    /// Terminal column of the text cursor when drawn in `area`, after the `:`.
    pub fn cursor_col(&self, area: Rect) -> u16 {
        let col = area.x.saturating_add(1).saturating_add(self.cursor as u16);
        col.min(area.right().saturating_sub(1))
    }
}

pub struct CommandBar<'a> {
    state: &'a CommandBarState,
    theme: &'a Theme,
}

impl<'a> CommandBar<'a> {
    pub fn new(state: &'a CommandBarState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }
}

impl Widget for CommandBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let line = match &self.state.error {
            Some(err) => Line::styled(
                format!("E: {err}"),
                Style::new().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            None => Line::from(vec![
                Span::styled(":", self.theme.border_command_bar),
                Span::raw(self.state.input.as_str()),
            ]),
        };
        line.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> CommandBarState {
        let mut s = CommandBarState::default();
        for c in text.chars() {
            s.handle(&AppEvent::Char(c));
        }
        s
    }

    #[test]
    fn insert_in_the_middle() {
        let mut s = typed("cear");
        s.handle(&AppEvent::Nav(Direction::Left));
        s.handle(&AppEvent::Nav(Direction::Left));
        s.handle(&AppEvent::Nav(Direction::Left));
        s.handle(&AppEvent::Char('l'));
        assert_eq!(s.input, "clear");
        assert_eq!(s.cursor, 2);
    }

    #[test]
    fn multibyte_backspace() {
        let mut s = typed("aéb");
        s.handle(&AppEvent::Nav(Direction::Left));
        s.handle(&AppEvent::Backspace);
        assert_eq!(s.input, "ab");
        assert_eq!(s.cursor, 1);
        s.handle(&AppEvent::Nav(Direction::Right));
        s.handle(&AppEvent::Nav(Direction::Right));
        assert_eq!(s.cursor, 2);
    }

    #[test]
    fn history_recall() {
        let mut s = typed("ts");
        s.submit();
        for c in "clear".chars() {
            s.handle(&AppEvent::Char(c));
        }
        s.submit();

        s.handle(&AppEvent::Nav(Direction::Up));
        assert_eq!(s.input, "clear");
        s.handle(&AppEvent::Nav(Direction::Up));
        assert_eq!(s.input, "ts");
        s.handle(&AppEvent::Nav(Direction::Up));
        assert_eq!(s.input, "ts");
        s.handle(&AppEvent::Nav(Direction::Down));
        assert_eq!(s.input, "clear");
        s.handle(&AppEvent::Nav(Direction::Down));
        assert_eq!(s.input, "");
    }

    #[test]
    fn any_key_dismisses_the_error() {
        let mut s = CommandBarState::default();
        s.error = Some("bad".into());
        s.handle(&AppEvent::Nav(Direction::Left));
        assert!(s.error.is_none());
    }

    #[test]
    fn cursor_column_follows_chars() {
        let s = typed("éé");
        assert_eq!(s.cursor_col(Rect::new(5, 0, 40, 1)), 8);
    }
}
