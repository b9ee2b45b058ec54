//! Translation from crossterm input to [`AppEvent`]s.
//!
//! Widgets only ever see [`AppEvent`]. Two tables exist: the feed table, where
//! letters are shortcuts, and the text table used while the command line is
//! open, where letters are just text and only `Ctrl+c` still quits.

use chainfeed_core::config::KeybindingsConfig;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    /// Drop every entry. There is no undo.
    Clear,
    /// One page towards newer entries.
    ScrollUp,
    /// One page towards older entries.
    ScrollDown,
    ScrollToNewest,
    /// Selection movement, or the text cursor on the command line.
    Nav(Direction),
    Char(char),
    Backspace,
    Enter,
    Escape,
    Resize(u16, u16),
}

/// The two configurable single-key actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMap {
    pub clear: char,
    pub scroll_to_newest: char,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyMap::from(&KeybindingsConfig::default())
    }
}

impl From<&KeybindingsConfig> for KeyMap {
    fn from(cfg: &KeybindingsConfig) -> Self {
        Self {
            clear: cfg.clear_key().unwrap_or('c'),
            scroll_to_newest: cfg.scroll_to_newest_key().unwrap_or('g'),
        }
    }
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char(c)
}

/// Keys that mean the same thing in both tables.
fn common(key: &KeyEvent) -> Option<AppEvent> {
    if is_ctrl(key, 'c') {
        return Some(AppEvent::Quit);
    }
    let unmodified = key.modifiers.is_empty();
    match key.code {
        KeyCode::Esc => Some(AppEvent::Escape),
        KeyCode::Enter if unmodified => Some(AppEvent::Enter),
        KeyCode::Backspace if unmodified => Some(AppEvent::Backspace),
        _ => None,
    }
}

/// Plain or shifted characters count as text.
fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) if (key.modifiers - KeyModifiers::SHIFT).is_empty() => Some(c),
        _ => None,
    }
}

impl KeyMap {
    /// Feed table. `None` for input with no binding (mouse, focus, F-keys).
    pub fn to_app_event(&self, event: Event) -> Option<AppEvent> {
        match event {
            Event::Key(key) => self.feed_key(&key),
            Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            _ => None,
        }
    }

    /// Text table, used while the command line has focus.
    pub fn to_app_event_insert(&self, event: Event) -> Option<AppEvent> {
        match event {
            Event::Key(key) => common(&key)
                .or_else(|| arrow(key.code).map(AppEvent::Nav))
                .or_else(|| typed_char(&key).map(AppEvent::Char)),
            Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
            _ => None,
        }
    }

    fn feed_key(&self, key: &KeyEvent) -> Option<AppEvent> {
        if let Some(ev) = common(key) {
            return Some(ev);
        }
        if is_ctrl(key, 'u') {
            return Some(AppEvent::ScrollUp);
        }
        if is_ctrl(key, 'd') {
            return Some(AppEvent::ScrollDown);
        }
        match key.code {
            KeyCode::PageUp => return Some(AppEvent::ScrollUp),
            KeyCode::PageDown => return Some(AppEvent::ScrollDown),
            _ => {}
        }
        if key.modifiers.is_empty() {
            if let Some(dir) = arrow(key.code) {
                return Some(AppEvent::Nav(dir));
            }
        }

        // Shift is ignored so an uppercase binding works on terminals that
        // report it and on those that don't.
        let c = typed_char(key)?;
        Some(match c {
            c if c == self.clear => AppEvent::Clear,
            c if c == self.scroll_to_newest => AppEvent::ScrollToNewest,
            'q' => AppEvent::Quit,
            'k' => AppEvent::Nav(Direction::Up),
            'j' => AppEvent::Nav(Direction::Down),
            other => AppEvent::Char(other),
        })
    }
}
