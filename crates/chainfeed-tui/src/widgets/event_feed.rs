//! The feed pane: entries newest first, one row each.
//!
//! `offset` counts entries hidden above the view and `selected` is an index
//! into the feed, both with 0 as the newest entry. When the user has scrolled
//! away from the top, merged entries shift both down by the number added so
//! the rows on screen do not move, and `unseen` counts them until the view
//! returns to the top.

use std::cell::Cell;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::event::{AppEvent, Direction};
use crate::theme::Theme;
use chainfeed_core::types::FEED_ICON;
use chainfeed_core::{DisplayItem, FeedEntry, FeedState};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Margin, Rect},
    text::{Line, Span},
    widgets::{
        Block, Cell as TableCell, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Table, Widget,
    },
};

/// Rows moved by `PageUp`/`PageDown`.
const PAGE_STEP: usize = 10;

const LABEL_WIDTH: u16 = 28;

/// Terminal glyph for a [`DisplayItem`] icon hint.
fn icon_glyph(icon: &str) -> &'static str {
    match icon {
        FEED_ICON => "🔔",
        _ => "·",
    }
}

pub struct EventFeedState {
    pub feed: Arc<FeedState>,
    pub offset: usize,
    pub selected: usize,
    pub unseen: usize,
    pub show_timestamps: bool,
    pub timestamp_format: String,
    /// Visible rows as of the last draw.
    rows: Cell<usize>,
}

impl EventFeedState {
    pub fn new(feed: Arc<FeedState>) -> Self {
        Self {
            feed,
            offset: 0,
            selected: 0,
            unseen: 0,
            show_timestamps: true,
            timestamp_format: "%H:%M:%S".into(),
            rows: Cell::new(20),
        }
    }

    pub fn is_scrolled(&self) -> bool {
        self.offset > 0
    }

    pub fn selected_entry(&self) -> Option<&FeedEntry> {
        self.feed.entries().get(self.selected)
    }

    fn last_index(&self) -> usize {
        self.feed.len().saturating_sub(1)
    }

    /// Swap in a newly published snapshot.
    pub fn update(&mut self, next: Arc<FeedState>) {
        if Arc::ptr_eq(&self.feed, &next) {
            return;
        }
        let prev = std::mem::replace(&mut self.feed, next);

        match prepended(&prev, &self.feed) {
            None => {
                tracing::debug!("feed restarted, back to newest");
                self.to_newest();
            }
            Some(added) if self.is_scrolled() => {
                self.offset += added;
                self.selected += added;
                self.unseen += added;
            }
            Some(_) => {}
        }

        let last = self.last_index();
        self.selected = self.selected.min(last);
        self.offset = self.offset.min(last);
    }

    fn to_newest(&mut self) {
        self.offset = 0;
        self.selected = 0;
        self.unseen = 0;
    }

    /// Move the selection, dragging the view along when it leaves the screen.
    fn step(&mut self, delta: isize) {
        let rows = self.rows.get().max(1);
        self.selected = self.selected.saturating_add_signed(delta).min(self.last_index());
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
    }

    /// Move the view a page, selecting its top row.
    fn page(&mut self, delta: isize) {
        self.offset = self.offset.saturating_add_signed(delta).min(self.last_index());
        self.selected = self.offset;
    }

    pub fn handle(&mut self, event: &AppEvent) {
        if self.feed.is_empty() {
            return;
        }
        let page = PAGE_STEP as isize;
        match event {
            AppEvent::Nav(Direction::Up) => self.step(-1),
            AppEvent::Nav(Direction::Down) => self.step(1),
            AppEvent::ScrollUp => self.page(-page),
            AppEvent::ScrollDown => self.page(page),
            AppEvent::ScrollToNewest => self.to_newest(),
            _ => return,
        }
        if !self.is_scrolled() {
            self.unseen = 0;
        }
        tracing::trace!(selected = self.selected, offset = self.offset, "feed moved");
    }
}

/// How many entries `next` put in front of `prev`. `None` means `next` is not
/// a continuation of `prev`, i.e. the feed was cleared in between.
fn prepended(prev: &FeedState, next: &FeedState) -> Option<usize> {
    let added = next.len().checked_sub(prev.len())?;
    let Some(old_newest) = prev.entries().first() else {
        return Some(added);
    };
    (next.entries()[added].key() == old_newest.key()).then_some(added)
}

pub struct EventFeed<'a> {
    state: &'a EventFeedState,
    title: &'a str,
    live: bool,
    focused: bool,
    theme: &'a Theme,
}

impl<'a> EventFeed<'a> {
    pub fn new(
        state: &'a EventFeedState,
        title: &'a str,
        live: bool,
        focused: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            state,
            title,
            live,
            focused,
            theme,
        }
    }

    fn block(&self) -> Block<'static> {
        let theme = self.theme;
        let state = self.state;
        let status = if self.live {
            Span::styled(" ● live ", theme.status_live)
        } else {
            Span::styled(" ○ ended ", theme.status_ended)
        };

        let mut block = Block::bordered()
            .title(format!(" Events · {} · {} ", self.title, state.feed.len()))
            .title_top(Line::from(status).right_aligned())
            .border_style(if self.focused {
                theme.border_focused
            } else {
                theme.border_unfocused
            });
        if state.is_scrolled() && state.unseen > 0 {
            block = block.title_bottom(
                Line::styled(format!(" ▲ {} newer ", state.unseen), theme.feed_selected)
                    .centered(),
            );
        }
        block
    }

    /// Arrival time in the configured format, or `%H:%M:%S` when chrono
    /// cannot render that format.
    fn stamp(&self, entry: &FeedEntry) -> String {
        let mut out = String::new();
        let at = entry.received_at();
        if write!(out, "{}", at.format(&self.state.timestamp_format)).is_err() {
            out = at.format("%H:%M:%S").to_string();
        }
        out
    }

    fn row(&self, index: usize, entry: &FeedEntry) -> Row<'static> {
        let mut cells = Vec::with_capacity(4);
        if self.state.show_timestamps {
            cells.push(TableCell::from(self.stamp(entry)).style(self.theme.feed_timestamp));
        }
        let DisplayItem {
            icon,
            summary,
            content,
            ..
        } = entry.to_display_item();
        cells.push(TableCell::from(icon_glyph(icon)));
        let summary_style = self.theme.label_style(&summary);
        cells.push(TableCell::from(summary).style(summary_style));
        cells.push(TableCell::from(content).style(self.theme.feed_detail));

        let row = Row::new(cells);
        if index == self.state.selected {
            row.style(self.theme.feed_selected)
        } else {
            row
        }
    }

    fn widths(&self, sample: &FeedEntry) -> Vec<Constraint> {
        let mut widths = Vec::with_capacity(4);
        if self.state.show_timestamps {
            let width = self.stamp(sample).chars().count() as u16;
            widths.push(Constraint::Length(width));
        }
        widths.push(Constraint::Length(2));
        widths.push(Constraint::Length(LABEL_WIDTH));
        widths.push(Constraint::Fill(1));
        widths
    }
}

impl Widget for EventFeed<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = self.block();
        let inner = block.inner(area);
        block.render(area, buf);

        let rows = inner.height as usize;
        self.state.rows.set(rows);

        let entries = self.state.feed.entries();
        let Some(sample) = entries.first() else {
            Paragraph::new(Line::styled(" waiting for events… ", self.theme.feed_empty))
                .render(inner, buf);
            return;
        };

        let start = self.state.offset.min(entries.len());
        let visible = entries[start..].iter().take(rows).enumerate();
        let table = Table::new(
            visible.map(|(i, entry)| self.row(start + i, entry)),
            self.widths(sample),
        )
        .column_spacing(1);
        let text_area = Rect {
            width: inner.width.saturating_sub(1),
            ..inner
        };
        Widget::render(table, text_area, buf);

        // Drawn over the right border.
        let mut position = ScrollbarState::new(entries.len())
            .position(start)
            .viewport_content_length(rows);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(None)
            .end_symbol(None);
        StatefulWidget::render(scrollbar, area.inner(Margin::new(0, 1)), buf, &mut position);
    }
}
