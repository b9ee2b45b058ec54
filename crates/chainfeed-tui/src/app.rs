//! Application state and the terminal event loop.
//!
//! The loop runs on the calling thread. Each frame it pulls the latest feed
//! snapshot from the store's `watch` channel, draws, then waits up to one
//! frame for input. Clearing is not done locally: it is sent to the store as
//! [`StoreCommand::Clear`] and shows up as the next snapshot.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    commands::{execute_command, Command},
    event::{AppEvent, KeyMap},
    theme::Theme,
    widgets::{
        command_bar::{CommandBar, CommandBarState},
        event_feed::{EventFeed, EventFeedState},
        help::HelpPopup,
    },
};
use chainfeed_core::{config::Config, FeedState, StoreCommand};
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
    DefaultTerminal, Frame,
};
use tokio::sync::{mpsc, watch};

const FRAME: Duration = Duration::from_millis(16);

/// Rows taken by the detail pane, borders included.
const DETAIL_HEIGHT: u16 = 4;

/// Everything the UI needs from the running pipeline.
pub struct FeedLink {
    pub state: watch::Receiver<Arc<FeedState>>,
    pub commands: mpsc::Sender<StoreCommand>,
    /// Shown in the feed title.
    pub source: String,
    /// Polled once per frame for the live/ended badge.
    pub live: Box<dyn Fn() -> bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Feed,
    Command,
}

pub struct AppState {
    pub feed: EventFeedState,
    pub source: String,
    pub live: bool,
    pub focus: Focus,
    pub theme: Theme,
    pub config: Config,
    pub keys: KeyMap,
    pub show_help: bool,
    pub command_bar: CommandBarState,
    pub quit: bool,
    commands: mpsc::Sender<StoreCommand>,
}

impl AppState {
    pub fn new(
        feed: Arc<FeedState>,
        source: String,
        commands: mpsc::Sender<StoreCommand>,
        config: Config,
        theme: Theme,
    ) -> Self {
        let mut feed = EventFeedState::new(feed);
        feed.show_timestamps = config.ui.show_timestamps;
        feed.timestamp_format = config.ui.timestamp_format.clone();

        Self {
            feed,
            source,
            live: true,
            focus: Focus::Feed,
            theme,
            keys: KeyMap::from(&config.keybindings),
            config,
            show_help: false,
            command_bar: CommandBarState::default(),
            quit: false,
            commands,
        }
    }

    /// Ask the store to reset the feed.
    pub fn request_clear(&mut self) {
        match self.commands.try_send(StoreCommand::Clear) {
            Ok(()) => tracing::debug!("clear sent to store"),
            Err(e) => tracing::warn!(error = %e, "clear not delivered"),
        }
    }

    pub fn handle(&mut self, event: AppEvent) {
        if self.show_help {
            if matches!(event, AppEvent::Char('?') | AppEvent::Escape | AppEvent::Quit) {
                self.show_help = false;
            }
            return;
        }

        match self.focus {
            Focus::Command => self.handle_command_line(event),
            Focus::Feed => match event {
                AppEvent::Quit => self.quit = true,
                AppEvent::Clear => self.request_clear(),
                AppEvent::Char('?') => self.show_help = true,
                AppEvent::Char(':') => {
                    self.command_bar.clear();
                    self.focus = Focus::Command;
                }
                other => self.feed.handle(&other),
            },
        }
    }

    fn handle_command_line(&mut self, event: AppEvent) {
        match event {
            AppEvent::Quit => self.quit = true,
            AppEvent::Escape => {
                self.command_bar.clear();
                self.focus = Focus::Feed;
            }
            AppEvent::Enter => {
                let line = self.command_bar.submit();
                match Command::parse(&line) {
                    Ok(cmd) => {
                        self.focus = Focus::Feed;
                        if let Some(cmd) = cmd {
                            execute_command(self, cmd);
                        }
                    }
                    // Keep the bar open so the message is visible.
                    Err(e) => self.command_bar.error = Some(e.to_string()),
                }
            }
            other => self.command_bar.handle(&other),
        }
    }
}

pub struct App {
    state: AppState,
    link: FeedLink,
}

impl App {
    pub fn new(link: FeedLink, config: Config, theme: Theme) -> Self {
        let snapshot = Arc::clone(&link.state.borrow());
        let state = AppState::new(
            snapshot,
            link.source.clone(),
            link.commands.clone(),
            config,
            theme,
        );
        Self { state, link }
    }

    /// Take over the terminal until the user quits. The terminal is restored
    /// on return and on panic.
    pub fn run(mut self) -> anyhow::Result<()> {
        let mut terminal = ratatui::try_init()?;
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }

    fn sync_feed(&mut self) {
        if self.link.state.has_changed().unwrap_or(false) {
            let next = Arc::clone(&self.link.state.borrow_and_update());
            self.state.feed.update(next);
        }
        self.state.live = (self.link.live)();
    }

    fn next_event(&self) -> anyhow::Result<Option<AppEvent>> {
        if !ct_event::poll(FRAME)? {
            return Ok(None);
        }
        let raw = ct_event::read()?;
        if matches!(&raw, Event::Key(k) if k.kind != KeyEventKind::Press) {
            return Ok(None);
        }
        Ok(match self.state.focus {
            Focus::Command => self.state.keys.to_app_event_insert(raw),
            Focus::Feed => self.state.keys.to_app_event(raw),
        })
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> anyhow::Result<()> {
        while !self.state.quit {
            self.sync_feed();
            terminal.draw(|frame| draw(frame, &self.state))?;

            if let Some(ev) = self.next_event()? {
                tracing::trace!(focus = ?self.state.focus, event = ?ev, "input");
                self.state.handle(ev);
            }
        }
        Ok(())
    }
}

fn draw(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let [feed_area, detail_area, _] = Layout::vertical([
        Constraint::Max(state.config.feed.max_height),
        Constraint::Length(DETAIL_HEIGHT),
        Constraint::Fill(1),
    ])
    .areas(area);

    frame.render_widget(
        EventFeed::new(
            &state.feed,
            &state.source,
            state.live,
            state.focus == Focus::Feed,
            &state.theme,
        ),
        feed_area,
    );
    frame.render_widget(detail_pane(state), detail_area);

    if state.show_help {
        frame.render_widget(HelpPopup::new(&state.keys, &state.theme), area);
    }

    if state.focus == Focus::Command {
        let bar = Rect {
            y: area.bottom().saturating_sub(1),
            height: 1,
            ..area
        };
        frame.render_widget(CommandBar::new(&state.command_bar, &state.theme), bar);
        frame.set_cursor_position((state.command_bar.cursor_col(bar), bar.y));
    }
}

fn detail_pane(state: &AppState) -> Paragraph<'_> {
    let theme = &state.theme;
    let lines = match state.feed.selected_entry() {
        Some(entry) => vec![
            Line::from(vec![
                Span::styled(entry.label(), theme.label_style(entry.label())),
                Span::styled(format!("  {}", entry.key()), theme.feed_timestamp),
            ]),
            Line::styled(entry.detail(), theme.feed_detail),
        ],
        None => vec![Line::styled("no event selected", theme.feed_empty)],
    };

    Paragraph::new(lines)
        .block(Block::bordered().title(" Detail ").border_style(theme.border_unfocused))
        .wrap(Wrap { trim: false })
}
