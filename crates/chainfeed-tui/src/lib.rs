//! Terminal front end for chainfeed.

pub mod app;
pub mod commands;
pub mod event;
pub mod theme;
pub mod widgets;

pub use app::{App, FeedLink};

/// Take over the terminal and show `link`'s feed until the user quits.
pub fn run(link: FeedLink, config: chainfeed_core::config::Config) -> anyhow::Result<()> {
    let theme = theme::Theme::by_name(&config.ui.theme);
    App::new(link, config, theme).run()
}
