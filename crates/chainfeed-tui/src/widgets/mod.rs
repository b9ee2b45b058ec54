//! Widgets drawn by the app shell.

pub mod command_bar;
pub mod event_feed;
pub mod help;
