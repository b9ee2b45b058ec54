//! User configuration.
//!
//! Settings live in `$XDG_CONFIG_HOME/chainfeed/config.toml` (falling back to
//! `~/.config`). Every section and key is optional; anything left out takes
//! the value from the matching `Default` impl.

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Written out on first run so users have something to edit.
const STARTER_FILE: &str = "\
# chainfeed configuration. Delete a line to fall back to its default.

[feed]
max_height = 250

[source]
# stdin | file | ws
kind   = \"stdin\"
url    = \"ws://127.0.0.1:9944\"
method = \"chainfeed_subscribeEvents\"
# path = \"/var/log/node-events.jsonl\"

[ui]
show_timestamps  = true
timestamp_format = \"%H:%M:%S\"
# default | gruvbox
theme            = \"default\"

[keybindings]
clear            = \"c\"
scroll_to_newest = \"g\"
";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub source: SourceConfig,
    pub ui: UiConfig,
    pub keybindings: KeybindingsConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Upper bound on the feed pane height, in terminal rows.
    pub max_height: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self { max_height: 250 }
    }
}

/// Which event source the binary subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Stdin,
    File,
    Ws,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Stdin => "stdin",
            SourceKind::File => "file",
            SourceKind::Ws => "ws",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// WebSocket JSON-RPC endpoint for `kind = "ws"`.
    pub url: String,
    /// Subscribe method for `kind = "ws"`.
    pub method: String,
    /// JSON-lines file for `kind = "file"`.
    pub path: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Stdin,
            url: "ws://127.0.0.1:9944".into(),
            method: "chainfeed_subscribeEvents".into(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    /// chrono `strftime` pattern for the arrival-time column.
    pub timestamp_format: String,
    /// Built-in theme name. Unknown names fall back to `default`.
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            timestamp_format: "%H:%M:%S".into(),
            theme: "default".into(),
        }
    }
}

/// Single-key bindings. Only the first character of each value counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub clear: String,
    pub scroll_to_newest: String,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            clear: "c".into(),
            scroll_to_newest: "g".into(),
        }
    }
}

impl KeybindingsConfig {
    pub fn clear_key(&self) -> Option<char> {
        self.clear.chars().next()
    }

    pub fn scroll_to_newest_key(&self) -> Option<char> {
        self.scroll_to_newest.chars().next()
    }
}

impl Config {
    /// Read the user's config file, writing the starter file first if there
    /// is none yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = user_config_path();
        if !path.exists() {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&path, STARTER_FILE)?;
            tracing::info!(path = %path.display(), "wrote starter config");
        }
        Self::load_from(&path)
    }

    /// Read `path` if it exists. A missing file is not an error. An
    /// unusable `timestamp_format` is replaced by the default.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let layered = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .build()?;
        let mut cfg: Config = layered.try_deserialize()?;

        if !is_valid_strftime(&cfg.ui.timestamp_format) {
            let fallback = UiConfig::default().timestamp_format;
            tracing::warn!(
                format = %cfg.ui.timestamp_format,
                fallback = %fallback,
                "invalid [ui] timestamp_format"
            );
            cfg.ui.timestamp_format = fallback;
        }
        Ok(cfg)
    }

    /// Built-in settings, no filesystem access.
    pub fn defaults() -> Self {
        Self::default()
    }
}

/// `false` when chrono would fail to render `fmt`.
pub fn is_valid_strftime(fmt: &str) -> bool {
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

fn user_config_path() -> PathBuf {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config"),
    };
    base.join("chainfeed").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.feed.max_height, 250);
        assert_eq!(cfg.source.kind, SourceKind::Stdin);
        assert_eq!(cfg.source.method, "chainfeed_subscribeEvents");
        assert!(cfg.source.path.is_none());
        assert!(cfg.ui.show_timestamps);
        assert_eq!(cfg.keybindings.clear_key(), Some('c'));
        assert_eq!(cfg.keybindings.scroll_to_newest_key(), Some('g'));
    }

    #[test]
    fn starter_file_matches_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, STARTER_FILE).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::defaults());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = Config::load_from(Path::new("/nonexistent/chainfeed/config.toml")).unwrap();
        assert_eq!(cfg, Config::defaults());
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[feed]\nmax_height = 40\n\n[source]\nkind = \"ws\"\nurl = \"ws://node:9944\"\n",
        )
        .unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.feed.max_height, 40);
        assert_eq!(cfg.source.kind, SourceKind::Ws);
        assert_eq!(cfg.source.url, "ws://node:9944");
        // Untouched keys keep their defaults.
        assert_eq!(cfg.source.method, "chainfeed_subscribeEvents");
        assert_eq!(cfg.keybindings.clear_key(), Some('c'));
    }

    #[test]
    fn bad_timestamp_format_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ui]\ntimestamp_format = \"%Q\"\nshow_timestamps = false\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.ui.timestamp_format, "%H:%M:%S");
        assert!(!cfg.ui.show_timestamps);
    }

    #[test]
    fn strftime_check() {
        assert!(is_valid_strftime("%H:%M:%S%.3f"));
        assert!(is_valid_strftime("plain text"));
        assert!(!is_valid_strftime("%Q"));
    }

    #[test]
    fn unknown_source_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[source]\nkind = \"carrier-pigeon\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
