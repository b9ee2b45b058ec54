//! Colour themes.
//!
//! Two themes ship inside the binary (`default` and `gruvbox`), both written
//! in TOML and read through the `config` crate. Every style is resolved once,
//! when the theme is loaded.
//!
//! Labels are coloured by their section: the part before `:` is hashed into
//! the `[palette] sections` list, so `balances:Transfer` and
//! `balances:Deposit` always share a colour.

use std::str::FromStr;

use config::{Config, File, FileFormat};
use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

const DEFAULT_THEME: &str = include_str!("themes/default.toml");
const GRUVBOX_DARK_THEME: &str = include_str!("themes/gruvbox_dark.toml");

/// One style as written in a theme file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StyleSpec {
    fg: Option<String>,
    bg: Option<String>,
    modifiers: Vec<String>,
}

impl StyleSpec {
    fn resolve(&self) -> anyhow::Result<Style> {
        let mut style = Style::default();
        if let Some(fg) = &self.fg {
            style = style.fg(color(fg)?);
        }
        if let Some(bg) = &self.bg {
            style = style.bg(color(bg)?);
        }
        for name in &self.modifiers {
            style = style.add_modifier(modifier(name)?);
        }
        Ok(style)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StyleTable {
    label: StyleSpec,
    detail: StyleSpec,
    timestamp: StyleSpec,
    selected: StyleSpec,
    empty: StyleSpec,
    border_focused: StyleSpec,
    border_unfocused: StyleSpec,
    border_command_bar: StyleSpec,
    live: StyleSpec,
    ended: StyleSpec,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PaletteTable {
    sections: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ThemeFile {
    #[serde(default)]
    styles: StyleTable,
    #[serde(default)]
    palette: PaletteTable,
}

/// Resolved styles for every part of the UI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Modifiers (and fallback colour) for `section:method` labels.
    pub feed_label: Style,
    pub feed_detail: Style,
    pub feed_timestamp: Style,
    /// Patched over the selected row.
    pub feed_selected: Style,
    pub feed_empty: Style,
    pub border_focused: Style,
    pub border_unfocused: Style,
    pub border_command_bar: Style,
    pub status_live: Style,
    pub status_ended: Style,
    section_colors: Vec<Color>,
}

impl Theme {
    /// The built-in default theme.
    pub fn load_default() -> Self {
        Self::from_toml_str(DEFAULT_THEME).expect("built-in default theme must parse")
    }

    pub fn load_gruvbox_dark() -> Self {
        Self::from_toml_str(GRUVBOX_DARK_THEME).expect("built-in gruvbox theme must parse")
    }

    /// Look a built-in theme up by name. Unknown names give the default.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "gruvbox" | "gruvbox_dark" => Self::load_gruvbox_dark(),
            other => {
                if other != "default" {
                    tracing::debug!(theme = other, "unknown theme, using default");
                }
                Self::load_default()
            }
        }
    }

    /// Parse a theme file. Missing styles are left unstyled; an unknown
    /// colour or modifier name is an error.
    pub fn from_toml_str(src: &str) -> anyhow::Result<Self> {
        let file: ThemeFile = Config::builder()
            .add_source(File::from_str(src, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        let s = &file.styles;

        Ok(Self {
            feed_label: s.label.resolve()?,
            feed_detail: s.detail.resolve()?,
            feed_timestamp: s.timestamp.resolve()?,
            feed_selected: s.selected.resolve()?,
            feed_empty: s.empty.resolve()?,
            border_focused: s.border_focused.resolve()?,
            border_unfocused: s.border_unfocused.resolve()?,
            border_command_bar: s.border_command_bar.resolve()?,
            status_live: s.live.resolve()?,
            status_ended: s.ended.resolve()?,
            section_colors: file
                .palette
                .sections
                .iter()
                .map(|c| color(c))
                .collect::<anyhow::Result<_>>()?,
        })
    }

    /// Style for a `section:method` label.
    pub fn label_style(&self, label: &str) -> Style {
        if self.section_colors.is_empty() {
            return self.feed_label;
        }
        let section = label.split(':').next().unwrap_or(label);
        let idx = (fnv1a(section) % self.section_colors.len() as u64) as usize;
        self.feed_label.fg(self.section_colors[idx])
    }
}

/// Colour names follow ratatui's parser: names like `light_blue`, `#rrggbb`,
/// or a palette index.
fn color(name: &str) -> anyhow::Result<Color> {
    Color::from_str(name).map_err(|_| anyhow::anyhow!("unknown colour {name:?}"))
}

fn modifier(name: &str) -> anyhow::Result<Modifier> {
    Ok(match name.to_ascii_lowercase().as_str() {
        "bold" => Modifier::BOLD,
        "dim" => Modifier::DIM,
        "italic" => Modifier::ITALIC,
        "underlined" => Modifier::UNDERLINED,
        "reversed" => Modifier::REVERSED,
        other => anyhow::bail!("unknown modifier {other:?}"),
    })
}

/// FNV-1a: stable across runs and platforms, unlike `DefaultHasher`.
fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_themes_parse() {
        for name in ["default", "gruvbox"] {
            let theme = Theme::by_name(name);
            assert!(!theme.section_colors.is_empty(), "{name}");
            assert!(theme.status_live.add_modifier.contains(Modifier::BOLD), "{name}");
        }
        assert_eq!(
            Theme::by_name("gruvbox").feed_detail.fg,
            Some(Color::Rgb(0xeb, 0xdb, 0xb2))
        );
    }

    #[test]
    fn unknown_name_falls_back_to_default() {
        assert_eq!(
            Theme::by_name("solarized").feed_detail,
            Theme::load_default().feed_detail
        );
    }

    #[test]
    fn same_section_same_colour() {
        let theme = Theme::load_default();
        let transfer = theme.label_style("balances:Transfer");
        assert_eq!(transfer, theme.label_style("balances:Deposit"));
        assert!(transfer.add_modifier.contains(Modifier::BOLD));
        assert!(transfer.fg.is_some());
    }

    #[test]
    fn colour_forms() {
        assert_eq!(color("#ff0080").unwrap(), Color::Rgb(255, 0, 128));
        assert_eq!(color("42").unwrap(), Color::Indexed(42));
        assert_eq!(color("dark_gray").unwrap(), Color::DarkGray);
        assert!(color("chartreuse").is_err());
    }

    #[test]
    fn bad_modifier_is_rejected() {
        let src = "[styles]\nlabel = { modifiers = [\"blink-fast\"] }\n";
        assert!(Theme::from_toml_str(src).is_err());
    }

    #[test]
    fn missing_sections_are_unstyled() {
        let theme = Theme::from_toml_str("[styles]\ndetail = { fg = \"red\" }\n").unwrap();
        assert_eq!(theme.feed_detail.fg, Some(Color::Red));
        assert_eq!(theme.feed_label, Style::default());
        assert_eq!(theme.label_style("a:b"), Style::default());
    }
}
