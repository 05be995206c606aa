//! Light/dark theme preference: auto → light → dark → auto.

use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::storage::LocalStorage;

pub const THEME_KEY: &str = "papersTheme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(ThemeMode::Auto),
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ThemeMode::Auto => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Auto,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ThemeMode::Auto => "🌓 Auto",
            ThemeMode::Light => "☀️ Light",
            ThemeMode::Dark => "🌙 Dark",
        }
    }

    /// Class applied to `<body>`; auto leaves the choice to the user agent.
    pub fn body_class(&self) -> Option<&'static str> {
        match self {
            ThemeMode::Auto => None,
            ThemeMode::Light => Some("papers-theme-light"),
            ThemeMode::Dark => Some("papers-theme-dark"),
        }
    }
}

pub struct ThemeController {
    storage: Arc<dyn LocalStorage>,
}

impl ThemeController {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Stored preference; missing or unrecognised values mean auto.
    pub fn current(&self) -> ThemeMode {
        self.storage
            .get_item(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|raw| ThemeMode::parse(raw.trim()))
            .unwrap_or_default()
    }

    pub fn cycle(&self) -> Result<ThemeMode> {
        let mode = self.current().next();
        self.storage.set_item(THEME_KEY, mode.as_str())?;
        info!(theme = mode.as_str(), "theme changed");
        Ok(mode)
    }
}
