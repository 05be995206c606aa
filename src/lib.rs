//! Papers library - interactive listing of research papers.
//!
//! Filtering, sorting, multi-paper selection with exports, per-paper notes
//! with autosave, and a theme preference, all driven from a card data store
//! and persisted to a local key-value store. The `handlers` module serves
//! the page over HTTP.

use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::info;

pub mod app;
pub mod cards;
pub mod error;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod notes;
pub mod selection;
pub mod storage;
pub mod templates;
pub mod theme;

pub use app::{AppSnapshot, PapersApp};
pub use cards::CardStore;
pub use error::{Error, Result};
pub use notes::{NoteSession, NotesStore};
pub use storage::{LocalStorage, MemoryStorage, SledStorage};
pub use theme::{ThemeController, ThemeMode};

// ============================================================================
// Configuration
// ============================================================================

pub const DB_PATH: &str = ".papers_db";
pub const CARDS_PATH: &str = "papers.html";
pub const BIND_ADDR: &str = "127.0.0.1:3000";
pub const AUTOSAVE_INTERVAL: Duration = notes::AUTOSAVE_INTERVAL;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub cards_path: PathBuf,
    pub bind_addr: String,
    /// Public url of the listing, used as the base of share links.
    pub page_url: String,
    pub autosave_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            cards_path: PathBuf::from(CARDS_PATH),
            bind_addr: BIND_ADDR.to_string(),
            page_url: format!("http://{}/", BIND_ADDR),
            autosave_interval: AUTOSAVE_INTERVAL,
        }
    }
}

impl Config {
    /// Defaults overridden by `PAPERS_DB`, `PAPERS_CARDS`, `PAPERS_ADDR` and
    /// `PAPERS_PAGE_URL`. Without an explicit page url it follows the bind
    /// address.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = env::var("PAPERS_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("PAPERS_CARDS") {
            config.cards_path = PathBuf::from(path);
        }
        if let Ok(addr) = env::var("PAPERS_ADDR") {
            config.page_url = format!("http://{}/", addr);
            config.bind_addr = addr;
        }
        if let Ok(url) = env::var("PAPERS_PAGE_URL") {
            config.page_url = url;
        }
        config
    }
}

// ============================================================================
// Application State
// ============================================================================

pub struct AppState {
    pub config: Config,
    app: Mutex<PapersApp>,
    pub notes: NoteSession,
    pub theme: ThemeController,
}

impl AppState {
    pub fn new(config: Config, store: CardStore, storage: Arc<dyn LocalStorage>) -> Self {
        let notes = NoteSession::new(NotesStore::new(storage.clone()), config.autosave_interval);
        Self {
            app: Mutex::new(PapersApp::new(store)),
            notes,
            theme: ThemeController::new(storage),
            config,
        }
    }

    /// Load the cards and open the sled database named by `config`.
    pub fn open(config: Config) -> Result<Self> {
        let store = CardStore::load(&config.cards_path)?;
        let storage = SledStorage::open(&config.db_path)?;
        info!(
            cards = store.len(),
            db = %config.db_path.display(),
            "papers state ready"
        );
        Ok(Self::new(config, store, Arc::new(storage)))
    }

    /// The page state. Handlers take it for one transition and drop it
    /// before awaiting.
    pub fn app(&self) -> MutexGuard<'_, PapersApp> {
        self.app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a fresh page session, as a browser reload would, restoring a
    /// `#selected=` fragment if one is given.
    pub fn reload(&self, fragment: Option<&str>) {
        let mut app = self.app();
        let store = app.store().clone();
        *app = PapersApp::with_fragment(store, fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::RawCard;

    fn state() -> AppState {
        let store = CardStore::new(vec![RawCard {
            paper_id: "p1".into(),
            year: Some("2023".into()),
            ..Default::default()
        }]);
        AppState::new(Config::default(), store, Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_default_page_url_follows_bind_addr() {
        let config = Config::default();
        assert_eq!(config.page_url, "http://127.0.0.1:3000/");
        assert_eq!(config.autosave_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_reload_resets_filters_and_loads_fragment() {
        let state = state();
        state.app().set_search("zzz");
        state.reload(Some("selected=p1"));
        let app = state.app();
        assert!(app.filters().is_default());
        assert!(app.selection().mode());
        assert!(app.selection().contains("p1"));
    }

    #[test]
    fn test_open_reads_cards_and_db() {
        let dir = tempfile::tempdir().unwrap();
        let cards = dir.path().join("cards.json");
        std::fs::write(&cards, r#"[{"paper-id":"a","year":"2020"}]"#).unwrap();
        let config = Config {
            db_path: dir.path().join("db"),
            cards_path: cards,
            ..Config::default()
        };
        let state = AppState::open(config).unwrap();
        assert_eq!(state.app().store().len(), 1);
        state.theme.cycle().unwrap();
        assert_eq!(state.theme.current(), ThemeMode::Light);
    }
}
