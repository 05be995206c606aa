//! Per-paper notes: storage, the editor session with autosave, badges.
//!
//! Notes live in local storage under `paperNotes:<paper id>`, one JSON
//! record per paper, last write wins. While an editor is open a background
//! task re-saves the draft every `AUTOSAVE_INTERVAL`; closing the editor
//! cancels it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use pulldown_cmark::Parser;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::export::{export_note, Download, PaperHeading};
use crate::models::{NoteRecord, ReadingStatus, MAX_PROGRESS, MAX_RATING};
use crate::storage::LocalStorage;

pub const STORAGE_PREFIX: &str = "paperNotes:";

pub fn key_for(paper_id: &str) -> String {
    format!("{}{}", STORAGE_PREFIX, paper_id)
}

// ============================================================================
// Store
// ============================================================================

#[derive(Clone)]
pub struct NotesStore {
    storage: Arc<dyn LocalStorage>,
}

/// Card badge contents. `None` parts are hidden.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badge {
    pub status: Option<&'static str>,
    pub stars: Option<String>,
}

impl NotesStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Stored note, or `None` if never saved. Unreadable or malformed
    /// records count as never saved.
    pub fn load(&self, paper_id: &str) -> Option<NoteRecord> {
        let raw = match self.storage.get_item(&key_for(paper_id)) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(paper_id, error = %e, "failed to read note");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(note) => Some(note),
            Err(e) => {
                debug!(paper_id, error = %e, "ignoring malformed note");
                None
            }
        }
    }

    pub fn save(&self, paper_id: &str, note: &NoteRecord) -> Result<()> {
        let json = serde_json::to_string(note)?;
        self.storage.set_item(&key_for(paper_id), &json)
    }

    pub fn remove(&self, paper_id: &str) -> Result<()> {
        self.storage.remove_item(&key_for(paper_id))?;
        info!(paper_id, "note deleted");
        Ok(())
    }

    /// Re-read one paper's note for its card badge.
    pub fn badge(&self, paper_id: &str) -> Badge {
        match self.load(paper_id) {
            Some(note) => Badge {
                status: Some(note.status.label()),
                stars: Some(note.stars()).filter(|s| !s.is_empty()),
            },
            None => Badge::default(),
        }
    }
}

// ============================================================================
// Editor Draft
// ============================================================================

/// Current values of the editor fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDraft {
    pub status: ReadingStatus,
    pub priority: String,
    pub progress: u8,
    pub rating: u8,
    pub tags: Vec<String>,
    /// Plain text field.
    pub text: String,
    /// Rich editor value, when a rich editor is attached. Takes precedence
    /// over `text`.
    pub rich_text: Option<String>,
    pub summary: String,
    pub todo: String,
    pub highlights: String,
}

impl NoteDraft {
    pub fn from_record(note: &NoteRecord) -> Self {
        Self {
            status: note.status,
            priority: note.priority.clone().unwrap_or_default(),
            progress: note.progress,
            rating: note.rating,
            tags: note.tags.clone(),
            text: note.text.clone(),
            rich_text: None,
            summary: note.summary.clone(),
            todo: note.todo.clone(),
            highlights: note.highlights.clone(),
        }
    }

    pub fn body(&self) -> &str {
        self.rich_text.as_deref().unwrap_or(&self.text)
    }

    /// Build the record to store. `created_at` carries over from the
    /// previous record, `updated_at` is always `now`.
    pub fn to_record(&self, previous: Option<&NoteRecord>, now: DateTime<Utc>) -> NoteRecord {
        NoteRecord {
            status: self.status,
            priority: (!self.priority.is_empty()).then(|| self.priority.clone()),
            progress: self.progress.min(MAX_PROGRESS),
            rating: self.rating.min(MAX_RATING),
            tags: self.tags.clone(),
            text: self.body().to_string(),
            summary: self.summary.clone(),
            todo: self.todo.clone(),
            highlights: self.highlights.clone(),
            created_at: Some(previous.and_then(|p| p.created_at).unwrap_or(now)),
            updated_at: Some(now),
        }
    }
}

/// Editor form submission. Absent fields leave the draft unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteForm {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<String>,
    pub rating: Option<String>,
    pub tags: Option<String>,
    pub text: Option<String>,
    pub rich_text: Option<String>,
    pub summary: Option<String>,
    pub todo: Option<String>,
    pub highlights: Option<String>,
}

fn parse_clamped(raw: &str, max: u8) -> u8 {
    raw.trim()
        .parse::<i64>()
        .map(|v| v.clamp(0, max as i64) as u8)
        .unwrap_or(0)
}

/// Comma-separated tag input; blanks and repeats dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

impl NoteForm {
    pub fn apply(&self, draft: &mut NoteDraft) {
        if let Some(status) = self.status.as_deref().and_then(ReadingStatus::parse) {
            draft.status = status;
        }
        if let Some(priority) = &self.priority {
            draft.priority = priority.clone();
        }
        if let Some(progress) = &self.progress {
            draft.progress = parse_clamped(progress, MAX_PROGRESS);
        }
        if let Some(rating) = &self.rating {
            draft.rating = parse_clamped(rating, MAX_RATING);
        }
        if let Some(tags) = &self.tags {
            draft.tags = parse_tags(tags);
        }
        if let Some(text) = &self.text {
            draft.text = text.clone();
        }
        match (&self.rich_text, &self.text) {
            (Some(rich), _) => draft.rich_text = Some(rich.clone()),
            (None, Some(_)) => draft.rich_text = None,
            (None, None) => {}
        }
        if let Some(summary) = &self.summary {
            draft.summary = summary.clone();
        }
        if let Some(todo) = &self.todo {
            draft.todo = todo.clone();
        }
        if let Some(highlights) = &self.highlights {
            draft.highlights = highlights.clone();
        }
    }
}

// ============================================================================
// Editor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NoteEditor {
    paper_id: String,
    pub draft: NoteDraft,
    last_saved: Option<DateTime<Utc>>,
}

impl NoteEditor {
    /// Load the stored note for `paper_id`, or start from defaults.
    pub fn open(store: &NotesStore, paper_id: &str) -> Self {
        let draft = store
            .load(paper_id)
            .map(|note| NoteDraft::from_record(&note))
            .unwrap_or_default();
        Self {
            paper_id: paper_id.to_string(),
            draft,
            last_saved: None,
        }
    }

    pub fn paper_id(&self) -> &str {
        &self.paper_id
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Human-readable "last saved" indicator.
    pub fn last_saved_label(&self) -> Option<String> {
        self.last_saved.map(|t| {
            format!("Saved at {}", t.with_timezone(&Local).format("%H:%M:%S"))
        })
    }

    /// Overwrite the stored note with the current draft.
    pub fn commit(&mut self, store: &NotesStore, now: DateTime<Utc>) -> Result<NoteRecord> {
        let previous = store.load(&self.paper_id);
        let record = self.draft.to_record(previous.as_ref(), now);
        store.save(&self.paper_id, &record)?;
        self.last_saved = Some(now);
        Ok(record)
    }
}

// ============================================================================
// Autosave
// ============================================================================

pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

type SharedEditor = Arc<tokio::sync::Mutex<Option<NoteEditor>>>;

/// Periodic save of the open editor. Dropping it cancels the task.
pub struct Autosave {
    handle: JoinHandle<()>,
}

impl Autosave {
    fn spawn(editor: SharedEditor, store: NotesStore, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let mut guard = editor.lock().await;
                let Some(open) = guard.as_mut() else {
                    break;
                };
                match open.commit(&store, Utc::now()) {
                    Ok(_) => debug!(paper_id = open.paper_id(), "autosaved note"),
                    Err(e) => warn!(paper_id = open.paper_id(), error = %e, "autosave failed"),
                }
            }
        });
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Autosave {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Session
// ============================================================================

/// The single note editor of the page and its autosave task.
pub struct NoteSession {
    store: NotesStore,
    editor: SharedEditor,
    autosave: Mutex<Option<Autosave>>,
    period: Duration,
}

impl NoteSession {
    pub fn new(store: NotesStore, period: Duration) -> Self {
        Self {
            store,
            editor: Arc::new(tokio::sync::Mutex::new(None)),
            autosave: Mutex::new(None),
            period,
        }
    }

    pub fn store(&self) -> &NotesStore {
        &self.store
    }

    fn set_autosave(&self, autosave: Option<Autosave>) {
        let mut slot = self
            .autosave
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = autosave;
    }

    pub fn autosave_running(&self) -> bool {
        self.autosave
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(Autosave::is_running)
    }

    /// Open the editor for `paper_id`, replacing any open editor, and start
    /// autosaving. Reopening the paper already open keeps its draft.
    pub async fn open(&self, paper_id: &str) -> NoteEditor {
        let opened = {
            let mut guard = self.editor.lock().await;
            match guard.as_ref() {
                Some(open) if open.paper_id() == paper_id => open.clone(),
                _ => {
                    let editor = NoteEditor::open(&self.store, paper_id);
                    *guard = Some(editor.clone());
                    self.set_autosave(Some(Autosave::spawn(
                        self.editor.clone(),
                        self.store.clone(),
                        self.period,
                    )));
                    editor
                }
            }
        };
        debug!(paper_id, "note editor open");
        opened
    }

    /// Snapshot of the open editor, if any.
    pub async fn current(&self) -> Option<NoteEditor> {
        self.editor.lock().await.clone()
    }

    /// Apply form values to the open editor's draft without saving.
    pub async fn update(&self, paper_id: &str, form: &NoteForm) -> Result<NoteEditor> {
        let mut guard = self.editor.lock().await;
        match guard.as_mut() {
            Some(open) if open.paper_id() == paper_id => {
                form.apply(&mut open.draft);
                Ok(open.clone())
            }
            _ => Err(Error::NoEditorOpen),
        }
    }

    /// Apply form values and save immediately.
    pub async fn save(&self, paper_id: &str, form: &NoteForm) -> Result<NoteRecord> {
        let mut guard = self.editor.lock().await;
        match guard.as_mut() {
            Some(open) if open.paper_id() == paper_id => {
                form.apply(&mut open.draft);
                let record = open.commit(&self.store, Utc::now())?;
                info!(paper_id, "note saved");
                Ok(record)
            }
            _ => Err(Error::NoEditorOpen),
        }
    }

    /// Close the editor and stop autosaving. Unsaved draft changes since the
    /// last tick are discarded.
    pub async fn close(&self) {
        self.set_autosave(None);
        let closed = self.editor.lock().await.take();
        if let Some(editor) = closed {
            debug!(paper_id = editor.paper_id(), "note editor closed");
        }
    }

    /// Remove the stored note; closes the editor if it shows this paper.
    pub async fn delete(&self, paper_id: &str) -> Result<()> {
        let open_here = self
            .editor
            .lock()
            .await
            .as_ref()
            .is_some_and(|open| open.paper_id() == paper_id);
        if open_here {
            self.close().await;
        }
        self.store.remove(paper_id)
    }

    /// Markdown download of one note. An open editor for the paper takes
    /// `form` into its draft and is saved first, so the file reflects what
    /// the user sees.
    pub async fn export(
        &self,
        paper_id: &str,
        form: &NoteForm,
        heading: &PaperHeading,
    ) -> Result<Download> {
        {
            let mut guard = self.editor.lock().await;
            if let Some(open) = guard.as_mut().filter(|open| open.paper_id() == paper_id) {
                form.apply(&mut open.draft);
                open.commit(&self.store, Utc::now())?;
            }
        }
        let note = self.store.load(paper_id).unwrap_or_default();
        Ok(export_note(paper_id, heading, &note))
    }
}

// ============================================================================
// Text Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ============================================================================
// Markdown Rendering
// ============================================================================

pub fn render_markdown(content: &str) -> String {
    let parser = Parser::new(content);
    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    // Sanitize HTML to prevent XSS from raw HTML in markdown
    ammonia::clean(&html_output)
}
