//! Data models for the papers listing.
//!
//! Paper records and cards are read-only once loaded. Note records are the
//! only values that get written back, through the notes store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Paper Records
// ============================================================================

/// Metadata embedded in a card's `data-paper-data` attribute.
///
/// Any JSON object is accepted. The typed fields are read leniently for the
/// BibTeX and Markdown exports, while `raw` keeps the object exactly as
/// embedded (plus the card id) for the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    /// As written in the metadata; empty when absent.
    pub year: String,
    pub venue: Option<String>,
    pub abstract_text: Option<String>,
    pub arxiv_id: Option<String>,
    pub links: PaperLinks,
    raw: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaperLinks {
    pub paper: Option<String>,
    pub code: Option<String>,
}

impl PaperRecord {
    /// Stamp the owning card's id, overriding any embedded one.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self.raw.insert("id".to_string(), Value::from(id));
        self
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn paper_url(&self) -> Option<&str> {
        self.links.paper.as_deref()
    }

    pub fn code_url(&self) -> Option<&str> {
        self.links.code.as_deref()
    }
}

/// Strings as-is, numbers in their JSON form; anything else is absent.
fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        }),
        _ => None,
    }
}

impl From<Map<String, Value>> for PaperRecord {
    fn from(raw: Map<String, Value>) -> Self {
        let authors = match raw.get("authors") {
            Some(Value::Array(items)) => items.iter().filter_map(|a| scalar_text(Some(a))).collect(),
            Some(single @ Value::String(_)) => scalar_text(Some(single)).into_iter().collect(),
            _ => Vec::new(),
        };
        let links = raw.get("links").map_or_else(PaperLinks::default, |links| PaperLinks {
            paper: scalar_text(links.get("paper")),
            code: scalar_text(links.get("code")),
        });
        Self {
            id: scalar_text(raw.get("id")).unwrap_or_default(),
            title: scalar_text(raw.get("title")).unwrap_or_default(),
            authors,
            year: scalar_text(raw.get("year")).unwrap_or_default(),
            venue: scalar_text(raw.get("venue")),
            abstract_text: scalar_text(raw.get("abstract")),
            arxiv_id: scalar_text(raw.get("arxiv_id")),
            links,
            raw,
        }
    }
}

impl From<PaperRecord> for Map<String, Value> {
    fn from(paper: PaperRecord) -> Self {
        paper.raw
    }
}

// ============================================================================
// Cards
// ============================================================================

/// One rendered card: the derived filter attributes plus the parsed record.
///
/// `paper` is `None` when the embedded metadata failed to parse; such a card
/// still filters and sorts but never shows up in exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub search_text: String,
    pub year: i64,
    pub categories: Vec<String>,
    pub starred: bool,
    pub has_code: bool,
    pub paper_type: Option<String>,
    pub relevance: f64,
    pub citations: i64,
    pub paper: Option<PaperRecord>,
}

impl AsRef<Card> for Card {
    fn as_ref(&self) -> &Card {
        self
    }
}

// ============================================================================
// Notes
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Completed,
    Skipped,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 4] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Completed,
        ReadingStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to-read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
            ReadingStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    /// Badge text shown on a card.
    pub fn label(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "📌 To read",
            ReadingStatus::Reading => "📖 Reading",
            ReadingStatus::Completed => "✅ Done",
            ReadingStatus::Skipped => "⏭ Skipped",
        }
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const MAX_RATING: u8 = 5;
pub const MAX_PROGRESS: u8 = 100;

/// Per-paper notes, stored as camelCase JSON under `paperNotes:<id>`.
///
/// Every field defaults so that records written by older versions of the
/// page (status, rating and text only) still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(default)]
    pub status: ReadingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient::progress")]
    pub progress: u8,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub todo: String,
    #[serde(default)]
    pub highlights: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NoteRecord {
    /// Star glyphs for the card badge; empty when unrated.
    pub fn stars(&self) -> String {
        render_stars(self.rating)
    }
}

pub fn render_stars(rating: u8) -> String {
    if rating == 0 {
        return String::new();
    }
    let r = rating.min(MAX_RATING) as usize;
    format!("{}{}", "★".repeat(r), "☆".repeat(MAX_RATING as usize - r))
}

// ============================================================================
// Lenient number parsing
// ============================================================================

/// Numbers in legacy notes are sometimes strings (`"4"`, `""`).
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrString {
        Int(i64),
        Float(f64),
        Str(String),
    }

    fn to_i64(v: Option<NumOrString>) -> Option<i64> {
        match v? {
            NumOrString::Int(i) => Some(i),
            NumOrString::Float(f) if f.is_finite() => Some(f as i64),
            NumOrString::Float(_) => None,
            NumOrString::Str(s) => s.trim().parse().ok(),
        }
    }

    pub fn rating<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let v = Option::<NumOrString>::deserialize(d)?;
        Ok(to_i64(v).unwrap_or(0).clamp(0, MAX_RATING as i64) as u8)
    }

    pub fn progress<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let v = Option::<NumOrString>::deserialize(d)?;
        Ok(to_i64(v).unwrap_or(0).clamp(0, MAX_PROGRESS as i64) as u8)
    }
}
