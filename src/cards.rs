//! Card data store.
//!
//! Cards are read once from a rendered listing page (or a JSON dump of the
//! same `data-*` attributes) and never change afterwards. Each card carries
//! the precomputed attributes the filter engine reads plus, when its
//! embedded metadata parses, the full `PaperRecord` used by exports.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Card, PaperRecord};

// ============================================================================
// Raw Attributes
// ============================================================================

/// The per-card `data-*` attributes, as strings, before interpretation.
///
/// In JSON form the keys are the attribute names without the `data-` prefix.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawCard {
    pub paper_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub paper_data: Option<String>,
    #[serde(default)]
    pub search_text: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub categories: Option<String>,
    #[serde(default)]
    pub starred: Option<String>,
    #[serde(default)]
    pub has_code: Option<String>,
    #[serde(default, rename = "type")]
    pub paper_type: Option<String>,
    #[serde(default)]
    pub relevance: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
}

impl RawCard {
    fn set_attr(&mut self, name: &str, value: String) {
        match name {
            "data-paper-id" => self.paper_id = value,
            "data-paper-data" => self.paper_data = Some(value),
            "data-search-text" => self.search_text = Some(value),
            "data-year" => self.year = Some(value),
            "data-categories" => self.categories = Some(value),
            "data-starred" => self.starred = Some(value),
            "data-has-code" => self.has_code = Some(value),
            "data-type" => self.paper_type = Some(value),
            "data-relevance" => self.relevance = Some(value),
            "data-citation" => self.citation = Some(value),
            _ => {}
        }
    }

    /// Interpret the attributes. Embedded metadata that fails to parse is
    /// logged and left out; the card itself is always produced.
    pub fn into_card(self) -> Card {
        let paper = self.paper_data.as_deref().and_then(|data| {
            match serde_json::from_str::<PaperRecord>(data) {
                Ok(paper) => Some(paper.with_id(&self.paper_id)),
                Err(e) => {
                    warn!(paper_id = %self.paper_id, error = %e, "failed to parse paper data");
                    None
                }
            }
        });

        let title = self
            .title
            .filter(|t| !t.is_empty())
            .or_else(|| paper.as_ref().map(|p| p.title.clone()))
            .unwrap_or_default();

        Card {
            title,
            search_text: self.search_text.unwrap_or_default().to_lowercase(),
            year: parse_or(self.year.as_deref(), 0),
            categories: self
                .categories
                .as_deref()
                .map(split_categories)
                .unwrap_or_default(),
            starred: is_true(self.starred.as_deref()),
            has_code: is_true(self.has_code.as_deref()),
            paper_type: self.paper_type.filter(|t| !t.is_empty()),
            relevance: parse_or(self.relevance.as_deref(), 0.0),
            citations: parse_or(self.citation.as_deref(), 0),
            id: self.paper_id,
            paper,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn is_true(value: Option<&str>) -> bool {
    value == Some("true")
}

fn split_categories(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// HTML Scanning
// ============================================================================

/// An opening tag whose class list contains `class_name`. Quoted attribute
/// values may contain `>`.
fn opening_tag_with_class(class_name: &str) -> Regex {
    let pattern = format!(
        r#"(?is)<([a-z][a-z0-9]*)\b((?:[^>"']|"[^"]*"|'[^']*')*?\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'](?:[^>"']|"[^"]*"|'[^']*')*)>"#,
        regex::escape(class_name)
    );
    Regex::new(&pattern).expect("static card pattern")
}

static CARD_TAG: LazyLock<Regex> = LazyLock::new(|| opening_tag_with_class("paper-card"));
static TITLE_TAG: LazyLock<Regex> = LazyLock::new(|| opening_tag_with_class("paper-title"));
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("static attribute pattern")
});
static INNER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("static tag pattern"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos|nbsp);")
        .expect("static entity pattern")
});

/// Decode the HTML entities a static-site generator emits in attribute
/// values and text.
pub fn html_entity_decode(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
                }
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn card_title(segment: &str) -> Option<String> {
    let caps = TITLE_TAG.captures(segment)?;
    let tag = caps.get(1)?.as_str().to_ascii_lowercase();
    let open_end = caps.get(0)?.end();
    let rest = &segment[open_end..];
    let close = format!("</{}", tag);
    let inner = match rest.to_ascii_lowercase().find(&close) {
        Some(end) => &rest[..end],
        None => rest,
    };
    let text = html_entity_decode(&INNER_TAG.replace_all(inner, ""));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Extract every `.paper-card` from a rendered listing page, in document
/// order.
pub fn scan_cards(html: &str) -> Vec<RawCard> {
    let mut found: Vec<(usize, usize, RawCard)> = Vec::new();
    for caps in CARD_TAG.captures_iter(html) {
        let (Some(whole), Some(attrs)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let mut raw = RawCard::default();
        for attr in ATTR.captures_iter(attrs.as_str()) {
            let value = attr.get(2).or_else(|| attr.get(3)).map_or("", |m| m.as_str());
            raw.set_attr(&attr[1].to_ascii_lowercase(), html_entity_decode(value));
        }
        if !raw.paper_id.is_empty() {
            found.push((whole.start(), whole.end(), raw));
        }
    }

    let next_starts: Vec<usize> = found
        .iter()
        .skip(1)
        .map(|(start, _, _)| *start)
        .chain(std::iter::once(html.len()))
        .collect();

    found
        .into_iter()
        .zip(next_starts)
        .map(|((_, body_start, mut raw), segment_end)| {
            raw.title = card_title(&html[body_start..segment_end]);
            raw
        })
        .collect()
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CardStore {
    cards: Vec<Card>,
}

impl CardStore {
    pub fn new(raw: Vec<RawCard>) -> Self {
        Self {
            cards: raw.into_iter().map(RawCard::into_card).collect(),
        }
    }

    pub fn from_html(html: &str) -> Self {
        Self::new(scan_cards(html))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawCard> = serde_json::from_str(json)?;
        Ok(Self::new(raw))
    }

    /// Load from a listing page (`.html`/`.htm`) or a JSON card dump.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let store = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_html(&content)
        };
        info!(
            path = %path.display(),
            cards = store.len(),
            papers = store.papers().count(),
            "loaded cards"
        );
        Ok(store)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Records whose metadata parsed, in card order.
    pub fn papers(&self) -> impl Iterator<Item = &PaperRecord> {
        self.cards.iter().filter_map(|c| c.paper.as_ref())
    }

    pub fn paper(&self, id: &str) -> Option<&PaperRecord> {
        self.papers().find(|p| p.id == id)
    }
}
