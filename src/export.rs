//! Generated downloads: selection exports and single-note markdown.

use crate::cards::CardStore;
use crate::error::{Error, Result};
use crate::models::{NoteRecord, PaperRecord};
use crate::selection::SelectionState;

/// A file handed to the user agent as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime: &'static str,
    pub content: String,
}

impl Download {
    fn new(filename: impl Into<String>, mime: &'static str, content: String) -> Self {
        Self {
            filename: filename.into(),
            mime,
            content,
        }
    }
}

pub const BIBTEX_FILE: &str = "papers.bib";
pub const JSON_FILE: &str = "papers.json";
pub const MARKDOWN_FILE: &str = "papers.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Bibtex,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn from_filename(name: &str) -> Option<Self> {
        match name {
            BIBTEX_FILE => Some(ExportFormat::Bibtex),
            JSON_FILE => Some(ExportFormat::Json),
            MARKDOWN_FILE => Some(ExportFormat::Markdown),
            _ => None,
        }
    }

    pub fn export(self, store: &CardStore, selection: &SelectionState) -> Result<Download> {
        match self {
            ExportFormat::Bibtex => export_bibtex(store, selection),
            ExportFormat::Json => export_json(store, selection),
            ExportFormat::Markdown => export_markdown(store, selection),
        }
    }
}

/// Selected records in id order, skipping ids with no record.
fn selected_papers<'a>(
    store: &'a CardStore,
    selection: &'a SelectionState,
) -> Result<impl Iterator<Item = &'a PaperRecord> + 'a> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(selection.ids().filter_map(|id| store.paper(id)))
}

// ============================================================================
// BibTeX
// ============================================================================

/// `<surname of the first author><year>`, `Unknown` standing in for a
/// missing author.
pub fn cite_key(paper: &PaperRecord) -> String {
    let surname = paper
        .authors
        .first()
        .and_then(|a| a.split_whitespace().last())
        .unwrap_or("Unknown");
    format!("{}{}", surname, paper.year)
}

pub fn bibtex_entry(paper: &PaperRecord) -> String {
    let mut bib = format!("@article{{{},\n", cite_key(paper));
    bib.push_str(&format!("  title={{{}}},\n", paper.title));
    bib.push_str(&format!("  author={{{}}},\n", paper.authors.join(" and ")));
    bib.push_str(&format!("  year={{{}}},\n", paper.year));
    if let Some(venue) = paper.venue.as_deref().filter(|v| !v.is_empty()) {
        bib.push_str(&format!("  journal={{{}}},\n", venue));
    }
    if let Some(arxiv) = paper.arxiv_id.as_deref().filter(|a| !a.is_empty()) {
        bib.push_str(&format!("  eprint={{{}}},\n", arxiv));
    }
    if let Some(url) = paper.paper_url().filter(|u| !u.is_empty()) {
        bib.push_str(&format!("  url={{{}}},\n", url));
    }
    bib.push_str("}\n\n");
    bib
}

pub fn export_bibtex(store: &CardStore, selection: &SelectionState) -> Result<Download> {
    let bib: String = selected_papers(store, selection)?.map(bibtex_entry).collect();
    Ok(Download::new(BIBTEX_FILE, "text/plain", bib))
}

// ============================================================================
// JSON
// ============================================================================

/// Full selected records, pretty-printed, in card order.
pub fn export_json(store: &CardStore, selection: &SelectionState) -> Result<Download> {
    if selection.is_empty() {
        return Err(Error::EmptySelection);
    }
    let selected: Vec<&PaperRecord> = store
        .papers()
        .filter(|p| selection.contains(&p.id))
        .collect();
    let json = serde_json::to_string_pretty(&selected)?;
    Ok(Download::new(JSON_FILE, "application/json", json))
}

// ============================================================================
// Markdown
// ============================================================================

fn markdown_entry(paper: &PaperRecord) -> String {
    let mut md = format!("## {}\n\n", paper.title);
    md.push_str(&format!("**Authors:** {}\n\n", paper.authors.join(", ")));
    md.push_str(&format!("**Year:** {}\n\n", paper.year));
    if let Some(venue) = paper.venue.as_deref().filter(|v| !v.is_empty()) {
        md.push_str(&format!("**Venue:** {}\n\n", venue));
    }
    if let Some(abstract_text) = paper.abstract_text.as_deref().filter(|a| !a.is_empty()) {
        md.push_str(&format!("**Abstract:** {}\n\n", abstract_text));
    }
    if let Some(url) = paper.paper_url().filter(|u| !u.is_empty()) {
        md.push_str(&format!("**Paper:** [{}]({})\n\n", url, url));
    }
    if let Some(url) = paper.code_url().filter(|u| !u.is_empty()) {
        md.push_str(&format!("**Code:** [{}]({})\n\n", url, url));
    }
    md.push_str("---\n\n");
    md
}

pub fn export_markdown(store: &CardStore, selection: &SelectionState) -> Result<Download> {
    let mut md = String::from("# Selected Papers\n\n");
    for paper in selected_papers(store, selection)? {
        md.push_str(&markdown_entry(paper));
    }
    Ok(Download::new(MARKDOWN_FILE, "text/markdown", md))
}

// ============================================================================
// Single Note
// ============================================================================

/// What the note export knows about the paper, from its card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaperHeading {
    pub title: String,
    pub venue: String,
    pub year: String,
}

impl PaperHeading {
    pub fn from_store(store: &CardStore, paper_id: &str) -> Self {
        if let Some(paper) = store.paper(paper_id) {
            return Self {
                title: paper.title.clone(),
                venue: paper.venue.clone().unwrap_or_default(),
                year: paper.year.clone(),
            };
        }
        match store.card(paper_id) {
            Some(card) => Self {
                title: card.title.clone(),
                venue: String::new(),
                year: if card.year != 0 { card.year.to_string() } else { String::new() },
            },
            None => Self::default(),
        }
    }

    /// `venue · year`, skipping blanks.
    pub fn subtitle(&self) -> String {
        [self.venue.as_str(), self.year.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · ")
    }
}

pub fn note_filename(paper_id: &str) -> String {
    format!("notes-{}.md", paper_id)
}

fn section(md: &mut String, heading: &str, body: &str) {
    md.push_str(&format!("## {}\n\n", heading));
    if body.trim().is_empty() {
        md.push_str("_(empty)_\n\n");
    } else {
        md.push_str(body.trim_end());
        md.push_str("\n\n");
    }
}

pub fn note_markdown(paper_id: &str, heading: &PaperHeading, note: &NoteRecord) -> String {
    let title = if heading.title.is_empty() {
        paper_id
    } else {
        heading.title.as_str()
    };
    let mut md = format!("# {}\n\n", title);

    md.push_str(&format!("- **Paper ID:** {}\n", paper_id));
    let subtitle = heading.subtitle();
    if !subtitle.is_empty() {
        md.push_str(&format!("- **Published:** {}\n", subtitle));
    }
    md.push_str(&format!("- **Status:** {}\n", note.status.label()));
    if let Some(priority) = note.priority.as_deref().filter(|p| !p.is_empty()) {
        md.push_str(&format!("- **Priority:** {}\n", priority));
    }
    md.push_str(&format!("- **Progress:** {}%\n", note.progress));
    if note.rating > 0 {
        md.push_str(&format!("- **Rating:** {} ({}/5)\n", note.stars(), note.rating));
    }
    if !note.tags.is_empty() {
        md.push_str(&format!("- **Tags:** {}\n", note.tags.join(", ")));
    }
    if let Some(created) = note.created_at {
        md.push_str(&format!("- **Created:** {}\n", created.to_rfc3339()));
    }
    if let Some(updated) = note.updated_at {
        md.push_str(&format!("- **Updated:** {}\n", updated.to_rfc3339()));
    }
    md.push('\n');

    section(&mut md, "Notes", &note.text);
    section(&mut md, "Summary", &note.summary);
    section(&mut md, "To-do", &note.todo);
    section(&mut md, "Highlights", &note.highlights);
    md
}

pub fn export_note(paper_id: &str, heading: &PaperHeading, note: &NoteRecord) -> Download {
    Download::new(
        note_filename(paper_id),
        "text/markdown",
        note_markdown(paper_id, heading, note),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::RawCard;
    use crate::models::ReadingStatus;

    fn raw(id: &str, data: &str) -> RawCard {
        RawCard {
            paper_id: id.to_string(),
            paper_data: Some(data.to_string()),
            ..Default::default()
        }
    }

    fn store() -> CardStore {
        CardStore::new(vec![
            raw(
                "p2",
                r#"{"title":"Second","authors":["Grace Hopper","Alan Turing"],"year":1950,
                    "venue":"Mind","arxiv_id":"1234.5678","links":{"paper":"https://x/p2","code":"https://gh/p2"},
                    "abstract":"About machines."}"#,
            ),
            raw("p1", r#"{"title":"First","authors":[],"year":2020}"#),
            raw("broken", "{"),
        ])
    }

    fn select(ids: &[&str]) -> SelectionState {
        let mut sel = SelectionState::new();
        sel.select_all(ids.iter().copied());
        sel
    }

    #[test]
    fn test_empty_selection_exports_nothing() {
        let store = store();
        let sel = SelectionState::new();
        for format in [ExportFormat::Bibtex, ExportFormat::Json, ExportFormat::Markdown] {
            assert!(matches!(format.export(&store, &sel), Err(Error::EmptySelection)));
        }
    }

    #[test]
    fn test_bibtex_entries() {
        let dl = export_bibtex(&store(), &select(&["p2", "p1", "gone"])).unwrap();
        assert_eq!(dl.filename, "papers.bib");
        assert_eq!(dl.mime, "text/plain");
        let expected = "@article{Unknown2020,\n  title={First},\n  author={},\n  year={2020},\n}\n\n\
@article{Hopper1950,\n  title={Second},\n  author={Grace Hopper and Alan Turing},\n  year={1950},\n  journal={Mind},\n  eprint={1234.5678},\n  url={https://x/p2},\n}\n\n";
        assert_eq!(dl.content, expected);
    }

    #[test]
    fn test_json_keeps_card_order() {
        let dl = export_json(&store(), &select(&["p1", "p2", "broken"])).unwrap();
        assert_eq!(dl.mime, "application/json");
        let value: serde_json::Value = serde_json::from_str(&dl.content).unwrap();
        let ids: Vec<_> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
        assert!(dl.content.starts_with("[\n  {"));
    }

    #[test]
    fn test_markdown_export() {
        let dl = export_markdown(&store(), &select(&["p2"])).unwrap();
        assert_eq!(dl.filename, "papers.md");
        assert_eq!(
            dl.content,
            "# Selected Papers\n\n## Second\n\n**Authors:** Grace Hopper, Alan Turing\n\n**Year:** 1950\n\n\
**Venue:** Mind\n\n**Abstract:** About machines.\n\n**Paper:** [https://x/p2](https://x/p2)\n\n\
**Code:** [https://gh/p2](https://gh/p2)\n\n---\n\n"
        );
    }

    #[test]
    fn test_loose_metadata_is_exported() {
        let store = CardStore::new(vec![raw(
            "loose",
            r#"{"title":"T","authors":["Ada Lovelace"],"venue":7,"year":"1843"}"#,
        )]);
        let sel = select(&["loose"]);

        let json = export_json(&store, &sel).unwrap().content;
        assert_eq!(
            json,
            "[\n  {\n    \"title\": \"T\",\n    \"authors\": [\n      \"Ada Lovelace\"\n    ],\n    \"venue\": 7,\n    \"year\": \"1843\",\n    \"id\": \"loose\"\n  }\n]"
        );

        let bib = export_bibtex(&store, &sel).unwrap().content;
        assert!(bib.starts_with("@article{Lovelace1843,\n"));
        assert!(bib.contains("  journal={7},\n"));
    }

    #[test]
    fn test_only_stale_ids_still_yields_file() {
        let dl = export_markdown(&store(), &select(&["gone"])).unwrap();
        assert_eq!(dl.content, "# Selected Papers\n\n");
    }

    #[test]
    fn test_note_markdown_sections() {
        let heading = PaperHeading::from_store(&store(), "p2");
        assert_eq!(heading.subtitle(), "Mind · 1950");
        let note = NoteRecord {
            status: ReadingStatus::Reading,
            rating: 4,
            progress: 40,
            tags: vec!["ai".into(), "classic".into()],
            text: "Body".into(),
            todo: "- [ ] reread".into(),
            ..Default::default()
        };
        let dl = export_note("p2", &heading, &note);
        assert_eq!(dl.filename, "notes-p2.md");
        let md = dl.content;
        assert!(md.starts_with("# Second\n\n- **Paper ID:** p2\n- **Published:** Mind · 1950\n"));
        assert!(md.contains("- **Status:** 📖 Reading\n"));
        assert!(md.contains("- **Rating:** ★★★★☆ (4/5)\n"));
        assert!(md.contains("- **Tags:** ai, classic\n"));
        assert!(md.contains("## Notes\n\nBody\n\n"));
        assert!(md.contains("## Summary\n\n_(empty)_\n\n"));
        assert!(md.contains("## To-do\n\n- [ ] reread\n\n"));
    }

    #[test]
    fn test_heading_for_unknown_paper_falls_back_to_id() {
        let heading = PaperHeading::from_store(&store(), "nope");
        let md = note_markdown("nope", &heading, &NoteRecord::default());
        assert!(md.starts_with("# nope\n"));
        assert!(!md.contains("Published"));
    }
}
