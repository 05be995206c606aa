//! The per-paper notes editor.
//!
//! A plain form posting to `/notes/{id}`. While the page is open a small
//! script pushes the field values to `/notes/{id}/draft` so the server side
//! autosave sees the latest draft.

use crate::export::PaperHeading;
use crate::models::{ReadingStatus, MAX_PROGRESS, MAX_RATING};
use crate::notes::{html_escape, render_markdown, NoteEditor, AUTOSAVE_INTERVAL};
use crate::theme::ThemeMode;

use super::components::base_html;

const PRIORITIES: [(&str, &str); 4] = [
    ("", "None"),
    ("low", "Low"),
    ("medium", "Medium"),
    ("high", "High"),
];

fn status_options(current: ReadingStatus) -> String {
    ReadingStatus::ALL
        .iter()
        .map(|status| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                status.as_str(),
                if *status == current { " selected" } else { "" },
                status.label()
            )
        })
        .collect()
}

fn priority_options(current: &str) -> String {
    let mut html: String = PRIORITIES
        .iter()
        .map(|(value, label)| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                value,
                if *value == current { " selected" } else { "" },
                label
            )
        })
        .collect();
    // Priorities written by other tools stay selectable.
    if !PRIORITIES.iter().any(|(value, _)| *value == current) {
        html.push_str(&format!(
            r#"<option value="{0}" selected>{0}</option>"#,
            html_escape(current)
        ));
    }
    html
}

fn rating_options(current: u8) -> String {
    (0..=MAX_RATING)
        .map(|n| {
            let label = if n == 0 {
                "Unrated".to_string()
            } else {
                "★".repeat(n as usize)
            };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                n,
                if n == current { " selected" } else { "" },
                label
            )
        })
        .collect()
}

fn textarea(name: &str, id: &str, label: &str, value: &str) -> String {
    format!(
        r#"<div><label for="{id}">{label}</label><textarea id="{id}" name="{name}">{value}</textarea></div>"#,
        id = id,
        name = name,
        label = label,
        value = html_escape(value),
    )
}

pub fn render_note_editor(editor: &NoteEditor, heading: &PaperHeading, theme: ThemeMode) -> String {
    let paper_id = editor.paper_id();
    let draft = &editor.draft;
    let action = format!("/notes/{}", urlencoding::encode(paper_id));
    let title = if heading.title.is_empty() {
        paper_id
    } else {
        heading.title.as_str()
    };
    let saved = editor.last_saved_label().unwrap_or_default();
    let preview = if draft.body().trim().is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="notes-preview"><h3>Preview</h3>{}</div>"#,
            render_markdown(draft.body())
        )
    };

    let content = format!(
        r##"<div id="paper-notes-modal" data-paper-id="{id}">
            <h1 id="paper-notes-title">📝 Notes: {title}</h1>
            <div class="meta" id="paper-notes-subtitle">{subtitle}</div>
            <form id="paper-notes-form" class="notes-form" action="{action}" method="post">
                <div class="row">
                    <div><label for="paper-notes-status">Status</label>
                        <select id="paper-notes-status" name="status">{status}</select></div>
                    <div><label for="paper-notes-priority">Priority</label>
                        <select id="paper-notes-priority" name="priority">{priority}</select></div>
                    <div><label for="paper-notes-progress">Progress (%)</label>
                        <input type="number" id="paper-notes-progress" name="progress" min="0" max="{max_progress}" value="{progress}"></div>
                    <div><label for="paper-notes-rating">Rating</label>
                        <select id="paper-notes-rating" name="rating">{rating}</select></div>
                </div>
                <div><label for="paper-notes-tags">Tags (comma separated)</label>
                    <input type="text" id="paper-notes-tags" name="tags" value="{tags}"></div>
                {text}
                {summary}
                {todo}
                {highlights}
                <div class="row">
                    <button type="submit" id="paper-notes-save">Save</button>
                    <button type="submit" formaction="{action}/export" id="paper-notes-export">Export markdown</button>
                    <span id="paper-notes-saved">{saved}</span>
                </div>
            </form>
            <div class="row">
                <form class="inline" action="{action}/delete" method="post" onsubmit="return confirm('Delete these notes?')">
                    <button type="submit" id="paper-notes-delete">Delete notes</button>
                </form>
                <form class="inline" action="{action}/close" method="post">
                    <button type="submit" data-notes-close>Close</button>
                </form>
            </div>
            {preview}
        </div>
        <script>
        (function() {{
            const form = document.getElementById('paper-notes-form');
            const saved = document.getElementById('paper-notes-saved');
            setInterval(async () => {{
                const body = new URLSearchParams(new FormData(form));
                try {{
                    const response = await fetch('{action}/draft', {{ method: 'POST', body: body }});
                    if (response.ok) {{
                        const data = await response.json();
                        if (data.last_saved) saved.textContent = data.last_saved;
                    }}
                }} catch (e) {{
                    console.error('Draft sync failed:', e);
                }}
            }}, {interval_ms});
        }})();
        </script>"##,
        id = html_escape(paper_id),
        title = html_escape(title),
        subtitle = html_escape(&heading.subtitle()),
        action = action,
        status = status_options(draft.status),
        priority = priority_options(&draft.priority),
        max_progress = MAX_PROGRESS,
        progress = draft.progress,
        rating = rating_options(draft.rating),
        tags = html_escape(&draft.tags.join(", ")),
        text = textarea("text", "paper-notes-text", "Notes (markdown)", draft.body()),
        summary = textarea("summary", "paper-notes-summary", "Summary", &draft.summary),
        todo = textarea("todo", "paper-notes-todo", "To do", &draft.todo),
        highlights = textarea("highlights", "paper-notes-highlights", "Highlights", &draft.highlights),
        saved = html_escape(&saved),
        preview = preview,
        interval_ms = AUTOSAVE_INTERVAL.as_millis(),
    );

    base_html(&format!("Notes: {}", title), &content, Some(theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::NotesStore;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn editor() -> NoteEditor {
        let notes = NotesStore::new(Arc::new(MemoryStorage::new()));
        NoteEditor::open(&notes, "p 1")
    }

    #[test]
    fn test_title_falls_back_to_paper_id() {
        let html = render_note_editor(&editor(), &PaperHeading::default(), ThemeMode::Auto);
        assert!(html.contains("📝 Notes: p 1"));
        assert!(html.contains(r#"action="/notes/p%201""#));
    }

    #[test]
    fn test_fields_reflect_draft() {
        let mut editor = editor();
        editor.draft.status = ReadingStatus::Reading;
        editor.draft.rating = 3;
        editor.draft.tags = vec!["gnn".into(), "survey".into()];
        editor.draft.text = "**key** idea".into();
        let heading = PaperHeading {
            title: "Graph Nets".into(),
            venue: "NeurIPS".into(),
            year: "2023".into(),
        };
        let html = render_note_editor(&editor, &heading, ThemeMode::Auto);
        assert!(html.contains(r#"<option value="reading" selected>"#));
        assert!(html.contains(r#"<option value="3" selected>★★★</option>"#));
        assert!(html.contains(r#"value="gnn, survey""#));
        assert!(html.contains("NeurIPS · 2023"));
        assert!(html.contains("<strong>key</strong>"));
    }

    #[test]
    fn test_unknown_priority_kept() {
        assert!(priority_options("urgent").contains(r#"<option value="urgent" selected>"#));
        assert!(priority_options("high").contains(r#"<option value="high" selected>"#));
    }

    #[test]
    fn test_export_submits_the_form() {
        let html = render_note_editor(&editor(), &PaperHeading::default(), ThemeMode::Auto);
        assert!(html.contains(
            r#"<button type="submit" formaction="/notes/p%201/export" id="paper-notes-export">"#
        ));
        assert!(!html.contains(r#"href="/notes/p%201/export""#));
    }
}
