//! The papers listing: filter controls, the selection bar, and the cards.

use crate::app::PapersApp;
use crate::export::{BIBTEX_FILE, JSON_FILE, MARKDOWN_FILE};
use crate::filter::{FacetChoice, FacetState, QuickToggle, SortKey};
use crate::models::Card;
use crate::notes::{html_escape, NotesStore};
use crate::selection::FRAGMENT_PREFIX;
use crate::theme::ThemeMode;

use super::components::base_html;

// ============================================================================
// Filter Controls
// ============================================================================

fn facet_button(action: &str, value: &str, label: &str, state: FacetState) -> String {
    format!(
        r#"<form class="inline" action="{action}/{value}" method="post"><button type="submit" class="filter-tag" data-filter-value="{raw}" data-state="{state}">{label}</button></form>"#,
        action = action,
        value = urlencoding::encode(value),
        raw = html_escape(value),
        state = state.as_str(),
        label = html_escape(label),
    )
}

fn search_form(query: &str) -> String {
    let clear = if query.is_empty() {
        String::new()
    } else {
        r#"<form class="inline" action="/search/clear" method="post"><button type="submit" id="clear-search" title="Clear search">&times;</button></form>"#
            .to_string()
    };
    format!(
        r#"<form class="inline search-box" action="/search" method="post">
            <input type="search" id="search-input" name="q" placeholder="Search titles, authors, abstracts..." value="{}">
            <button type="submit">Search</button>
        </form>
        {}"#,
        html_escape(query),
        clear
    )
}

fn year_filters(app: &PapersApp) -> String {
    let filters = app.filters();
    let mut html = String::from(r#"<div class="filter-group" id="year-filters"><span class="label">Year</span>"#);
    html.push_str(&facet_button(
        "/filters/year",
        "all",
        "All years",
        filters.year_state(&FacetChoice::All),
    ));
    for year in app.years() {
        let label = year.to_string();
        let state = filters.year_state(&FacetChoice::Value(year));
        html.push_str(&facet_button("/filters/year", &label, &label, state));
    }
    html.push_str("</div>");
    html
}

fn category_filters(app: &PapersApp) -> String {
    let filters = app.filters();
    let mut html = String::from(r#"<div class="filter-group" id="category-filters"><span class="label">Category</span>"#);
    html.push_str(&facet_button(
        "/filters/category",
        "all",
        "All categories",
        filters.category_state(&FacetChoice::All),
    ));
    for category in app.categories() {
        let state = filters.category_state(&FacetChoice::Value(category.clone()));
        html.push_str(&facet_button("/filters/category", &category, &category, state));
    }
    html.push_str("</div>");
    html
}

fn quick_filters(app: &PapersApp) -> String {
    let mut html = String::from(r#"<div class="filter-group" id="quick-filters"><span class="label">Show</span>"#);
    for toggle in QuickToggle::ALL {
        html.push_str(&facet_button(
            "/filters/quick",
            toggle.as_str(),
            toggle.label(),
            app.filters().quick_state(toggle),
        ));
    }
    html.push_str("</div>");
    html
}

fn sort_form(current: &SortKey) -> String {
    let mut options = String::new();
    for key in SortKey::KNOWN.iter() {
        let selected = if key == current { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            key.as_str(),
            selected,
            key.label()
        ));
    }
    if let SortKey::Unknown(raw) = current {
        options.push_str(&format!(
            r#"<option value="{0}" selected>{0}</option>"#,
            html_escape(raw)
        ));
    }
    format!(
        r#"<form class="inline" action="/sort" method="post">
            <select id="sort-select" name="sort" onchange="this.form.submit()">{}</select>
            <noscript><button type="submit">Sort</button></noscript>
        </form>
        <form class="inline" action="/filters/reset" method="post"><button type="submit" id="reset-filters">Reset filters</button></form>"#,
        options
    )
}

// ============================================================================
// Selection Controls
// ============================================================================

fn selection_controls(app: &PapersApp) -> String {
    let mode = app.selection().mode();
    let mut html = format!(
        r#"<form class="inline" action="/selection/mode" method="post"><button type="submit" id="toggle-selection-mode" class="{class}">{label}</button></form>"#,
        class = if mode { "toggle-active" } else { "" },
        label = if mode { "✓ Selecting" } else { "☐ Select" },
    );
    if mode {
        html.push_str(
            r#"<form class="inline" action="/selection/visible" method="post"><button type="submit" id="select-all-visible">Select all visible</button></form>"#,
        );
    }
    html
}

fn selection_bar(app: &PapersApp) -> String {
    let Some(label) = app.selection().count_label() else {
        return String::new();
    };
    format!(
        r#"<div id="selection-bar">
            <span id="selection-count">{label}</span>
            <a href="/selection/share" id="share-selection">🔗 Share</a>
            <a href="/export/{bib}" id="export-bibtex">BibTeX</a>
            <a href="/export/{json}" id="export-json">JSON</a>
            <a href="/export/{md}" id="export-markdown">Markdown</a>
            <form class="inline" action="/selection/clear" method="post"><button type="submit" id="clear-selection">Clear</button></form>
        </div>"#,
        label = label,
        bib = BIBTEX_FILE,
        json = JSON_FILE,
        md = MARKDOWN_FILE,
    )
}

// ============================================================================
// Cards
// ============================================================================

fn card_meta(card: &Card) -> String {
    match &card.paper {
        Some(paper) => {
            let mut parts = Vec::new();
            if !paper.authors.is_empty() {
                parts.push(html_escape(&paper.authors.join(", ")));
            }
            if let Some(venue) = paper.venue.as_deref().filter(|v| !v.is_empty()) {
                parts.push(html_escape(venue));
            }
            if card.year != 0 {
                parts.push(card.year.to_string());
            }
            parts.join(" · ")
        }
        None if card.year != 0 => card.year.to_string(),
        None => String::new(),
    }
}

fn card_links(card: &Card) -> String {
    let Some(paper) = &card.paper else {
        return String::new();
    };
    let mut html = String::new();
    if let Some(url) = paper.paper_url() {
        html.push_str(&format!(
            r#"<a href="{}" target="_blank" rel="noopener">Paper</a>"#,
            html_escape(url)
        ));
    }
    if let Some(url) = paper.code_url() {
        html.push_str(&format!(
            r#"<a href="{}" target="_blank" rel="noopener">Code</a>"#,
            html_escape(url)
        ));
    }
    html
}

fn render_card(app: &PapersApp, notes: &NotesStore, index: usize, card: &Card) -> String {
    let selected = app.selection().contains(&card.id);
    let mut classes = vec!["paper-card"];
    if app.results().is_hidden(index) {
        classes.push("hidden");
    }
    if selected {
        classes.push("selected");
    }
    let encoded_id = urlencoding::encode(&card.id);

    let checkbox = if app.selection().mode() {
        format!(
            r#"<form class="paper-checkbox" action="/selection/toggle/{id}" method="post"><button type="submit" role="checkbox" aria-checked="{checked}" title="Select paper">{mark}</button></form>"#,
            id = encoded_id,
            checked = selected,
            mark = if selected { "☑" } else { "☐" },
        )
    } else {
        String::new()
    };

    let badge = notes.badge(&card.id);
    let status_badge = badge
        .status
        .map(|s| format!(r#"<span class="notes-badge" data-notes-badge>{}</span>"#, s))
        .unwrap_or_default();
    let rating_badge = badge
        .stars
        .map(|s| format!(r#"<span class="notes-rating" data-notes-rating>{}</span>"#, s))
        .unwrap_or_default();

    let categories: String = card
        .categories
        .iter()
        .map(|c| format!(r#"<span class="category">{}</span>"#, html_escape(c)))
        .collect();
    let star = if card.starred { "⭐ " } else { "" };

    format!(
        r#"<article class="{classes}" data-paper-id="{id}" data-year="{year}">
            {checkbox}
            <h3 class="paper-title">{star}{title}</h3>
            <div class="meta">{meta}</div>
            <div class="categories">{categories}</div>
            <div class="actions">
                <a class="paper-notes-btn" href="/notes/{encoded_id}">📝 Notes</a>
                {links}
                {status_badge}
                {rating_badge}
            </div>
        </article>"#,
        classes = classes.join(" "),
        id = html_escape(&card.id),
        year = card.year,
        title = html_escape(&card.title),
        meta = card_meta(card),
        links = card_links(card),
    )
}

// ============================================================================
// Pages
// ============================================================================

pub fn render_papers_page(app: &PapersApp, notes: &NotesStore, theme: ThemeMode) -> String {
    let results = app.results();
    let cards = app.store().cards();

    let mut container = String::new();
    for &index in &results.order {
        if let Some(card) = cards.get(index) {
            container.push_str(&render_card(app, notes, index, card));
        }
    }

    let no_results_style = if results.is_empty() { "" } else { r#" style="display:none""# };

    let content = format!(
        r#"{shared_link}
        <div id="papers-app">
            <h1>Papers</h1>
            <div class="toolbar">
                {search}
                <span class="spacer"></span>
                {sort}
                {selection_controls}
            </div>
            {years}
            {categories}
            {quick}
            <div id="results-count">{counter}</div>
            <div id="no-results"{no_results_style}>No papers match the current filters.</div>
            <div id="papers-container">
                {container}
            </div>
            {selection_bar}
        </div>"#,
        shared_link = shared_link_script(),
        search = search_form(&app.filters().search),
        sort = sort_form(&app.filters().sort),
        selection_controls = selection_controls(app),
        years = year_filters(app),
        categories = category_filters(app),
        quick = quick_filters(app),
        counter = results.counter_html(),
        selection_bar = selection_bar(app),
    );

    base_html("Papers", &content, Some(theme))
}

/// Browsers keep `#selected=…` to themselves, so the page re-requests itself
/// with the fragment as its query string.
fn shared_link_script() -> String {
    format!(
        r#"<script>
            if (location.hash.startsWith('#{prefix}')) {{
                location.replace(location.pathname + '?' + location.hash.slice(1));
            }}
        </script>"#,
        prefix = FRAGMENT_PREFIX,
    )
}

/// Share link for the current selection, ready to copy.
pub fn render_share_page(url: &str, count: usize, theme: ThemeMode) -> String {
    let content = format!(
        r#"<h1>Share selection</h1>
        <p>Link to {count} selected paper{plural}:</p>
        <input type="text" id="share-link-input" class="share-link" readonly value="{url}" onclick="this.select()">
        <p><button type="button" onclick="navigator.clipboard.writeText(document.getElementById('share-link-input').value).then(() => this.textContent = 'Copied!')">Copy link</button>
        <a href="/">Back to papers</a></p>"#,
        count = count,
        plural = if count == 1 { "" } else { "s" },
        url = html_escape(url),
    );
    base_html("Share selection", &content, Some(theme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardStore, RawCard};
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn app() -> PapersApp {
        PapersApp::new(CardStore::new(vec![
            RawCard {
                paper_id: "p1".into(),
                title: Some("Graph <Nets>".into()),
                year: Some("2023".into()),
                categories: Some("gnn".into()),
                ..Default::default()
            },
            RawCard {
                paper_id: "p2".into(),
                title: Some("Transformers".into()),
                year: Some("2021".into()),
                categories: Some("nlp".into()),
                ..Default::default()
            },
        ]))
    }

    fn notes() -> NotesStore {
        NotesStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_page_lists_cards_and_counter() {
        let html = render_papers_page(&app(), &notes(), ThemeMode::Auto);
        assert!(html.contains(r#"data-paper-id="p1""#));
        assert!(html.contains("Graph &lt;Nets&gt;"));
        assert!(html.contains("Showing <strong>2</strong> papers"));
        assert!(!html.contains(r#"id="selection-bar""#));
    }

    #[test]
    fn test_hidden_cards_and_active_facets() {
        let mut app = app();
        app.toggle_year(FacetChoice::Value(2021));
        let html = render_papers_page(&app, &notes(), ThemeMode::Dark);
        assert!(html.contains(r#"class="paper-card hidden" data-paper-id="p1""#));
        assert!(html.contains(r#"data-filter-value="2021" data-state="active""#));
        assert!(html.contains(r#"data-filter-value="all" data-state="inactive""#));
        assert!(html.contains("papers-theme-dark"));
    }

    #[test]
    fn test_selection_bar_appears_with_selection() {
        let mut app = app();
        app.toggle_selection_mode();
        app.toggle_paper("p2");
        let html = render_papers_page(&app, &notes(), ThemeMode::Auto);
        assert!(html.contains("1 paper selected"));
        assert!(html.contains(r#"class="paper-card selected""#));
        assert!(html.contains(r#"action="/selection/toggle/p2""#));
    }

    #[test]
    fn test_empty_state_indicator() {
        let mut app = app();
        app.set_search("nothing matches this");
        let html = render_papers_page(&app, &notes(), ThemeMode::Auto);
        assert!(html.contains(r#"<div id="no-results">"#));
        assert!(html.contains("Showing <strong>0</strong> papers"));
    }

    #[test]
    fn test_page_follows_selected_fragment() {
        let html = render_papers_page(&app(), &notes(), ThemeMode::Auto);
        assert!(html.contains("location.hash.startsWith('#selected=')"));
        assert!(html.contains("location.replace(location.pathname + '?' + location.hash.slice(1))"));
    }
}
