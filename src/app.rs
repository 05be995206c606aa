//! Page state for the papers listing and its named transitions.
//!
//! Every filter transition re-runs the filter engine so `results` always
//! reflects `filters`.

use serde::Serialize;
use tracing::debug;

use crate::cards::CardStore;
use crate::error::Result;
use crate::export::{Download, ExportFormat};
use crate::filter::{recompute, FacetChoice, FilterState, QuickToggle, ResultsView, SortKey};
use crate::selection::SelectionState;

pub struct PapersApp {
    store: CardStore,
    filters: FilterState,
    results: ResultsView,
    selection: SelectionState,
}

/// JSON view of the page state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSnapshot {
    pub search: String,
    pub years: Vec<i64>,
    pub categories: Vec<String>,
    pub quick: Vec<&'static str>,
    pub all_years: bool,
    pub all_categories: bool,
    pub sort: String,
    pub total: usize,
    pub visible: Vec<String>,
    pub hidden: Vec<String>,
    pub selection_mode: bool,
    pub selected: Vec<String>,
}

impl PapersApp {
    pub fn new(store: CardStore) -> Self {
        let mut app = Self {
            results: ResultsView::unfiltered(store.len()),
            store,
            filters: FilterState::default(),
            selection: SelectionState::new(),
        };
        app.update_results();
        app
    }

    /// Start a page session, restoring a `#selected=` fragment if present.
    pub fn with_fragment(store: CardStore, fragment: Option<&str>) -> Self {
        let mut app = Self::new(store);
        if let Some(fragment) = fragment {
            app.load_selection(fragment);
        }
        app
    }

    pub fn store(&self) -> &CardStore {
        &self.store
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn results(&self) -> &ResultsView {
        &self.results
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    fn update_results(&mut self) {
        self.results = recompute(self.store.cards(), &self.results.order, &self.filters);
        debug!(
            visible = self.results.visible_count(),
            total = self.results.total(),
            "results updated"
        );
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    pub fn set_search(&mut self, query: &str) {
        self.filters.set_search(query);
        self.update_results();
    }

    pub fn clear_search(&mut self) {
        self.filters.clear_search();
        self.update_results();
    }

    pub fn toggle_year(&mut self, choice: FacetChoice<i64>) {
        self.filters.toggle_year(choice);
        self.update_results();
    }

    pub fn toggle_category(&mut self, choice: FacetChoice<String>) {
        self.filters.toggle_category(choice);
        self.update_results();
    }

    pub fn toggle_quick(&mut self, toggle: QuickToggle) {
        self.filters.toggle_quick(toggle);
        self.update_results();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filters.set_sort(sort);
        self.update_results();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
        self.update_results();
    }

    /// Distinct card years, newest first, for the year facet.
    pub fn years(&self) -> Vec<i64> {
        let mut years: Vec<i64> = self.store.cards().iter().map(|c| c.year).collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        years
    }

    /// Distinct card categories, alphabetical, for the category facet.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .store
            .cards()
            .iter()
            .flat_map(|c| c.categories.iter().cloned())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    // ------------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------------

    pub fn toggle_selection_mode(&mut self) -> bool {
        self.selection.toggle_mode()
    }

    /// Checkbox toggle for a card. Ids with no card are ignored.
    pub fn toggle_paper(&mut self, id: &str) -> Option<bool> {
        self.store.card(id)?;
        Some(self.selection.toggle(id))
    }

    pub fn select_all_visible(&mut self) {
        let ids: Vec<&str> = self.results.visible_ids(self.store.cards()).collect();
        self.selection.select_all(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn load_selection(&mut self, fragment: &str) -> usize {
        self.selection.load_fragment(fragment)
    }

    pub fn share_url(&self, page_url: &str) -> Result<String> {
        self.selection.share_url(page_url)
    }

    pub fn export(&self, format: ExportFormat) -> Result<Download> {
        format.export(&self.store, &self.selection)
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let cards = self.store.cards();
        let hidden = cards
            .iter()
            .enumerate()
            .filter(|(i, _)| self.results.is_hidden(*i))
            .map(|(_, c)| c.id.clone())
            .collect();
        AppSnapshot {
            search: self.filters.search.clone(),
            years: self.filters.years.iter().copied().collect(),
            categories: self.filters.categories.iter().cloned().collect(),
            quick: self.filters.quick.iter().map(QuickToggle::as_str).collect(),
            all_years: self.filters.all_years,
            all_categories: self.filters.all_categories,
            sort: self.filters.sort.as_str().to_string(),
            total: cards.len(),
            visible: self.results.visible_ids(cards).map(str::to_string).collect(),
            hidden,
            selection_mode: self.selection.mode(),
            selected: self.selection.ids().map(str::to_string).collect(),
        }
    }
}
