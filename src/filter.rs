//! Filter engine: search, year/category facets, quick toggles and sorting.
//!
//! `evaluate` and `sort_cards` are pure. `recompute` applies both to the
//! whole card list and produces the next `ResultsView`; hidden cards are
//! flagged, never dropped.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::Card;

/// Value of `data-type` that the `foundation` quick toggle selects.
pub const FOUNDATION_TYPE: &str = "Foundation";

// ============================================================================
// Sort Keys
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    DateDesc,
    DateAsc,
    RelevanceDesc,
    TitleAsc,
    CitationDesc,
    /// Anything else the sort control sends. Sorting by it keeps the
    /// current order.
    Unknown(String),
}

impl SortKey {
    pub const KNOWN: [SortKey; 5] = [
        SortKey::DateDesc,
        SortKey::DateAsc,
        SortKey::RelevanceDesc,
        SortKey::TitleAsc,
        SortKey::CitationDesc,
    ];

    pub fn parse(s: &str) -> Self {
        match s {
            "date-desc" => SortKey::DateDesc,
            "date-asc" => SortKey::DateAsc,
            "relevance-desc" => SortKey::RelevanceDesc,
            "title-asc" => SortKey::TitleAsc,
            "citation-desc" => SortKey::CitationDesc,
            other => SortKey::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SortKey::DateDesc => "date-desc",
            SortKey::DateAsc => "date-asc",
            SortKey::RelevanceDesc => "relevance-desc",
            SortKey::TitleAsc => "title-asc",
            SortKey::CitationDesc => "citation-desc",
            SortKey::Unknown(raw) => raw,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SortKey::DateDesc => "Newest first",
            SortKey::DateAsc => "Oldest first",
            SortKey::RelevanceDesc => "Most relevant",
            SortKey::TitleAsc => "Title (A-Z)",
            SortKey::CitationDesc => "Most cited",
            SortKey::Unknown(raw) => raw,
        }
    }
}

// ============================================================================
// Quick Toggles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuickToggle {
    Starred,
    HasCode,
    Foundation,
}

impl QuickToggle {
    pub const ALL: [QuickToggle; 3] = [
        QuickToggle::Starred,
        QuickToggle::HasCode,
        QuickToggle::Foundation,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuickToggle::Starred => "starred",
            QuickToggle::HasCode => "has-code",
            QuickToggle::Foundation => "foundation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuickToggle::Starred => "⭐ Starred",
            QuickToggle::HasCode => "💻 Has code",
            QuickToggle::Foundation => "🏛 Foundational",
        }
    }

    fn matches(&self, card: &Card) -> bool {
        match self {
            QuickToggle::Starred => card.starred,
            QuickToggle::HasCode => card.has_code,
            QuickToggle::Foundation => card.paper_type.as_deref() == Some(FOUNDATION_TYPE),
        }
    }
}

// ============================================================================
// Filter State
// ============================================================================

/// A click on a facet button: the "all" sentinel or one specific value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetChoice<T> {
    All,
    Value(T),
}

impl<T: std::str::FromStr> FacetChoice<T> {
    /// `all` (or `all-years` / `all-categories`) is the sentinel. Values
    /// that do not parse yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" | "all-years" | "all-categories" => Some(FacetChoice::All),
            other => other.parse().ok().map(FacetChoice::Value),
        }
    }
}

/// Visual state of a filter button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetState {
    Active,
    Inactive,
}

impl FacetState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetState::Active => "active",
            FacetState::Inactive => "inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        *self == FacetState::Active
    }
}

impl From<bool> for FacetState {
    fn from(active: bool) -> Self {
        if active {
            FacetState::Active
        } else {
            FacetState::Inactive
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// Lowercased search query.
    pub search: String,
    pub years: BTreeSet<i64>,
    pub categories: BTreeSet<String>,
    pub quick: BTreeSet<QuickToggle>,
    pub all_years: bool,
    pub all_categories: bool,
    pub sort: SortKey,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            years: BTreeSet::new(),
            categories: BTreeSet::new(),
            quick: BTreeSet::new(),
            all_years: true,
            all_categories: true,
            sort: SortKey::default(),
        }
    }
}

fn toggle_facet<T: Ord>(set: &mut BTreeSet<T>, all: &mut bool, choice: FacetChoice<T>) {
    match choice {
        FacetChoice::All => {
            set.clear();
            *all = true;
        }
        FacetChoice::Value(value) => {
            if !set.remove(&value) {
                set.insert(value);
            }
            *all = set.is_empty();
        }
    }
}

impl FilterState {
    pub fn set_search(&mut self, raw: &str) {
        self.search = raw.to_lowercase();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn toggle_year(&mut self, choice: FacetChoice<i64>) {
        toggle_facet(&mut self.years, &mut self.all_years, choice);
    }

    pub fn toggle_category(&mut self, choice: FacetChoice<String>) {
        toggle_facet(&mut self.categories, &mut self.all_categories, choice);
    }

    pub fn toggle_quick(&mut self, toggle: QuickToggle) {
        if !self.quick.remove(&toggle) {
            self.quick.insert(toggle);
        }
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.sort = sort;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Button state for a year facet choice; the "all" sentinel is active
    /// while no specific year is.
    pub fn year_state(&self, choice: &FacetChoice<i64>) -> FacetState {
        FacetState::from(match choice {
            FacetChoice::All => self.all_years,
            FacetChoice::Value(year) => self.years.contains(year),
        })
    }

    pub fn category_state(&self, choice: &FacetChoice<String>) -> FacetState {
        FacetState::from(match choice {
            FacetChoice::All => self.all_categories,
            FacetChoice::Value(category) => self.categories.contains(category),
        })
    }

    pub fn quick_state(&self, toggle: QuickToggle) -> FacetState {
        FacetState::from(self.quick.contains(&toggle))
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Evaluation and Sorting
// ============================================================================

/// Whether `card` is visible under `filters`: AND across search, facets and
/// quick toggles, OR within a facet.
pub fn evaluate(card: &Card, filters: &FilterState) -> bool {
    if !filters.search.is_empty() && !card.search_text.contains(&filters.search) {
        return false;
    }

    if !filters.all_years && !filters.years.is_empty() && !filters.years.contains(&card.year) {
        return false;
    }

    if !filters.all_categories
        && !filters.categories.is_empty()
        && !card.categories.iter().any(|c| filters.categories.contains(c))
    {
        return false;
    }

    filters.quick.iter().all(|q| q.matches(card))
}

fn fold_accents(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn swap_case(s: &str) -> String {
    s.chars()
        .flat_map(|c| {
            if c.is_lowercase() {
                c.to_uppercase().collect::<Vec<_>>()
            } else {
                c.to_lowercase().collect::<Vec<_>>()
            }
        })
        .collect()
}

/// Collation-style comparison: letters first, then accents, then case
/// (lowercase before uppercase), then raw code points.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    fold_accents(a)
        .cmp(&fold_accents(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| swap_case(a).cmp(&swap_case(b)))
        .then_with(|| a.cmp(b))
}

fn compare(a: &Card, b: &Card, key: &SortKey) -> Ordering {
    match key {
        SortKey::DateDesc => b.year.cmp(&a.year),
        SortKey::DateAsc => a.year.cmp(&b.year),
        SortKey::RelevanceDesc => b.relevance.total_cmp(&a.relevance),
        SortKey::TitleAsc => locale_compare(&a.title, &b.title),
        SortKey::CitationDesc => b.citations.cmp(&a.citations),
        SortKey::Unknown(_) => Ordering::Equal,
    }
}

/// Stable sort of the visible cards. Ties keep their incoming order.
pub fn sort_cards<C: AsRef<Card>>(cards: &mut [C], key: &SortKey) {
    cards.sort_by(|a, b| compare(a.as_ref(), b.as_ref(), key));
}

/// A card with its index in the store.
struct Slot<'a>(usize, &'a Card);

impl AsRef<Card> for Slot<'_> {
    fn as_ref(&self) -> &Card {
        self.1
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one recomputation over every card.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultsView {
    /// Card indices in container order: hidden cards keep their previous
    /// relative order, visible ones follow in sorted order.
    pub order: Vec<usize>,
    /// Card indices that passed the filters, sorted.
    pub visible: Vec<usize>,
    /// Hidden flag per card index.
    pub hidden: Vec<bool>,
}

impl ResultsView {
    /// Everything visible, in card order. The state before the first
    /// recomputation.
    pub fn unfiltered(total: usize) -> Self {
        Self {
            order: (0..total).collect(),
            visible: (0..total).collect(),
            hidden: vec![false; total],
        }
    }

    pub fn total(&self) -> usize {
        self.hidden.len()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.iter().filter(|h| **h).count()
    }

    /// The empty-state indicator shows when nothing is visible.
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden.get(index).copied().unwrap_or(true)
    }

    pub fn visible_ids<'a>(&'a self, cards: &'a [Card]) -> impl Iterator<Item = &'a str> + 'a {
        self.visible
            .iter()
            .filter_map(move |&i| cards.get(i).map(|c| c.id.as_str()))
    }

    /// Results counter, e.g. `Showing <strong>3</strong> papers`.
    pub fn counter_html(&self) -> String {
        let count = self.visible_count();
        format!(
            "Showing <strong>{}</strong> paper{}",
            count,
            if count == 1 { "" } else { "s" }
        )
    }
}

/// Re-evaluate every card and reflow the container.
///
/// `previous` is the container order from the last recomputation; visible
/// cards are sorted starting from that order so ties keep it.
pub fn recompute(cards: &[Card], previous: &[usize], filters: &FilterState) -> ResultsView {
    let hidden: Vec<bool> = cards.iter().map(|c| !evaluate(c, filters)).collect();

    let mut visible_cards: Vec<Slot> = previous
        .iter()
        .filter(|&&i| i < cards.len() && !hidden[i])
        .map(|&i| Slot(i, &cards[i]))
        .collect();
    sort_cards(&mut visible_cards, &filters.sort);
    let visible: Vec<usize> = visible_cards.into_iter().map(|Slot(i, _)| i).collect();

    let mut order: Vec<usize> = previous
        .iter()
        .copied()
        .filter(|&i| i < cards.len() && hidden[i])
        .collect();
    order.extend(visible.iter().copied());

    ResultsView {
        order,
        visible,
        hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, year: i64, categories: &[&str]) -> Card {
        Card {
            id: id.to_string(),
            title: id.to_uppercase(),
            search_text: format!("{} title text", id),
            year,
            categories: categories.iter().map(|c| c.to_string()).collect(),
            starred: false,
            has_code: false,
            paper_type: None,
            relevance: 0.0,
            citations: 0,
            paper: None,
        }
    }

    fn sample() -> Vec<Card> {
        let mut a = card("a", 2023, &["vision"]);
        a.starred = true;
        a.relevance = 3.5;
        a.citations = 10;
        let mut b = card("b", 2021, &["nlp", "vision"]);
        b.has_code = true;
        b.relevance = 9.0;
        b.citations = 300;
        let mut c = card("c", 2023, &["robotics"]);
        c.paper_type = Some(FOUNDATION_TYPE.to_string());
        c.relevance = 1.0;
        c.citations = 42;
        let d = card("d", 2019, &[]);
        vec![a, b, c, d]
    }

    fn ids(cards: &[Card], view: &ResultsView) -> Vec<String> {
        view.visible_ids(cards).map(str::to_string).collect()
    }

    fn run(cards: &[Card], filters: &FilterState) -> ResultsView {
        let start: Vec<usize> = (0..cards.len()).collect();
        recompute(cards, &start, filters)
    }

    #[test]
    fn test_default_filters_show_everything_newest_first() {
        let cards = sample();
        let view = run(&cards, &FilterState::default());
        assert_eq!(ids(&cards, &view), vec!["a", "c", "b", "d"]);
        assert_eq!(view.hidden_count(), 0);
    }

    #[test]
    fn test_search_is_substring_of_search_text() {
        let cards = sample();
        let mut f = FilterState::default();
        f.set_search("B TITLE");
        assert_eq!(f.search, "b title");
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["b"]);
    }

    #[test]
    fn test_year_filter_hides_then_restores() {
        let cards = sample();
        let mut f = FilterState::default();
        f.toggle_year(FacetChoice::Value(2022));
        assert!(!f.all_years);
        let view = run(&cards, &f);
        assert!(view.is_hidden(0));
        assert!(view.is_empty());

        f.toggle_year(FacetChoice::Value(2022));
        assert!(f.all_years);
        let view = run(&cards, &f);
        assert!(!view.is_hidden(0));
    }

    #[test]
    fn test_or_within_facet_and_across_facets() {
        let cards = sample();
        let mut f = FilterState::default();
        f.toggle_year(FacetChoice::Value(2023));
        f.toggle_year(FacetChoice::Value(2021));
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["a", "c", "b"]);

        f.toggle_category(FacetChoice::Value("vision".to_string()));
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["a", "b"]);

        f.toggle_quick(QuickToggle::HasCode);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["b"]);
    }

    #[test]
    fn test_all_sentinel_clears_facet() {
        let mut f = FilterState::default();
        f.toggle_category(FacetChoice::Value("nlp".to_string()));
        f.toggle_category(FacetChoice::Value("vision".to_string()));
        f.toggle_category(FacetChoice::All);
        assert!(f.categories.is_empty());
        assert!(f.all_categories);
    }

    #[test]
    fn test_facet_button_states() {
        let mut f = FilterState::default();
        assert_eq!(f.year_state(&FacetChoice::All), FacetState::Active);
        f.toggle_year(FacetChoice::Value(2023));
        assert_eq!(f.year_state(&FacetChoice::All), FacetState::Inactive);
        assert!(f.year_state(&FacetChoice::Value(2023)).is_active());
        assert_eq!(f.year_state(&FacetChoice::Value(2021)), FacetState::Inactive);
        assert_eq!(
            f.category_state(&FacetChoice::Value("nlp".into())).as_str(),
            "inactive"
        );
        f.toggle_quick(QuickToggle::HasCode);
        assert_eq!(f.quick_state(QuickToggle::HasCode), FacetState::Active);
    }

    #[test]
    fn test_quick_toggles() {
        let cards = sample();
        let mut f = FilterState::default();
        f.toggle_quick(QuickToggle::Starred);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["a"]);
        f.toggle_quick(QuickToggle::Starred);
        f.toggle_quick(QuickToggle::Foundation);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["c"]);
    }

    #[test]
    fn test_visible_plus_hidden_is_total() {
        let cards = sample();
        let mut f = FilterState::default();
        for year in [2019, 2023] {
            f.toggle_year(FacetChoice::Value(year));
            for q in QuickToggle::ALL {
                f.toggle_quick(q);
                let view = run(&cards, &f);
                assert_eq!(view.visible_count() + view.hidden_count(), cards.len());
                assert_eq!(view.order.len(), cards.len());
            }
        }
    }

    #[test]
    fn test_sort_orders() {
        let cards = sample();
        let mut f = FilterState::default();
        f.set_sort(SortKey::DateAsc);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["d", "b", "a", "c"]);
        f.set_sort(SortKey::RelevanceDesc);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["b", "a", "c", "d"]);
        f.set_sort(SortKey::CitationDesc);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["b", "c", "a", "d"]);
        f.set_sort(SortKey::TitleAsc);
        assert_eq!(ids(&cards, &run(&cards, &f)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unknown_sort_keeps_previous_order() {
        let cards = sample();
        let mut f = FilterState::default();
        f.set_sort(SortKey::parse("shuffle"));
        let previous = vec![3, 1, 0, 2];
        let view = recompute(&cards, &previous, &f);
        assert_eq!(view.visible, previous);
    }

    fn sorted_ids(cards: &mut [&Card], key: SortKey) -> Vec<String> {
        sort_cards(cards, &key);
        cards.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn test_sort_cards_is_idempotent_and_ties_keep_order() {
        let cards = sample();
        let mut list: Vec<&Card> = cards.iter().collect();
        let once = sorted_ids(&mut list, SortKey::DateDesc);
        let twice = sorted_ids(&mut list, SortKey::DateDesc);
        assert_eq!(once, vec!["a", "c", "b", "d"]);
        assert_eq!(once, twice);

        // a and c tie on year; their relative order follows the input.
        let mut swapped = vec![&cards[2], &cards[0], &cards[1], &cards[3]];
        assert_eq!(sorted_ids(&mut swapped, SortKey::DateDesc), vec!["c", "a", "b", "d"]);

        let mut unknown = vec![&cards[3], &cards[1], &cards[0]];
        assert_eq!(sorted_ids(&mut unknown, SortKey::parse("shuffle")), vec!["d", "b", "a"]);

        let mut owned = sample();
        sort_cards(&mut owned, &SortKey::CitationDesc);
        let ids: Vec<&str> = owned.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_recompute_is_idempotent_and_keeps_container_ties() {
        let cards = sample();
        let f = FilterState::default();
        let first = run(&cards, &f);
        let second = recompute(&cards, &first.order, &f);
        assert_eq!(first, second);

        let swapped = vec![2, 0, 1, 3];
        let view = recompute(&cards, &swapped, &f);
        assert_eq!(ids(&cards, &view), vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_hidden_cards_lead_the_container_order() {
        let cards = sample();
        let mut f = FilterState::default();
        f.toggle_year(FacetChoice::Value(2023));
        let view = run(&cards, &f);
        assert_eq!(view.order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut f = FilterState::default();
        f.set_search("x");
        f.toggle_year(FacetChoice::Value(2020));
        f.toggle_quick(QuickToggle::Starred);
        f.set_sort(SortKey::TitleAsc);
        f.reset();
        assert!(f.is_default());
    }

    #[test]
    fn test_locale_compare() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("école", "ecole"), Ordering::Greater);
        assert_eq!(locale_compare("école", "ezra"), Ordering::Less);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_facet_choice_parse() {
        assert_eq!(FacetChoice::<i64>::parse("all"), Some(FacetChoice::All));
        assert_eq!(FacetChoice::<i64>::parse("2021"), Some(FacetChoice::Value(2021)));
        assert_eq!(FacetChoice::<i64>::parse("soon"), None);
        assert_eq!(
            FacetChoice::<String>::parse("vision"),
            Some(FacetChoice::Value("vision".to_string()))
        );
    }

    #[test]
    fn test_counter_text() {
        let view = ResultsView::unfiltered(1);
        assert_eq!(view.counter_html(), "Showing <strong>1</strong> paper");
        let view = ResultsView::unfiltered(0);
        assert_eq!(view.counter_html(), "Showing <strong>0</strong> papers");
        assert!(view.is_empty());
    }
}
