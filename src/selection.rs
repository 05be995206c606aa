//! Multi-paper selection and `#selected=` share links.

use std::collections::BTreeSet;

use url::Url;

use crate::error::{Error, Result};

pub const FRAGMENT_PREFIX: &str = "selected=";

/// Chosen paper ids plus whether selection mode (per-card checkboxes) is on.
///
/// Ids are not validated against the card store; exports skip the ones that
/// do not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    ids: BTreeSet<String>,
    mode: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> bool {
        self.mode
    }

    /// Turning selection mode off drops the whole selection.
    pub fn set_mode(&mut self, on: bool) {
        self.mode = on;
        if !on {
            self.clear();
        }
    }

    pub fn toggle_mode(&mut self) -> bool {
        self.set_mode(!self.mode);
        self.mode
    }

    /// Checkbox change for one card.
    pub fn set(&mut self, id: &str, checked: bool) {
        if checked {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        let checked = !self.ids.contains(id);
        self.set(id, checked);
        checked
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.ids.extend(ids.into_iter().map(str::to_string));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Selection bar text; `None` hides the bar.
    pub fn count_label(&self) -> Option<String> {
        match self.ids.len() {
            0 => None,
            1 => Some("1 paper selected".to_string()),
            n => Some(format!("{} papers selected", n)),
        }
    }

    /// `<page url without query/fragment>#selected=<id>,<id>,…`
    pub fn share_url(&self, current_url: &str) -> Result<String> {
        if self.is_empty() {
            return Err(Error::EmptySelection);
        }
        let ids: Vec<String> = self
            .ids()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect();
        Ok(format!(
            "{}#{}{}",
            base_url(current_url)?,
            FRAGMENT_PREFIX,
            ids.join(",")
        ))
    }

    /// Add every id from a `#selected=` fragment. Returns how many ids the
    /// fragment carried; a non-empty fragment turns selection mode on.
    pub fn load_fragment(&mut self, fragment: &str) -> usize {
        let ids = parse_fragment(fragment).unwrap_or_default();
        for id in &ids {
            self.ids.insert(id.clone());
        }
        if !ids.is_empty() && !self.mode {
            self.mode = true;
        }
        ids.len()
    }
}

/// The page url with query and fragment stripped.
pub fn base_url(current_url: &str) -> Result<Url> {
    let mut url = Url::parse(current_url)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Ids from `#selected=a,b` (leading `#` optional). Fragments of any other
/// form yield `None`.
pub fn parse_fragment(fragment: &str) -> Option<Vec<String>> {
    let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
    let list = fragment.strip_prefix(FRAGMENT_PREFIX)?;
    Some(
        list.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                urlencoding::decode(id)
                    .map(|d| d.into_owned())
                    .unwrap_or_else(|_| id.to_string())
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_and_count_label() {
        let mut sel = SelectionState::new();
        assert_eq!(sel.count_label(), None);
        assert!(sel.toggle("p1"));
        assert_eq!(sel.count_label().as_deref(), Some("1 paper selected"));
        sel.set("p2", true);
        assert_eq!(sel.count_label().as_deref(), Some("2 papers selected"));
        assert!(!sel.toggle("p1"));
        assert_eq!(sel.ids().collect::<Vec<_>>(), vec!["p2"]);
    }

    #[test]
    fn test_leaving_selection_mode_clears() {
        let mut sel = SelectionState::new();
        assert!(sel.toggle_mode());
        sel.select_all(["a", "b"]);
        assert!(!sel.toggle_mode());
        assert!(sel.is_empty());
    }

    #[test]
    fn test_share_url_strips_query_and_fragment() {
        let mut sel = SelectionState::new();
        sel.select_all(["p2", "p1"]);
        let url = sel
            .share_url("https://example.org/papers/?q=x#selected=old")
            .unwrap();
        assert_eq!(url, "https://example.org/papers/#selected=p1,p2");
    }

    #[test]
    fn test_share_requires_selection() {
        let sel = SelectionState::new();
        assert!(matches!(
            sel.share_url("https://example.org/papers/"),
            Err(Error::EmptySelection)
        ));
    }

    #[test]
    fn test_share_then_load_round_trip() {
        let mut sel = SelectionState::new();
        sel.select_all(["p1", "p2"]);
        let url = Url::parse(&sel.share_url("http://localhost:3000/").unwrap()).unwrap();

        let mut fresh = SelectionState::new();
        let loaded = fresh.load_fragment(url.fragment().unwrap());
        assert_eq!(loaded, 2);
        assert!(fresh.mode());
        assert_eq!(fresh.ids().collect::<Vec<_>>(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_ids_with_commas_survive() {
        let mut sel = SelectionState::new();
        sel.set("a,b", true);
        let url = sel.share_url("http://localhost/").unwrap();
        let frag = url.split_once('#').unwrap().1;
        assert_eq!(parse_fragment(frag), Some(vec!["a,b".to_string()]));
    }

    #[test]
    fn test_parse_fragment_forms() {
        assert_eq!(
            parse_fragment("#selected=x,,y"),
            Some(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(parse_fragment("selected="), Some(vec![]));
        assert_eq!(parse_fragment("#top"), None);
    }

    #[test]
    fn test_empty_fragment_leaves_mode_off() {
        let mut sel = SelectionState::new();
        assert_eq!(sel.load_fragment("#selected="), 0);
        assert!(!sel.mode());
    }
}
