//! Transient UI session state: selection and filter tags.
//!
//! # Responsibility
//! - Hold the single selected-card id and the active filter tag set.
//! - Persist both across UI reloads through a small key-value store.
//!
//! # Invariants
//! - At most one card is selected at a time.
//! - Selecting the selected card again clears the selection (toggle).
//! - The filter set's lifecycle is independent of card data.
//! - Malformed stored values degrade to defaults, never to errors.

use crate::model::card::{Card, CardId};
use log::warn;
use std::collections::{BTreeSet, HashMap};

const SELECTED_CARD_KEY: &str = "selected_card";
const FILTER_TAGS_KEY: &str = "filter_tags";

/// Transient key-value persistence for session state.
///
/// Not durable and not shared across processes; an in-memory map is the
/// reference implementation, a UI shell may back it with whatever it has.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Holds at most one selected card id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<CardId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects `id`, or clears the selection when `id` is already selected.
    pub fn select(&mut self, id: impl Into<CardId>) {
        let id = id.into();
        if self.selected.as_deref() == Some(id.as_str()) {
            self.selected = None;
        } else {
            self.selected = Some(id);
        }
    }

    /// Clears the selection unconditionally.
    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Clears the selection when it points at `id`. Used after deletes.
    pub fn clear_if(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Restores a selection previously saved to `store`.
    pub fn restore(store: &impl SessionStore) -> Self {
        let selected = match store.get(SELECTED_CARD_KEY) {
            None => None,
            Some(raw) => match serde_json::from_str::<Option<CardId>>(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        "event=session_restore module=session status=warn key={SELECTED_CARD_KEY} error={err}"
                    );
                    None
                }
            },
        };
        Self { selected }
    }

    /// Saves the selection to `store`.
    pub fn persist(&self, store: &mut impl SessionStore) {
        let raw = serde_json::to_string(&self.selected).unwrap_or_else(|_| "null".to_string());
        store.set(SELECTED_CARD_KEY, &raw);
    }
}

/// The active filter tag set. Empty means match-all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    tags: BTreeSet<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag to the filter. Any string is a legal tag, including ones
    /// present on no card.
    pub fn add(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Removes a tag from the filter; absent tags are a no-op.
    pub fn remove(&mut self, tag: &str) {
        self.tags.remove(tag);
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// True when the filter is empty or intersects the card's tags.
    pub fn matches(&self, card: &Card) -> bool {
        crate::rank::passes_filter(card, &self.tags)
    }

    /// Restores filter tags previously saved to `store`.
    pub fn restore(store: &impl SessionStore) -> Self {
        let tags = match store.get(FILTER_TAGS_KEY) {
            None => BTreeSet::new(),
            Some(raw) => match serde_json::from_str::<BTreeSet<String>>(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(
                        "event=session_restore module=session status=warn key={FILTER_TAGS_KEY} error={err}"
                    );
                    BTreeSet::new()
                }
            },
        };
        Self { tags }
    }

    /// Saves the filter tags to `store`.
    pub fn persist(&self, store: &mut impl SessionStore) {
        let raw = serde_json::to_string(&self.tags).unwrap_or_else(|_| "[]".to_string());
        store.set(FILTER_TAGS_KEY, &raw);
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterState, MemorySessionStore, Selection, SessionStore};

    #[test]
    fn select_toggles_when_reselecting_same_id() {
        let mut selection = Selection::new();
        selection.select("a");
        assert_eq!(selection.current(), Some("a"));
        selection.select("a");
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn select_switches_to_different_id() {
        let mut selection = Selection::new();
        selection.select("a");
        selection.select("b");
        assert_eq!(selection.current(), Some("b"));
    }

    #[test]
    fn clear_if_only_clears_matching_selection() {
        let mut selection = Selection::new();
        selection.select("a");
        selection.clear_if("b");
        assert_eq!(selection.current(), Some("a"));
        selection.clear_if("a");
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn filter_add_remove_are_idempotent() {
        let mut filter = FilterState::new();
        filter.add("x");
        filter.add("x");
        assert_eq!(filter.tags().len(), 1);
        filter.remove("missing");
        filter.remove("x");
        assert!(filter.is_empty());
    }

    #[test]
    fn selection_and_filter_round_trip_through_store() {
        let mut store = MemorySessionStore::new();

        let mut selection = Selection::new();
        selection.select("card-1");
        selection.persist(&mut store);

        let mut filter = FilterState::new();
        filter.add("rust");
        filter.persist(&mut store);

        assert_eq!(Selection::restore(&store).current(), Some("card-1"));
        assert!(FilterState::restore(&store).tags().contains("rust"));
    }

    #[test]
    fn malformed_stored_values_fall_back_to_defaults() {
        let mut store = MemorySessionStore::new();
        store.set("selected_card", "{not json");
        store.set("filter_tags", "42");
        assert_eq!(Selection::restore(&store).current(), None);
        assert!(FilterState::restore(&store).is_empty());
    }
}
