//! Rank engine: filter, partition and order a card snapshot for display.
//!
//! # Responsibility
//! - Merge BFS distances, card attributes and the active tag filter into the
//!   ordered lists a caller displays.
//!
//! # Invariants
//! - Pure function of its inputs; no hidden session or global reads.
//! - The sort key chain yields a deterministic order for any two cards that
//!   differ in distance, link count, text length or title.

use crate::graph;
use crate::model::card::Card;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// A card paired with its hop distance from the selection, when reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedCard {
    pub card: Card,
    pub distance: Option<u32>,
}

/// Ranked output: cards reachable from the selection, then the rest.
///
/// With no selection, `linked` is empty and every surviving card lands in
/// `unlinked`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedOutput {
    pub linked: Vec<RankedCard>,
    pub unlinked: Vec<RankedCard>,
}

/// Filters, partitions and orders a card snapshot.
///
/// Filtering: a card passes when `filter_tags` is empty or intersects the
/// card's tags. Partitioning applies only when `selected_id` is given and
/// splits by reachability through the link graph. Ordering within each
/// group: distance ascending, related-count descending, text length
/// descending, title ascending.
pub fn rank(cards: Vec<Card>, selected_id: Option<&str>, filter_tags: &BTreeSet<String>) -> RankedOutput {
    let distances = selected_id.map(|origin| graph::distances(&cards, origin));

    let mut output = RankedOutput::default();
    for card in cards {
        if !passes_filter(&card, filter_tags) {
            continue;
        }
        let distance = distances
            .as_ref()
            .and_then(|found| found.get(card.id.as_str()).copied());
        let entry = RankedCard { card, distance };
        if distances.is_some() && entry.distance.is_some() {
            output.linked.push(entry);
        } else {
            output.unlinked.push(entry);
        }
    }

    output.linked.sort_by(display_order);
    output.unlinked.sort_by(display_order);
    output
}

/// True when the filter is empty or shares at least one tag with the card.
pub fn passes_filter(card: &Card, filter_tags: &BTreeSet<String>) -> bool {
    filter_tags.is_empty() || card.tags.intersection(filter_tags).next().is_some()
}

fn display_order(a: &RankedCard, b: &RankedCard) -> Ordering {
    a.distance
        .cmp(&b.distance)
        .then_with(|| b.card.related.len().cmp(&a.card.related.len()))
        .then_with(|| text_len(&b.card).cmp(&text_len(&a.card)))
        .then_with(|| a.card.title.cmp(&b.card.title))
}

fn text_len(card: &Card) -> usize {
    card.text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::{passes_filter, rank};
    use crate::model::card::Card;
    use std::collections::BTreeSet;

    fn card(id: &str, title: &str, text: &str, tags: &[&str], related: &[&str]) -> Card {
        let mut card = Card::with_id(id.to_string(), title.to_string(), text.to_string());
        card.tags = tags.iter().map(|value| value.to_string()).collect();
        card.related = related.iter().map(|value| value.to_string()).collect();
        card
    }

    fn tag_set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn empty_filter_passes_everything() {
        let untagged = card("a", "A", "", &[], &[]);
        assert!(passes_filter(&untagged, &tag_set(&[])));
    }

    #[test]
    fn filter_requires_tag_intersection() {
        let filter = tag_set(&["x"]);
        assert!(passes_filter(&card("a", "A", "", &["x", "y"], &[]), &filter));
        assert!(!passes_filter(&card("b", "B", "", &["y"], &[]), &filter));
    }

    #[test]
    fn no_selection_puts_everything_in_unlinked() {
        let cards = vec![card("a", "A", "", &[], &["b"]), card("b", "B", "", &[], &["a"])];
        let ranked = rank(cards, None, &BTreeSet::new());
        assert!(ranked.linked.is_empty());
        assert_eq!(ranked.unlinked.len(), 2);
        assert!(ranked.unlinked.iter().all(|entry| entry.distance.is_none()));
    }

    #[test]
    fn selection_partitions_by_reachability() {
        let cards = vec![
            card("a", "A", "", &[], &["b"]),
            card("b", "B", "", &[], &["a"]),
            card("d", "D", "", &[], &[]),
        ];
        let ranked = rank(cards, Some("a"), &BTreeSet::new());
        let linked_ids: Vec<&str> = ranked
            .linked
            .iter()
            .map(|entry| entry.card.id.as_str())
            .collect();
        assert_eq!(linked_ids, vec!["a", "b"]);
        assert_eq!(ranked.unlinked.len(), 1);
        assert_eq!(ranked.unlinked[0].card.id, "d");
    }

    #[test]
    fn related_count_breaks_distance_ties() {
        // b and c are both one hop out; c carries more links.
        let cards = vec![
            card("a", "A", "", &[], &["b", "c"]),
            card("b", "B", "", &[], &["a"]),
            card("c", "C", "", &[], &["a", "d"]),
            card("d", "D", "", &[], &["c"]),
        ];
        let ranked = rank(cards, Some("a"), &BTreeSet::new());
        let order: Vec<&str> = ranked
            .linked
            .iter()
            .map(|entry| entry.card.id.as_str())
            .collect();
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn text_length_then_title_break_remaining_ties() {
        let cards = vec![
            card("s", "Short", "x", &[], &[]),
            card("l", "Long", "xxxx", &[], &[]),
            card("b", "Beta", "x", &[], &[]),
        ];
        let ranked = rank(cards, None, &BTreeSet::new());
        let order: Vec<&str> = ranked
            .unlinked
            .iter()
            .map(|entry| entry.card.title.as_str())
            .collect();
        // Longer text first; equal-length texts fall back to title order.
        assert_eq!(order, vec!["Long", "Beta", "Short"]);
    }

    #[test]
    fn filtered_cards_are_excluded_from_both_groups() {
        let cards = vec![
            card("a", "A", "", &["x"], &["b"]),
            card("b", "B", "", &["y"], &["a"]),
        ];
        let ranked = rank(cards, Some("a"), &tag_set(&["x"]));
        assert_eq!(ranked.linked.len(), 1);
        assert_eq!(ranked.linked[0].card.id, "a");
        assert!(ranked.unlinked.is_empty());
    }
}
