//! Relation graph: adjacency view and BFS hop distances.
//!
//! # Responsibility
//! - Build an adjacency view over a card snapshot.
//! - Compute shortest-hop distances from a chosen origin card.
//!
//! # Invariants
//! - The origin, when present, has distance 0.
//! - Unreachable cards have no entry; "no distance" is distinct from 0.
//! - A missing origin yields an empty mapping, never an error.
//!
//! Every call recomputes from scratch: O(V + E) per call, no caching. Fine
//! for the expected tens-to-hundreds of cards; a known scalability limit,
//! not a bug.

use crate::model::card::{Card, CardId};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Hop count per reachable card id.
pub type Distances = HashMap<CardId, u32>;

/// Builds an id -> related-set view over a card snapshot.
pub fn adjacency(cards: &[Card]) -> HashMap<&str, &BTreeSet<CardId>> {
    cards
        .iter()
        .map(|card| (card.id.as_str(), &card.related))
        .collect()
}

/// Computes shortest-hop distances from `origin` over symmetric links.
///
/// Breadth-first with an explicit queue; the first assignment of a distance
/// is minimal because traversal proceeds depth by depth.
pub fn distances(cards: &[Card], origin: &str) -> Distances {
    let graph = adjacency(cards);
    let mut visited = Distances::new();
    if !graph.contains_key(origin) {
        return visited;
    }

    let mut queue = VecDeque::new();
    visited.insert(origin.to_string(), 0);
    queue.push_back(origin.to_string());

    while let Some(current) = queue.pop_front() {
        let depth = visited[&current];
        let Some(neighbours) = graph.get(current.as_str()) else {
            continue;
        };
        for neighbour in neighbours.iter() {
            if visited.contains_key(neighbour) {
                continue;
            }
            // Links can reference cards missing from the snapshot; they
            // carry no distance and are not traversed.
            if !graph.contains_key(neighbour.as_str()) {
                continue;
            }
            visited.insert(neighbour.clone(), depth + 1);
            queue.push_back(neighbour.clone());
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::distances;
    use crate::model::card::Card;

    fn card(id: &str, related: &[&str]) -> Card {
        let mut card = Card::with_id(id.to_string(), id.to_string(), "");
        card.related = related.iter().map(|value| value.to_string()).collect();
        card
    }

    #[test]
    fn chain_distances_count_hops_from_origin() {
        let cards = vec![
            card("a", &["b"]),
            card("b", &["a", "c"]),
            card("c", &["b"]),
        ];
        let found = distances(&cards, "a");
        assert_eq!(found.get("a"), Some(&0));
        assert_eq!(found.get("b"), Some(&1));
        assert_eq!(found.get("c"), Some(&2));
    }

    #[test]
    fn disconnected_card_has_no_entry() {
        let cards = vec![card("a", &["b"]), card("b", &["a"]), card("d", &[])];
        let found = distances(&cards, "a");
        assert_eq!(found.len(), 2);
        assert!(!found.contains_key("d"));
    }

    #[test]
    fn missing_origin_yields_empty_mapping() {
        let cards = vec![card("a", &[])];
        assert!(distances(&cards, "ghost").is_empty());
    }

    #[test]
    fn cycles_terminate_with_minimal_distances() {
        let cards = vec![
            card("a", &["b", "c"]),
            card("b", &["a", "c"]),
            card("c", &["a", "b"]),
        ];
        let found = distances(&cards, "a");
        assert_eq!(found.get("b"), Some(&1));
        assert_eq!(found.get("c"), Some(&1));
    }

    #[test]
    fn dangling_reference_is_skipped() {
        let cards = vec![card("a", &["gone"])];
        let found = distances(&cards, "a");
        assert_eq!(found.len(), 1);
        assert_eq!(found.get("a"), Some(&0));
    }
}
