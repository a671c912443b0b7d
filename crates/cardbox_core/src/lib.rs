//! Core domain logic for the Cardbox knowledge-card board.
//!
//! Cards carry a title, free text, tags and symmetric links to other cards.
//! The crate keeps the link graph consistent, computes shortest-hop
//! distances from a selected card, and merges distances, tie-break
//! attributes and an active tag filter into a deterministic display order.
//!
//! Everything here is synchronous and pull-based: every read recomputes from
//! current state, and a single logical writer is assumed. Concurrent-writer
//! conflict resolution is out of scope.

pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod rank;
pub mod repo;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::card::{new_card_id, slugify, Card, CardId, CardValidationError};
pub use rank::{rank, RankedCard, RankedOutput};
pub use repo::card_repo::{
    CardPatch, CardRepository, RepoError, RepoResult, SqliteCardRepository,
};
pub use service::card_service::{CardService, NewCard, StoreError};
pub use service::confirm::{AlwaysAllow, ConfirmFn, ConfirmPolicy, DenyAll};
pub use session::{FilterState, MemorySessionStore, Selection, SessionStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
