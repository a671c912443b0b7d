//! Domain model for the card board.
//!
//! # Responsibility
//! - Define the canonical card record shared by store, graph and ranking.
//!
//! # Invariants
//! - Every card is identified by a stable `CardId` generated at creation.
//! - `related` never contains the card's own id.

pub mod card;
