//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the CRUD contract the card store consumes.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate cards before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod card_repo;
