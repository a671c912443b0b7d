//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into card-store operations.
//! - Enforce link symmetry and cascade rules above the CRUD surface.

pub mod card_service;
pub mod confirm;
