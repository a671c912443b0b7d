//! Card domain model and id generation.
//!
//! # Responsibility
//! - Define the canonical card record (title, text, tags, links).
//! - Generate stable human-readable ids from titles.
//!
//! # Invariants
//! - `id` is stable and never reused for another card.
//! - `title` is non-empty after trimming.
//! - `related` never contains the card's own id.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

const ID_SUFFIX_LEN: usize = 8;

/// Stable identifier for a card.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CardId = String;

/// Validation failures for card state and link operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardValidationError {
    /// Title is empty or whitespace-only.
    EmptyTitle,
    /// A card may not link to itself.
    SelfLink(CardId),
}

impl Display for CardValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "card title must not be empty"),
            Self::SelfLink(id) => write!(f, "card cannot link to itself: {id}"),
        }
    }
}

impl Error for CardValidationError {}

/// Canonical card record.
///
/// Tags and related ids are kept as ordered sets so snapshots serialize and
/// compare deterministically; insertion order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Stable id, `slug(title)` plus a random suffix.
    pub id: CardId,
    /// Display title. Non-empty.
    pub title: String,
    /// Free-form body text. Defaults to empty.
    #[serde(default)]
    pub text: String,
    /// Unordered unique tag set.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Unordered unique set of other card ids. Symmetric by store invariant.
    #[serde(default)]
    pub related: BTreeSet<CardId>,
}

impl Card {
    /// Creates a card with a freshly generated id and empty tag/link sets.
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let title = title.into();
        Self::with_id(new_card_id(&title), title, text)
    }

    /// Creates a card with a caller-provided stable id.
    ///
    /// Used by load paths where identity already exists in storage.
    pub fn with_id(id: CardId, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
            tags: BTreeSet::new(),
            related: BTreeSet::new(),
        }
    }

    /// Checks card-local invariants.
    ///
    /// # Errors
    /// - `EmptyTitle` when the trimmed title is empty.
    /// - `SelfLink` when `related` contains this card's own id.
    pub fn validate(&self) -> Result<(), CardValidationError> {
        if self.title.trim().is_empty() {
            return Err(CardValidationError::EmptyTitle);
        }
        if self.related.contains(&self.id) {
            return Err(CardValidationError::SelfLink(self.id.clone()));
        }
        Ok(())
    }
}

/// Generates a new card id from a title: lowercase slug plus random suffix.
///
/// The suffix keeps ids unique even for identical titles; ids are never
/// reused because the suffix is drawn from a fresh UUID per call.
pub fn new_card_id(title: &str) -> CardId {
    let slug = slugify(title);
    let uuid = Uuid::new_v4().simple().to_string();
    let suffix = &uuid[..ID_SUFFIX_LEN];
    if slug.is_empty() {
        format!("card-{suffix}")
    } else {
        format!("{slug}-{suffix}")
    }
}

/// Lowercases and collapses non-alphanumeric runs to single dashes.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{new_card_id, slugify, Card, CardValidationError};

    #[test]
    fn slugify_collapses_and_trims_separators() {
        assert_eq!(slugify("Hello,  World!"), "hello-world");
        assert_eq!(slugify("  --spaced--  "), "spaced");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn new_card_id_prefixes_slug_and_stays_unique() {
        let first = new_card_id("My Card");
        let second = new_card_id("My Card");
        assert!(first.starts_with("my-card-"));
        assert_ne!(first, second);
    }

    #[test]
    fn new_card_id_for_symbol_only_title_falls_back_to_generic_prefix() {
        assert!(new_card_id("???").starts_with("card-"));
    }

    #[test]
    fn validate_rejects_blank_title_and_self_link() {
        let blank = Card::new("   ", "");
        assert_eq!(blank.validate(), Err(CardValidationError::EmptyTitle));

        let mut card = Card::new("Alpha", "");
        card.related.insert(card.id.clone());
        assert_eq!(
            card.validate(),
            Err(CardValidationError::SelfLink(card.id.clone()))
        );
    }
}
