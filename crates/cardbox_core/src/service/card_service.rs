//! Card store use-case service.
//!
//! # Responsibility
//! - Provide create/update/delete/link/tag operations over the repository.
//! - Enforce link symmetry: if A relates to B, B relates to A after every
//!   operation, not just by convention.
//! - Keep deletes cascading: no surviving card references a deleted id.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Removing an absent tag or link is an idempotent no-op, not an error;
//!   the UI may race a double-click.
//! - Destructive operations consult the injected confirm policy first.

use crate::model::card::{Card, CardId, CardValidationError};
use crate::rank::{self, RankedOutput};
use crate::repo::card_repo::{CardPatch, CardRepository, RepoError};
use crate::service::confirm::{AlwaysAllow, ConfirmPolicy};
use log::warn;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for card store use-cases.
#[derive(Debug)]
pub enum StoreError {
    /// Card-local invariant violated (empty title, self-link).
    Validation(CardValidationError),
    /// Operation referenced a card id that does not exist.
    NotFound(CardId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write/read-back mismatch that should never happen.
    InconsistentState(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "card not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent card state: {details}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::InconsistentState(_) => None,
        }
    }
}

impl From<CardValidationError> for StoreError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Request model for creating a card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCard {
    /// Display title. Must be non-empty.
    pub title: String,
    /// Free-form body text.
    pub text: String,
    /// Initial tag set.
    pub tags: BTreeSet<String>,
    /// Optional id of an existing card to link symmetrically right after
    /// insert.
    pub related_seed: Option<CardId>,
}

/// Card store facade over a repository and a confirm policy.
///
/// Destructive operations (`delete_card`, `unlink`, `remove_tag`) return
/// `Ok(false)` when the policy declines; `Ok(true)` covers both applied
/// changes and idempotent no-ops.
pub struct CardService<R: CardRepository, P: ConfirmPolicy = AlwaysAllow> {
    repo: R,
    confirm: P,
}

impl<R: CardRepository> CardService<R> {
    /// Creates a service with the default allow-everything policy.
    pub fn new(repo: R) -> Self {
        Self::with_confirm_policy(repo, AlwaysAllow)
    }
}

impl<R: CardRepository, P: ConfirmPolicy> CardService<R, P> {
    /// Creates a service with an explicit confirm policy.
    pub fn with_confirm_policy(repo: R, confirm: P) -> Self {
        Self { repo, confirm }
    }

    /// Creates a card with a freshly generated id.
    ///
    /// When `related_seed` names an existing card, both sides are linked
    /// before this returns.
    pub fn create_card(&mut self, request: NewCard) -> Result<Card, StoreError> {
        if let Some(seed) = request.related_seed.as_deref() {
            if self.repo.find_by_id(seed)?.is_none() {
                return Err(StoreError::NotFound(seed.to_string()));
            }
        }

        let mut card = Card::new(request.title, request.text);
        card.tags = request.tags;
        card.validate()?;
        self.repo.insert(&card)?;

        if let Some(seed) = request.related_seed.as_deref() {
            let id = card.id.clone();
            self.link(&id, seed)?;
        }

        self.read_back(&card.id, "created card not found in read-back")
    }

    /// Merges patch fields into an existing card.
    ///
    /// A `related` replacement is diffed against the current set and the
    /// counterpart cards are updated too, so symmetry survives arbitrary
    /// partial updates.
    pub fn update_card(&mut self, id: &str, patch: CardPatch) -> Result<Card, StoreError> {
        if let Some(title) = patch.title.as_deref() {
            if title.trim().is_empty() {
                return Err(StoreError::Validation(CardValidationError::EmptyTitle));
            }
        }

        let current = self.require(id)?;

        if let Some(new_related) = patch.related.as_ref() {
            if new_related.contains(id) {
                return Err(StoreError::Validation(CardValidationError::SelfLink(
                    id.to_string(),
                )));
            }

            // Counterpart updates for every added or removed relation; a
            // counterpart that vanished mid-update is skipped, not fatal.
            let mut reverse = Vec::new();
            for added in new_related.difference(&current.related) {
                if let Some(other) = self.repo.find_by_id(added)? {
                    reverse.push(RelatedChange {
                        id: added.clone(),
                        new: with_member(other.related.clone(), id),
                        previous: other.related,
                    });
                }
            }
            for removed in current.related.difference(new_related) {
                if let Some(other) = self.repo.find_by_id(removed)? {
                    reverse.push(RelatedChange {
                        id: removed.clone(),
                        new: without_member(other.related.clone(), id),
                        previous: other.related,
                    });
                }
            }

            self.apply_related_changes(&reverse)?;
            if let Err(err) = self.repo.update_fields(id, &patch) {
                self.restore_related(&reverse);
                return Err(err.into());
            }
        } else {
            self.repo.update_fields(id, &patch)?;
        }

        self.read_back(id, "updated card not found in read-back")
    }

    /// Deletes a card and cascades link removal to every other card.
    ///
    /// Returns `Ok(false)` when the confirm policy declines. Has no effect
    /// on filter or selection state owned elsewhere.
    pub fn delete_card(&mut self, id: &str) -> Result<bool, StoreError> {
        let card = self.require(id)?;
        if !self.confirm.confirm(&format!("Delete \"{}\"?", card.title)) {
            return Ok(false);
        }
        self.repo.remove(id)?;
        Ok(true)
    }

    /// Adds a tag to a card. Adding a present tag is a no-op.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> Result<(), StoreError> {
        let card = self.require(id)?;
        if card.tags.contains(tag) {
            return Ok(());
        }
        let mut tags = card.tags;
        tags.insert(tag.to_string());
        self.repo.update_fields(
            id,
            &CardPatch {
                tags: Some(tags),
                ..CardPatch::default()
            },
        )?;
        Ok(())
    }

    /// Removes a tag from a card. Removing an absent tag is a no-op and
    /// skips the confirm prompt; only an actual removal is gated.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> Result<bool, StoreError> {
        let card = self.require(id)?;
        if !card.tags.contains(tag) {
            return Ok(true);
        }
        let prompt = format!("Remove tag \"{tag}\" from \"{}\"?", card.title);
        if !self.confirm.confirm(&prompt) {
            return Ok(false);
        }
        let mut tags = card.tags;
        tags.remove(tag);
        self.repo.update_fields(
            id,
            &CardPatch {
                tags: Some(tags),
                ..CardPatch::default()
            },
        )?;
        Ok(true)
    }

    /// Links two cards symmetrically. Linking an already-linked pair is a
    /// no-op.
    ///
    /// # Errors
    /// - `Validation(SelfLink)` when `id_a == id_b`.
    /// - `NotFound` when either card is absent.
    pub fn link(&mut self, id_a: &str, id_b: &str) -> Result<(), StoreError> {
        if id_a == id_b {
            return Err(StoreError::Validation(CardValidationError::SelfLink(
                id_a.to_string(),
            )));
        }
        let card_a = self.require(id_a)?;
        let card_b = self.require(id_b)?;
        if card_a.related.contains(id_b) && card_b.related.contains(id_a) {
            return Ok(());
        }

        self.apply_related_changes(&[
            RelatedChange {
                id: id_a.to_string(),
                new: with_member(card_a.related.clone(), id_b),
                previous: card_a.related,
            },
            RelatedChange {
                id: id_b.to_string(),
                new: with_member(card_b.related.clone(), id_a),
                previous: card_b.related,
            },
        ])
    }

    /// Removes the symmetric link between two cards. Unlinking a pair that
    /// is not linked is a no-op; an actual unlink is gated by the policy.
    pub fn unlink(&mut self, id_a: &str, id_b: &str) -> Result<bool, StoreError> {
        let card_a = self.require(id_a)?;
        let card_b = self.require(id_b)?;
        if !card_a.related.contains(id_b) && !card_b.related.contains(id_a) {
            return Ok(true);
        }

        let prompt = format!("Unlink \"{}\" from \"{}\"?", card_a.title, card_b.title);
        if !self.confirm.confirm(&prompt) {
            return Ok(false);
        }

        self.apply_related_changes(&[
            RelatedChange {
                id: id_a.to_string(),
                new: without_member(card_a.related.clone(), id_b),
                previous: card_a.related,
            },
            RelatedChange {
                id: id_b.to_string(),
                new: without_member(card_b.related.clone(), id_a),
                previous: card_b.related,
            },
        ])?;
        Ok(true)
    }

    /// Returns one card by id.
    pub fn get_card(&self, id: &str) -> Result<Option<Card>, StoreError> {
        Ok(self.repo.find_by_id(id)?)
    }

    /// Returns every card, ordered by id.
    pub fn list_cards(&self) -> Result<Vec<Card>, StoreError> {
        Ok(self.repo.find_all()?)
    }

    /// Returns every tag used by any card, deduplicated and sorted
    /// case-insensitively.
    pub fn list_tags(&self) -> Result<Vec<String>, StoreError> {
        let mut tags: Vec<String> = self
            .repo
            .find_all()?
            .into_iter()
            .flat_map(|card| card.tags)
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();
        tags.sort_by_key(|tag| tag.to_lowercase());
        Ok(tags)
    }

    /// Returns cards a given card could still link to: everything except
    /// itself and its existing relations, sorted by title.
    pub fn link_candidates(&self, id: &str) -> Result<Vec<Card>, StoreError> {
        let card = self.require(id)?;
        let mut candidates: Vec<Card> = self
            .repo
            .find_all()?
            .into_iter()
            .filter(|other| other.id != card.id && !card.related.contains(&other.id))
            .collect();
        candidates.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(candidates)
    }

    /// Ranks the current snapshot for display: filtered, partitioned by
    /// reachability from `selected_id`, ordered deterministically.
    pub fn ranked(
        &self,
        selected_id: Option<&str>,
        filter_tags: &BTreeSet<String>,
    ) -> Result<RankedOutput, StoreError> {
        let cards = self.repo.find_all()?;
        Ok(rank::rank(cards, selected_id, filter_tags))
    }

    fn require(&self, id: &str) -> Result<Card, StoreError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn read_back(&self, id: &str, context: &'static str) -> Result<Card, StoreError> {
        self.repo
            .find_by_id(id)?
            .ok_or(StoreError::InconsistentState(context))
    }

    fn replace_related(&mut self, id: &str, related: BTreeSet<CardId>) -> Result<(), StoreError> {
        self.repo.update_fields(
            id,
            &CardPatch {
                related: Some(related),
                ..CardPatch::default()
            },
        )?;
        Ok(())
    }

    /// Applies a batch of related-set replacements. When one write fails,
    /// the already-applied ones are restored so no one-sided link survives
    /// an error return.
    fn apply_related_changes(&mut self, changes: &[RelatedChange]) -> Result<(), StoreError> {
        for (index, change) in changes.iter().enumerate() {
            if let Err(err) = self.replace_related(&change.id, change.new.clone()) {
                self.restore_related(&changes[..index]);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Best-effort restore of previously applied related sets, newest
    /// first. A failed restore is logged; the original error still reaches
    /// the caller.
    fn restore_related(&mut self, applied: &[RelatedChange]) {
        for change in applied.iter().rev() {
            if let Err(err) = self.replace_related(&change.id, change.previous.clone()) {
                warn!(
                    "event=link_rollback module=service status=error card_id={} error={err}",
                    change.id
                );
            }
        }
    }
}

/// One card's related-set replacement, with the prior set kept for
/// compensation.
#[derive(Debug, Clone)]
struct RelatedChange {
    id: CardId,
    new: BTreeSet<CardId>,
    previous: BTreeSet<CardId>,
}

fn with_member(mut related: BTreeSet<CardId>, id: &str) -> BTreeSet<CardId> {
    related.insert(id.to_string());
    related
}

fn without_member(mut related: BTreeSet<CardId>, id: &str) -> BTreeSet<CardId> {
    related.remove(id);
    related
}
