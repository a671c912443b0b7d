//! Card repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the narrow CRUD surface the card store builds on:
//!   `find_all`, `find_by_id`, `insert`, `update_fields`, `remove`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A read immediately following a write observes that write; the store's
//!   symmetry and cascade logic depends on this.
//! - Multi-row mutations (card + tags + links) are applied in one
//!   transaction; readers never observe a partially written card.
//! - Link rows referencing cards that no longer exist are skipped on write,
//!   never fatal.

use crate::db::DbError;
use crate::model::card::{Card, CardId, CardValidationError};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for card persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CardValidationError),
    Db(DbError),
    NotFound(CardId),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "card not found: {id}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing; run migrations first")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<CardValidationError> for RepoError {
    fn from(value: CardValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial update for `update_fields`. `None` fields are left untouched;
/// `Some` tag/related sets replace the stored set wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub related: Option<BTreeSet<CardId>>,
}

impl CardPatch {
    /// Returns true when the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.text.is_none() && self.tags.is_none() && self.related.is_none()
    }
}

/// CRUD contract consumed by the card store.
///
/// Implementations must guarantee read-after-write consistency within a
/// single logical writer; nothing here is safe for concurrent writers.
pub trait CardRepository {
    /// Returns every stored card, ordered by id for determinism.
    fn find_all(&self) -> RepoResult<Vec<Card>>;
    /// Returns one card by id, or `None` when absent.
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Card>>;
    /// Inserts a new card including its tag and link rows.
    fn insert(&mut self, card: &Card) -> RepoResult<()>;
    /// Merges patch fields into an existing card.
    fn update_fields(&mut self, id: &str, patch: &CardPatch) -> RepoResult<()>;
    /// Removes a card; link rows pointing at it are cascade-deleted.
    fn remove(&mut self, id: &str) -> RepoResult<()>;
}

/// SQLite-backed card repository.
#[derive(Debug)]
pub struct SqliteCardRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteCardRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when the card schema has not been applied.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        for table in ["cards", "card_tags", "card_links"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl CardRepository for SqliteCardRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Card>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, content FROM cards ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut cards = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get("id")?;
            let mut card = Card::with_id(
                id.clone(),
                row.get::<_, String>("title")?,
                row.get::<_, String>("content")?,
            );
            card.tags = load_tags(self.conn, &id)?;
            card.related = load_related(self.conn, &id)?;
            cards.push(card);
        }
        Ok(cards)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Card>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, content FROM cards WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut card = Card::with_id(
                row.get::<_, String>("id")?,
                row.get::<_, String>("title")?,
                row.get::<_, String>("content")?,
            );
            card.tags = load_tags(self.conn, id)?;
            card.related = load_related(self.conn, id)?;
            return Ok(Some(card));
        }
        Ok(None)
    }

    fn insert(&mut self, card: &Card) -> RepoResult<()> {
        card.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO cards (id, title, content) VALUES (?1, ?2, ?3);",
            params![card.id.as_str(), card.title.as_str(), card.text.as_str()],
        )?;
        replace_tags_in_tx(&tx, &card.id, &card.tags)?;
        replace_links_in_tx(&tx, &card.id, &card.related)?;
        tx.commit()?;
        Ok(())
    }

    fn update_fields(&mut self, id: &str, patch: &CardPatch) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !card_exists_in_tx(&tx, id)? {
            return Err(RepoError::NotFound(id.to_string()));
        }

        if let Some(title) = patch.title.as_deref() {
            tx.execute(
                "UPDATE cards SET title = ?2 WHERE id = ?1;",
                params![id, title],
            )?;
        }
        if let Some(text) = patch.text.as_deref() {
            tx.execute(
                "UPDATE cards SET content = ?2 WHERE id = ?1;",
                params![id, text],
            )?;
        }
        if let Some(tags) = patch.tags.as_ref() {
            replace_tags_in_tx(&tx, id, tags)?;
        }
        if let Some(related) = patch.related.as_ref() {
            replace_links_in_tx(&tx, id, related)?;
        }

        tx.execute(
            "UPDATE cards SET updated_at = (strftime('%s', 'now') * 1000) WHERE id = ?1;",
            [id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM cards WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn replace_tags_in_tx(tx: &Transaction<'_>, id: &str, tags: &BTreeSet<String>) -> RepoResult<()> {
    tx.execute("DELETE FROM card_tags WHERE card_id = ?1;", [id])?;
    for tag in tags {
        tx.execute(
            "INSERT INTO card_tags (card_id, tag) VALUES (?1, ?2);",
            params![id, tag.as_str()],
        )?;
    }
    Ok(())
}

fn replace_links_in_tx(
    tx: &Transaction<'_>,
    id: &str,
    related: &BTreeSet<CardId>,
) -> RepoResult<()> {
    tx.execute("DELETE FROM card_links WHERE card_id = ?1;", [id])?;
    for related_id in related {
        // Insert-select skips ids whose card has vanished instead of
        // tripping the foreign key; cascade tolerance over strictness.
        tx.execute(
            "INSERT INTO card_links (card_id, related_id)
             SELECT ?1, id FROM cards WHERE id = ?2 AND id <> ?1;",
            params![id, related_id.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, id: &str) -> RepoResult<BTreeSet<String>> {
    let mut stmt =
        conn.prepare("SELECT tag FROM card_tags WHERE card_id = ?1 ORDER BY tag ASC;")?;
    let mut rows = stmt.query([id])?;
    let mut tags = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tags.insert(row.get::<_, String>(0)?);
    }
    Ok(tags)
}

fn load_related(conn: &Connection, id: &str) -> RepoResult<BTreeSet<CardId>> {
    let mut stmt = conn
        .prepare("SELECT related_id FROM card_links WHERE card_id = ?1 ORDER BY related_id ASC;")?;
    let mut rows = stmt.query([id])?;
    let mut related = BTreeSet::new();
    while let Some(row) = rows.next()? {
        related.insert(row.get::<_, String>(0)?);
    }
    Ok(related)
}

fn card_exists_in_tx(tx: &Transaction<'_>, id: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM cards WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
