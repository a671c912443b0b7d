use cardbox_core::db::migrations::latest_version;
use cardbox_core::db::{open_db, open_db_in_memory};
use cardbox_core::{SqliteCardRepository, RepoError};

#[test]
fn fresh_database_lands_on_latest_version() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
}

#[test]
fn reopening_a_database_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cards.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO cards (id, title) VALUES ('a-1', 'Alpha');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM cards;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn repository_rejects_unmigrated_connections() {
    let mut conn = rusqlite::Connection::open_in_memory().unwrap();
    let error = SqliteCardRepository::try_new(&mut conn).unwrap_err();
    assert!(matches!(error, RepoError::MissingRequiredTable(_)));
}

#[test]
fn foreign_keys_enforce_link_cascade_at_schema_level() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO cards (id, title) VALUES ('a-1', 'Alpha');
         INSERT INTO cards (id, title) VALUES ('b-1', 'Beta');
         INSERT INTO card_links (card_id, related_id) VALUES ('a-1', 'b-1');
         INSERT INTO card_links (card_id, related_id) VALUES ('b-1', 'a-1');
         DELETE FROM cards WHERE id = 'b-1';",
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM card_links;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}
