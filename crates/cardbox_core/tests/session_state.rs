use cardbox_core::db::open_db_in_memory;
use cardbox_core::{
    CardService, FilterState, MemorySessionStore, NewCard, Selection, SqliteCardRepository,
};

#[test]
fn reselecting_the_selected_card_deselects() {
    let mut selection = Selection::new();
    selection.select("a");
    selection.select("a");
    assert_eq!(selection.current(), None);
}

#[test]
fn deleting_the_selected_card_clears_the_selection() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = CardService::new(repo);
    let mut selection = Selection::new();

    let keep = service
        .create_card(NewCard {
            title: "Keep".to_string(),
            ..NewCard::default()
        })
        .unwrap()
        .id;
    let doomed = service
        .create_card(NewCard {
            title: "Doomed".to_string(),
            ..NewCard::default()
        })
        .unwrap()
        .id;

    selection.select(doomed.clone());
    assert!(service.delete_card(&doomed).unwrap());
    selection.clear_if(&doomed);
    assert_eq!(selection.current(), None);

    // Deleting a non-selected card leaves the selection alone.
    selection.select(keep.clone());
    selection.clear_if(&doomed);
    assert_eq!(selection.current(), Some(keep.as_str()));
}

#[test]
fn card_mutations_do_not_touch_filter_state() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqliteCardRepository::try_new(&mut conn).unwrap();
    let mut service = CardService::new(repo);

    let mut filter = FilterState::new();
    filter.add("x");

    let card = service
        .create_card(NewCard {
            title: "Card".to_string(),
            ..NewCard::default()
        })
        .unwrap();
    service.add_tag(&card.id, "x").unwrap();
    service.delete_card(&card.id).unwrap();

    assert!(filter.tags().contains("x"));
    assert_eq!(filter.tags().len(), 1);
}

#[test]
fn session_state_survives_a_simulated_reload() {
    let mut store = MemorySessionStore::new();

    {
        let mut selection = Selection::new();
        selection.select("alpha-1");
        selection.persist(&mut store);

        let mut filter = FilterState::new();
        filter.add("x");
        filter.add("y");
        filter.persist(&mut store);
    }

    let selection = Selection::restore(&store);
    let filter = FilterState::restore(&store);
    assert_eq!(selection.current(), Some("alpha-1"));
    assert_eq!(filter.tags().len(), 2);
    assert!(filter.tags().contains("x"));
}

#[test]
fn empty_store_restores_to_defaults() {
    let store = MemorySessionStore::new();
    assert_eq!(Selection::restore(&store).current(), None);
    assert!(FilterState::restore(&store).is_empty());
}
