//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cardbox_core` wiring: build an
//!   in-memory board, select a card and print the ranked view.

use cardbox_core::db::open_db_in_memory;
use cardbox_core::{CardService, NewCard, Selection, SqliteCardRepository};
use std::collections::BTreeSet;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cardbox_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("cardbox_core version={}", cardbox_core::core_version());

    let mut conn = open_db_in_memory()?;
    let repo = SqliteCardRepository::try_new(&mut conn)?;
    let mut service = CardService::new(repo);

    let alpha = service.create_card(NewCard {
        title: "Alpha".to_string(),
        text: "origin card".to_string(),
        ..NewCard::default()
    })?;
    let beta = service.create_card(NewCard {
        title: "Beta".to_string(),
        related_seed: Some(alpha.id.clone()),
        ..NewCard::default()
    })?;
    service.create_card(NewCard {
        title: "Gamma".to_string(),
        related_seed: Some(beta.id.clone()),
        ..NewCard::default()
    })?;

    let mut selection = Selection::new();
    selection.select(alpha.id.clone());

    let ranked = service.ranked(selection.current(), &BTreeSet::new())?;
    for entry in &ranked.linked {
        let distance = entry
            .distance
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("linked d={distance} {}", entry.card.title);
    }
    for entry in &ranked.unlinked {
        println!("unlinked {}", entry.card.title);
    }

    Ok(())
}
