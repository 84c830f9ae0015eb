//! End-to-end resolution over a real in-memory store

use infinit_core::{
    AliasIndex, EntityResolver, IngestOutcome, IngestRequest, MatchMethod, NameNormalizer,
    Resolution, ResolutionConfig, TokenSetRatio, ingest_document,
};
use infinit_domain::{AliasKind, MovementId, NewAlias, NewMovement};
use infinit_store::{SqliteStore, Store};
use proptest::prelude::*;

struct Fixture {
    store: SqliteStore,
    normalizer: NameNormalizer,
    rodina: MovementId,
    sjednocena: MovementId,
    jehovovi: MovementId,
    sincchondzi: MovementId,
}

fn fixture() -> Fixture {
    let store = SqliteStore::open_in_memory().unwrap();
    let rodina = store.insert_movement(NewMovement::named("Rodina")).unwrap();
    let sjednocena = store
        .insert_movement(NewMovement::named("Hnutí Sjednocená rodina"))
        .unwrap();
    let jehovovi = store
        .insert_movement(NewMovement::named("Svědkové Jehovovi"))
        .unwrap();
    let sincchondzi = store
        .insert_movement(NewMovement::named("Šinčchondží"))
        .unwrap();
    store
        .insert_alias(NewAlias::new(jehovovi, "jehovisté", AliasKind::Configured))
        .unwrap();
    Fixture {
        store,
        normalizer: NameNormalizer::default(),
        rodina,
        sjednocena,
        jehovovi,
        sincchondzi,
    }
}

fn resolve(fixture: &Fixture, text: &str) -> Resolution {
    let index = AliasIndex::build(
        &ResolutionConfig::default(),
        &fixture.store,
        &fixture.normalizer,
    )
    .unwrap();
    let similarity = TokenSetRatio;
    let resolver = EntityResolver::new(&index, &fixture.normalizer, &similarity, 80);
    resolver.resolve(text)
}

#[test]
fn test_longest_canonical_substring_wins() {
    let fixture = fixture();
    let resolution = resolve(
        &fixture,
        "Reportáž o Hnutí Sjednocená rodina natočená loni",
    );
    assert_eq!(
        resolution,
        Resolution::Found {
            movement: fixture.sjednocena,
            method: MatchMethod::CanonicalSubstring,
            score: 100,
        }
    );
}

#[test]
fn test_shorter_name_matches_when_alone() {
    let fixture = fixture();
    let resolution = resolve(&fixture, "Co je Rodina a odkud přišla");
    assert_eq!(resolution.movement(), Some(fixture.rodina));
}

#[test]
fn test_alias_substring_is_second_tier() {
    let fixture = fixture();
    let resolution = resolve(&fixture, "u dveří zvonili jehovisté");
    assert_eq!(
        resolution,
        Resolution::Found {
            movement: fixture.jehovovi,
            method: MatchMethod::AliasSubstring,
            score: 100,
        }
    );
}

#[test]
fn test_fuzzy_catches_ascii_spelling() {
    let fixture = fixture();
    // No verbatim substring of the canonical name, but all folded name
    // tokens appear in the folded text.
    let resolution = resolve(&fixture, "zpráva o skupině Sincchondzi z Koreje");
    match resolution {
        Resolution::Found {
            movement,
            method,
            score,
        } => {
            assert_eq!(movement, fixture.sincchondzi);
            assert_eq!(method, MatchMethod::FuzzyCanonical);
            assert!(score >= 80);
        }
        Resolution::NotFound => panic!("expected a fuzzy match"),
    }
}

#[test]
fn test_empty_and_unrelated_text() {
    let fixture = fixture();
    assert_eq!(resolve(&fixture, ""), Resolution::NotFound);
    assert_eq!(resolve(&fixture, "   \t "), Resolution::NotFound);
    assert_eq!(
        resolve(&fixture, "předpověď počasí na středu"),
        Resolution::NotFound
    );
}

#[test]
fn test_ingest_gates_duplicates_and_attributes() {
    let fixture = fixture();
    let index = AliasIndex::build(
        &ResolutionConfig::default(),
        &fixture.store,
        &fixture.normalizer,
    )
    .unwrap();
    let similarity = TokenSetRatio;
    let resolver = EntityResolver::new(&index, &fixture.normalizer, &similarity, 80);

    let request = IngestRequest {
        url: "https://zpravy.example.cz/clanek-1".to_string(),
        title: "Svědkové Jehovovi v Brně".to_string(),
        text: "Dlouhý text o společenství.".to_string(),
        published_at: None,
    };

    let outcome = ingest_document(&fixture.store, &resolver, request.clone()).unwrap();
    let inserted = match outcome {
        IngestOutcome::Inserted { id, resolution } => {
            assert_eq!(resolution.movement(), Some(fixture.jehovovi));
            id
        }
        other => panic!("expected insert, got {:?}", other),
    };
    let stored = fixture.store.source(inserted).unwrap().unwrap();
    assert_eq!(stored.movement_id, Some(fixture.jehovovi));
    assert!(stored.fingerprint.is_some());

    // Same URL again
    let outcome = ingest_document(&fixture.store, &resolver, request.clone()).unwrap();
    assert!(matches!(
        outcome,
        IngestOutcome::DuplicateUrl { existing } if existing.id == inserted
    ));

    // Same content, different URL
    let rehosted = IngestRequest {
        url: "https://mirror.example.cz/clanek-1".to_string(),
        ..request
    };
    let outcome = ingest_document(&fixture.store, &resolver, rehosted).unwrap();
    assert!(matches!(
        outcome,
        IngestOutcome::DuplicateContent { existing } if existing.id == inserted
    ));
    assert_eq!(fixture.store.sources().unwrap().len(), 1);
}

#[test]
fn test_ingest_rejects_invalid_url() {
    let fixture = fixture();
    let index = AliasIndex::build(
        &ResolutionConfig::default(),
        &fixture.store,
        &fixture.normalizer,
    )
    .unwrap();
    let similarity = TokenSetRatio;
    let resolver = EntityResolver::new(&index, &fixture.normalizer, &similarity, 80);

    let request = IngestRequest {
        url: "not a url".to_string(),
        title: String::new(),
        text: "text".to_string(),
        published_at: None,
    };
    assert!(ingest_document(&fixture.store, &resolver, request).is_err());
}

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(input in "\\PC{0,60}") {
        let normalizer = NameNormalizer::default();
        let once = normalizer.normalize(&input);
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn prop_normalize_output_is_folded(input in "\\PC{0,60}") {
        let normalizer = NameNormalizer::default();
        let out = normalizer.normalize(&input);
        prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
        prop_assert!(!out.contains("  "));
        prop_assert_eq!(out.trim(), out.as_str());
    }
}
