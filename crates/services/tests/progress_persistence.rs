use std::sync::Arc;

use serde_json::json;
use services::{AppServices, Clock, SelectionError, StoreSettings};
use storage::catalog::{JsonCatalog, WordCatalog};
use vocab_core::model::{Category, TraversalMode};
use vocab_core::time::fixed_now;

fn catalog() -> Arc<dyn WordCatalog> {
    Arc::new(JsonCatalog::from_words([
        (Category::Verbs, vec![json!({"word": "run"}); 50]),
        (Category::Nouns, vec![json!({"word": "house"}); 10]),
    ]))
}

async fn open(url: &str) -> AppServices {
    AppServices::new_sqlite(url, catalog(), Clock::fixed(fixed_now()), StoreSettings::default())
        .await
        .expect("open services")
}

#[tokio::test]
async fn flushed_progress_survives_a_restart() {
    let url = "sqlite:file:memdb_services_restart?mode=memory&cache=shared";
    let first = open(url).await;
    let engine = first.engine();

    let bob = engine
        .select_next("bob", "nouns", TraversalMode::Ordered, 7)
        .await
        .unwrap();
    assert_eq!(bob.index, 7);
    let alice = engine
        .select_next("alice", "verbs", TraversalMode::Unordered, 0)
        .await
        .unwrap();

    let report = first.flush().await.unwrap();
    assert_eq!(report.written, 2);
    assert_eq!(first.store().pending(), 0);

    // `first` stays alive so the shared in-memory database is kept.
    let second = open(url).await;
    let bob_view = second.engine().overview("bob", "nouns").unwrap();
    assert_eq!(bob_view.count, 10);
    assert_eq!(bob_view.cursor, engine.overview("bob", "nouns").unwrap().cursor);

    let alice_cursor = second
        .engine()
        .overview("alice", "verbs")
        .unwrap()
        .cursor
        .unwrap();
    assert_eq!(alice_cursor.last_index(), alice.index);
    assert_eq!(alice_cursor.mode(), TraversalMode::Unordered);

    // The reloaded cursor still drives the no-repeat rule.
    let next = second
        .engine()
        .select_next("alice", "verbs", TraversalMode::Unordered, 0)
        .await
        .unwrap();
    assert_ne!(next.index, alice.index);
}

#[tokio::test]
async fn unflushed_progress_is_not_visible_after_a_restart() {
    let url = "sqlite:file:memdb_services_unflushed?mode=memory&cache=shared";
    let first = open(url).await;
    first
        .engine()
        .select_next("carol", "verbs", TraversalMode::Ordered, 3)
        .await
        .unwrap();

    let second = open(url).await;
    assert_eq!(second.store().cursor_count(), 0);
    assert_eq!(first.store().pending(), 1);
}

#[tokio::test]
async fn bad_requests_leave_storage_untouched() {
    let url = "sqlite:file:memdb_services_rejects?mode=memory&cache=shared";
    let services = open(url).await;
    let engine = services.engine();

    let err = engine
        .select_next("bob", "nouns", TraversalMode::Ordered, 12)
        .await
        .unwrap_err();
    assert!(matches!(err, SelectionError::OutOfRangeIndex { index: 12, count: 10 }));

    let err = engine
        .select_next("bob", "unknown_category", TraversalMode::Ordered, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, SelectionError::UnknownCategory(_)));

    let report = services.flush().await.unwrap();
    assert_eq!(report.written, 0);
}
