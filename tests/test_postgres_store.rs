//! `PostgresStore` against a live database. Runs only when `DATABASE_URL` is set.

use color_sync_hub::domain::source::NewSource;
use color_sync_hub::{EntityKind, PostgresStore, SourceStatus, StorageError, SyncStore};
use serde_json::json;
use std::env;

async fn connect() -> Option<PostgresStore> {
    dotenv::dotenv().ok();
    let Ok(url) = env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set, skipping Postgres store test");
        return None;
    };
    Some(PostgresStore::connect(&url, 2).await.unwrap())
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn upsert_reports_insert_then_update() {
    let Some(store) = connect().await else {
        return;
    };
    let slug = unique("ruby-red");
    let first = json!({
        "slug": slug,
        "name": "Ruby Red",
        "hex": "#E0115F",
        "hue": "337",
        "source_app": "Trainer",
        "synced_at": "2024-05-01T10:00:00Z"
    });
    let inserted = store
        .upsert(EntityKind::Color, first.as_object().unwrap())
        .await
        .unwrap();
    assert!(inserted.inserted);

    let second = json!({ "slug": slug, "name": "Ruby" });
    let updated = store
        .upsert(EntityKind::Color, second.as_object().unwrap())
        .await
        .unwrap();
    assert!(!updated.inserted);
    assert_eq!(updated.id, inserted.id);

    let lookup = store.load_lookup(EntityKind::Color).await.unwrap();
    let entry = lookup.iter().find(|e| e.id == inserted.id).unwrap();
    assert_eq!(entry.slug.as_deref(), Some(slug.as_str()));
    assert_eq!(entry.name.as_deref(), Some("Ruby"));

    let hex: Option<String> = sqlx::query_scalar("SELECT hex FROM colors WHERE slug = $1")
        .bind(&slug)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(hex.as_deref(), Some("#E0115F"));
}

#[tokio::test]
async fn upsert_rejects_bad_records() {
    let Some(store) = connect().await else {
        return;
    };
    let missing_key = json!({ "year": 1900 });
    let err = store
        .upsert(EntityKind::Painting, missing_key.as_object().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingConflictKey { .. }));

    let bad_year = json!({ "title": unique("painting"), "year": "circa 1900" });
    let err = store
        .upsert(EntityKind::Painting, bad_year.as_object().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidValue { .. }));
}

#[tokio::test]
async fn source_registration_and_status() {
    let Some(store) = connect().await else {
        return;
    };
    let registration = NewSource {
        app_name: unique("trainer"),
        app_url: "https://trainer.example".to_string(),
        export_endpoint: "/export".to_string(),
    };
    let source = store.register_source(&registration).await.unwrap();
    assert_eq!(source.status, SourceStatus::Registered);

    let at = chrono::Utc::now();
    store
        .set_source_status(source.id, SourceStatus::Completed, Some(at))
        .await
        .unwrap();
    store
        .set_source_status(source.id, SourceStatus::Failed, None)
        .await
        .unwrap();
    let stored = store.get_source(source.id).await.unwrap().unwrap();
    assert_eq!(stored.status, SourceStatus::Failed);
    assert!(stored.last_sync_at.is_some());

    let again = store.register_source(&registration).await.unwrap();
    assert_eq!(again.id, source.id);
    assert_eq!(again.status, SourceStatus::Registered);
}
