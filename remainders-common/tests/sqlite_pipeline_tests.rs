//! Integration tests: result pipeline over the SQLite record source
//!
//! Each test seeds a private in-memory database with the `sended` table and
//! drives `resolve_latest` / `resolve_search` end to end.

use std::sync::Arc;

use remainders_common::resolve::{RoleEntry, RolePolicy, RoleTable};
use remainders_common::source::{MemoryRecordSource, RecordSource, SqliteRecordSource};
use remainders_common::{Error, FanoutEngine, ResultPipeline, SearchPhrase};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Test helper: in-memory database with schema
async fn setup_db() -> SqlitePool {
    // one connection: every sqlite::memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");

    sqlx::query(
        r#"
        CREATE TABLE sended (
            "to"       TEXT NOT NULL,
            title      TEXT NOT NULL,
            message    TEXT NOT NULL,
            "type"     TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await
    .expect("Should create table");

    pool
}

/// Test helper: insert one stored record
async fn insert(pool: &SqlitePool, to: &str, title: &str, message: &str, updated_at: &str) {
    sqlx::query(r#"INSERT INTO sended ("to", title, message, "type", updated_at) VALUES (?, ?, ?, 'reminder', ?)"#)
        .bind(to)
        .bind(title)
        .bind(message)
        .bind(updated_at)
        .execute(pool)
        .await
        .expect("Should insert record");
}

fn engine() -> FanoutEngine {
    let roles = RoleTable::new(
        vec![
            RoleEntry::new("teacher", "T"),
            RoleEntry::new("student", "profiles/"),
            RoleEntry::new("personel", ""),
        ],
        "anonymous",
    )
    .unwrap();
    FanoutEngine::with_policy(roles, RolePolicy::Token)
}

fn pipeline(pool: SqlitePool) -> ResultPipeline {
    ResultPipeline::new(Arc::new(SqliteRecordSource::new(pool)), engine())
}

// =============================================================================
// Record source
// =============================================================================

#[tokio::test]
async fn test_fetch_sorted_newest_first() {
    let pool = setup_db().await;
    insert(&pool, "#role#teacher1@a@x.example", "old", "", "2024-01-01T08:00:00Z").await;
    insert(&pool, "#role#teacher2@b@x.example", "new", "", "2024-01-03T08:00:00Z").await;
    insert(&pool, "#role#teacher3@c@x.example", "mid", "", "2024-01-02T08:00:00Z").await;

    let source = SqliteRecordSource::new(pool);
    let records = source.fetch(10, None).await.unwrap();

    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["new", "mid", "old"]);
    assert_eq!(records[0].kind, "reminder");
}

#[tokio::test]
async fn test_fetch_filter_case_insensitive_with_dot_wildcard() {
    let pool = setup_db().await;
    insert(&pool, "#role#teacher1@Bob.Smith@x.example", "bob", "", "2024-01-01T08:00:00Z").await;
    insert(&pool, "#role#teacher2@bobXsmith@x.example", "bobx", "", "2024-01-02T08:00:00Z").await;
    insert(&pool, "#role#teacher3@alice@x.example", "alice", "", "2024-01-03T08:00:00Z").await;

    let source = SqliteRecordSource::new(pool);
    let phrase = SearchPhrase::parse("bob.smith").unwrap();
    let records = source.fetch(10, Some(&phrase)).await.unwrap();

    // "." behaves like a regex wildcard at query level
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["bobx", "bob"]);
}

#[tokio::test]
async fn test_fetch_orders_by_instant_across_offsets_and_precision() {
    let pool = setup_db().await;
    // 10:00+05:00 is 05:00Z, an hour before 06:00Z
    insert(&pool, "#role#teacher1@a@x.example", "older", "", "2024-01-01T10:00:00+05:00").await;
    insert(&pool, "#role#teacher2@b@x.example", "newer", "", "2024-01-01T06:00:00Z").await;
    insert(&pool, "#role#teacher3@c@x.example", "frac_newer", "", "2024-01-02T08:00:00.500Z").await;
    insert(&pool, "#role#teacher4@d@x.example", "frac_older", "", "2024-01-02T08:00:00Z").await;

    let source = SqliteRecordSource::new(pool);
    let records = source.fetch(10, None).await.unwrap();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["frac_newer", "frac_older", "newer", "older"]);

    // Same order as the in-memory source, which sorts on parsed timestamps
    let mut shuffled = records.clone();
    shuffled.reverse();
    let memory = MemoryRecordSource::new(shuffled);
    let memory_titles: Vec<String> = memory
        .fetch(10, None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(memory_titles, titles);

    // The limit keeps the newest instants
    let limited = source.fetch(3, None).await.unwrap();
    let titles: Vec<&str> = limited.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["frac_newer", "frac_older", "newer"]);

    let phrase = SearchPhrase::parse("x.example").unwrap();
    let filtered = source.fetch(2, Some(&phrase)).await.unwrap();
    let titles: Vec<&str> = filtered.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["frac_newer", "frac_older"]);
}

#[tokio::test]
async fn test_fetch_missing_table_is_source_unavailable() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    let source = SqliteRecordSource::new(pool);
    assert!(matches!(
        source.fetch(10, None).await,
        Err(Error::SourceUnavailable(_))
    ));
}

#[tokio::test]
async fn test_undecodable_rows_skipped() {
    let pool = setup_db().await;
    insert(&pool, "#role#teacher1@a@x.example", "good", "", "2024-01-01T08:00:00Z").await;
    insert(&pool, "#role#teacher2@b@x.example", "bad", "", "not a timestamp").await;

    let records = SqliteRecordSource::new(pool).fetch(10, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "good");
}

// =============================================================================
// Latest
// =============================================================================

#[tokio::test]
async fn test_latest_end_to_end() {
    let pool = setup_db().await;
    insert(
        &pool,
        "#role#teacher42@a@b.example#role#personel7@p@b.example",
        "Meeting",
        "Visit #SLUG#",
        "2024-04-01T10:00:00Z",
    )
    .await;

    let out = pipeline(pool).resolve_latest().await.unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].to, "a@b.example");
    assert_eq!(out[0].message, "Visit T42");
    assert_eq!(out[1].to, "p@b.example");
    assert_eq!(out[1].message, "Visit ");
    assert!(out.iter().all(|r| r.title == "Meeting"));
}

#[tokio::test]
async fn test_latest_limited_to_25_stored_records() {
    let pool = setup_db().await;
    for i in 0..30 {
        insert(
            &pool,
            &format!("#role#teacher{}@u{}@x.example", i, i),
            &format!("r{}", i),
            "#SLUG#",
            &format!("2024-01-01T00:{:02}:00Z", i),
        )
        .await;
    }

    let out = pipeline(pool).resolve_latest().await.unwrap();
    assert_eq!(out.len(), 25);
    assert_eq!(out[0].to, "u29@x.example");
    assert_eq!(out[24].to, "u5@x.example");
}

#[tokio::test]
async fn test_latest_malformed_record_aborts() {
    let pool = setup_db().await;
    insert(&pool, "#role#teacher1@a@x.example", "ok", "", "2024-01-01T08:00:00Z").await;
    insert(&pool, "#role#student5parent", "broken", "", "2024-01-02T08:00:00Z").await;

    match pipeline(pool).resolve_latest().await {
        Err(Error::MalformedRecipientSegment { record, segment }) => {
            assert_eq!(segment, "student5parent");
            assert!(record.contains("broken"));
        }
        other => panic!("expected MalformedRecipientSegment, got {:?}", other),
    }
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_two_stage_filter() {
    let pool = setup_db().await;
    insert(
        &pool,
        "#role#student11@bob@x.example#role#student12@carol@x.example",
        "Grades",
        "https://school.example/#SLUG#",
        "2024-01-01T08:00:00Z",
    )
    .await;
    insert(&pool, "#role#teacher3@dave@x.example", "Other", "", "2024-01-02T08:00:00Z").await;

    let out = pipeline(pool).resolve_search("bob").await.unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to, "bob@x.example");
    assert_eq!(out[0].message, "https://school.example/profiles/11");
}

#[tokio::test]
async fn test_search_unknown_role_dropped_not_failed() {
    let pool = setup_db().await;
    insert(&pool, "#role#unknownrole7@bob@y.example", "x", "", "2024-01-01T08:00:00Z").await;

    let out = pipeline(pool).resolve_search("bob").await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_search_rejects_empty_phrase() {
    let pool = setup_db().await;

    assert!(matches!(
        pipeline(pool).resolve_search("%").await,
        Err(Error::SanitizationEmpty)
    ));
}
