//! Concurrency tests for ImageStore lock scopes.
//!
//! A slow image host (wiremock with a response delay) keeps a save in flight
//! while other operations race against it.

use setu_core::config::StoreConfig;
use setu_core::LockScope;
use setu_store::ImageStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const SLOW: Duration = Duration::from_millis(600);

async fn slow_image_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"fake image bytes".to_vec())
                .set_delay(SLOW),
        )
        .mount(&server)
        .await;
    server
}

fn open_store(dir: &tempfile::TempDir, scope: LockScope) -> Arc<ImageStore> {
    Arc::new(
        ImageStore::new(
            dir.path(),
            &StoreConfig::default().extensions,
            scope,
            Duration::from_secs(5),
        )
        .unwrap(),
    )
}

/// Delete of the same file issued mid-download waits for the save to finish,
/// then removes the completed file.
#[tokio::test]
async fn test_same_file_save_and_delete_do_not_interleave() {
    let server = slow_image_server().await;
    let dir = tempfile::TempDir::new().unwrap();
    let store = open_store(&dir, LockScope::PerFile);
    let url = format!("{}/1_p0.png", server.uri());

    let s = store.clone();
    let save = tokio::spawn(async move { s.save(&url, "1_p0.png").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let s = store.clone();
    let delete = tokio::spawn(async move { s.delete("1_p0.png").await });

    assert!(save.await.unwrap());
    assert!(delete.await.unwrap(), "delete must see the finished file");
    assert!(!store.path_of("1_p0.png").exists());
}

/// Under the global scope a save for one request blocks a delete for another.
#[tokio::test]
async fn test_global_scope_serializes_unrelated_files() {
    let server = slow_image_server().await;
    let dir = tempfile::TempDir::new().unwrap();
    let store = open_store(&dir, LockScope::Global);
    std::fs::write(store.path_of("other.png"), b"x").unwrap();
    let url = format!("{}/a.png", server.uri());

    let s = store.clone();
    let save = tokio::spawn(async move { s.save(&url, "a.png").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    assert!(store.delete("other.png").await);
    let waited = started.elapsed();

    assert!(save.await.unwrap());
    assert!(
        waited >= Duration::from_millis(300),
        "delete finished after {:?}; it should have waited for the save",
        waited
    );
}

/// Under the per-file scope unrelated files proceed independently.
#[tokio::test]
async fn test_per_file_scope_allows_unrelated_files() {
    let server = slow_image_server().await;
    let dir = tempfile::TempDir::new().unwrap();
    let store = open_store(&dir, LockScope::PerFile);
    std::fs::write(store.path_of("other.png"), b"x").unwrap();
    let url = format!("{}/a.png", server.uri());

    let s = store.clone();
    let save = tokio::spawn(async move { s.save(&url, "a.png").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let started = Instant::now();
    assert!(store.delete("other.png").await);
    let waited = started.elapsed();

    assert!(save.await.unwrap());
    assert!(
        waited < Duration::from_millis(300),
        "delete of an unrelated file took {:?}",
        waited
    );
}

/// Purge waits for in-flight saves, so nothing survives it.
#[tokio::test]
async fn test_purge_waits_for_inflight_save() {
    let server = slow_image_server().await;
    let dir = tempfile::TempDir::new().unwrap();
    let store = open_store(&dir, LockScope::PerFile);
    let url = format!("{}/late.png", server.uri());

    let s = store.clone();
    let save = tokio::spawn(async move { s.save(&url, "late.png").await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.purge().await, 1);
    assert!(save.await.unwrap());
    assert!(store.list_images().await.is_empty());
}
