//! Integration tests for the rating write path
//!
//! Ratings are written through on every call: no caching, no coalescing.
//! The mock transport's expectation counts pin that down.

use async_trait::async_trait;
use bridge_traits::{ResourceKind, Transport, TransportError};
use core_metadata::{MetadataConfig, MetadataError, MetadataManager, SongId};
use core_runtime::events::{ClientEvent, EventBus};
use mockall::mock;
use mockall::predicate::eq;
use serde_json::{json, Value};
use std::sync::Arc;

mock! {
    pub Backend {}

    #[async_trait]
    impl Transport for Backend {
        async fn fetch(&self, resource: ResourceKind, key: &str) -> Result<Value, TransportError>;
        async fn write(&self, resource: ResourceKind, key: &str, payload: Value) -> Result<Value, TransportError>;
    }
}

fn manager(mock: MockBackend) -> MetadataManager {
    MetadataManager::new(MetadataConfig::default(), Arc::new(mock))
}

#[tokio::test]
async fn test_rating_writes_are_never_coalesced() {
    let mut mock = MockBackend::new();
    // No fetch expectation: any fetch would fail the test. Two identical
    // writes in a row must both reach the backend.
    mock.expect_write()
        .with(
            eq(ResourceKind::SongRatings),
            eq("42"),
            eq(json!({"rating": 7})),
        )
        .times(2)
        .returning(|_, _, _| Ok(Value::Null));

    let manager = manager(mock);
    assert_eq!(manager.set_song_ratings(SongId(42), 7).await.unwrap(), 7);
    assert_eq!(manager.set_song_ratings(SongId(42), 7).await.unwrap(), 7);
}

#[tokio::test]
async fn test_rating_confirmation_echoed_by_backend_wins() {
    let mut mock = MockBackend::new();
    mock.expect_write()
        .times(1)
        .returning(|_, _, _| Ok(json!({"rating": 8})));

    let manager = manager(mock);
    assert_eq!(manager.set_song_ratings(SongId(1), 3).await.unwrap(), 8);
}

#[tokio::test]
async fn test_rating_save_publishes_event() {
    let mut mock = MockBackend::new();
    mock.expect_write()
        .times(1)
        .returning(|_, _, _| Ok(Value::Null));

    let bus = EventBus::new(8);
    let mut sub = bus.subscribe();
    let manager = MetadataManager::new(MetadataConfig::default(), Arc::new(mock))
        .with_event_bus(bus.clone());

    manager.set_song_ratings(SongId(5), 9).await.unwrap();

    let event = sub.recv().await.unwrap();
    assert_eq!(
        event,
        ClientEvent::RatingSaved {
            song_id: 5,
            rating: 9,
        }
    );
}

#[tokio::test]
async fn test_rating_write_failure_propagates() {
    let mut mock = MockBackend::new();
    mock.expect_write().times(1).returning(|_, _, _| {
        Err(TransportError::Http {
            status: 500,
            body: "server error".to_string(),
        })
    });

    let manager = manager(mock);
    let err = manager.set_song_ratings(SongId(2), 4).await.unwrap_err();
    assert!(matches!(
        err,
        MetadataError::Transport(TransportError::Http { status: 500, .. })
    ));
}
