// Tests for the process-wide call session registry
//
// These tests verify idempotent creation under concurrency, transcript
// accumulation order, and idle eviction of unreferenced sessions.

use call_bridge::session::{CallSession, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_get_or_create_returns_same_record() {
    let registry = SessionRegistry::new();

    let first = registry.get_or_create("CA100").await;
    let second = registry.get_or_create("CA100").await;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len().await, 1);
    assert_eq!(first.transcript_text().await, "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_creates_one_record() {
    let registry = SessionRegistry::new();

    let mut handles = Vec::new();
    for i in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            let session = registry.get_or_create("CA-shared").await;
            session.append_fragment(&format!("fragment {}", i)).await;
            session
        }));
    }

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap());
    }

    assert_eq!(registry.len().await, 1);
    for session in &sessions[1..] {
        assert!(Arc::ptr_eq(&sessions[0], session), "Duplicate session record");
    }

    // No lost appends
    assert_eq!(sessions[0].fragment_count().await, 16);
}

#[tokio::test]
async fn test_distinct_calls_are_isolated() {
    let registry = SessionRegistry::new();

    let a = registry.get_or_create("CA-a").await;
    let b = registry.get_or_create("CA-b").await;
    a.append_fragment("lift stuck").await;

    assert_eq!(a.transcript_text().await, "lift stuck");
    assert_eq!(b.transcript_text().await, "");
    assert!(registry.get("CA-c").await.is_none());
}

#[tokio::test]
async fn test_transcript_joins_fragments_in_order() {
    let session = CallSession::new("CA1");
    session.append_fragment("hello").await;
    session.append_fragment("   ").await;
    session.append_fragment(" book a service ").await;

    assert_eq!(session.transcript_text().await, "hello\nbook a service");
    assert_eq!(session.fragment_count().await, 2);
}

#[tokio::test]
async fn test_evict_idle_skips_referenced_sessions() {
    let registry = SessionRegistry::new();

    let held = registry.get_or_create("CA-live").await;
    drop(registry.get_or_create("CA-idle").await);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let evicted = registry.evict_idle(Duration::from_millis(1)).await;

    assert_eq!(evicted, vec!["CA-idle".to_string()]);
    assert!(registry.get("CA-live").await.is_some());
    assert!(registry.get("CA-idle").await.is_none());
    drop(held);
}

#[tokio::test]
async fn test_evict_idle_keeps_recent_sessions() {
    let registry = SessionRegistry::new();
    drop(registry.get_or_create("CA-recent").await);

    let evicted = registry.evict_idle(Duration::from_secs(3600)).await;

    assert!(evicted.is_empty());
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_sweeper_disabled_with_zero_ttl() {
    let registry = SessionRegistry::new();
    assert!(registry
        .spawn_sweeper(Duration::ZERO, Duration::from_secs(60))
        .is_none());
}

#[tokio::test]
async fn test_sweeper_evicts_in_background() {
    let registry = SessionRegistry::new();
    drop(registry.get_or_create("CA-old").await);

    let sweeper = registry
        .spawn_sweeper(Duration::from_millis(10), Duration::from_secs(1))
        .expect("sweeper");

    // The first tick fires immediately; give the session time to age past the TTL first.
    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(registry.is_empty().await);
    sweeper.abort();
}

#[tokio::test]
async fn test_touch_advances_last_activity() {
    let session = CallSession::new("CA1");
    let before = session.last_activity();

    tokio::time::sleep(Duration::from_millis(5)).await;
    session.touch();

    assert!(session.last_activity() > before);
    assert!(session.created_at() <= before);
}
