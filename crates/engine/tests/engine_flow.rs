// crates/engine/tests/engine_flow.rs
//! End-to-end engine behavior over a scripted remote source.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use convo_view_core::{ConversationKind, Filters, InboxPartition};
use convo_view_engine::{ConversationEngine, EngineConfig, SectionOptions};
use convo_view_store::testing::{conversation, page, ConversationExt, ScriptedSource};
use convo_view_store::RefreshMode;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config(dir: &std::path::Path) -> EngineConfig {
    EngineConfig {
        state_dir: dir.to_path_buf(),
        ..EngineConfig::default()
    }
}

async fn engine_with(
    source: Arc<ScriptedSource>,
    dir: &std::path::Path,
) -> ConversationEngine {
    ConversationEngine::open(config(dir), source).await
}

fn section_ids(section: &[convo_view_core::Conversation]) -> Vec<&str> {
    section.iter().map(|c| c.id.as_str()).collect()
}

#[tokio::test]
async fn test_startup_full_refresh_populates_view() -> Result<()> {
    init_tracing();
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![
                conversation("c1")
                    .with_title("Jane Doe")
                    .with_last_activity("2026-08-01T10:00:00Z"),
                conversation("c2")
                    .with_title("Ops crew")
                    .with_last_activity("2026-08-02T10:00:00Z"),
            ],
            false,
            Some("n1"),
            Some("o1"),
        ),
    );

    let dir = tempfile::tempdir()?;
    let engine = engine_with(source.clone(), dir.path()).await;
    engine.start().await;

    assert!(engine.last_refresh_error().is_none());
    // Empty persisted state means the startup policy walked history (Older)
    // across all three partitions.
    assert_eq!(source.total_calls(), 3);

    let sections = engine.ranked_view("", Filters::default(), SectionOptions::default());
    // Empty query: pure recency order.
    assert_eq!(section_ids(&sections.other), vec!["c2", "c1"]);
    Ok(())
}

#[tokio::test]
async fn test_query_ranks_prefix_title_above_participant_match() {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![
                conversation("by-title")
                    .with_title("Jane Doe")
                    .with_last_activity("2026-08-01T10:00:00Z"),
                conversation("by-participant")
                    .with_title("Weekend plans")
                    .with_participant_names(&["Jane Smith"])
                    .with_last_activity("2026-08-01T10:00:00Z"),
            ],
            false,
            None,
            None,
        ),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source, dir.path()).await;
    engine.start().await;

    let sections = engine.ranked_view("jane", Filters::default(), SectionOptions::default());
    assert_eq!(section_ids(&sections.other), vec!["by-title", "by-participant"]);
}

#[tokio::test]
async fn test_conjunctive_query_drops_partial_matches() {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![
                conversation("both").with_title("Alice and Bob"),
                conversation("alice-only").with_title("Alice solo"),
                conversation("bob-only").with_title("Bob solo"),
            ],
            false,
            None,
            None,
        ),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source, dir.path()).await;
    engine.start().await;

    let sections = engine.ranked_view("alice bob", Filters::default(), SectionOptions::default());
    assert_eq!(section_ids(&sections.other), vec!["both"]);
}

#[tokio::test]
async fn test_filters_apply_before_sectioning() {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![
                conversation("direct")
                    .with_kind(ConversationKind::Single)
                    .with_unread(1),
                conversation("group")
                    .with_kind(ConversationKind::Group)
                    .with_unread(2),
                conversation("muted")
                    .with_kind(ConversationKind::Single)
                    .with_muted(),
            ],
            false,
            None,
            None,
        ),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source, dir.path()).await;
    engine.start().await;

    let filters = Filters {
        kind: Some(ConversationKind::Single),
        unread_only: true,
        ..Default::default()
    };
    let sections = engine.ranked_view("", filters, SectionOptions::default());
    // Muted is excluded by default, the group chat by kind.
    assert_eq!(section_ids(&sections.other), vec!["direct"]);
}

#[tokio::test]
async fn test_visits_feed_recent_section() {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![conversation("c1"), conversation("c2"), conversation("c3")],
            false,
            None,
            None,
        ),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source, dir.path()).await;
    engine.start().await;

    engine.record_visit("c1").await;
    engine.record_visit("c2").await;
    engine.record_visit("c1").await;

    let sections = engine.ranked_view("", Filters::default(), SectionOptions::all());
    // De-duplicated, most recent first.
    assert_eq!(section_ids(&sections.recent), vec!["c1", "c2"]);
    assert_eq!(section_ids(&sections.other), vec!["c3"]);
}

#[tokio::test]
async fn test_failed_refresh_keeps_prior_view_and_reports() {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(vec![conversation("c1")], false, Some("n1"), None),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source.clone(), dir.path()).await;
    engine.start().await;
    assert!(engine.last_refresh_error().is_none());

    let before = engine.ranked_view("", Filters::default(), SectionOptions::default());

    // Manual refresh where one partition blows up mid-flight.
    source.push_page(
        InboxPartition::Primary,
        page(vec![conversation("c2")], false, Some("n2"), None),
    );
    source.push_error(InboxPartition::Archive, "HTTP 503");
    engine.request_refresh(RefreshMode::Incremental);

    wait_until(|| !engine.busy() && engine.last_refresh_error().is_some()).await;

    let after = engine.ranked_view("", Filters::default(), SectionOptions::default());
    assert_eq!(section_ids(&after.other), section_ids(&before.other));
}

#[tokio::test]
async fn test_request_refresh_is_single_flight() {
    init_tracing();
    let source = Arc::new(ScriptedSource::new());
    source.set_response_delay(Duration::from_millis(50));
    source.push_page(
        InboxPartition::Primary,
        page(vec![conversation("c1")], false, None, None),
    );

    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(source.clone(), dir.path()).await;

    engine.request_refresh(RefreshMode::Full);
    // Let the first spawned refresh take the single-flight lock.
    tokio::time::sleep(Duration::from_millis(10)).await;
    engine.request_refresh(RefreshMode::Full);

    wait_until(|| !engine.busy() && source.total_calls() >= 3).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Exactly one fetch sequence: one page request per partition.
    assert_eq!(source.total_calls(), 3);
}

#[tokio::test]
async fn test_view_survives_restart_from_persisted_state() -> Result<()> {
    let source = Arc::new(ScriptedSource::new());
    source.push_page(
        InboxPartition::Primary,
        page(
            vec![conversation("c1").with_title("Jane Doe")],
            false,
            Some("n1"),
            None,
        ),
    );

    let dir = tempfile::tempdir()?;
    {
        let engine = engine_with(source, dir.path()).await;
        engine.start().await;
        engine.record_visit("c1").await;
    }

    // New engine, remote unavailable: the persisted mirror still serves.
    let offline = Arc::new(ScriptedSource::new());
    let engine = engine_with(offline, dir.path()).await;
    let sections = engine.ranked_view("jane", Filters::default(), SectionOptions::all());
    assert_eq!(section_ids(&sections.recent), vec!["c1"]);
    Ok(())
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
