use std::time::Duration;

use axum::http::StatusCode;
use rstest::rstest;
use tessera::prelude::*;
use tessera_test_utils::{
    ChunkServer, Xorshift64, chunk_path, expected_stream, listing_body, listing_record,
};

use crate::common::{config_for, memory_env, settle, tracing_setup};

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn rebuilds_both_groups_from_a_shuffled_listing(_tracing_setup: ()) {
    let server = ChunkServer::start().await;
    let id = SessionId::new("rec-42");
    server.publish(&id, StreamGroup::Webcam, &[0, 1, 2, 3, 4, 5]);
    server.publish(&id, StreamGroup::Screenshare, &[0, 1, 2, 3]);
    let mut records: Vec<_> = (0..6)
        .map(|i| listing_record(&id, StreamGroup::Webcam, i))
        .chain((0..4).map(|i| listing_record(&id, StreamGroup::Screenshare, i)))
        .collect();
    Xorshift64::new(0xfeed).shuffle(&mut records);
    server.set_listing(&id, listing_body(records));

    let env = memory_env();
    let mut session = config_for(&server).with_prefetch(3).session(env.clone()).unwrap();
    session
        .show(id.clone(), &[StreamGroup::Webcam, StreamGroup::Screenshare])
        .await
        .unwrap();

    let webcam = settle(&session, StreamGroup::Webcam).await;
    let screen = settle(&session, StreamGroup::Screenshare).await;

    assert_eq!(webcam.status, AssemblyStatus::Ready);
    assert_eq!(screen.status, AssemblyStatus::Ready);
    assert_eq!(webcam.progress(), (6, 6));
    assert_eq!(screen.progress(), (4, 4));
    assert_eq!(
        env.bytes(StreamGroup::Webcam),
        expected_stream(StreamGroup::Webcam, 0..6)
    );
    assert_eq!(
        env.bytes(StreamGroup::Screenshare),
        expected_stream(StreamGroup::Screenshare, 0..4)
    );
    assert!(matches!(webcam.autoplay, AutoplayOutcome::Blocked(_)));

    session.stop().await;
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn server_error_on_one_chunk_leaves_a_gap(_tracing_setup: ()) {
    let server = ChunkServer::start().await;
    let id = SessionId::new("rec-7");
    server.publish(&id, StreamGroup::Webcam, &[0, 1, 2]);
    let broken = chunk_path(&id, StreamGroup::Webcam, 1);
    server.fail(&broken, StatusCode::SERVICE_UNAVAILABLE);

    let env = memory_env();
    let mut session = config_for(&server).session(env.clone()).unwrap();
    session.start(id, StreamGroup::Webcam).await.unwrap();
    let state = settle(&session, StreamGroup::Webcam).await;

    assert_eq!(state.status, AssemblyStatus::Ready);
    assert_eq!(state.progress(), (3, 3));
    assert_eq!(
        env.bytes(StreamGroup::Webcam),
        expected_stream(StreamGroup::Webcam, [0, 2])
    );
    let Some(AssemblyError::PartialChunkFailure { failed, .. }) = state.last_error else {
        panic!("expected a partial failure");
    };
    assert_eq!(failed[0].index, ChunkIndex::new(1));

    // One retry for a 503.
    let attempts = server
        .requests()
        .iter()
        .filter(|p| **p == format!("media/{broken}"))
        .count();
    assert_eq!(attempts, 2);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unresponsive_chunk_is_skipped_after_timeout() {
    let server = ChunkServer::start().await;
    let id = SessionId::new("rec-8");
    server.publish(&id, StreamGroup::Screenshare, &[0, 1]);
    server.delay(
        &chunk_path(&id, StreamGroup::Screenshare, 0),
        Duration::from_secs(3),
    );

    let env = memory_env();
    let mut session = config_for(&server)
        .with_chunk_timeout(Duration::from_millis(200))
        .session(env.clone())
        .unwrap();
    session.start(id, StreamGroup::Screenshare).await.unwrap();
    let state = settle(&session, StreamGroup::Screenshare).await;

    assert_eq!(state.status, AssemblyStatus::Ready);
    assert_eq!(state.failed_chunks.len(), 1);
    assert_eq!(
        state.failed_chunks[0].error,
        tessera::assemble::ChunkError::Timeout(Duration::from_millis(200))
    );
    assert_eq!(
        env.bytes(StreamGroup::Screenshare),
        expected_stream(StreamGroup::Screenshare, [1])
    );
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn unknown_session_is_a_catalog_error() {
    let server = ChunkServer::start().await;
    let mut session = config_for(&server).session(memory_env()).unwrap();

    let err = session
        .start(SessionId::new("nope"), StreamGroup::Webcam)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlaybackError::Catalog(CatalogError::Net(NetError::HttpStatus { status: 404, .. }))
    ));
    assert_eq!(
        session.state(StreamGroup::Webcam).map(|s| s.status),
        Some(AssemblyStatus::Failed)
    );
}
