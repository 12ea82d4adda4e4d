use std::time::Duration;

use rstest::rstest;
use tessera::{media::MediaOp, prelude::*};
use tessera_test_utils::{ChunkServer, chunk_path};
use tokio_util::sync::CancellationToken;

use crate::common::{cancel_token, config_for, memory_env, settle};

fn releases(env: &MemoryEnvironment, group: StreamGroup) -> usize {
    env.count(group, |op| matches!(op, MediaOp::Released))
}

/// Every webcam chunk answers slowly so a switch lands mid-assembly.
async fn slow_webcam_server(id: &SessionId) -> ChunkServer {
    let server = ChunkServer::start().await;
    let webcam: Vec<u64> = (0..12).collect();
    server.publish(id, StreamGroup::Webcam, &webcam);
    server.publish(id, StreamGroup::Screenshare, &[0, 1, 2]);
    for index in webcam {
        server.delay(
            &chunk_path(id, StreamGroup::Webcam, index),
            Duration::from_millis(40),
        );
    }
    server
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn switching_groups_releases_the_previous_target_once() {
    let id = SessionId::new("tabbed");
    let server = slow_webcam_server(&id).await;
    let env = memory_env();
    let mut session = config_for(&server).session(env.clone()).unwrap();

    let mut webcam = session.start(id.clone(), StreamGroup::Webcam).await.unwrap();
    webcam.wait_for(|s| s.chunks_processed >= 1).await.unwrap();

    session.switch_group(StreamGroup::Screenshare).await.unwrap();
    let screen = settle(&session, StreamGroup::Screenshare).await;
    session.switch_group(StreamGroup::Webcam).await.unwrap();
    session.stop().await;
    session.stop().await;

    assert_eq!(screen.status, AssemblyStatus::Ready);
    assert_eq!(screen.progress(), (3, 3));
    assert_eq!(releases(&env, StreamGroup::Webcam), env.targets(StreamGroup::Webcam).len());
    assert_eq!(releases(&env, StreamGroup::Screenshare), 1);
    assert!(session.active_groups().is_empty());

    let journal = env.journal();
    let first_webcam_release = journal
        .iter()
        .position(|e| e.group == StreamGroup::Webcam && e.op == MediaOp::Released)
        .unwrap();
    let first_screen_append = journal
        .iter()
        .position(|e| {
            e.group == StreamGroup::Screenshare && matches!(e.op, MediaOp::AppendBegun(_))
        })
        .unwrap();
    assert!(first_webcam_release < first_screen_append);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn lifecycle_events_follow_teardown_order() {
    let id = SessionId::new("events");
    let server = slow_webcam_server(&id).await;
    let mut session = config_for(&server)
        .with_events_capacity(256)
        .session(memory_env())
        .unwrap();
    let mut rx = session.events().subscribe();

    session.start(id.clone(), StreamGroup::Webcam).await.unwrap();
    session.switch_group(StreamGroup::Screenshare).await.unwrap();
    settle(&session, StreamGroup::Screenshare).await;
    session.stop().await;

    let mut lifecycle = Vec::new();
    let mut listed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::Playback(event) => lifecycle.push(event),
            Event::Catalog(CatalogEvent::Listed { .. }) => listed += 1,
            _ => {}
        }
    }
    assert_eq!(
        lifecycle,
        vec![
            PlaybackEvent::Started {
                session: id.clone(),
                group: StreamGroup::Webcam,
            },
            PlaybackEvent::TornDown {
                group: StreamGroup::Webcam,
            },
            PlaybackEvent::Started {
                session: id,
                group: StreamGroup::Screenshare,
            },
            PlaybackEvent::TornDown {
                group: StreamGroup::Screenshare,
            },
            PlaybackEvent::Stopped,
        ]
    );
    // Two listing calls, each reporting both groups.
    assert_eq!(listed, 4);
}

#[rstest]
#[timeout(Duration::from_secs(10))]
#[tokio::test]
async fn parent_token_cancels_running_groups(cancel_token: CancellationToken) {
    let id = SessionId::new("shutdown");
    let server = slow_webcam_server(&id).await;
    let env = memory_env();
    let mut session = config_for(&server)
        .with_cancel(cancel_token.clone())
        .session(env.clone())
        .unwrap();

    let mut webcam = session.start(id, StreamGroup::Webcam).await.unwrap();
    webcam.wait_for(|s| s.chunks_processed >= 1).await.unwrap();
    cancel_token.cancel();
    let state = settle(&session, StreamGroup::Webcam).await;

    assert_eq!(state.status, AssemblyStatus::Cancelled);
    assert!(state.chunks_processed < 12);
    assert_eq!(releases(&env, StreamGroup::Webcam), 1);

    session.stop().await;
    assert_eq!(releases(&env, StreamGroup::Webcam), 1);
}
