use std::time::Duration;

use rstest::fixture;
use tessera::{catalog::HttpChunkSource, prelude::*};
use tessera_test_utils::ChunkServer;
use tokio_util::sync::CancellationToken;

#[fixture]
pub fn cancel_token() -> CancellationToken {
    CancellationToken::new()
}

#[fixture]
pub fn tracing_setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::default()
                .add_directive("warn".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

/// Config pointed at `server`, with short timeouts so failure tests stay
/// fast.
pub fn config_for(server: &ChunkServer) -> TesseraConfig {
    let net = NetOptions::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_retry_policy(RetryPolicy::new(
            1,
            Duration::from_millis(10),
            Duration::from_millis(50),
        ));
    TesseraConfig::new(server.api_base())
        .with_storage_base(server.media_base())
        .with_net(net)
        .with_chunk_timeout(Duration::from_secs(2))
}

pub fn memory_env() -> MemoryEnvironment {
    MemoryEnvironment::new(MemoryEnvConfig::default().with_autoplay(false))
}

pub type Session = PlaybackSession<HttpChunkSource<SharedNet>, MemoryEnvironment, SharedNet>;

/// Wait for `group` to reach a terminal state.
pub async fn settle(session: &Session, group: StreamGroup) -> AssemblyState {
    session
        .subscribe(group)
        .expect("group is active")
        .wait_for(AssemblyState::is_terminal)
        .await
        .expect("assembler state")
        .clone()
}
