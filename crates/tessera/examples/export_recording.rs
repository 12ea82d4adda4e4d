//! Rebuild one stream group of a recorded session and write it to a file.
//!
//! ```
//! cargo run -p tessera --example export_recording -- API_BASE SESSION [webcam|screenshare] [OUT]
//! ```

use std::{env::args, error::Error};

use tessera::prelude::*;
use tracing::{info, metadata::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::default()
                .add_directive("tessera_assemble=debug".parse()?)
                .add_directive("tessera_catalog=info".parse()?)
                .add_directive("tessera_net=warn".parse()?)
                .add_directive(LevelFilter::INFO.into()),
        )
        .with_line_number(false)
        .with_file(false)
        .init();

    let mut args = args().skip(1);
    let api_base: Url = args
        .next()
        .unwrap_or_else(|| "http://127.0.0.1:8080/api".to_string())
        .parse()?;
    let session_id = SessionId::new(args.next().unwrap_or_else(|| "demo".to_string()));
    let group: StreamGroup = args.next().as_deref().unwrap_or("webcam").parse()?;
    let out = args
        .next()
        .unwrap_or_else(|| format!("{session_id}-{group}.webm"));

    let env = MemoryEnvironment::new(MemoryEnvConfig::default().with_autoplay(false));
    let config = TesseraConfig::new(api_base).with_prefetch(2);
    let mut session = config.session(env.clone())?;
    let mut events = session.events().subscribe();

    info!(%session_id, %group, "reconstructing recording");
    let mut state = session.start(session_id, group).await?;

    let state = loop {
        tokio::select! {
            changed = state.wait_for(AssemblyState::is_terminal) => break changed?.clone(),
            event = events.recv() => match event {
                Ok(Event::Assembly(AssemblyEvent::Progress { processed, total, .. })) => {
                    info!(processed, total, "progress");
                }
                Ok(Event::Assembly(AssemblyEvent::ChunkFailed { index, error, .. })) => {
                    warn!(%index, %error, "chunk skipped");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => warn!(n, "events lagged"),
                Err(_) => {}
            },
        }
    };

    session.stop().await;

    match state.status {
        AssemblyStatus::Ready => {
            let bytes = env.bytes(group);
            std::fs::write(&out, &bytes)?;
            info!(path = %out, bytes = bytes.len(), codec = ?state.codec, "recording written");
            if let Some(error) = state.last_error {
                warn!(%error, "recording has gaps");
            }
        }
        AssemblyStatus::Empty => info!("no recording exists for this group"),
        status => {
            let reason = state
                .last_error
                .map_or_else(|| status.to_string(), |e| e.to_string());
            return Err(format!("recording could not be reconstructed: {reason}").into());
        }
    }

    Ok(())
}
