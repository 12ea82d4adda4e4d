use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, stream};
use tessera_core::{AssemblyStatus, Chunk, ChunkIndex, StreamGroup};
use tessera_events::{AssemblyEvent, EventBus};
use tessera_media::{
    CodecAttempt, CodecNegotiator, CodecRejection, MediaEnvironment, MediaLease, MediaTarget,
    NoSupportedCodec, SinkError,
};
use tessera_net::Net;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    AppendQueue, AssemblerOptions, AssemblyError, AssemblyState, AutoplayOutcome, ChunkError,
    ChunkFailure, FallbackOutcome, PlaybackMode,
};

/// Final state of one assembly run plus the indices that made it into the
/// sink, in append order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssemblyReport {
    pub state: AssemblyState,
    pub appended: Vec<ChunkIndex>,
}

/// Drives one stream group from an ordered chunk list to a finished sink.
///
/// Lifecycle: `Idle -> Negotiating -> Appending -> Finalizing -> Ready`,
/// with `Failed`, `Empty` and `Cancelled` as the other terminals. A chunk
/// that cannot be fetched or appended is recorded and skipped; only
/// aggregate conditions fail the run.
pub struct BufferAssembler<E, N> {
    group: StreamGroup,
    env: E,
    net: N,
    options: AssemblerOptions,
    negotiator: CodecNegotiator,
    events: EventBus,
    state: watch::Sender<AssemblyState>,
}

impl<E, N> BufferAssembler<E, N>
where
    E: MediaEnvironment,
    N: Net,
{
    pub fn new(
        group: StreamGroup,
        env: E,
        net: N,
        options: AssemblerOptions,
        events: EventBus,
    ) -> Self {
        let negotiator = CodecNegotiator::new(options.codecs.clone());
        Self {
            group,
            env,
            net,
            options,
            negotiator,
            events,
            state: watch::Sender::new(AssemblyState::new(group)),
        }
    }

    pub fn group(&self) -> StreamGroup {
        self.group
    }

    /// Observe state changes.
    pub fn state(&self) -> watch::Receiver<AssemblyState> {
        self.state.subscribe()
    }

    /// Run assembly on a task.
    pub fn spawn(
        self,
        chunks: Vec<Chunk>,
        lease: Arc<MediaLease<E::Target>>,
        cancel: CancellationToken,
    ) -> AssemblyHandle
    where
        N: 'static,
    {
        let state = self.state();
        let task = tokio::spawn(async move { self.assemble(chunks, &lease, &cancel).await });
        AssemblyHandle { task, state }
    }

    /// Assemble `chunks` into a target installed on `lease`.
    ///
    /// Never fails outright: the outcome is carried by the report's state.
    /// The lease is released on every terminal except `Ready` and `Empty`.
    pub async fn assemble(
        &self,
        mut chunks: Vec<Chunk>,
        lease: &MediaLease<E::Target>,
        cancel: &CancellationToken,
    ) -> AssemblyReport {
        chunks.sort_by_key(|c| c.index);
        let total = chunks.len();
        self.state.send_modify(|s| s.chunks_total = total);

        if chunks.is_empty() {
            debug!(group = %self.group, "no chunks to assemble");
            return self.finish(
                AssemblyStatus::Empty,
                Some(AssemblyError::NoChunksFound { group: self.group }),
                Vec::new(),
            );
        }
        if cancel.is_cancelled() {
            return self.cancelled(lease, Vec::new());
        }

        self.transition(AssemblyStatus::Negotiating);
        let attached = if self.env.supports_streaming() {
            self.env.attach(self.group)
        } else {
            Err(SinkError::Unsupported(
                "environment lacks incremental buffering".into(),
            ))
        };
        let target = match attached {
            Ok(target) => target,
            Err(error) => return self.sink_setup_failed(error, &chunks, lease, cancel).await,
        };
        let Some(target) = lease.install(target) else {
            return self.cancelled(lease, Vec::new());
        };

        let negotiated = match self.negotiator.select(&self.env, &*target) {
            Ok(negotiated) => negotiated,
            Err(NoSupportedCodec { attempts }) => {
                for attempt in &attempts {
                    self.publish_rejection(attempt);
                }
                warn!(group = %self.group, candidates = attempts.len(), "no supported codec");
                lease.release();
                return self.finish(
                    AssemblyStatus::Failed,
                    Some(AssemblyError::NoSupportedCodec { attempts }),
                    Vec::new(),
                );
            }
        };
        for attempt in &negotiated.rejected {
            self.publish_rejection(attempt);
        }
        let codec = negotiated.codec;
        self.state.send_modify(|s| s.codec = Some(codec.clone()));
        self.events.publish(AssemblyEvent::CodecSelected {
            group: self.group,
            codec,
        });

        self.transition(AssemblyStatus::Appending);
        let mut queue = AppendQueue::new(negotiated.sink);
        let mut appended = Vec::with_capacity(total);
        let mut failed = Vec::new();

        let fetches = stream::iter(chunks.clone())
            .map(|chunk| async move { (chunk.index, self.fetch(&chunk).await) })
            .buffered(self.options.prefetch.max(1));
        futures::pin_mut!(fetches);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return self.cancelled(lease, appended),
                next = fetches.next() => next,
            };
            let Some((index, fetched)) = next else {
                break;
            };

            let outcome = match fetched {
                Ok(bytes) => {
                    let len = bytes.len() as u64;
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return self.cancelled(lease, appended),
                        pushed = queue.push(bytes) => pushed.map(|()| len).map_err(ChunkError::Append),
                    }
                }
                Err(error) => Err(error),
            };

            match outcome {
                Ok(bytes) => {
                    trace!(group = %self.group, index = index.get(), bytes, "chunk appended");
                    appended.push(index);
                    self.events.publish(AssemblyEvent::ChunkAppended {
                        group: self.group,
                        index,
                        bytes,
                    });
                }
                Err(error) => {
                    warn!(group = %self.group, index = index.get(), %error, "chunk skipped");
                    self.events.publish(AssemblyEvent::ChunkFailed {
                        group: self.group,
                        index,
                        error: error.to_string(),
                    });
                    failed.push(ChunkFailure { index, error });
                }
            }

            let processed = appended.len() + failed.len();
            let bytes_appended = queue.bytes_appended();
            self.state.send_modify(|s| {
                s.chunks_processed = processed;
                s.bytes_appended = bytes_appended;
                s.failed_chunks.clone_from(&failed);
            });
            self.events.publish(AssemblyEvent::Progress {
                group: self.group,
                processed,
                total,
            });
        }

        self.transition(AssemblyStatus::Finalizing);
        if let Err(error) = queue.drain().await {
            warn!(group = %self.group, %error, "sink reported an error while draining");
        }

        if appended.is_empty() {
            warn!(group = %self.group, total, "every chunk failed");
            lease.release();
            return self.finish(
                AssemblyStatus::Failed,
                Some(AssemblyError::AllChunksFailed { failed, total }),
                appended,
            );
        }

        if let Err(error) = target.end_of_stream() {
            warn!(group = %self.group, %error, "end of stream rejected");
            lease.release();
            return self.finish(
                AssemblyStatus::Failed,
                Some(AssemblyError::FinalizeFailed(error)),
                appended,
            );
        }
        self.events
            .publish(AssemblyEvent::EndOfStream { group: self.group });

        let partial = (!failed.is_empty())
            .then(|| AssemblyError::PartialChunkFailure { failed, total });
        let mut report = self.finish(AssemblyStatus::Ready, partial, appended);

        let autoplay = self.autoplay(&target).await;
        self.state.send_modify(|s| s.autoplay = autoplay.clone());
        report.state.autoplay = autoplay;
        report
    }

    async fn fetch(&self, chunk: &Chunk) -> Result<Bytes, ChunkError> {
        let request = self
            .net
            .get_bytes(chunk.locator.clone(), self.options.chunk_headers.clone());
        match self.options.chunk_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| ChunkError::Timeout(limit))?
                .map_err(ChunkError::Fetch),
            None => request.await.map_err(ChunkError::Fetch),
        }
    }

    async fn autoplay(&self, target: &E::Target) -> AutoplayOutcome {
        if !self.options.autoplay {
            return AutoplayOutcome::Disabled;
        }
        let outcome = match target.play().await {
            Ok(()) => AutoplayOutcome::Started,
            Err(error) if error.is_policy_rejection() => {
                debug!(group = %self.group, %error, "autoplay rejected by policy");
                AutoplayOutcome::Blocked(error.to_string())
            }
            Err(error) => {
                warn!(group = %self.group, %error, "autoplay failed");
                AutoplayOutcome::Blocked(error.to_string())
            }
        };
        self.events.publish(AssemblyEvent::Autoplay {
            group: self.group,
            started: outcome == AutoplayOutcome::Started,
        });
        outcome
    }

    /// No sink could be set up. Optionally play chunk 0 on its own.
    async fn sink_setup_failed(
        &self,
        error: SinkError,
        chunks: &[Chunk],
        lease: &MediaLease<E::Target>,
        cancel: &CancellationToken,
    ) -> AssemblyReport {
        warn!(group = %self.group, %error, "sink creation failed");

        let fallback = if !self.options.single_segment_fallback {
            FallbackOutcome::Disabled
        } else if let Some(initial) = chunks.iter().find(|c| c.index.get() == 0) {
            self.state
                .send_modify(|s| s.mode = PlaybackMode::SingleSegmentFallback);
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return self.cancelled(lease, Vec::new()),
                outcome = self.play_single_segment(initial) => outcome,
            };
            self.events.publish(AssemblyEvent::Fallback {
                group: self.group,
                index: initial.index,
                played: outcome.played(),
            });
            outcome
        } else {
            warn!(
                group = %self.group,
                first = ?chunks.first().map(|c| c.index.get()),
                "chunk 0 not listed; skipping single-segment fallback"
            );
            FallbackOutcome::NoInitialChunk
        };

        self.finish(
            AssemblyStatus::Failed,
            Some(AssemblyError::SinkCreationFailed { error, fallback }),
            Vec::new(),
        )
    }

    async fn play_single_segment(&self, chunk: &Chunk) -> FallbackOutcome {
        let index = chunk.index;
        let bytes = match self.fetch(chunk).await {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(group = %self.group, index = index.get(), %error, "fallback fetch failed");
                return FallbackOutcome::FetchFailed { index, error };
            }
        };
        match self.env.play_single_segment(self.group, bytes).await {
            Ok(()) => {
                debug!(group = %self.group, index = index.get(), "playing single segment");
                FallbackOutcome::Played { index }
            }
            Err(error) => {
                debug!(group = %self.group, index = index.get(), %error, "single segment not played");
                FallbackOutcome::PlayRejected { index, error }
            }
        }
    }

    fn publish_rejection(&self, attempt: &CodecAttempt) {
        let reason = match &attempt.rejection {
            CodecRejection::NotReported => "not reported as supported".to_string(),
            CodecRejection::CreationFailed(error) => error.to_string(),
        };
        self.events.publish(AssemblyEvent::CodecRejected {
            group: self.group,
            codec: attempt.codec.clone(),
            reason,
        });
    }

    fn transition(&self, status: AssemblyStatus) {
        debug!(group = %self.group, %status, "assembly transition");
        self.state.send_modify(|s| s.status = status);
        self.events.publish(AssemblyEvent::StatusChanged {
            group: self.group,
            status,
        });
    }

    fn cancelled(
        &self,
        lease: &MediaLease<E::Target>,
        appended: Vec<ChunkIndex>,
    ) -> AssemblyReport {
        debug!(group = %self.group, appended = appended.len(), "assembly cancelled");
        lease.release();
        self.finish(AssemblyStatus::Cancelled, None, appended)
    }

    fn finish(
        &self,
        status: AssemblyStatus,
        error: Option<AssemblyError>,
        appended: Vec<ChunkIndex>,
    ) -> AssemblyReport {
        self.state.send_modify(|s| s.last_error = error);
        self.transition(status);
        AssemblyReport {
            state: self.state.borrow().clone(),
            appended,
        }
    }
}

/// A spawned assembly run.
pub struct AssemblyHandle {
    task: JoinHandle<AssemblyReport>,
    state: watch::Receiver<AssemblyState>,
}

impl AssemblyHandle {
    /// Latest state snapshot.
    pub fn state(&self) -> AssemblyState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AssemblyState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end. `None` if the task panicked or was aborted.
    pub async fn join(self) -> Option<AssemblyReport> {
        match self.task.await {
            Ok(report) => Some(report),
            Err(error) => {
                warn!(%error, "assembly task did not complete");
                None
            }
        }
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}
