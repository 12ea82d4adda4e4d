//! In-process playback environment.
//!
//! Stands in for a browser media stack: sinks accept bytes after a
//! configurable latency, reject overlapping appends, and every operation is
//! journaled so callers can inspect ordering, releases and output.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tessera_core::{CodecDescriptor, StreamGroup};
use tokio::sync::watch;
use tracing::trace;

use crate::{MediaEnvironment, MediaSink, MediaTarget, PlayError, SinkError};

/// Behaviour knobs for [`MemoryEnvironment`].
#[derive(Clone, Debug)]
pub struct MemoryEnvConfig {
    pub streaming: bool,
    pub attach_fails: bool,
    /// Codecs the capability query accepts. `None` accepts all.
    pub supported: Option<Vec<CodecDescriptor>>,
    /// Codecs sink creation accepts. `None` accepts all.
    pub creatable: Option<Vec<CodecDescriptor>>,
    pub autoplay_allowed: bool,
    pub append_latency: Duration,
    /// New sinks report busy for this long after creation.
    pub initial_busy: Duration,
    /// Payloads the sink fails to decode.
    pub rejected_payloads: Vec<Bytes>,
}

impl Default for MemoryEnvConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            attach_fails: false,
            supported: None,
            creatable: None,
            autoplay_allowed: true,
            append_latency: Duration::from_millis(1),
            initial_busy: Duration::ZERO,
            rejected_payloads: Vec::new(),
        }
    }
}

impl MemoryEnvConfig {
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_attach_failure(mut self) -> Self {
        self.attach_fails = true;
        self
    }

    pub fn with_supported(mut self, codecs: Vec<CodecDescriptor>) -> Self {
        self.supported = Some(codecs);
        self
    }

    pub fn with_creatable(mut self, codecs: Vec<CodecDescriptor>) -> Self {
        self.creatable = Some(codecs);
        self
    }

    pub fn with_autoplay(mut self, allowed: bool) -> Self {
        self.autoplay_allowed = allowed;
        self
    }

    pub fn with_append_latency(mut self, latency: Duration) -> Self {
        self.append_latency = latency;
        self
    }

    pub fn with_initial_busy(mut self, busy: Duration) -> Self {
        self.initial_busy = busy;
        self
    }

    pub fn with_rejected_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.rejected_payloads.push(payload.into());
        self
    }
}

/// One journaled operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaOp {
    Attached,
    SinkCreated(CodecDescriptor),
    SinkRejected(CodecDescriptor),
    AppendBegun(usize),
    Appended(Bytes),
    AppendFailed(usize),
    /// An append was issued while another was in flight.
    Overlap,
    EndOfStream,
    Played { allowed: bool },
    Released,
    Revoked(String),
    SingleSegment(Bytes),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalEntry {
    pub target: u64,
    pub group: StreamGroup,
    pub op: MediaOp,
}

struct Shared {
    config: MemoryEnvConfig,
    journal: Mutex<Vec<JournalEntry>>,
    next_id: AtomicU64,
}

impl Shared {
    fn record(&self, target: u64, group: StreamGroup, op: MediaOp) {
        trace!(target, %group, ?op, "media op");
        self.journal.lock().push(JournalEntry { target, group, op });
    }
}

/// In-process [`MediaEnvironment`]. Clones share one journal.
#[derive(Clone)]
pub struct MemoryEnvironment {
    shared: Arc<Shared>,
}

impl MemoryEnvironment {
    pub fn new(config: MemoryEnvConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                journal: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn config(&self) -> &MemoryEnvConfig {
        &self.shared.config
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.shared.journal.lock().clone()
    }

    /// Journal entries of `group`, in order.
    pub fn ops(&self, group: StreamGroup) -> Vec<MediaOp> {
        self.shared
            .journal
            .lock()
            .iter()
            .filter(|e| e.group == group)
            .map(|e| e.op.clone())
            .collect()
    }

    pub fn count(&self, group: StreamGroup, pred: impl Fn(&MediaOp) -> bool) -> usize {
        self.shared
            .journal
            .lock()
            .iter()
            .filter(|e| e.group == group && pred(&e.op))
            .count()
    }

    /// Targets attached for `group`, oldest first.
    pub fn targets(&self, group: StreamGroup) -> Vec<u64> {
        self.shared
            .journal
            .lock()
            .iter()
            .filter(|e| e.group == group && e.op == MediaOp::Attached)
            .map(|e| e.target)
            .collect()
    }

    /// Payloads appended to `target`, in append order.
    pub fn appended(&self, target: u64) -> Vec<Bytes> {
        self.shared
            .journal
            .lock()
            .iter()
            .filter(|e| e.target == target)
            .filter_map(|e| match &e.op {
                MediaOp::Appended(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Buffered stream of the most recent target of `group`.
    pub fn bytes(&self, group: StreamGroup) -> Vec<u8> {
        self.targets(group)
            .last()
            .map(|&target| self.appended(target).concat())
            .unwrap_or_default()
    }

    fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryEnvironment {
    fn default() -> Self {
        Self::new(MemoryEnvConfig::default())
    }
}

#[async_trait]
impl MediaEnvironment for MemoryEnvironment {
    type Target = MemoryTarget;

    fn supports_streaming(&self) -> bool {
        self.shared.config.streaming
    }

    fn is_type_supported(&self, codec: &CodecDescriptor) -> bool {
        self.shared
            .config
            .supported
            .as_ref()
            .is_none_or(|list| list.contains(codec))
    }

    fn attach(&self, group: StreamGroup) -> Result<MemoryTarget, SinkError> {
        let config = &self.shared.config;
        if !config.streaming {
            return Err(SinkError::Unsupported("no media source support".into()));
        }
        if config.attach_fails {
            return Err(SinkError::AttachFailed("media element unavailable".into()));
        }
        let id = self.next_id();
        self.shared.record(id, group, MediaOp::Attached);
        Ok(MemoryTarget {
            id,
            group,
            url: format!("blob:memory/{id}"),
            shared: Arc::clone(&self.shared),
            released: Arc::new(AtomicBool::new(false)),
            sinks: Mutex::new(Vec::new()),
        })
    }

    async fn play_single_segment(&self, group: StreamGroup, bytes: Bytes) -> Result<(), PlayError> {
        let id = self.next_id();
        self.shared.record(id, group, MediaOp::SingleSegment(bytes));
        if self.shared.config.autoplay_allowed {
            Ok(())
        } else {
            Err(PlayError::NotAllowed("autoplay blocked".into()))
        }
    }
}

/// Target handed out by [`MemoryEnvironment::attach`].
pub struct MemoryTarget {
    id: u64,
    group: StreamGroup,
    url: String,
    shared: Arc<Shared>,
    released: Arc<AtomicBool>,
    sinks: Mutex<Vec<Arc<watch::Sender<bool>>>>,
}

impl MemoryTarget {
    pub fn id(&self) -> u64 {
        self.id
    }

    fn check_live(&self) -> Result<(), SinkError> {
        if self.released.load(Ordering::Acquire) {
            Err(SinkError::Released)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MediaTarget for MemoryTarget {
    type Sink = MemorySink;

    fn object_url(&self) -> &str {
        &self.url
    }

    fn add_sink(&self, codec: &CodecDescriptor) -> Result<MemorySink, SinkError> {
        self.check_live()?;
        let creatable = self
            .shared
            .config
            .creatable
            .as_ref()
            .is_none_or(|list| list.contains(codec));
        if !creatable {
            self.shared
                .record(self.id, self.group, MediaOp::SinkRejected(codec.clone()));
            return Err(SinkError::CreationFailed {
                codec: codec.clone(),
                reason: "type not creatable".into(),
            });
        }
        self.shared
            .record(self.id, self.group, MediaOp::SinkCreated(codec.clone()));

        let initial_busy = self.shared.config.initial_busy;
        let updating = Arc::new(watch::Sender::new(!initial_busy.is_zero()));
        if !initial_busy.is_zero() {
            let updating = Arc::clone(&updating);
            tokio::spawn(async move {
                tokio::time::sleep(initial_busy).await;
                updating.send_replace(false);
            });
        }
        self.sinks.lock().push(Arc::clone(&updating));

        Ok(MemorySink {
            target: self.id,
            group: self.group,
            shared: Arc::clone(&self.shared),
            released: Arc::clone(&self.released),
            updating,
            last_error: Arc::new(Mutex::new(None)),
        })
    }

    fn end_of_stream(&self) -> Result<(), SinkError> {
        self.check_live()?;
        if self.sinks.lock().iter().any(|s| *s.borrow()) {
            return Err(SinkError::InvalidState("append in flight".into()));
        }
        self.shared.record(self.id, self.group, MediaOp::EndOfStream);
        Ok(())
    }

    async fn play(&self) -> Result<(), PlayError> {
        if self.released.load(Ordering::Acquire) {
            return Err(PlayError::Failed("target released".into()));
        }
        let allowed = self.shared.config.autoplay_allowed;
        self.shared
            .record(self.id, self.group, MediaOp::Played { allowed });
        if allowed {
            Ok(())
        } else {
            Err(PlayError::NotAllowed("autoplay blocked".into()))
        }
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.record(self.id, self.group, MediaOp::Released);
        self.shared
            .record(self.id, self.group, MediaOp::Revoked(self.url.clone()));
    }
}

/// Sink created by [`MemoryTarget::add_sink`].
pub struct MemorySink {
    target: u64,
    group: StreamGroup,
    shared: Arc<Shared>,
    released: Arc<AtomicBool>,
    updating: Arc<watch::Sender<bool>>,
    last_error: Arc<Mutex<Option<SinkError>>>,
}

#[async_trait]
impl MediaSink for MemorySink {
    fn is_updating(&self) -> bool {
        *self.updating.borrow()
    }

    fn begin_append(&self, bytes: Bytes) -> Result<(), SinkError> {
        if self.released.load(Ordering::Acquire) {
            return Err(SinkError::Released);
        }
        if self.is_updating() {
            self.shared.record(self.target, self.group, MediaOp::Overlap);
            return Err(SinkError::Busy);
        }
        self.updating.send_replace(true);
        self.shared
            .record(self.target, self.group, MediaOp::AppendBegun(bytes.len()));

        let shared = Arc::clone(&self.shared);
        let updating = Arc::clone(&self.updating);
        let last_error = Arc::clone(&self.last_error);
        let (target, group) = (self.target, self.group);
        tokio::spawn(async move {
            tokio::time::sleep(shared.config.append_latency).await;
            if shared.config.rejected_payloads.contains(&bytes) {
                shared.record(target, group, MediaOp::AppendFailed(bytes.len()));
                *last_error.lock() = Some(SinkError::AppendRejected("decode error".into()));
            } else {
                shared.record(target, group, MediaOp::Appended(bytes));
                *last_error.lock() = None;
            }
            updating.send_replace(false);
        });
        Ok(())
    }

    async fn updated(&self) -> Result<(), SinkError> {
        let mut rx = self.updating.subscribe();
        rx.wait_for(|updating| !*updating)
            .await
            .map_err(|_| SinkError::Released)?;
        match self.last_error.lock().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
