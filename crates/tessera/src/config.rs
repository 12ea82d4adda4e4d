//! Top-level configuration and wiring.

use std::{sync::Arc, time::Duration};

use tessera_assemble::AssemblerOptions;
use tessera_catalog::{ChunkCatalog, HttpChunkSource};
use tessera_events::EventBus;
use tessera_media::MediaEnvironment;
use tessera_net::{DefaultRetryPolicy, HttpClient, Net, NetExt, NetOptions, NetResult, RetryNet};
use tessera_playback::PlaybackSession;
use tokio_util::sync::CancellationToken;
use url::Url;

/// HTTP transport with retries, shared by the catalog and every assembler.
pub type SharedNet = Arc<RetryNet<HttpClient, DefaultRetryPolicy>>;

/// Everything needed to build a [`PlaybackSession`] against a recording
/// backend.
///
/// # Example
///
/// ```ignore
/// use tessera::TesseraConfig;
///
/// let config = TesseraConfig::new("https://api.example.com/v1".parse()?)
///     .with_storage_base("https://cdn.example.com/recordings/".parse()?)
///     .with_chunk_timeout(Duration::from_secs(10))
///     .with_prefetch(2);
/// ```
#[derive(Clone, Debug)]
pub struct TesseraConfig {
    /// Base of the listing API (`{api_base}/sessions/{id}/chunks`).
    pub api_base: Url,
    /// Base for relative chunk locators. Defaults to `api_base`.
    pub storage_base: Option<Url>,
    /// Network configuration (timeouts, retries, headers).
    pub net: NetOptions,
    /// Assembly configuration (codecs, chunk timeout, prefetch, autoplay).
    pub assembler: AssemblerOptions,
    /// Capacity of the event bus.
    pub events_capacity: usize,
    /// Parent token for every assembler.
    pub cancel: Option<CancellationToken>,
}

impl TesseraConfig {
    pub fn new(api_base: Url) -> Self {
        Self {
            api_base,
            storage_base: None,
            net: NetOptions::default(),
            assembler: AssemblerOptions::default(),
            events_capacity: 64,
            cancel: None,
        }
    }

    pub fn with_storage_base(mut self, base: Url) -> Self {
        self.storage_base = Some(base);
        self
    }

    pub fn with_net(mut self, net: NetOptions) -> Self {
        self.net = net;
        self
    }

    pub fn with_assembler(mut self, assembler: AssemblerOptions) -> Self {
        self.assembler = assembler;
        self
    }

    /// Set the per-chunk fetch bound.
    pub fn with_chunk_timeout(mut self, timeout: Duration) -> Self {
        self.assembler.chunk_timeout = Some(timeout);
        self
    }

    /// Set how many chunks are fetched ahead of the append cursor.
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.assembler = self.assembler.with_prefetch(prefetch);
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.assembler.autoplay = autoplay;
        self
    }

    pub fn with_events_capacity(mut self, capacity: usize) -> Self {
        self.events_capacity = capacity;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the HTTP transport.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn net_client(&self) -> NetResult<SharedNet> {
        let client = HttpClient::new(self.net.clone())?;
        Ok(Arc::new(client.with_retry(self.net.retry_policy.clone())))
    }

    /// Catalog over `net` honouring the configured bases.
    pub fn catalog<N: Net>(&self, net: N, events: EventBus) -> ChunkCatalog<HttpChunkSource<N>> {
        let catalog = ChunkCatalog::new(HttpChunkSource::new(net, self.api_base.clone()))
            .with_events(events);
        match &self.storage_base {
            Some(base) => catalog.with_locator_base(base.clone()),
            None => catalog,
        }
    }

    /// Wire a playback session for `env` over a fresh transport and bus.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn session<E>(
        &self,
        env: E,
    ) -> NetResult<PlaybackSession<HttpChunkSource<SharedNet>, E, SharedNet>>
    where
        E: MediaEnvironment + Clone,
    {
        let net = self.net_client()?;
        let events = EventBus::new(self.events_capacity);
        let session = PlaybackSession::new(
            self.catalog(Arc::clone(&net), events.clone()),
            env,
            net,
            self.assembler.clone(),
            events,
        );
        Ok(match &self.cancel {
            Some(cancel) => session.with_cancel(cancel.child_token()),
            None => session,
        })
    }
}

#[cfg(test)]
mod tests {
    use tessera_media::MemoryEnvironment;

    use super::*;

    fn api() -> Url {
        Url::parse("https://api.test/v1").unwrap()
    }

    #[test]
    fn defaults() {
        let config = TesseraConfig::new(api());

        assert_eq!(config.events_capacity, 64);
        assert_eq!(config.assembler.prefetch, 1);
        assert_eq!(config.assembler.chunk_timeout, Some(Duration::from_secs(20)));
        assert!(config.assembler.autoplay);
        assert!(config.assembler.single_segment_fallback);
        assert_eq!(config.net.request_timeout, Duration::from_secs(30));
        assert_eq!(config.net.retry_policy.max_retries, 3);
    }

    #[test]
    fn builders_apply() {
        let config = TesseraConfig::new(api())
            .with_prefetch(0)
            .with_chunk_timeout(Duration::from_secs(3))
            .with_autoplay(false)
            .with_events_capacity(8);

        assert_eq!(config.assembler.prefetch, 1);
        assert_eq!(config.assembler.chunk_timeout, Some(Duration::from_secs(3)));
        assert!(!config.assembler.autoplay);
        assert_eq!(config.events_capacity, 8);
    }

    #[tokio::test]
    async fn session_starts_without_a_session_id() {
        let session = TesseraConfig::new(api())
            .session(MemoryEnvironment::default())
            .unwrap();

        assert!(session.session_id().is_none());
        assert!(session.active_groups().is_empty());
    }
}
