use std::time::Duration;

use tessera_core::CodecDescriptor;
use tessera_net::Headers;

/// Assembly configuration.
#[derive(Clone, Debug)]
pub struct AssemblerOptions {
    /// Sink formats to try, most specific first.
    pub codecs: Vec<CodecDescriptor>,
    /// Upper bound on one chunk fetch. `None` waits indefinitely.
    pub chunk_timeout: Option<Duration>,
    /// Chunks fetched ahead of the append cursor. `1` is strict
    /// fetch-then-append.
    pub prefetch: usize,
    /// Ask the playback element to start once the stream is ready.
    pub autoplay: bool,
    /// Play the first chunk alone when incremental buffering is unavailable.
    pub single_segment_fallback: bool,
    /// Extra headers for chunk requests.
    pub chunk_headers: Option<Headers>,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            codecs: CodecDescriptor::default_candidates(),
            chunk_timeout: Some(Duration::from_secs(20)),
            prefetch: 1,
            autoplay: true,
            single_segment_fallback: true,
            chunk_headers: None,
        }
    }
}

impl AssemblerOptions {
    pub fn with_codecs(mut self, codecs: Vec<CodecDescriptor>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_chunk_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.chunk_timeout = timeout;
        self
    }

    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_single_segment_fallback(mut self, enabled: bool) -> Self {
        self.single_segment_fallback = enabled;
        self
    }

    pub fn with_chunk_headers(mut self, headers: Headers) -> Self {
        self.chunk_headers = Some(headers);
        self
    }
}
