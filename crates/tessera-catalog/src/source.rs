use async_trait::async_trait;
use tessera_core::SessionId;
use tessera_net::{Headers, Net};
use tracing::debug;
use url::Url;

use crate::{CatalogError, CatalogResult, RawListing};

/// Where chunk listings come from.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Fetch the raw listing for every group of a session.
    async fn list(&self, session: &SessionId) -> CatalogResult<RawListing>;

    /// Base URL for resolving relative chunk locators.
    fn locator_base(&self) -> Option<&Url> {
        None
    }
}

/// Lists chunks with `GET {api_base}/sessions/{session}/chunks`.
pub struct HttpChunkSource<N> {
    net: N,
    api_base: Url,
    headers: Option<Headers>,
}

impl<N: Net> HttpChunkSource<N> {
    pub fn new(net: N, api_base: Url) -> Self {
        Self {
            net,
            api_base,
            headers: None,
        }
    }

    /// Headers sent with listing requests, e.g. an auth token.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidUrl`] when the API base cannot carry a
    /// path (e.g. a `data:` URL).
    pub fn listing_url(&self, session: &SessionId) -> CatalogResult<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["sessions", session.as_str(), "chunks"]);
        Ok(url)
    }
}

#[async_trait]
impl<N: Net> ChunkSource for HttpChunkSource<N> {
    async fn list(&self, session: &SessionId) -> CatalogResult<RawListing> {
        let url = self.listing_url(session)?;
        debug!(%session, %url, "fetching chunk listing");
        let body = self.net.get_bytes(url, self.headers.clone()).await?;
        RawListing::from_slice(&body)
    }

    fn locator_base(&self) -> Option<&Url> {
        Some(&self.api_base)
    }
}
