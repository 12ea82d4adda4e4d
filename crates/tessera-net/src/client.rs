use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::trace;
use url::Url;

use crate::{
    error::{NetError, NetResult},
    traits::Net,
    types::{Headers, NetOptions},
};

/// `reqwest`-backed [`Net`] implementation.
///
/// Applies `NetOptions::request_timeout` per request. Retries are a separate
/// layer, see [`NetExt::with_retry`](crate::NetExt::with_retry).
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
    options: NetOptions,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns [`NetError::Http`] if the underlying client cannot be built.
    pub fn new(options: NetOptions) -> NetResult<Self> {
        let inner = Client::builder()
            .pool_max_idle_per_host(options.pool_max_idle_per_host)
            .build()
            .map_err(|e| NetError::http(e.to_string()))?;
        Ok(Self { inner, options })
    }

    /// Wrap an existing client, e.g. one shared with other parts of the app.
    pub fn with_client(inner: Client, options: NetOptions) -> Self {
        Self { inner, options }
    }

    pub fn options(&self) -> &NetOptions {
        &self.options
    }

    fn apply_headers(
        mut req: reqwest::RequestBuilder,
        headers: Option<Headers>,
    ) -> reqwest::RequestBuilder {
        if let Some(headers) = headers {
            for (k, v) in headers.iter() {
                req = req.header(k, v);
            }
        }
        req
    }
}

#[async_trait]
impl Net for HttpClient {
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError> {
        let mut req = self.inner.get(url.clone());
        for (k, v) in self.options.default_headers.iter() {
            req = req.header(k, v);
        }
        let req = Self::apply_headers(req, headers);
        let req = req.timeout(self.options.request_timeout);

        let resp = req.send().await.map_err(NetError::from)?;
        let status = resp.status();

        if !status.is_success() {
            return Err(NetError::http_status(status.as_u16(), url.as_str()));
        }

        let bytes = resp.bytes().await.map_err(NetError::from)?;
        trace!(%url, len = bytes.len(), "fetched bytes");
        Ok(bytes)
    }
}
