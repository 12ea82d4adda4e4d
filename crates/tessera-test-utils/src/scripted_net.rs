//! In-process [`Net`] with per-URL scripted responses.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tessera_net::{Headers, Net, NetError};
use url::Url;

#[derive(Clone)]
struct Script {
    result: Result<Bytes, NetError>,
    delay: Duration,
}

#[derive(Default)]
struct Inner {
    scripts: HashMap<String, Script>,
    requests: Vec<Url>,
}

/// Serves scripted bodies or errors keyed by full URL and records every
/// request in arrival order. Unscripted URLs answer 404.
#[derive(Clone, Default)]
pub struct ScriptedNet {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedNet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `body`.
    pub fn respond(&self, url: &Url, body: impl Into<Bytes>) -> &Self {
        self.script(url, Ok(body.into()), Duration::ZERO)
    }

    /// Answer `url` with `body` after `delay`.
    pub fn respond_after(&self, url: &Url, body: impl Into<Bytes>, delay: Duration) -> &Self {
        self.script(url, Ok(body.into()), delay)
    }

    /// Answer `url` with `error`.
    pub fn fail(&self, url: &Url, error: NetError) -> &Self {
        self.script(url, Err(error), Duration::ZERO)
    }

    fn script(&self, url: &Url, result: Result<Bytes, NetError>, delay: Duration) -> &Self {
        self.inner
            .lock()
            .scripts
            .insert(url.to_string(), Script { result, delay });
        self
    }

    /// URLs requested so far, in request order.
    #[must_use]
    pub fn requests(&self) -> Vec<Url> {
        self.inner.lock().requests.clone()
    }

    #[must_use]
    pub fn request_count(&self, url: &Url) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|u| *u == url)
            .count()
    }
}

#[async_trait]
impl Net for ScriptedNet {
    async fn get_bytes(&self, url: Url, _headers: Option<Headers>) -> Result<Bytes, NetError> {
        let script = {
            let mut inner = self.inner.lock();
            inner.requests.push(url.clone());
            inner.scripts.get(url.as_str()).cloned()
        };
        let Some(script) = script else {
            return Err(NetError::http_status(404, url.as_str()));
        };
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        script.result
    }
}
