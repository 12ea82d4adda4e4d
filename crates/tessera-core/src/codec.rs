use std::fmt;

use crate::{CoreError, CoreResult};

/// MIME type plus optional `codecs` parameter describing a sink format,
/// e.g. `video/webm;codecs="vp9,opus"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CodecDescriptor(String);

impl CodecDescriptor {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCodec`] when the container is not of the
    /// `type/subtype` form.
    pub fn parse(mime: impl Into<String>) -> CoreResult<Self> {
        let mime = mime.into();
        let container = mime.split(';').next().unwrap_or_default().trim();
        let mut parts = container.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(ty), Some(sub), None) if !ty.is_empty() && !sub.is_empty() => Ok(Self(mime)),
            _ => Err(CoreError::InvalidCodec(mime)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `type/subtype` part, without parameters.
    pub fn container(&self) -> &str {
        self.0.split(';').next().unwrap_or_default().trim()
    }

    /// Codec names listed in the `codecs` parameter, in order.
    pub fn codecs(&self) -> Vec<&str> {
        self.0
            .split(';')
            .skip(1)
            .filter_map(|param| {
                let (key, value) = param.split_once('=')?;
                (key.trim().eq_ignore_ascii_case("codecs")).then_some(value)
            })
            .flat_map(|value| value.trim().trim_matches('"').split(','))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Candidate list for browser-recorded sessions, most specific first.
    pub fn default_candidates() -> Vec<Self> {
        [
            r#"video/webm;codecs="vp9,opus""#,
            r#"video/webm;codecs="vp8,opus""#,
            r#"video/webm;codecs="vp9""#,
            r#"video/webm;codecs="vp8""#,
            "video/webm",
            r#"video/mp4;codecs="avc1.42E01E,mp4a.40.2""#,
            "video/mp4",
        ]
        .into_iter()
        .map(|m| Self(m.to_string()))
        .collect()
    }
}

impl fmt::Display for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
