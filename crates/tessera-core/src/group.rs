use std::{fmt, str::FromStr};

use crate::CoreError;

/// Logical recording channel a chunk belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamGroup {
    Webcam,
    Screenshare,
}

impl StreamGroup {
    pub const ALL: [StreamGroup; 2] = [StreamGroup::Webcam, StreamGroup::Screenshare];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webcam => "webcam",
            Self::Screenshare => "screenshare",
        }
    }

    /// Parse a backend group tag. Case-insensitive, accepts the aliases the
    /// backend has emitted over time.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "webcam" | "camera" | "cam" => Some(Self::Webcam),
            "screen" | "screenshare" | "screen_share" | "screen-share" | "display" => {
                Some(Self::Screenshare)
            }
            _ => None,
        }
    }

    /// Infer the group from path segments of a locator.
    ///
    /// Query string and fragment are ignored. Each segment is tried whole,
    /// then split on `_`, `-` and `.`. Returns `None` when nothing matches or
    /// when segments point at both groups.
    pub fn infer_from_locator(locator: &str) -> Option<Self> {
        let path = locator
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let path = match path.find("://") {
            Some(pos) => {
                let rest = &path[pos + 3..];
                rest.find('/').map_or("", |slash| &rest[slash..])
            }
            None => path,
        };

        let mut found: Option<Self> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let hit = Self::from_tag(segment).or_else(|| {
                let mut tokens = segment.split(['_', '-', '.']).filter_map(Self::from_tag);
                let first = tokens.next()?;
                tokens.all(|t| t == first).then_some(first)
            });

            match (found, hit) {
                (_, None) => {}
                (None, Some(group)) => found = Some(group),
                (Some(prev), Some(group)) if prev == group => {}
                (Some(_), Some(_)) => return None,
            }
        }
        found
    }
}

impl fmt::Display for StreamGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamGroup {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| CoreError::UnknownGroup(s.to_string()))
    }
}

/// Where a group classification came from, in decreasing order of trust.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalSource {
    /// Tag carried on the chunk record itself.
    Explicit,
    /// The bucket of a grouped listing the chunk appeared under.
    Bucket,
    /// Inferred from the locator path.
    Locator,
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Explicit => "explicit tag",
            Self::Bucket => "listing bucket",
            Self::Locator => "locator",
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("webcam", Some(StreamGroup::Webcam))]
    #[case("CAMERA", Some(StreamGroup::Webcam))]
    #[case(" screen-share ", Some(StreamGroup::Screenshare))]
    #[case("screen_share", Some(StreamGroup::Screenshare))]
    #[case("display", Some(StreamGroup::Screenshare))]
    #[case("audio", None)]
    #[case("", None)]
    fn from_tag_accepts_aliases(#[case] tag: &str, #[case] expected: Option<StreamGroup>) {
        assert_eq!(StreamGroup::from_tag(tag), expected);
    }

    #[rstest]
    #[case::path_segment("recordings/s1/webcam/0.webm", Some(StreamGroup::Webcam))]
    #[case::absolute_url(
        "https://cdn.example.com/recordings/s1/screen/3.webm?sig=webcam",
        Some(StreamGroup::Screenshare)
    )]
    #[case::file_stem("recordings/s1/screenshare_0007.webm", Some(StreamGroup::Screenshare))]
    #[case::dashed_stem("s1/cam-12.webm", Some(StreamGroup::Webcam))]
    #[case::host_ignored("https://webcam.example.com/s1/0.webm", None)]
    #[case::nothing("recordings/s1/0.webm", None)]
    #[case::ambiguous("webcam/screen/0.webm", None)]
    fn infer_from_locator(#[case] locator: &str, #[case] expected: Option<StreamGroup>) {
        assert_eq!(StreamGroup::infer_from_locator(locator), expected);
    }

    #[test]
    fn from_str_reports_unknown_tag() {
        let err = "microphone".parse::<StreamGroup>().unwrap_err();
        assert_eq!(err, CoreError::UnknownGroup("microphone".to_string()));
    }

    #[test]
    fn signal_trust_order() {
        assert!(SignalSource::Explicit < SignalSource::Bucket);
        assert!(SignalSource::Bucket < SignalSource::Locator);
    }
}
