use tessera_core::{SignalSource, StreamGroup};

/// One piece of evidence about a chunk's stream group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupSignal {
    Explicit(StreamGroup),
    Bucket(StreamGroup),
    Locator(StreamGroup),
}

impl GroupSignal {
    pub fn group(self) -> StreamGroup {
        match self {
            Self::Explicit(g) | Self::Bucket(g) | Self::Locator(g) => g,
        }
    }

    pub fn source(self) -> SignalSource {
        match self {
            Self::Explicit(_) => SignalSource::Explicit,
            Self::Bucket(_) => SignalSource::Bucket,
            Self::Locator(_) => SignalSource::Locator,
        }
    }
}

/// Resolved group plus every signal that disagreed with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub group: StreamGroup,
    pub resolved_by: SignalSource,
    pub conflicts: Vec<GroupSignal>,
}

/// Resolve a group from the available signals. The most trusted signal
/// wins; `None` when there is no signal at all.
pub fn classify(signals: impl IntoIterator<Item = GroupSignal>) -> Option<Classification> {
    let mut signals: Vec<GroupSignal> = signals.into_iter().collect();
    signals.sort_by_key(|s| s.source());

    let winner = *signals.first()?;
    let conflicts = signals
        .into_iter()
        .skip(1)
        .filter(|s| s.group() != winner.group())
        .collect();

    Some(Classification {
        group: winner.group(),
        resolved_by: winner.source(),
        conflicts,
    })
}
