use tessera_core::{SessionId, StreamGroup};

/// Lifecycle events from a playback session.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Assembly for a group was started.
    Started {
        session: SessionId,
        group: StreamGroup,
    },
    /// A group was torn down and its media resources released.
    TornDown { group: StreamGroup },
    /// Every group was torn down.
    Stopped,
}
