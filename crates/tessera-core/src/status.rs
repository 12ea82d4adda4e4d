use std::fmt;

/// Lifecycle of one group's assembly.
///
/// `Idle → Negotiating → Appending → Finalizing → {Ready, Failed}`, plus
/// `Empty` for a group with nothing to play and `Cancelled` for an
/// assembly torn down mid-flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AssemblyStatus {
    #[default]
    Idle,
    Negotiating,
    Appending,
    Finalizing,
    Ready,
    Failed,
    Empty,
    Cancelled,
}

impl AssemblyStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Failed | Self::Empty | Self::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Negotiating => "negotiating",
            Self::Appending => "appending",
            Self::Finalizing => "finalizing",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Empty => "empty",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AssemblyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
