//! Load lifecycle of the embedded document.

/// Load state of the embedded document as seen by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Transport-level failure to load the document at all.
    Failed {
        message: String,
    },
    Closed,
}

impl LoadState {
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
            LoadState::Failed { .. } => "failed",
            LoadState::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, LoadState::Closed)
    }

    /// Failed documents offer retry and open-externally affordances.
    pub fn offers_retry(&self) -> bool {
        matches!(self, LoadState::Failed { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            LoadState::Failed { message } => Some(message),
            _ => None,
        }
    }
}
