use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Externally visible lifecycle state.
///
/// Idle is both initial and terminal. The transient reconnect during device
/// switches never changes the visible status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Connecting,
    Active,
    Terminating,
}

/// Platform notifications routed into the lifecycle's single transition
/// function rather than handled by scattered listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// An input device was plugged in or removed
    DevicesChanged,
    /// The surface was hidden (tab backgrounded)
    TabHidden,
    /// The surface became visible again
    TabVisible,
    /// The active local track ended underneath the session
    TrackEnded,
}

/// Snapshot of lifecycle state for the UI surface
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub muted: bool,
    pub started_at: Option<DateTime<Utc>>,
}
