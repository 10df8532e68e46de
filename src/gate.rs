use std::sync::Mutex;
use tracing::{info, warn};

/// Default bound on concurrent realtime sessions
pub const MAX_SESSIONS: usize = 20;

/// Bounded counter of concurrent sessions, gating token issuance.
///
/// The count is advisory throttling, not a security boundary: `/end` callers
/// are unauthenticated, and a client that dies without calling `/end` leaks
/// its slot until the process restarts. The fullness check happens before
/// the vendor call and the increment after it succeeds, so true concurrent
/// load can briefly overshoot the bound.
pub struct AdmissionGate {
    active: Mutex<usize>,
    max_sessions: usize,
}

impl AdmissionGate {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            active: Mutex::new(0),
            max_sessions,
        }
    }

    /// Whether the gate is at capacity
    pub fn is_full(&self) -> bool {
        *self.active.lock().unwrap() >= self.max_sessions
    }

    /// Count a session that the vendor accepted
    pub fn register(&self) {
        let mut active = self.active.lock().unwrap();
        *active += 1;
        info!("Session registered ({}/{} active)", *active, self.max_sessions);
    }

    /// Release a slot, floored at zero. Idempotent under over-release.
    pub fn release(&self) {
        let mut active = self.active.lock().unwrap();
        if *active == 0 {
            warn!("Release with no active sessions; ignoring");
            return;
        }
        *active -= 1;
        info!("Session released ({}/{} active)", *active, self.max_sessions);
    }

    /// Current number of registered sessions
    pub fn active(&self) -> usize {
        *self.active.lock().unwrap()
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}
