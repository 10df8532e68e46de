use thiserror::Error;

/// Failures while acquiring or enumerating audio input devices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("audio input device not found: {0}")]
    NotFound(String),

    #[error("audio input device unavailable: {0}")]
    Unavailable(String),

    #[error("no audio input devices available")]
    NoDevices,
}

/// Network or parse failure talking to the vendor; the gateway maps this
/// to HTTP 500 with the message as the body.
#[derive(Error, Debug, Clone)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Failures while negotiating or maintaining the peer media connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("SDP negotiation failed: {0}")]
    Sdp(String),

    #[error("peer connection closed")]
    PeerClosed,

    #[error("signaling transport error: {0}")]
    Transport(String),
}

/// Session lifecycle errors surfaced to the embedding surface.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A start or terminate is already in flight; overlapping starts are
    /// rejected rather than queued.
    #[error("session operation already in progress")]
    Busy,

    /// The gateway's admission gate rejected the session.
    #[error("API is overloaded, please wait a bit")]
    Overloaded,

    /// Non-success response from the vendor or gateway, relayed with its
    /// original status and body.
    #[error("vendor error (status {status}): {body}")]
    Vendor { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    /// Token response carried no usable ephemeral credential.
    #[error("token response missing client credential")]
    MissingCredential,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
}
