use crate::error::{DeviceError, NegotiationError};
use tokio::sync::mpsc;

use super::frames::AudioFrame;

/// An audio input device descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Platform-assigned device id
    pub id: String,
    /// Human-readable label (empty until a permission grant unlocks it)
    pub label: String,
}

/// A live local capture stream bound to one input device.
///
/// Platform-specific implementations wrap whatever the embedding surface
/// provides (a browser media stream, a native capture handle, a file source
/// in tests). The lifecycle only ever holds these as boxed trait objects.
pub trait InputStream: Send + Sync {
    /// Id of the device this stream captures from
    fn device_id(&self) -> &str;

    /// Enable or disable the audio track without releasing the device
    fn set_enabled(&self, enabled: bool);

    /// Whether the track is currently enabled
    fn enabled(&self) -> bool;

    /// Stop capture and release the hardware device. Idempotent.
    fn stop(&self);

    /// Whether the stream has been stopped
    fn stopped(&self) -> bool;

    /// Take the PCM tap for this stream.
    ///
    /// Yields `Some` exactly once; later calls return `None`.
    fn take_tap(&mut self) -> Option<mpsc::Receiver<AudioFrame>>;
}

/// The peer media connection to the vendor.
///
/// Owns the underlying connection, the outbound audio sender, and the
/// application data channel. ICE, codecs, and media transport are the
/// platform's problem; this seam only carries the calls the lifecycle makes.
#[async_trait::async_trait]
pub trait PeerLink: Send + Sync {
    /// Attach the stream's audio track as the outbound sender
    async fn attach_audio(&mut self, stream: &dyn InputStream) -> Result<(), NegotiationError>;

    /// Open the application data channel used for session events
    async fn open_data_channel(&mut self, label: &str) -> Result<(), NegotiationError>;

    /// Generate the local SDP offer
    async fn create_offer(&mut self) -> Result<String, NegotiationError>;

    /// Apply the vendor's SDP answer as the remote description
    async fn apply_answer(&mut self, sdp: &str) -> Result<(), NegotiationError>;

    /// Swap the outbound audio track in place. No renegotiation.
    async fn replace_audio(&mut self, stream: &dyn InputStream) -> Result<(), NegotiationError>;

    /// Take the remote audio tap.
    ///
    /// `None` until the remote track has arrived, and `None` again after the
    /// first successful take.
    fn take_remote_tap(&mut self) -> Option<mpsc::Receiver<AudioFrame>>;

    /// Tear the connection down. Idempotent.
    fn close(&mut self);
}

/// Platform capabilities the session lifecycle runs on top of.
///
/// Implementations exist per embedding surface; tests use an in-memory mock.
#[async_trait::async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Request a throwaway audio permission grant to unlock device labels,
    /// releasing it immediately.
    async fn unlock_labels(&self) -> Result<(), DeviceError>;

    /// Enumerate audio input devices, in platform order
    async fn enumerate_inputs(&self) -> Result<Vec<AudioDevice>, DeviceError>;

    /// Open a capture stream for `device_id`, or the platform default when
    /// `None`
    async fn open_input(&self, device_id: Option<&str>)
        -> Result<Box<dyn InputStream>, DeviceError>;

    /// Create a fresh peer connection
    async fn open_peer(&self) -> Result<Box<dyn PeerLink>, NegotiationError>;
}
