pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod media;
pub mod prompt;
pub mod session;
pub mod vendor;

pub use config::Config;
pub use error::{DeviceError, LifecycleError, NegotiationError, TransportError};
pub use gate::{AdmissionGate, MAX_SESSIONS};
pub use http::{create_router, AppState};
pub use media::{
    AudioDevice, AudioFrame, DeviceManager, InputStream, MediaPlatform, MixerConfig, PeerLink,
    StreamSource, VoiceMixer,
};
pub use session::{
    ControlPlane, GatewayClient, MintedSession, Screen, SessionConfig, SessionEvent,
    SessionSnapshot, SessionStatus, ViewRouter, VoiceSession,
};
pub use vendor::{ChatMessage, ChatRequest, OpenAiClient, Signaling, TokenRequest, Upstream, VendorApi};
