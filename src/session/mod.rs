pub mod config;
pub mod gateway;
pub mod lifecycle;
pub mod router;
pub mod state;

pub use config::SessionConfig;
pub use gateway::{ControlPlane, GatewayClient, MintedSession};
pub use lifecycle::VoiceSession;
pub use router::{Screen, ViewRouter};
pub use state::{SessionEvent, SessionSnapshot, SessionStatus};
