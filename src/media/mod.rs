pub mod devices;
pub mod frames;
pub mod mixer;
pub mod platform;

pub use devices::DeviceManager;
pub use frames::{AudioFrame, StreamSource};
pub use mixer::{MixerConfig, VoiceMixer};
pub use platform::{AudioDevice, InputStream, MediaPlatform, PeerLink};
