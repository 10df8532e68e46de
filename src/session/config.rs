use crate::vendor::TokenRequest;
use serde::{Deserialize, Serialize};

/// Configuration for one realtime voice session
///
/// Built with defaults at app start, mutated through the configuration
/// surface, and read once when a session starts to build the vendor request
/// and device constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Vendor realtime model
    pub model: String,

    /// Vendor voice preset
    pub voice: String,

    /// System instructions for the assistant
    pub instructions: String,

    /// Preferred input device id; platform default when `None`
    pub microphone_id: Option<String>,

    /// Start the session with the microphone track disabled
    pub start_with_mic_disabled: bool,

    /// Sampling temperature, forwarded verbatim as entered
    pub temperature: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-realtime-preview".to_string(),
            voice: "verse".to_string(),
            instructions: "You are a friendly conversation partner.".to_string(),
            microphone_id: None,
            start_with_mic_disabled: false,
            temperature: None,
        }
    }
}

impl SessionConfig {
    /// The token request sent to the gateway at session start
    pub fn token_request(&self) -> TokenRequest {
        TokenRequest {
            model: self.model.clone(),
            voice: self.voice.clone(),
            instructions: self.instructions.clone(),
            temperature: self.temperature.clone(),
        }
    }
}
