/// Audio stream source type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    /// Local microphone input
    Local,
    /// Remote vendor audio track
    Remote,
}

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since the session connected
    pub timestamp_ms: u64,
    /// Which side of the conversation produced this frame
    pub source: StreamSource,
}

impl AudioFrame {
    /// Duration of this frame in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let per_channel = self.samples.len() as u64 / self.channels as u64;
        per_channel * 1000 / self.sample_rate as u64
    }
}
