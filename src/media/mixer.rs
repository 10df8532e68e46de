// Two-source mixer feeding the level analyser.
//
// Merges the local microphone tap and the remote vendor tap into one mixed
// stream used only for visualization. Frames are buffered per source,
// time-aligned, and summed with clipping. When the local stream is replaced
// (device switch, reconnect) the local leg is rebound so a stopped stream's
// tap is never referenced; the remote tap is attached once and kept.

use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::frames::{AudioFrame, StreamSource};

/// Configuration for the voice mixer
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// Expected sample rate of incoming frames
    pub sample_rate: u32,
    /// Expected channel count of incoming frames
    pub channels: u16,
    /// Maximum buffering delay in milliseconds; older frames are dropped
    /// to prevent unbounded buffering
    pub max_buffer_delay_ms: u64,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            channels: 1,
            max_buffer_delay_ms: 200,
        }
    }
}

/// Mixer combining the local microphone and remote vendor audio
pub struct VoiceMixer {
    config: MixerConfig,
    local_rx: mpsc::Receiver<AudioFrame>,
    remote_rx: Option<mpsc::Receiver<AudioFrame>>,
    buffers: HashMap<StreamSource, VecDeque<AudioFrame>>,
    current_position_ms: u64,
    /// Normalized RMS of the most recent mixed frame (0.0 to 1.0)
    level: f32,
}

impl VoiceMixer {
    /// Build a mixer bound to a local microphone tap
    pub fn new(config: MixerConfig, local_rx: mpsc::Receiver<AudioFrame>) -> Self {
        let mut buffers = HashMap::new();
        buffers.insert(StreamSource::Local, VecDeque::new());
        buffers.insert(StreamSource::Remote, VecDeque::new());

        Self {
            config,
            local_rx,
            remote_rx: None,
            buffers,
            current_position_ms: 0,
            level: 0.0,
        }
    }

    /// Attach the remote vendor tap.
    ///
    /// The remote tap survives local rebinds and is attached at most once:
    /// repeated negotiation callbacks handing over another receiver are
    /// ignored. Returns whether the tap was accepted.
    pub fn attach_remote(&mut self, rx: mpsc::Receiver<AudioFrame>) -> bool {
        if self.remote_rx.is_some() {
            debug!("Remote tap already attached; ignoring duplicate");
            return false;
        }
        self.remote_rx = Some(rx);
        true
    }

    /// Whether a remote tap has been attached
    pub fn has_remote(&self) -> bool {
        self.remote_rx.is_some()
    }

    /// Rebind the local leg to a fresh tap after the local stream was
    /// replaced.
    ///
    /// Drops the old receiver and clears buffered local frames so the mix
    /// never references a stopped stream. Remote state is untouched.
    pub fn rebind_local(&mut self, rx: mpsc::Receiver<AudioFrame>) {
        self.local_rx = rx;
        if let Some(buffer) = self.buffers.get_mut(&StreamSource::Local) {
            buffer.clear();
        }
        debug!("Local mixer leg rebound to fresh tap");
    }

    /// Drain both taps without blocking and fold available frames into the
    /// mix. Returns the frames mixed during this pump.
    pub fn pump(&mut self) -> Vec<AudioFrame> {
        let mut incoming = Vec::new();
        while let Ok(frame) = self.local_rx.try_recv() {
            incoming.push(frame);
        }
        if let Some(remote) = self.remote_rx.as_mut() {
            while let Ok(frame) = remote.try_recv() {
                incoming.push(frame);
            }
        }
        for frame in incoming {
            self.buffer_frame(frame);
        }
        self.cleanup_old_frames();

        let mut mixed_frames = Vec::new();
        while let Some(mixed) = self.mix_next_chunk() {
            self.level = Self::rms_level(&mixed);
            mixed_frames.push(mixed);
        }
        mixed_frames
    }

    /// Normalized RMS of the most recent mixed frame, for visualization
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Buffer a frame into its source's queue after validating its format
    fn buffer_frame(&mut self, frame: AudioFrame) {
        if frame.sample_rate != self.config.sample_rate {
            warn!(
                "Frame sample rate mismatch: expected {}, got {}. Dropping frame.",
                self.config.sample_rate, frame.sample_rate
            );
            return;
        }

        if frame.channels != self.config.channels {
            warn!(
                "Frame channel count mismatch: expected {}, got {}. Dropping frame.",
                self.config.channels, frame.channels
            );
            return;
        }

        if let Some(buffer) = self.buffers.get_mut(&frame.source) {
            buffer.push_back(frame);
        }
    }

    /// Remove frames older than the max buffer delay
    fn cleanup_old_frames(&mut self) {
        let cutoff_time = self
            .current_position_ms
            .saturating_sub(self.config.max_buffer_delay_ms);

        for (source, buffer) in &mut self.buffers {
            while let Some(frame) = buffer.front() {
                if frame.timestamp_ms < cutoff_time {
                    warn!(
                        "Dropping old {:?} frame at {}ms (current position: {}ms)",
                        source, frame.timestamp_ms, self.current_position_ms
                    );
                    buffer.pop_front();
                } else {
                    break;
                }
            }
        }
    }

    /// Mix the next chunk from the source buffers, or `None` when no data
    /// is available
    fn mix_next_chunk(&mut self) -> Option<AudioFrame> {
        let mut frames_to_mix: Vec<AudioFrame> = Vec::new();

        for buffer in self.buffers.values_mut() {
            if let Some(frame) = buffer.pop_front() {
                frames_to_mix.push(frame);
            }
        }

        if frames_to_mix.is_empty() {
            return None;
        }

        if frames_to_mix.len() == 1 {
            let frame = frames_to_mix.into_iter().next().unwrap();
            self.current_position_ms = frame.timestamp_ms;
            return Some(frame);
        }

        let mixed = Self::mix_frames(&self.config, &frames_to_mix);
        self.current_position_ms = mixed.timestamp_ms;
        Some(mixed)
    }

    /// Sum frames together with clipping, aligned at the earliest timestamp
    fn mix_frames(config: &MixerConfig, frames: &[AudioFrame]) -> AudioFrame {
        let timestamp_ms = frames.iter().map(|f| f.timestamp_ms).min().unwrap_or(0);
        let max_len = frames.iter().map(|f| f.samples.len()).max().unwrap_or(0);
        let mut mixed_samples = Vec::with_capacity(max_len);

        for i in 0..max_len {
            let mut sum: i32 = 0;
            for frame in frames {
                sum += frame.samples.get(i).copied().unwrap_or(0) as i32;
            }
            mixed_samples.push(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
        }

        AudioFrame {
            samples: mixed_samples,
            sample_rate: config.sample_rate,
            channels: config.channels,
            timestamp_ms,
            source: StreamSource::Local,
        }
    }

    fn rms_level(frame: &AudioFrame) -> f32 {
        if frame.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = frame
            .samples
            .iter()
            .map(|&s| {
                let v = s as f64;
                v * v
            })
            .sum();
        let rms = (sum_sq / frame.samples.len() as f64).sqrt();
        (rms / i16::MAX as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(source: StreamSource, timestamp_ms: u64, samples: Vec<i16>) -> AudioFrame {
        AudioFrame {
            samples,
            sample_rate: 24000,
            channels: 1,
            timestamp_ms,
            source,
        }
    }

    #[test]
    fn test_mix_frames_equal_length() {
        let config = MixerConfig::default();
        let frames = vec![
            frame(StreamSource::Local, 0, vec![100, 200, 300]),
            frame(StreamSource::Remote, 0, vec![50, 100, 150]),
        ];

        let mixed = VoiceMixer::mix_frames(&config, &frames);

        assert_eq!(mixed.samples.len(), 3);
        assert_eq!(mixed.samples[0], 150); // 100 + 50
        assert_eq!(mixed.samples[1], 300); // 200 + 100
        assert_eq!(mixed.samples[2], 450); // 300 + 150
    }

    #[test]
    fn test_mix_frames_with_clipping() {
        let config = MixerConfig::default();
        let frames = vec![
            frame(StreamSource::Local, 0, vec![i16::MAX - 100]),
            frame(StreamSource::Remote, 0, vec![200]),
        ];

        let mixed = VoiceMixer::mix_frames(&config, &frames);

        assert_eq!(mixed.samples[0], i16::MAX); // Clipped to max
    }

    #[test]
    fn test_mix_frames_different_lengths() {
        let config = MixerConfig::default();
        let frames = vec![
            frame(StreamSource::Local, 0, vec![100, 200]),
            frame(StreamSource::Remote, 0, vec![50, 100, 150, 200]),
        ];

        let mixed = VoiceMixer::mix_frames(&config, &frames);

        assert_eq!(mixed.samples.len(), 4); // Length of longer frame
        assert_eq!(mixed.samples[0], 150);
        assert_eq!(mixed.samples[1], 300);
        assert_eq!(mixed.samples[2], 150); // Local ended
        assert_eq!(mixed.samples[3], 200); // Local ended
    }

    #[test]
    fn test_pump_merges_both_taps() {
        let (local_tx, local_rx) = mpsc::channel(16);
        let (remote_tx, remote_rx) = mpsc::channel(16);

        let mut mixer = VoiceMixer::new(MixerConfig::default(), local_rx);
        assert!(mixer.attach_remote(remote_rx));

        local_tx
            .try_send(frame(StreamSource::Local, 0, vec![100, 100]))
            .unwrap();
        remote_tx
            .try_send(frame(StreamSource::Remote, 0, vec![25, 50]))
            .unwrap();

        let mixed = mixer.pump();
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].samples, vec![125, 150]);
        assert!(mixer.level() > 0.0);
    }

    #[test]
    fn test_attach_remote_is_cached() {
        let (_local_tx, local_rx) = mpsc::channel(16);
        let (_tx1, rx1) = mpsc::channel(16);
        let (_tx2, rx2) = mpsc::channel(16);

        let mut mixer = VoiceMixer::new(MixerConfig::default(), local_rx);

        assert!(mixer.attach_remote(rx1));
        // A repeated negotiation callback must not rebind the remote leg
        assert!(!mixer.attach_remote(rx2));
        assert!(mixer.has_remote());
    }

    #[test]
    fn test_rebind_local_drops_old_tap() {
        let (old_tx, old_rx) = mpsc::channel(16);
        let (new_tx, new_rx) = mpsc::channel(16);

        let mut mixer = VoiceMixer::new(MixerConfig::default(), old_rx);
        old_tx
            .try_send(frame(StreamSource::Local, 0, vec![1, 2]))
            .unwrap();

        mixer.rebind_local(new_rx);

        // The old sender's channel is closed and its buffered frames cleared
        assert!(old_tx.is_closed());
        new_tx
            .try_send(frame(StreamSource::Local, 0, vec![10, 20]))
            .unwrap();
        let mixed = mixer.pump();
        assert_eq!(mixed.len(), 1);
        assert_eq!(mixed[0].samples, vec![10, 20]);
    }

    #[test]
    fn test_frame_format_mismatch_dropped() {
        let (local_tx, local_rx) = mpsc::channel(16);
        let mut mixer = VoiceMixer::new(MixerConfig::default(), local_rx);

        local_tx
            .try_send(AudioFrame {
                samples: vec![1, 2, 3],
                sample_rate: 16000, // mixer expects 24000
                channels: 1,
                timestamp_ms: 0,
                source: StreamSource::Local,
            })
            .unwrap();

        assert!(mixer.pump().is_empty());
    }

    #[test]
    fn test_old_frames_cleaned_up() {
        let (local_tx, local_rx) = mpsc::channel(16);
        let mut mixer = VoiceMixer::new(MixerConfig::default(), local_rx);

        local_tx
            .try_send(frame(StreamSource::Local, 1000, vec![5, 5]))
            .unwrap();
        mixer.pump();

        // Far older than max_buffer_delay_ms behind the mix position
        local_tx
            .try_send(frame(StreamSource::Local, 100, vec![9, 9]))
            .unwrap();
        assert!(mixer.pump().is_empty());
    }
}
