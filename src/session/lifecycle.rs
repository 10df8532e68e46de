use super::config::SessionConfig;
use super::gateway::ControlPlane;
use super::state::{SessionEvent, SessionSnapshot, SessionStatus};
use crate::error::LifecycleError;
use crate::media::{DeviceManager, InputStream, MediaPlatform, MixerConfig, PeerLink, VoiceMixer};
use crate::vendor::Signaling;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Label of the application data channel carrying session events
const EVENT_CHANNEL_LABEL: &str = "oai-events";

/// The client-side session lifecycle.
///
/// Owns the peer link, the local capture stream, and the analyser mixer for
/// the duration of one session. All methods take `&mut self`, so a start
/// can never overlap an in-flight start or terminate; the status guard
/// turns an overlapping attempt into a [`LifecycleError::Busy`] rejection
/// rather than queueing it.
pub struct VoiceSession {
    /// Correlation id for logs
    session_id: Uuid,

    config: SessionConfig,

    control: Arc<dyn ControlPlane>,
    signaling: Arc<dyn Signaling>,
    platform: Arc<dyn MediaPlatform>,

    devices: DeviceManager,

    status: SessionStatus,
    muted: bool,

    /// Set while the microphone is stopped because the surface is hidden
    mic_parked: bool,

    /// Set once the gateway minted a token; gates the `/end` notification
    slot_held: bool,

    started_at: Option<chrono::DateTime<Utc>>,

    peer: Option<Box<dyn PeerLink>>,
    local: Option<Box<dyn InputStream>>,
    mixer: Option<VoiceMixer>,
}

impl VoiceSession {
    pub fn new(
        config: SessionConfig,
        control: Arc<dyn ControlPlane>,
        signaling: Arc<dyn Signaling>,
        platform: Arc<dyn MediaPlatform>,
    ) -> Self {
        let devices = DeviceManager::new(platform.clone());

        Self {
            session_id: Uuid::new_v4(),
            config,
            control,
            signaling,
            platform,
            devices,
            status: SessionStatus::Idle,
            muted: false,
            mic_parked: false,
            slot_held: false,
            started_at: None,
            peer: None,
            local: None,
            mixer: None,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            muted: self.muted,
            started_at: self.started_at,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Mutable access for the configuration surface; only read at start
    pub fn config_mut(&mut self) -> &mut SessionConfig {
        &mut self.config
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut DeviceManager {
        &mut self.devices
    }

    /// Current analyser level for visualization (0.0 to 1.0)
    pub fn mixer_level(&mut self) -> f32 {
        match self.mixer.as_mut() {
            Some(mixer) => {
                mixer.pump();
                mixer.level()
            }
            None => 0.0,
        }
    }

    /// Start a session: mint a token, acquire the microphone, negotiate the
    /// peer connection, and wire the analyser mix.
    ///
    /// Any failure after the state leaves Idle runs termination to clean
    /// partial state and surfaces the error.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.status != SessionStatus::Idle {
            warn!(session_id = %self.session_id, "Start rejected: session not idle");
            return Err(LifecycleError::Busy);
        }

        self.status = SessionStatus::Connecting;
        info!(session_id = %self.session_id, "Starting voice session");

        match self.connect().await {
            Ok(()) => {
                self.status = SessionStatus::Active;
                self.started_at = Some(Utc::now());
                info!(session_id = %self.session_id, "Voice session active");
                Ok(())
            }
            Err(e) => {
                error!(session_id = %self.session_id, "Session start failed: {}", e);
                self.release_all(false).await;
                self.status = SessionStatus::Idle;
                Err(e)
            }
        }
    }

    async fn connect(&mut self) -> Result<(), LifecycleError> {
        let minted = self.control.mint_session(&self.config.token_request()).await?;
        self.slot_held = true;

        // Re-validate the configured device against the latest enumeration;
        // an enumeration failure still lets the platform default try.
        if let Err(e) = self.devices.refresh().await {
            warn!("Device enumeration failed before start: {}", e);
        }
        let target = self.resolve_target_device();

        let mut local = self.acquire_input(target.as_deref()).await?;
        self.muted = self.config.start_with_mic_disabled;
        if self.muted {
            local.set_enabled(false);
        }

        let mut peer = self.platform.open_peer().await?;
        peer.attach_audio(local.as_ref()).await?;
        peer.open_data_channel(EVENT_CHANNEL_LABEL).await?;

        let offer = peer.create_offer().await?;
        let answer = self
            .signaling
            .exchange_sdp(&self.config.model, &minted.client_secret, &offer)
            .await?;
        peer.apply_answer(&answer).await?;

        // Wire the analyser mix: local tap now, remote tap once the track
        // has arrived (attach is cached, so later callbacks are harmless).
        let mut mixer = local
            .take_tap()
            .map(|rx| VoiceMixer::new(MixerConfig::default(), rx));
        if let (Some(m), Some(remote)) = (mixer.as_mut(), peer.take_remote_tap()) {
            m.attach_remote(remote);
        }

        self.local = Some(local);
        self.peer = Some(peer);
        self.mixer = mixer;
        Ok(())
    }

    /// The device to open at start: the configured microphone when it is
    /// still present, otherwise the device manager's validated selection
    fn resolve_target_device(&self) -> Option<String> {
        if let Some(id) = self.config.microphone_id.as_deref() {
            if self.devices.devices().iter().any(|d| d.id == id) {
                return Some(id.to_string());
            }
            warn!("Configured microphone {} not present; using fallback", id);
        }
        self.devices.selected().map(str::to_string)
    }

    /// Open a capture stream with a one-shot fallback to the first
    /// available device
    async fn acquire_input(
        &self,
        device_id: Option<&str>,
    ) -> Result<Box<dyn InputStream>, LifecycleError> {
        match self.platform.open_input(device_id).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                warn!(
                    "Failed to open input {:?}: {}; trying first available device",
                    device_id, e
                );
                match self.devices.first_available() {
                    Some(fallback) if device_id != Some(fallback) => self
                        .platform
                        .open_input(Some(fallback))
                        .await
                        .map_err(LifecycleError::Device),
                    _ => Err(LifecycleError::Device(e)),
                }
            }
        }
    }

    /// Toggle the local audio track. Purely local and synchronous; never
    /// renegotiates or touches the network.
    pub fn set_muted(&mut self, muted: bool) {
        if let Some(local) = &self.local {
            local.set_enabled(!muted);
        }
        self.muted = muted;
    }

    /// Re-acquire the local stream and swap it into the live connection.
    ///
    /// Used on device hot-plug, visibility resume, and track-ended events.
    /// Replaces the outbound track on the existing sender (no
    /// renegotiation), stops the old stream, and rebinds the mixer's local
    /// leg. Idempotent and safe to call when no session is active.
    pub async fn reconnect_audio(&mut self, target: Option<&str>) -> Result<(), LifecycleError> {
        if self.status != SessionStatus::Active || self.peer.is_none() {
            return Ok(());
        }

        let target = target
            .map(str::to_string)
            .or_else(|| self.devices.selected().map(str::to_string));
        info!(session_id = %self.session_id, "Reconnecting audio to {:?}", target);

        let mut fresh = match self.acquire_input(target.as_deref()).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Audio reconnect found no usable device: {}", e);
                self.terminate(false).await;
                return Err(e);
            }
        };
        fresh.set_enabled(!self.muted);

        if let Some(peer) = self.peer.as_mut() {
            peer.replace_audio(fresh.as_ref()).await?;
        }

        if let Some(old) = self.local.take() {
            old.stop();
        }

        if let Some(rx) = fresh.take_tap() {
            match self.mixer.as_mut() {
                Some(mixer) => mixer.rebind_local(rx),
                None => self.mixer = Some(VoiceMixer::new(MixerConfig::default(), rx)),
            }
        }
        // Late remote arrival: attach once, cached thereafter
        if let (Some(mixer), Some(peer)) = (self.mixer.as_mut(), self.peer.as_mut()) {
            if !mixer.has_remote() {
                if let Some(remote) = peer.take_remote_tap() {
                    mixer.attach_remote(remote);
                }
            }
        }

        self.local = Some(fresh);
        Ok(())
    }

    /// Tear the session down and return to Idle.
    ///
    /// Idempotent: a second call finds nothing to release and is a no-op.
    /// Every release step is attempted independently; the gateway is
    /// notified best-effort (fire-and-forget when `unloading`).
    pub async fn terminate(&mut self, unloading: bool) {
        if self.status == SessionStatus::Terminating {
            return;
        }
        if self.status == SessionStatus::Idle && self.peer.is_none() && self.local.is_none() {
            return;
        }

        self.status = SessionStatus::Terminating;
        info!(session_id = %self.session_id, "Terminating voice session");

        self.release_all(unloading).await;

        self.status = SessionStatus::Idle;
        self.muted = false;
        self.mic_parked = false;
        self.started_at = None;
        info!(session_id = %self.session_id, "Voice session terminated");
    }

    /// Release held handles in order: peer link (with its data channel),
    /// mixer, local stream, then the gateway notification
    async fn release_all(&mut self, unloading: bool) {
        if let Some(mut peer) = self.peer.take() {
            peer.close();
        }
        self.mixer = None;
        if let Some(local) = self.local.take() {
            local.stop();
        }
        if self.slot_held {
            self.slot_held = false;
            self.control.end_session(unloading).await;
        }
    }

    /// Route a platform notification through the transition function
    pub async fn handle_event(&mut self, event: SessionEvent) -> Result<(), LifecycleError> {
        match event {
            SessionEvent::DevicesChanged => {
                let previous = self.devices.selected().map(str::to_string);
                if let Err(e) = self.devices.refresh().await {
                    warn!("Device re-enumeration failed: {}", e);
                    return Ok(());
                }
                let current = self.devices.selected().map(str::to_string);
                if self.status == SessionStatus::Active && previous != current {
                    self.reconnect_audio(current.as_deref()).await?;
                }
                Ok(())
            }

            SessionEvent::TabHidden => {
                // Stop, not mute: release the hardware while backgrounded
                if self.status == SessionStatus::Active {
                    if let Some(local) = &self.local {
                        local.stop();
                        self.mic_parked = true;
                        info!(session_id = %self.session_id, "Microphone parked while hidden");
                    }
                }
                Ok(())
            }

            SessionEvent::TabVisible => {
                if self.mic_parked && self.status == SessionStatus::Active {
                    self.mic_parked = false;
                    self.reconnect_audio(None).await?;
                }
                Ok(())
            }

            SessionEvent::TrackEnded => {
                if self.status == SessionStatus::Active {
                    self.reconnect_audio(None).await?;
                }
                Ok(())
            }
        }
    }

    /// Switch microphones mid-session: validate against the device list,
    /// then rewire the live connection if one exists
    pub async fn switch_microphone(&mut self, device_id: &str) -> Result<(), LifecycleError> {
        self.devices
            .switch_microphone(device_id)
            .map_err(LifecycleError::Device)?;
        self.config.microphone_id = Some(device_id.to_string());
        self.reconnect_audio(Some(device_id)).await
    }
}
