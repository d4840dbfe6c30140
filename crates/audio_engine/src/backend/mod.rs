//! Audio backend implementations
//!
//! Platform-independent abstraction over native audio playback. The pool
//! and the system facade drive backends exclusively through the
//! [`AudioBackend`] trait; which concrete backend runs is a deployment
//! decision (a real device via rodio, or the silent headless backend on
//! machines without one).

pub mod headless;
#[cfg(feature = "rodio-backend")]
pub mod rodio_backend;

use serde::{Deserialize, Serialize};

use crate::AudioResult;

slotmap::new_key_type! {
    /// Key identifying one native voice inside a backend.
    pub struct VoiceId;
}

/// Audio backend trait for platform abstraction.
///
/// A "voice" is one native playback stream; the backend owns its decoding
/// and output resources and frees them on [`AudioBackend::stop`].
pub trait AudioBackend {
    /// Initialize the backend. Idempotent; a second call is a no-op.
    fn initialize(&mut self, config: &BackendConfig) -> AudioResult<()>;

    /// Stop every voice and release the output device.
    fn shutdown(&mut self);

    /// Whether `initialize` has succeeded.
    fn is_initialized(&self) -> bool;

    /// Start playback of an encoded sound buffer (WAV, OGG Vorbis, MP3,
    /// or FLAC), returning the native voice.
    fn play_sound(&mut self, data: &[u8]) -> AudioResult<VoiceId>;

    /// Suspend a voice.
    fn pause(&mut self, voice: VoiceId) -> AudioResult<()>;

    /// Resume a suspended voice.
    fn resume(&mut self, voice: VoiceId) -> AudioResult<()>;

    /// Stop a voice and free its native resources. Idempotent.
    fn stop(&mut self, voice: VoiceId);

    /// Set the gain of a voice (0.0 = silent, 1.0 = unchanged).
    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> AudioResult<()>;

    /// Whether the voice is audible right now (not paused, not finished).
    fn is_playing(&self, voice: VoiceId) -> bool;

    /// Whether the voice has played to completion or been stopped.
    fn is_finished(&self, voice: VoiceId) -> bool;

    /// Stop every active voice.
    fn stop_all(&mut self);
}

/// Configuration for an audio backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
        }
    }
}

/// Create the default audio backend for the platform.
#[cfg(feature = "rodio-backend")]
pub fn create_backend(config: &BackendConfig) -> AudioResult<Box<dyn AudioBackend>> {
    let mut backend = Box::new(rodio_backend::RodioBackend::new());
    backend.initialize(config)?;
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_defaults() {
        let config = BackendConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
        assert_eq!(config.buffer_size, 4096);
    }
}
