//! Rodio audio backend
//!
//! Cross-platform playback through the Rodio library. Rodio is pure Rust
//! and decodes WAV, OGG Vorbis, MP3, and FLAC; each voice is one sink on
//! the default output device.

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use slotmap::SlotMap;
use std::io::Cursor;

use super::{AudioBackend, BackendConfig, VoiceId};
use crate::{AudioError, AudioResult};

/// Rodio-based audio backend.
pub struct RodioBackend {
    // The OS output stream must outlive every sink created from it.
    _output_stream: Option<OutputStream>,
    stream_handle: Option<OutputStreamHandle>,
    voices: SlotMap<VoiceId, Sink>,
    initialized: bool,
}

impl RodioBackend {
    /// Create an uninitialized Rodio backend.
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            voices: SlotMap::with_key(),
            initialized: false,
        }
    }

    /// Number of live (unstopped) voices.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, _config: &BackendConfig) -> AudioResult<()> {
        if self.initialized {
            return Ok(());
        }

        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            AudioError::BackendInitFailed(format!("no audio output available: {e}"))
        })?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.initialized = true;

        log::info!("rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.stop_all();
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;

        log::info!("rodio audio backend shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn play_sound(&mut self, data: &[u8]) -> AudioResult<VoiceId> {
        let stream_handle = self
            .stream_handle
            .as_ref()
            .ok_or(AudioError::BackendNotInitialized)?;

        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("sink creation failed: {e}")))?;
        let source = Decoder::new(Cursor::new(data.to_vec()))
            .map_err(|e| AudioError::PlaybackFailed(format!("decode failed: {e}")))?;
        sink.append(source);

        Ok(self.voices.insert(sink))
    }

    fn pause(&mut self, voice: VoiceId) -> AudioResult<()> {
        let sink = self.voices.get(voice).ok_or(AudioError::InvalidVoice)?;
        sink.pause();
        Ok(())
    }

    fn resume(&mut self, voice: VoiceId) -> AudioResult<()> {
        let sink = self.voices.get(voice).ok_or(AudioError::InvalidVoice)?;
        sink.play();
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(sink) = self.voices.remove(voice) {
            sink.stop();
        }
    }

    fn set_volume(&mut self, voice: VoiceId, volume: f32) -> AudioResult<()> {
        let sink = self.voices.get(voice).ok_or(AudioError::InvalidVoice)?;
        sink.set_volume(volume);
        Ok(())
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.voices
            .get(voice)
            .map_or(false, |sink| !sink.is_paused() && !sink.empty())
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices.get(voice).map_or(true, Sink::empty)
    }

    fn stop_all(&mut self) {
        for (_voice, sink) in self.voices.drain() {
            sink.stop();
        }
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_without_initialization() {
        let mut backend = RodioBackend::new();
        let result = backend.play_sound(&[0u8; 64]);
        assert!(matches!(result, Err(AudioError::BackendNotInitialized)));
    }

    #[test]
    fn test_initialization_lifecycle() {
        let mut backend = RodioBackend::new();
        assert!(!backend.is_initialized());

        // May fail in CI/test environments without an audio device.
        if backend.initialize(&BackendConfig::default()).is_ok() {
            assert!(backend.is_initialized());

            // A second initialization is a no-op.
            assert!(backend.initialize(&BackendConfig::default()).is_ok());

            backend.shutdown();
            assert!(!backend.is_initialized());
        }
    }

    #[test]
    fn test_unknown_voice_operations() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let mut arena: SlotMap<VoiceId, ()> = SlotMap::with_key();
            let ghost = arena.insert(());

            assert!(matches!(backend.pause(ghost), Err(AudioError::InvalidVoice)));
            assert!(matches!(
                backend.resume(ghost),
                Err(AudioError::InvalidVoice)
            ));
            assert!(matches!(
                backend.set_volume(ghost, 0.5),
                Err(AudioError::InvalidVoice)
            ));
            assert!(!backend.is_playing(ghost));
            assert!(backend.is_finished(ghost));
            backend.stop(ghost); // idempotent
        }
    }

    #[test]
    fn test_undecodable_data_is_rejected() {
        let mut backend = RodioBackend::new();
        if backend.initialize(&BackendConfig::default()).is_ok() {
            let result = backend.play_sound(&[0u8; 16]);
            assert!(matches!(result, Err(AudioError::PlaybackFailed(_))));
            assert_eq!(backend.voice_count(), 0);
        }
    }
}
