//! Headless audio backend
//!
//! Silent stand-in for machines with no audio device: CI runners,
//! dedicated servers, and tests. Voices go through the same lifecycle as
//! real ones but never reach hardware.
//!
//! The voice table is shared with a [`HeadlessController`], so a test (or
//! a server harness) can watch voice counts and declare voices finished
//! from outside the backend.

use slotmap::SlotMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{AudioBackend, BackendConfig, VoiceId};
use crate::{AudioError, AudioResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceStatus {
    Playing,
    Paused,
    Finished,
}

type VoiceTable = SlotMap<VoiceId, VoiceStatus>;

/// Silent backend that tracks voice state in memory.
pub struct HeadlessBackend {
    voices: Arc<Mutex<VoiceTable>>,
    initialized: bool,
}

impl HeadlessBackend {
    /// Create an uninitialized headless backend.
    pub fn new() -> Self {
        Self {
            voices: Arc::new(Mutex::new(SlotMap::with_key())),
            initialized: false,
        }
    }

    /// External view onto this backend's voice table. Stays valid after
    /// the backend is boxed behind the `AudioBackend` trait.
    pub fn controller(&self) -> HeadlessController {
        HeadlessController {
            voices: Arc::clone(&self.voices),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VoiceTable> {
        self.voices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioBackend for HeadlessBackend {
    fn initialize(&mut self, _config: &BackendConfig) -> AudioResult<()> {
        if !self.initialized {
            self.initialized = true;
            log::info!("headless audio backend initialized");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop_all();
        self.initialized = false;
        log::info!("headless audio backend shut down");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn play_sound(&mut self, data: &[u8]) -> AudioResult<VoiceId> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }
        if data.is_empty() {
            return Err(AudioError::PlaybackFailed("empty sound buffer".to_string()));
        }
        Ok(self.lock().insert(VoiceStatus::Playing))
    }

    fn pause(&mut self, voice: VoiceId) -> AudioResult<()> {
        let mut voices = self.lock();
        let status = voices.get_mut(voice).ok_or(AudioError::InvalidVoice)?;
        if *status == VoiceStatus::Playing {
            *status = VoiceStatus::Paused;
        }
        Ok(())
    }

    fn resume(&mut self, voice: VoiceId) -> AudioResult<()> {
        let mut voices = self.lock();
        let status = voices.get_mut(voice).ok_or(AudioError::InvalidVoice)?;
        if *status == VoiceStatus::Paused {
            *status = VoiceStatus::Playing;
        }
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) {
        self.lock().remove(voice);
    }

    fn set_volume(&mut self, voice: VoiceId, _volume: f32) -> AudioResult<()> {
        self.lock().get(voice).ok_or(AudioError::InvalidVoice)?;
        Ok(())
    }

    fn is_playing(&self, voice: VoiceId) -> bool {
        self.lock().get(voice) == Some(&VoiceStatus::Playing)
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        match self.lock().get(voice) {
            Some(status) => *status == VoiceStatus::Finished,
            None => true,
        }
    }

    fn stop_all(&mut self) {
        self.lock().clear();
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// External handle onto a [`HeadlessBackend`]'s voice table.
pub struct HeadlessController {
    voices: Arc<Mutex<VoiceTable>>,
}

impl HeadlessController {
    fn lock(&self) -> MutexGuard<'_, VoiceTable> {
        self.voices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of live (unstopped) voices.
    pub fn live_voices(&self) -> usize {
        self.lock().len()
    }

    /// Number of voices currently audible.
    pub fn playing(&self) -> usize {
        self.lock()
            .values()
            .filter(|status| **status == VoiceStatus::Playing)
            .count()
    }

    /// Number of voices currently paused.
    pub fn paused(&self) -> usize {
        self.lock()
            .values()
            .filter(|status| **status == VoiceStatus::Paused)
            .count()
    }

    /// Declare every live voice finished, as if its data ran out.
    pub fn finish_all(&self) {
        for status in self.lock().values_mut() {
            *status = VoiceStatus::Finished;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn initialized() -> HeadlessBackend {
        let mut backend = HeadlessBackend::new();
        backend.initialize(&BackendConfig::default()).unwrap();
        backend
    }

    #[test]
    fn test_requires_initialization() {
        let mut backend = HeadlessBackend::new();
        assert!(matches!(
            backend.play_sound(&[1u8; 4]),
            Err(AudioError::BackendNotInitialized)
        ));
    }

    #[test]
    fn test_rejects_empty_buffer() {
        let mut backend = initialized();
        assert!(matches!(
            backend.play_sound(&[]),
            Err(AudioError::PlaybackFailed(_))
        ));
    }

    #[test]
    fn test_voice_lifecycle() {
        let mut backend = initialized();
        let voice = backend.play_sound(&[1u8; 4]).unwrap();

        assert!(backend.is_playing(voice));
        assert!(!backend.is_finished(voice));

        backend.pause(voice).unwrap();
        assert!(!backend.is_playing(voice));

        backend.resume(voice).unwrap();
        assert!(backend.is_playing(voice));

        backend.stop(voice);
        assert!(backend.is_finished(voice));
    }

    #[test]
    fn test_controller_observes_and_finishes() {
        let mut backend = initialized();
        let controller = backend.controller();

        let voice = backend.play_sound(&[1u8; 4]).unwrap();
        let _other = backend.play_sound(&[1u8; 4]).unwrap();
        backend.pause(voice).unwrap();

        assert_eq!(controller.live_voices(), 2);
        assert_eq!(controller.playing(), 1);
        assert_eq!(controller.paused(), 1);

        controller.finish_all();
        assert!(backend.is_finished(voice));
        assert_eq!(controller.playing(), 0);
    }

    #[test]
    fn test_shutdown_clears_voices() {
        let mut backend = initialized();
        let controller = backend.controller();
        backend.play_sound(&[1u8; 4]).unwrap();

        backend.shutdown();
        assert!(!backend.is_initialized());
        assert_eq!(controller.live_voices(), 0);
    }
}
