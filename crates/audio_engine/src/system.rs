//! Audio system facade
//!
//! [`AudioSystem`] is the one explicitly constructed, explicitly owned
//! entry point for playback: it owns the source pool and the native
//! backend and keeps the two consistent. Build it once during subsystem
//! start-up and pass it by reference to whatever needs audio; there is
//! no global instance.

use crate::backend::AudioBackend;
use crate::config::AudioConfig;
use crate::pool::{Acquire, SourceHandle, SourcePool};
use crate::source::SourceState;
use crate::AudioResult;

/// Owns the sound source pool and the audio backend.
pub struct AudioSystem {
    pool: SourcePool,
    backend: Box<dyn AudioBackend>,
}

impl AudioSystem {
    /// Build the system over the platform's default backend.
    #[cfg(feature = "rodio-backend")]
    pub fn new(config: &AudioConfig) -> AudioResult<Self> {
        let backend = crate::backend::create_backend(&config.backend)?;
        Self::with_backend(backend, config)
    }

    /// Build the system over the silent headless backend (CI, dedicated
    /// servers, tests).
    pub fn headless(config: &AudioConfig) -> AudioResult<Self> {
        Self::with_backend(
            Box::new(crate::backend::headless::HeadlessBackend::new()),
            config,
        )
    }

    /// Build the system over an already constructed backend, initializing
    /// it if necessary.
    pub fn with_backend(
        mut backend: Box<dyn AudioBackend>,
        config: &AudioConfig,
    ) -> AudioResult<Self> {
        if !backend.is_initialized() {
            backend.initialize(&config.backend)?;
        }
        Ok(Self {
            pool: SourcePool::new(config.pool.capacity),
            backend,
        })
    }

    /// Request playback of an encoded sound at `priority`.
    ///
    /// Returns `Ok(Acquire::Declined)`, not an error, when every channel
    /// is busy with equal-or-higher priority sounds; the sound is dropped.
    /// A preempted sound's voice is stopped before the new one starts.
    pub fn play(&mut self, data: &[u8], priority: i32) -> AudioResult<Acquire> {
        let outcome = self.pool.acquire(priority);
        let Acquire::Granted { handle, evicted } = outcome else {
            return Ok(Acquire::Declined);
        };

        if let Some(voice) = evicted {
            self.backend.stop(voice);
        }

        match self.backend.play_sound(data) {
            Ok(voice) => {
                self.pool.attach_voice(handle, voice)?;
                Ok(outcome)
            }
            Err(err) => {
                // The channel must not leak when the native layer refuses
                // playback.
                self.pool.release(handle);
                Err(err)
            }
        }
    }

    /// Suspend a playing sound.
    pub fn pause(&mut self, handle: SourceHandle) -> AudioResult<()> {
        if let Some(voice) = self.pool.pause(handle)? {
            self.backend.pause(voice)?;
        }
        Ok(())
    }

    /// Resume a paused sound.
    pub fn resume(&mut self, handle: SourceHandle) -> AudioResult<()> {
        if let Some(voice) = self.pool.resume(handle)? {
            self.backend.resume(voice)?;
        }
        Ok(())
    }

    /// Stop a sound and return its channel to the pool. Idempotent:
    /// stopping an already released or preempted handle does nothing.
    pub fn stop(&mut self, handle: SourceHandle) {
        if let Some(voice) = self.pool.release(handle) {
            self.backend.stop(voice);
        }
    }

    /// Set the gain of one sound (0.0 = silent, 1.0 = unchanged).
    pub fn set_volume(&mut self, handle: SourceHandle, volume: f32) -> AudioResult<()> {
        if let Some(voice) = self.pool.voice_of(handle)? {
            self.backend.set_volume(voice, volume)?;
        }
        Ok(())
    }

    /// Lifecycle state of the sound behind `handle`.
    pub fn state_of(&self, handle: SourceHandle) -> AudioResult<SourceState> {
        self.pool.state_of(handle)
    }

    /// Stop every sound (session teardown, global mute). Capacity is
    /// unchanged; all outstanding handles turn stale.
    pub fn stop_all(&mut self) {
        for voice in self.pool.stop_all() {
            self.backend.stop(voice);
        }
    }

    /// Per-frame upkeep: reclaim channels whose voices played to
    /// completion so they become available to new requests.
    pub fn update(&mut self) {
        for (handle, voice) in self.pool.active_voices() {
            if self.backend.is_finished(voice) {
                // The handle came from the scan one statement ago; the
                // only way to lose the race is a concurrent release, which
                // makes marking unnecessary anyway.
                let _ = self.pool.mark_stopped(handle);
            }
        }
        for voice in self.pool.sweep_stopped() {
            self.backend.stop(voice);
        }
    }

    /// The underlying source pool (capacity, statistics, direct access).
    pub fn pool(&self) -> &SourcePool {
        &self.pool
    }

    /// Stop everything and release the backend's output device.
    pub fn shutdown(&mut self) {
        self.stop_all();
        self.backend.shutdown();
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{HeadlessBackend, HeadlessController};
    use crate::AudioError;

    const CLIP: &[u8] = &[1u8; 16];

    fn headless_system(capacity: usize) -> (AudioSystem, HeadlessController) {
        let backend = HeadlessBackend::new();
        let controller = backend.controller();
        let mut config = AudioConfig::default();
        config.pool.capacity = capacity;
        let system = AudioSystem::with_backend(Box::new(backend), &config).unwrap();
        (system, controller)
    }

    fn play(system: &mut AudioSystem, priority: i32) -> SourceHandle {
        system
            .play(CLIP, priority)
            .unwrap()
            .handle()
            .expect("expected a granted channel")
    }

    #[test]
    fn test_play_starts_backend_voices() {
        let (mut system, controller) = headless_system(4);
        for priority in 0..3 {
            play(&mut system, priority);
        }
        assert_eq!(controller.live_voices(), 3);
        assert_eq!(system.pool().active_count(), 3);
    }

    #[test]
    fn test_preemption_stops_evicted_voice() {
        let (mut system, controller) = headless_system(2);
        play(&mut system, 1);
        play(&mut system, 2);

        let winner = play(&mut system, 5);
        assert_eq!(system.state_of(winner).unwrap(), SourceState::Playing);

        // Two channels, two live voices: the evicted one was stopped.
        assert_eq!(controller.live_voices(), 2);
        assert_eq!(system.pool().stats().preempted, 1);
    }

    #[test]
    fn test_declined_leaves_backend_untouched() {
        let (mut system, controller) = headless_system(1);
        play(&mut system, 5);

        let outcome = system.play(CLIP, 3).unwrap();
        assert!(outcome.is_declined());
        assert_eq!(controller.live_voices(), 1);
    }

    #[test]
    fn test_pause_and_resume_reach_backend() {
        let (mut system, controller) = headless_system(1);
        let handle = play(&mut system, 1);

        system.pause(handle).unwrap();
        assert_eq!(system.state_of(handle).unwrap(), SourceState::Paused);
        assert_eq!(controller.paused(), 1);

        system.resume(handle).unwrap();
        assert_eq!(controller.playing(), 1);
    }

    #[test]
    fn test_update_reclaims_finished_voices() {
        let (mut system, controller) = headless_system(2);
        let a = play(&mut system, 1);
        let b = play(&mut system, 2);

        controller.finish_all();
        system.update();

        assert_eq!(system.pool().active_count(), 0);
        assert_eq!(controller.live_voices(), 0);
        assert!(matches!(system.state_of(a), Err(AudioError::StaleHandle)));
        assert!(matches!(system.state_of(b), Err(AudioError::StaleHandle)));

        // Reclaimed channels are immediately grantable again.
        play(&mut system, 1);
        play(&mut system, 1);
        assert!(system.play(CLIP, 1).unwrap().is_declined());
    }

    #[test]
    fn test_update_leaves_live_voices_alone() {
        let (mut system, _controller) = headless_system(2);
        let a = play(&mut system, 1);

        system.update();
        assert_eq!(system.state_of(a).unwrap(), SourceState::Playing);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut system, controller) = headless_system(1);
        let handle = play(&mut system, 1);

        system.stop(handle);
        system.stop(handle);
        assert_eq!(controller.live_voices(), 0);
        assert_eq!(system.pool().active_count(), 0);
    }

    #[test]
    fn test_stale_handle_operations_fail_safely() {
        let (mut system, _controller) = headless_system(1);
        let old = play(&mut system, 1);
        let new = play(&mut system, 2); // preempts `old`

        assert!(matches!(system.pause(old), Err(AudioError::StaleHandle)));
        assert!(matches!(
            system.set_volume(old, 0.5),
            Err(AudioError::StaleHandle)
        ));
        system.stop(old); // no-op
        assert_eq!(system.state_of(new).unwrap(), SourceState::Playing);
    }

    #[test]
    fn test_set_volume_on_live_sound() {
        let (mut system, _controller) = headless_system(1);
        let handle = play(&mut system, 1);
        assert!(system.set_volume(handle, 0.25).is_ok());
    }

    #[test]
    fn test_play_failure_releases_channel() {
        let (mut system, controller) = headless_system(1);

        // The headless backend rejects empty buffers.
        let result = system.play(&[], 5);
        assert!(matches!(result, Err(AudioError::PlaybackFailed(_))));

        assert_eq!(system.pool().active_count(), 0);
        assert_eq!(controller.live_voices(), 0);

        // The channel is still available afterwards.
        play(&mut system, 1);
    }

    #[test]
    fn test_stop_all_and_shutdown() {
        let (mut system, controller) = headless_system(3);
        for priority in 0..3 {
            play(&mut system, priority);
        }

        system.stop_all();
        assert_eq!(system.pool().active_count(), 0);
        assert_eq!(controller.live_voices(), 0);

        system.shutdown();
        assert_eq!(controller.live_voices(), 0);
    }
}
