//! Sound source lifecycle
//!
//! A sound source is one reusable playback channel: a slot in the pool
//! bound, while busy, to a native backend voice. Sources are created
//! lazily, recycled forever, and destroyed only with the pool that owns
//! them.

use crate::backend::VoiceId;
use crate::{AudioError, AudioResult};

/// Lifecycle state of a sound source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// The slot is free. Priority is meaningless in this state.
    Idle,
    /// A sound is assigned and audible (or about to be, while the backend
    /// spins up its voice).
    Playing,
    /// Playback is suspended and can be resumed.
    Paused,
    /// The native voice ran to completion; the slot is reclaimed on the
    /// next pool sweep.
    Stopped,
}

/// One playback channel, exclusively owned by its pool.
///
/// All mutation goes through the pool, which validates handles before
/// touching a source; the methods here only enforce the state machine.
#[derive(Debug)]
pub struct SoundSource {
    index: u32,
    generation: u32,
    state: SourceState,
    priority: i32,
    voice: Option<VoiceId>,
}

impl SoundSource {
    pub(crate) fn new(index: u32) -> Self {
        Self {
            index,
            generation: 0,
            state: SourceState::Idle,
            priority: 0,
            voice: None,
        }
    }

    /// Slot index of this source within its pool.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation counter; bumps every time the slot is reclaimed.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Priority of the assigned sound. Meaningless while [`SourceState::Idle`].
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Native voice currently bound to this source, if playback started.
    pub fn voice(&self) -> Option<VoiceId> {
        self.voice
    }

    /// Assign a new sound at `priority` and enter [`SourceState::Playing`].
    ///
    /// The pool only calls this on idle slots (freshly created, or just
    /// reclaimed by release or preemption).
    pub(crate) fn assign(&mut self, priority: i32) {
        debug_assert_eq!(self.state, SourceState::Idle);
        self.state = SourceState::Playing;
        self.priority = priority;
        self.voice = None;
    }

    /// Bind the native voice once the backend has started playback.
    pub(crate) fn attach_voice(&mut self, voice: VoiceId) -> AudioResult<()> {
        if self.state != SourceState::Playing {
            return Err(AudioError::InvalidState(format!(
                "attach_voice on {:?} source",
                self.state
            )));
        }
        self.voice = Some(voice);
        Ok(())
    }

    /// Suspend playback. Valid only from [`SourceState::Playing`].
    pub(crate) fn pause(&mut self) -> AudioResult<Option<VoiceId>> {
        if self.state != SourceState::Playing {
            return Err(AudioError::InvalidState(format!(
                "pause on {:?} source",
                self.state
            )));
        }
        self.state = SourceState::Paused;
        Ok(self.voice)
    }

    /// Resume playback. Valid only from [`SourceState::Paused`].
    pub(crate) fn resume(&mut self) -> AudioResult<Option<VoiceId>> {
        if self.state != SourceState::Paused {
            return Err(AudioError::InvalidState(format!(
                "resume on {:?} source",
                self.state
            )));
        }
        self.state = SourceState::Playing;
        Ok(self.voice)
    }

    /// Record that the native voice finished on its own. The slot stays
    /// assigned until the next pool sweep collapses it to idle.
    pub(crate) fn mark_stopped(&mut self) -> AudioResult<()> {
        match self.state {
            SourceState::Playing | SourceState::Paused => {
                self.state = SourceState::Stopped;
                Ok(())
            }
            state => Err(AudioError::InvalidState(format!(
                "mark_stopped on {state:?} source"
            ))),
        }
    }

    /// Force the source back to idle, invalidating outstanding handles.
    ///
    /// Legal from any state; reclaiming an idle source is a no-op. Returns
    /// the bound voice so the caller can close it. The generation bump is
    /// what turns every handle issued for the previous assignment stale.
    pub(crate) fn stop(&mut self) -> Option<VoiceId> {
        if self.state == SourceState::Idle {
            return None;
        }
        self.state = SourceState::Idle;
        self.priority = 0;
        self.generation = self.generation.wrapping_add(1);
        self.voice.take()
    }
}
