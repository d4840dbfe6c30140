//! Sound source pool
//!
//! Capacity-bounded allocator for playback channels. Sources are created
//! lazily up to a fixed capacity; once every slot is busy, a new request
//! wins a channel only by strictly outranking the least important sound
//! currently playing, which is then forcibly stopped. Requests that cannot
//! win are declined, never queued: a sound played seconds late is
//! worse than one dropped.
//!
//! Handles are (index, generation) pairs. A slot's generation bumps every
//! time it is reclaimed, so a preempted or released client's handle turns
//! permanently stale instead of aliasing the slot's next owner.
//!
//! The slot table lives behind a mutex: `acquire`, `release`, the
//! preemption scan, and the sweep each run as one exclusive critical
//! section, so concurrent callers can never select the same idle slot or
//! double-preempt a victim. Every operation is synchronous and O(capacity)
//! worst case.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::VoiceId;
use crate::source::{SoundSource, SourceState};
use crate::{AudioError, AudioResult};

/// Number of playback channels when the configuration does not say otherwise.
pub const DEFAULT_CAPACITY: usize = 30;

/// Handle to a pooled sound source.
///
/// Carries the slot index and the generation it was issued at; every pool
/// operation rejects handles whose generation no longer matches the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    index: u32,
    generation: u32,
}

impl SourceHandle {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index this handle refers to.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the handle was issued at.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Outcome of an admission request.
///
/// Declining is a first-class outcome, not an error: the caller is
/// expected to drop the sound (or retry at a higher priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// A channel was granted.
    Granted {
        /// Handle to the granted source.
        handle: SourceHandle,
        /// Native voice of a preempted sound. The caller must stop it;
        /// the slot itself has already been reassigned.
        evicted: Option<VoiceId>,
    },
    /// Every channel is busy with sounds of equal or higher priority.
    Declined,
}

impl Acquire {
    /// Handle of the granted source, if the request was granted.
    pub fn handle(&self) -> Option<SourceHandle> {
        match self {
            Self::Granted { handle, .. } => Some(*handle),
            Self::Declined => None,
        }
    }

    /// Whether the request was declined.
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined)
    }
}

/// Usage counters for a source pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolStats {
    /// Requests granted a channel (including by preemption).
    pub granted: u64,
    /// Granted requests that had to preempt a lower-priority sound.
    pub preempted: u64,
    /// Requests dropped because nothing could be preempted.
    pub declined: u64,
    /// Sources currently assigned.
    pub active: usize,
    /// Most sources ever assigned at once.
    pub peak_active: usize,
}

/// Capacity-bounded pool of sound sources.
///
/// Construct once during subsystem start-up; capacity is fixed for the
/// pool's lifetime. The pool exclusively owns its sources; clients hold
/// revocable [`SourceHandle`]s that the pool may invalidate at any time
/// through preemption.
pub struct SourcePool {
    capacity: usize,
    inner: Mutex<PoolInner>,
}

struct PoolInner {
    sources: Vec<SoundSource>,
    stats: PoolStats,
}

impl SourcePool {
    /// Create a pool with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        log::info!("created sound source pool with {capacity} channels");
        Self {
            capacity,
            inner: Mutex::new(PoolInner {
                sources: Vec::new(),
                stats: PoolStats::default(),
            }),
        }
    }

    /// Maximum number of simultaneous channels.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently assigned sources.
    pub fn active_count(&self) -> usize {
        self.lock().stats.active
    }

    /// Snapshot of the pool's usage counters.
    pub fn stats(&self) -> PoolStats {
        self.lock().stats
    }

    /// Request a channel for a sound at `priority` (higher outranks lower).
    ///
    /// Selection order: the lowest-index idle slot; else a lazily created
    /// slot while under capacity; else the least important busy slot,
    /// preempted only when `priority` strictly exceeds it. Equal priority
    /// never preempts, so ties cannot cause churn.
    pub fn acquire(&self, priority: i32) -> Acquire {
        let mut inner = self.lock();

        // Idle slots always win over preemption; lowest index for determinism.
        if let Some(index) = inner
            .sources
            .iter()
            .position(|source| source.state() == SourceState::Idle)
        {
            let handle = inner.assign(index, priority);
            return Acquire::Granted {
                handle,
                evicted: None,
            };
        }

        if inner.sources.len() < self.capacity {
            let index = inner.sources.len();
            inner.sources.push(SoundSource::new(index as u32));
            let handle = inner.assign(index, priority);
            return Acquire::Granted {
                handle,
                evicted: None,
            };
        }

        match inner.victim_index() {
            Some(index) if Self::should_preempt(priority, inner.sources[index].priority()) => {
                log::debug!(
                    "preempting source {index} (priority {}) for priority {priority}",
                    inner.sources[index].priority()
                );
                inner.stats.active = inner.stats.active.saturating_sub(1);
                let evicted = inner.sources[index].stop();
                inner.stats.preempted += 1;
                let handle = inner.assign(index, priority);
                Acquire::Granted { handle, evicted }
            }
            _ => {
                inner.stats.declined += 1;
                Acquire::Declined
            }
        }
    }

    /// Return a source to the idle set, yielding the native voice to close.
    ///
    /// Idempotent: a handle that was already released or preempted is
    /// ignored and can never touch the slot's next owner.
    pub fn release(&self, handle: SourceHandle) -> Option<VoiceId> {
        let mut inner = self.lock();
        let index = handle.index as usize;
        match inner.sources.get(index) {
            Some(source)
                if source.generation() == handle.generation
                    && source.state() != SourceState::Idle => {}
            _ => return None,
        }
        inner.stats.active = inner.stats.active.saturating_sub(1);
        inner.sources[index].stop()
    }

    /// Bind the backend voice started for this source.
    pub fn attach_voice(&self, handle: SourceHandle, voice: VoiceId) -> AudioResult<()> {
        self.lock().current_source_mut(handle)?.attach_voice(voice)
    }

    /// Suspend a playing source, yielding the voice to pause.
    pub fn pause(&self, handle: SourceHandle) -> AudioResult<Option<VoiceId>> {
        self.lock().current_source_mut(handle)?.pause()
    }

    /// Resume a paused source, yielding the voice to resume.
    pub fn resume(&self, handle: SourceHandle) -> AudioResult<Option<VoiceId>> {
        self.lock().current_source_mut(handle)?.resume()
    }

    /// Record that a source's voice finished on its own; the slot is
    /// reclaimed by the next [`SourcePool::sweep_stopped`].
    pub fn mark_stopped(&self, handle: SourceHandle) -> AudioResult<()> {
        self.lock().current_source_mut(handle)?.mark_stopped()
    }

    /// Collapse every stopped slot back to idle, yielding the voices to
    /// close. Outstanding handles for swept slots turn stale.
    pub fn sweep_stopped(&self) -> Vec<VoiceId> {
        let mut inner = self.lock();
        let PoolInner { sources, stats } = &mut *inner;
        let mut voices = Vec::new();
        for source in sources
            .iter_mut()
            .filter(|source| source.state() == SourceState::Stopped)
        {
            stats.active = stats.active.saturating_sub(1);
            if let Some(voice) = source.stop() {
                voices.push(voice);
            }
        }
        if !voices.is_empty() {
            log::debug!("swept {} finished sources", voices.len());
        }
        voices
    }

    /// Force every busy slot back to idle (session teardown, global mute).
    ///
    /// Capacity is unchanged; all outstanding handles turn stale. Returns
    /// the native voices to close.
    pub fn stop_all(&self) -> Vec<VoiceId> {
        let mut inner = self.lock();
        let PoolInner { sources, stats } = &mut *inner;
        let mut voices = Vec::new();
        let mut stopped = 0usize;
        for source in sources
            .iter_mut()
            .filter(|source| source.state() != SourceState::Idle)
        {
            stopped += 1;
            if let Some(voice) = source.stop() {
                voices.push(voice);
            }
        }
        stats.active = stats.active.saturating_sub(stopped);
        if stopped > 0 {
            log::info!("force-stopped {stopped} active sources");
        }
        voices
    }

    /// Lifecycle state of the source behind `handle`.
    pub fn state_of(&self, handle: SourceHandle) -> AudioResult<SourceState> {
        Ok(self.lock().current_source(handle)?.state())
    }

    /// Priority of the sound behind `handle`.
    pub fn priority_of(&self, handle: SourceHandle) -> AudioResult<i32> {
        Ok(self.lock().current_source(handle)?.priority())
    }

    /// Native voice bound to the source behind `handle`, if playback has
    /// started.
    pub fn voice_of(&self, handle: SourceHandle) -> AudioResult<Option<VoiceId>> {
        Ok(self.lock().current_source(handle)?.voice())
    }

    /// Handles and voices of every assigned, unswept source. Used by the
    /// per-frame upkeep to ask the backend which voices have finished.
    pub fn active_voices(&self) -> Vec<(SourceHandle, VoiceId)> {
        self.lock()
            .sources
            .iter()
            .filter(|source| {
                matches!(source.state(), SourceState::Playing | SourceState::Paused)
            })
            .filter_map(|source| {
                source
                    .voice()
                    .map(|voice| (SourceHandle::new(source.index(), source.generation()), voice))
            })
            .collect()
    }

    /// Admission policy at saturation: a request wins only by strictly
    /// outranking the least important busy sound. Isolated here so the
    /// policy can change without touching the scan or the slot logic.
    fn should_preempt(requested: i32, min_busy: i32) -> bool {
        requested > min_busy
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // A panic while holding the lock cannot leave the slot table
        // half-updated; recover the guard rather than poisoning the pool.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SourcePool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl PoolInner {
    /// Assign an idle slot and issue its handle.
    fn assign(&mut self, index: usize, priority: i32) -> SourceHandle {
        let source = &mut self.sources[index];
        source.assign(priority);
        self.stats.granted += 1;
        self.stats.active += 1;
        self.stats.peak_active = self.stats.peak_active.max(self.stats.active);
        SourceHandle::new(source.index(), source.generation())
    }

    /// Busy slot with the minimum priority; equal minima resolve to the
    /// lowest index.
    fn victim_index(&self) -> Option<usize> {
        let mut victim: Option<(usize, i32)> = None;
        for (index, source) in self.sources.iter().enumerate() {
            if source.state() == SourceState::Idle {
                continue;
            }
            match victim {
                Some((_, min)) if source.priority() >= min => {}
                _ => victim = Some((index, source.priority())),
            }
        }
        victim.map(|(index, _)| index)
    }

    fn current_source(&self, handle: SourceHandle) -> AudioResult<&SoundSource> {
        self.sources
            .get(handle.index as usize)
            .filter(|source| source.generation() == handle.generation)
            .ok_or(AudioError::StaleHandle)
    }

    fn current_source_mut(&mut self, handle: SourceHandle) -> AudioResult<&mut SoundSource> {
        self.sources
            .get_mut(handle.index as usize)
            .filter(|source| source.generation() == handle.generation)
            .ok_or(AudioError::StaleHandle)
    }
}
