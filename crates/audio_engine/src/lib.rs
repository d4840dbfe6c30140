//! # Audio Engine
//!
//! Bounded audio-source pooling for interactive applications.
//!
//! Game code wants to fire an unbounded number of sounds; the platform
//! exposes a small, fixed number of simultaneous playback channels. This
//! crate manages that scarcity: a [`pool::SourcePool`] hands out channels
//! ("sound sources") to play requests, lazily creating them up to a fixed
//! capacity, and, once saturated, reclaims the least important playing
//! channel to satisfy a more important request. Requests that cannot win a
//! channel are declined, not queued: a sound triggered seconds late is
//! worse than a sound dropped.
//!
//! ## Features
//!
//! - **Admission control**: priority-based preemption with deterministic
//!   tie-breaking
//! - **Safe reclamation**: generation-tagged handles turn use-after-preempt
//!   into a recoverable [`AudioError::StaleHandle`]
//! - **Backend abstraction**: playback runs through the
//!   [`backend::AudioBackend`] trait, with a rodio implementation and a
//!   silent headless one for CI and dedicated servers
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_engine::prelude::*;
//!
//! fn main() -> AudioResult<()> {
//!     let mut config = AudioConfig::default();
//!     config.pool.capacity = 8;
//!
//!     let mut audio = AudioSystem::headless(&config)?;
//!     let clip: Vec<u8> = vec![1; 16];
//!
//!     match audio.play(&clip, 5)? {
//!         Acquire::Granted { handle, .. } => audio.stop(handle),
//!         Acquire::Declined => { /* drop the sound */ }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod backend;
pub mod config;
pub mod logging;
pub mod pool;
pub mod source;
pub mod system;

use thiserror::Error;

/// Errors surfaced by the audio subsystem.
///
/// A declined play request is *not* an error; see [`pool::Acquire`]. None
/// of these variants is fatal to the process; the worst outcome of any of
/// them is an audibly dropped or cut-off sound.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The handle's slot has been preempted, released, or reassigned.
    /// Recoverable: discard the handle.
    #[error("stale source handle: the slot has been reclaimed")]
    StaleHandle,

    /// The operation is not legal in the source's current lifecycle state.
    #[error("invalid source state: {0}")]
    InvalidState(String),

    /// The backend was used before `initialize` succeeded.
    #[error("audio backend is not initialized")]
    BackendNotInitialized,

    /// The backend failed to start (no output device, driver error).
    #[error("audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Native playback failed (decode, device, or sink error).
    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    /// The voice id does not refer to a live native voice.
    #[error("invalid voice id")]
    InvalidVoice,
}

/// Convenience result alias for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

pub use pool::{Acquire, PoolStats, SourceHandle, SourcePool};
pub use source::{SoundSource, SourceState};
pub use system::AudioSystem;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        backend::{AudioBackend, BackendConfig, VoiceId},
        config::AudioConfig,
        pool::{Acquire, PoolStats, SourceHandle, SourcePool},
        source::SourceState,
        system::AudioSystem,
        AudioError, AudioResult,
    };
}
