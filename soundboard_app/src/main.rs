//! Headless demonstration of priority-based channel admission.
//!
//! Floods a small source pool with prioritised play requests and logs
//! which sounds win a channel, which preempt a quieter sound, and which
//! get dropped.

use audio_engine::prelude::*;

fn main() -> AudioResult<()> {
    audio_engine::logging::init_with_default_filter();

    let mut config = AudioConfig::default();
    config.pool.capacity = 4;

    let mut audio = AudioSystem::headless(&config)?;

    // The headless backend tracks lifecycles without decoding, so any
    // non-empty buffer stands in for a real clip.
    let clip = vec![0u8; 64];

    let requests = [
        ("footsteps", 1),
        ("ambience", 0),
        ("reload", 3),
        ("dialogue", 5),
        ("explosion", 4),
        ("ui-click", 2),
        ("music-sting", 0),
        ("alarm", 6),
    ];

    log::info!(
        "firing {} requests at a {}-channel pool",
        requests.len(),
        audio.pool().capacity()
    );

    let mut held = Vec::new();
    for (name, priority) in requests {
        match audio.play(&clip, priority)? {
            Acquire::Granted { handle, evicted } => {
                if evicted.is_some() {
                    log::info!("{name} (priority {priority}) -> slot {}, preempting a quieter sound", handle.index());
                } else {
                    log::info!("{name} (priority {priority}) -> slot {}", handle.index());
                }
                held.push((name, handle));
            }
            Acquire::Declined => {
                log::info!("{name} (priority {priority}) dropped: every channel is busier");
            }
        }
    }

    // Early winners may have lost their channel along the way; their
    // handles fail safely instead of touching the new owners.
    for (name, handle) in &held {
        match audio.pause(*handle) {
            Ok(()) => {
                log::info!("paused {name}");
                audio.resume(*handle)?;
            }
            Err(err) => log::info!("{name} already lost its channel: {err}"),
        }
    }

    audio.update();

    let stats = audio.pool().stats();
    log::info!(
        "granted {} / preempted {} / declined {} (peak {} channels active)",
        stats.granted,
        stats.preempted,
        stats.declined,
        stats.peak_active
    );

    audio.stop_all();
    Ok(())
}
