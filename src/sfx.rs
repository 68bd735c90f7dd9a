//! Audio feedback cues.
//!
//! The session only asks for "a flip cue of N discs". Whatever actually makes
//! sound is a [`CueSink`] installed by the host. The player that routes cues is
//! a process-wide singleton built on first use and never torn down.

use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tracing::trace;

const START_OFFSET_SECS: f64 = 0.01;
const BLIP_SPACING_SECS: f64 = 0.06;
const BASE_FREQ_HZ: f64 = 900.0;
const FREQ_STEP_HZ: f64 = 35.0;

/// One short square-wave tone.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blip {
    /// Seconds after the cue is triggered.
    pub offset_secs: f64,
    pub freq_hz: f64,
}

/// Receives cues and renders them.
pub trait CueSink: Send + Sync {
    fn play(&self, blips: &[Blip]);
}

/// Descending run of blips, one per flipped disc and at least one.
pub fn flip_cue(count: usize) -> Vec<Blip> {
    (0..count.max(1))
        .map(|i| Blip {
            offset_secs: START_OFFSET_SECS + i as f64 * BLIP_SPACING_SECS,
            freq_hz: BASE_FREQ_HZ - i as f64 * FREQ_STEP_HZ,
        })
        .collect()
}

#[derive(Default)]
struct CuePlayer {
    sink: Option<Arc<dyn CueSink>>,
}

static PLAYER: Lazy<Mutex<CuePlayer>> = Lazy::new(|| Mutex::new(CuePlayer::default()));

/// Routes all later cues to `sink`, replacing any previous one.
pub fn install_sink(sink: Arc<dyn CueSink>) {
    if let Ok(mut player) = PLAYER.lock() {
        player.sink = Some(sink);
    }
}

/// Plays the flip cue on the installed sink; dropped when none is installed.
pub fn play_flips(count: usize) {
    let sink = match PLAYER.lock() {
        Ok(player) => player.sink.clone(),
        Err(_) => None,
    };
    match sink {
        Some(sink) => sink.play(&flip_cue(count)),
        None => trace!(count, "no cue sink installed"),
    }
}

/// Sink that buffers cues until the host drains them.
#[derive(Default)]
pub struct QueuedCues {
    pending: Mutex<Vec<Blip>>,
}

impl QueuedCues {
    pub fn drain(&self) -> Vec<Blip> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }
}

impl CueSink for QueuedCues {
    fn play(&self, blips: &[Blip]) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.extend_from_slice(blips);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_cue_descends_in_pitch_and_always_sounds() {
        let cue = flip_cue(3);

        assert_eq!(cue.len(), 3);
        assert_eq!(cue[0].freq_hz, 900.0);
        assert_eq!(cue[2].freq_hz, 830.0);
        assert!((cue[1].offset_secs - 0.07).abs() < 1e-12);
        assert_eq!(flip_cue(0).len(), 1);
    }

    #[test]
    fn queued_sink_collects_until_drained() {
        let sink = QueuedCues::default();
        sink.play(&flip_cue(2));
        sink.play(&flip_cue(1));

        assert_eq!(sink.drain().len(), 3);
        assert!(sink.drain().is_empty());
    }

    #[test]
    fn shared_player_routes_to_the_installed_sink() {
        let sink = Arc::new(QueuedCues::default());
        install_sink(sink.clone());

        play_flips(4);

        let blips = sink.drain();
        assert!(blips.len() >= 4);
        assert_eq!(blips[0].freq_hz, 900.0);
    }
}
