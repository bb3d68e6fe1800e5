//! Sound cue dispatch
//!
//! The simulation only reports events; this board turns them into cues for
//! whatever audio backend the host provides. Muting is the world's
//! sound-enabled switch, read on every dispatch.

use std::collections::HashMap;

use crate::sim::{GameEvent, SoundCue, World};

impl SoundCue {
    /// Asset the host is expected to play for this cue
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundCue::Crash => "crash.wav",
            SoundCue::Charge => "charge.wav",
            SoundCue::Explosion => "explosion.wav",
        }
    }
}

/// Collects cues from tick events
#[derive(Debug, Default)]
pub struct SoundBoard {
    played: HashMap<SoundCue, u32>,
}

impl SoundBoard {
    /// Cues to play for `events`; empty while `world` has sound disabled
    pub fn dispatch(&mut self, world: &World, events: &[GameEvent]) -> Vec<SoundCue> {
        if !world.sound_enabled() {
            return Vec::new();
        }

        let cues: Vec<SoundCue> = events.iter().filter_map(GameEvent::sound_cue).collect();
        for cue in &cues {
            log::debug!("Playing {}", cue.asset_name());
            *self.played.entry(*cue).or_default() += 1;
        }
        cues
    }

    /// How many times `cue` has been dispatched
    pub fn play_count(&self, cue: SoundCue) -> u32 {
        self.played.get(&cue).copied().unwrap_or(0)
    }
}
