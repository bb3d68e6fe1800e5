//! World rules and preferences
//!
//! Stored as JSON. Missing keys fall back to defaults, so a file only needs
//! the values it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::Strategy;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === World ===
    /// Seed for every random choice the simulation makes
    pub seed: u64,
    pub world_width: f32,
    pub world_height: f32,

    // === Rules ===
    /// Lives at the start of a match
    pub lives: u32,
    /// Checkpoints to visit; reaching the last one wins
    pub checkpoint_count: u32,
    /// Speed change per accelerate/brake press
    pub speed_increment: f32,
    /// One opponent robot per entry, with its starting strategy
    pub opponents: Vec<Strategy>,
    /// Roaming drones
    pub obstacle_count: u32,

    // === Driver ===
    pub sound_enabled: bool,
    /// Milliseconds between ticks in the headless driver
    pub tick_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            world_width: 1000.0,
            world_height: 800.0,

            lives: 3,
            checkpoint_count: 9,
            speed_increment: 10.0,
            opponents: vec![Strategy::Race, Strategy::Pursuit, Strategy::Race],
            obstacle_count: 2,

            sound_enabled: false,
            tick_interval_ms: 20,
        }
    }
}

impl Settings {
    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.world_width >= 1.0 && self.world_height >= 1.0) {
            return Err(SettingsError::Invalid("world must be at least 1x1"));
        }
        if self.lives == 0 {
            return Err(SettingsError::Invalid("lives must be at least 1"));
        }
        if self.checkpoint_count == 0 {
            return Err(SettingsError::Invalid("checkpoint_count must be at least 1"));
        }
        if self.speed_increment < 0.0 {
            return Err(SettingsError::Invalid("speed_increment must not be negative"));
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid("tick_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from `path`
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load settings from `path`, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
