use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use glam::Vec2;
use gravitation_core::FlightTuning;
use gravitation_persistence::StoreLayout;
use serde::Deserialize;

/// Session configuration loaded from an optional TOML file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Flight constants applied to every level.
    pub(crate) tuning: FlightTuning,
    /// Where the ship appears when a level starts.
    pub(crate) spawn: SpawnConfig,
    /// Remote leaderboard and ghost storage.
    pub(crate) store: StoreConfig,
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid config toml")
    }
}

/// Spawn point expressed relative to the ship sprite.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SpawnConfig {
    /// Horizontal center of the ship at spawn.
    pub(crate) center_x: f32,
    /// Top edge of the ship at spawn.
    pub(crate) y: f32,
}

impl SpawnConfig {
    /// Logical origin for a ship sprite of `sprite_width` pixels.
    pub(crate) fn origin(&self, sprite_width: u32) -> Vec2 {
        Vec2::new(self.center_x - (sprite_width / 2) as f32, self.y)
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            center_x: 1300.0,
            y: 2450.0,
        }
    }
}

/// Remote store settings. The URL may also come from the command line.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct StoreConfig {
    /// Base URL of the blob store.
    pub(crate) url: Option<String>,
    /// Request timeout in seconds.
    pub(crate) timeout_secs: u64,
    /// Key of the leaderboard blob.
    pub(crate) leaderboard_key: String,
    /// Key of the ghost blob per level.
    pub(crate) ghost_keys: BTreeMap<String, String>,
}

impl StoreConfig {
    /// Request timeout for store calls.
    pub(crate) const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Key layout understood by the score keeper.
    pub(crate) fn layout(&self) -> StoreLayout {
        StoreLayout {
            leaderboard_key: self.leaderboard_key.clone(),
            ghost_keys: self.ghost_keys.clone(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
            leaderboard_key: StoreLayout::default().leaderboard_key,
            ghost_keys: BTreeMap::new(),
        }
    }
}
