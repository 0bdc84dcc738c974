use std::env;

use serde::Serialize;

use crate::constants::{
    get_fruit_kind, get_frightened_secs, get_mode_schedule, get_personal_house_thresholds,
    get_speed_table, SpeedTable, EXTRA_LIFE_SCORE, FRUIT_PELLET_THRESHOLDS, STARTING_LIVES,
    TICK_MS,
};
use crate::types::FruitKind;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameConfig {
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    #[serde(rename = "startingLives")]
    pub starting_lives: u32,
    #[serde(rename = "extraLifeScore")]
    pub extra_life_score: u64,
    pub seed: u32,
    #[serde(rename = "startLevel")]
    pub start_level: u32,
    #[serde(rename = "fruitPelletThresholds")]
    pub fruit_pellet_thresholds: [u32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            starting_lives: STARTING_LIVES,
            extra_life_score: EXTRA_LIFE_SCORE,
            seed: 1,
            start_level: 1,
            fruit_pellet_thresholds: FRUIT_PELLET_THRESHOLDS,
        }
    }
}

impl GameConfig {
    /// Defaults overridden by `PACMAZE_*` variables; unparsable or zero values are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_ms: read_env_u64("PACMAZE_TICK_MS", defaults.tick_ms),
            starting_lives: read_env_u32("PACMAZE_LIVES", defaults.starting_lives),
            extra_life_score: read_env_u64("PACMAZE_EXTRA_LIFE_SCORE", defaults.extra_life_score),
            seed: read_env_u32("PACMAZE_SEED", defaults.seed),
            start_level: read_env_u32("PACMAZE_START_LEVEL", defaults.start_level),
            fruit_pellet_thresholds: defaults.fruit_pellet_thresholds,
        }
    }
}

/// Immutable tuning for one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelConfig {
    pub level: u32,
    pub speeds: SpeedTable,
    pub frightened_secs: u32,
    pub mode_schedule: Vec<Option<u32>>,
    pub fruit: FruitKind,
    pub personal_house_thresholds: [u32; 3],
}

impl LevelConfig {
    pub fn for_level(level: u32) -> Self {
        let level = level.max(1);
        Self {
            level,
            speeds: get_speed_table(level),
            frightened_secs: get_frightened_secs(level),
            mode_schedule: get_mode_schedule(level),
            fruit: get_fruit_kind(level),
            personal_house_thresholds: get_personal_house_thresholds(level),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            game: GameConfig::from_env(),
        }
    }
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    parse_positive_u64(env::var(name).ok().as_deref()).unwrap_or(default)
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    parse_positive_u64(env::var(name).ok().as_deref())
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(default)
}

fn parse_positive_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}
