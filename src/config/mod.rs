//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::game::{GameError, MatchRules, ObstacleField, Tuning};

/// Which arena to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    FreeForAll,
    TeamChase,
}

impl FromStr for GameMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ffa" | "free_for_all" => Ok(Self::FreeForAll),
            "team" | "team_chase" => Ok(Self::TeamChase),
            _ => Err(ConfigError::Invalid {
                var: "SHEEP_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    pub mode: GameMode,
    /// Fixed seed for the first round; random when absent
    pub seed: Option<u64>,
    /// Pace ticks at the simulation rate instead of running flat out
    pub realtime: bool,
    /// Per-round tick cap
    pub max_ticks: u64,
    pub rounds: u32,

    /// ASCII occupancy map, team mode only
    pub map_path: Option<PathBuf>,
    /// Free-for-all roster size including the player
    pub agents: usize,
    /// Team mode countdown in seconds
    pub match_secs: f32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            mode: parse_or("SHEEP_MODE", GameMode::FreeForAll)?,
            seed: parse_opt("SHEEP_SEED")?,
            realtime: parse_or("SHEEP_REALTIME", false)?,
            max_ticks: parse_or("SHEEP_MAX_TICKS", 60 * 120)?,
            rounds: parse_or("SHEEP_ROUNDS", 1)?,

            map_path: env::var("SHEEP_MAP").ok().map(PathBuf::from),
            agents: parse_or("SHEEP_AGENTS", 7)?,
            match_secs: parse_or("SHEEP_MATCH_SECS", 20.0)?,
        })
    }

    pub fn rules(&self) -> MatchRules {
        match self.mode {
            GameMode::FreeForAll => MatchRules::FreeForAll {
                sheep: self.agents,
            },
            GameMode::TeamChase => MatchRules::team_chase_for(self.match_secs),
        }
    }

    pub fn tuning(&self) -> Tuning {
        match self.mode {
            GameMode::FreeForAll => Tuning::free_for_all(),
            GameMode::TeamChase => Tuning::team_chase(),
        }
    }

    /// Terrain for the configured mode, read from `SHEEP_MAP` if set.
    pub fn obstacles(&self, tuning: &Tuning) -> Result<Option<ObstacleField>, GameError> {
        match (self.mode, &self.map_path) {
            (GameMode::TeamChase, Some(path)) => {
                ObstacleField::load(path, tuning.world_width, tuning.world_height).map(Some)
            }
            _ => Ok(None),
        }
    }
}

fn parse_opt<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(None),
    }
}

fn parse_or<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(var)?.unwrap_or(default))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
