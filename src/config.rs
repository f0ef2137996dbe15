//! Match configuration loading: phase wait durations and the randomness seed.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::state::state_machine::GamePhase;

/// Default location on disk where the engine looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "AVALON_ENGINE_CONFIG_PATH";
/// Longest wait accepted between two phases.
const MAX_WAIT: Duration = Duration::from_secs(600);

/// Pauses inserted after a phase before the next one becomes playable.
///
/// A zero wait makes the transition immediate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseWaits {
    /// After the leader submitted a team.
    pub after_team_proposition: Duration,
    /// After a team vote closed.
    pub after_team_voting: Duration,
    /// After a quest vote closed.
    pub after_quest_voting: Duration,
}

impl PhaseWaits {
    /// Wait applied to transitions leaving `phase`.
    pub fn after(&self, phase: GamePhase) -> Duration {
        match phase {
            GamePhase::TeamProposition => self.after_team_proposition,
            GamePhase::TeamVoting => self.after_team_voting,
            GamePhase::QuestVoting => self.after_quest_voting,
            GamePhase::Preparation
            | GamePhase::TeamVotingPreApproved
            | GamePhase::Assassination
            | GamePhase::GameLost
            | GamePhase::GameWon => Duration::ZERO,
        }
    }
}

/// Configuration accepted when a match is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameConfig {
    /// Phase wait durations.
    pub waits: PhaseWaits,
    /// Fixed seed for role dealing and leader selection; OS entropy when absent.
    pub rng_seed: Option<u64>,
}

impl GameConfig {
    /// Load the configuration from disk, falling back to immediate transitions.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match parse(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        waits = ?config.waits,
                        seeded = config.rng_seed.is_some(),
                        "loaded game config"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

/// Errors raised while parsing a configuration document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON for [`RawConfig`].
    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Parse and validate a JSON configuration document.
pub fn parse(contents: &str) -> Result<GameConfig, ConfigError> {
    let raw: RawConfig = serde_json::from_str(contents)?;
    raw.validate()?;
    Ok(raw.into())
}

#[serde_as]
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    #[validate(nested)]
    waits: RawWaits,
    #[serde(default)]
    seed: Option<u64>,
}

#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Wait durations in milliseconds.
struct RawWaits {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default)]
    #[validate(custom(function = "validate_wait"))]
    after_team_proposition: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default)]
    #[validate(custom(function = "validate_wait"))]
    after_team_voting: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default)]
    #[validate(custom(function = "validate_wait"))]
    after_quest_voting: Duration,
}

fn validate_wait(wait: &Duration) -> Result<(), ValidationError> {
    if *wait > MAX_WAIT {
        let mut err = ValidationError::new("wait_too_long");
        err.message = Some(
            format!(
                "wait must not exceed {} ms (got {})",
                MAX_WAIT.as_millis(),
                wait.as_millis()
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

impl From<RawConfig> for GameConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            waits: PhaseWaits {
                after_team_proposition: value.waits.after_team_proposition,
                after_team_voting: value.waits.after_team_voting,
                after_quest_voting: value.waits.after_quest_voting,
            },
            rng_seed: value.seed,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
