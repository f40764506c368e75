//! Training configuration.
//!
//! Every section falls back to its defaults when absent, so a configuration file
//! only needs the values it changes:
//!
//! ```
//! use beacon_training::config::TrainingConfig;
//!
//! let config: TrainingConfig =
//!     serde_json::from_str(r#"{ "population": { "size": 50 } }"#).unwrap();
//! assert_eq!(config.population.size, 50);
//! assert_eq!(config.network.output_count, 4);
//! config.validate().unwrap();
//! ```

use beacon_env::BeaconConfig;
use beacon_policy::{
    agent::{MIN_SCREEN_SIZE, POLICY_OUTPUT_COUNT},
    network::NetworkConfig,
};
use serde::{Deserialize, Serialize};

use crate::genetic::PopulationConfig;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("elite count {elite_count} exceeds population size {size}")]
    TooManyElites { elite_count: usize, size: usize },
    #[display("tournament size must be between 1 and the population size, got {tournament_size}")]
    InvalidTournamentSize { tournament_size: usize },
    #[display("{name} must be a finite value in {range}, got {value}")]
    OutOfRange {
        name: &'static str,
        range: &'static str,
        value: f32,
    },
    #[display("unit speed must be at least 1, got {unit_speed}")]
    InvalidUnitSpeed { unit_speed: i32 },
    #[display("beacon radius must not be negative, got {beacon_radius}")]
    NegativeBeaconRadius { beacon_radius: i32 },
    #[display("screen of size {screen_size} is too small, need at least {min}")]
    ScreenTooSmall { screen_size: usize, min: usize },
    #[display("network must have {expected} outputs, got {actual}")]
    OutputCountMismatch { expected: usize, actual: usize },
    #[display("network takes {actual} inputs but observations provide {expected}")]
    InputCountMismatch { expected: usize, actual: usize },
}

/// Complete configuration of a training run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub network: NetworkConfig,
    pub population: PopulationConfig,
    pub environment: BeaconConfig,
}

impl TrainingConfig {
    /// Checks that the sections are usable and agree with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.population.validate()?;
        let env = &self.environment;
        if env.unit_speed < 1 {
            return Err(ConfigError::InvalidUnitSpeed {
                unit_speed: env.unit_speed,
            });
        }
        let Ok(radius) = usize::try_from(env.beacon_radius) else {
            return Err(ConfigError::NegativeBeaconRadius {
                beacon_radius: env.beacon_radius,
            });
        };
        // the beacon plus a free cell on each side, and every policy target
        let min = radius
            .saturating_mul(2)
            .saturating_add(3)
            .max(MIN_SCREEN_SIZE);
        if env.screen_size < min {
            return Err(ConfigError::ScreenTooSmall {
                screen_size: env.screen_size,
                min,
            });
        }
        check_network(&self.network, 2 * env.screen_size.pow(2))
    }
}

/// Checks that `network` fits the policy and an observation of `input_count` features.
pub fn check_network(network: &NetworkConfig, input_count: usize) -> Result<(), ConfigError> {
    if network.output_count != POLICY_OUTPUT_COUNT {
        return Err(ConfigError::OutputCountMismatch {
            expected: POLICY_OUTPUT_COUNT,
            actual: network.output_count,
        });
    }
    if network.input_count != input_count {
        return Err(ConfigError::InputCountMismatch {
            expected: input_count,
            actual: network.input_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        TrainingConfig::default().validate().unwrap();
    }

    #[test]
    fn test_screen_size_must_match_inputs() {
        let mut config = TrainingConfig::default();
        config.environment.screen_size = 20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InputCountMismatch {
                expected: 800,
                actual: 512
            })
        ));
    }

    #[test]
    fn test_screen_must_hold_every_target() {
        let mut config = TrainingConfig::default();
        config.environment.screen_size = 8;
        config.network.input_count = 128;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ScreenTooSmall {
                screen_size: 8,
                min: 16
            })
        ));
    }

    #[test]
    fn test_screen_must_hold_beacon() {
        let mut config = TrainingConfig::default();
        config.environment.beacon_radius = 7;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ScreenTooSmall {
                screen_size: 16,
                min: 17
            })
        ));
    }

    #[test]
    fn test_unit_must_move() {
        let mut config = TrainingConfig::default();
        for unit_speed in [0, -1] {
            config.environment.unit_speed = unit_speed;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidUnitSpeed { unit_speed: s }) if s == unit_speed
            ));
        }
    }

    #[test]
    fn test_negative_beacon_radius_rejected() {
        let mut config = TrainingConfig::default();
        config.environment.beacon_radius = -2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeBeaconRadius { beacon_radius: -2 })
        ));
    }

    #[test]
    fn test_output_count_is_fixed() {
        let mut config = TrainingConfig::default();
        config.network.output_count = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputCountMismatch { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let config = TrainingConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: TrainingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }
}
