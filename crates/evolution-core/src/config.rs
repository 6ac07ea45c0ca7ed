use crate::environment::Environment;
use crate::genome::ParseNameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty setting. Decides the starting influence budget, the periodic
/// influence income and the intervention price multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Scientist,
    God,
    Hardcore,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Scientist => "scientist",
            Mode::God => "god",
            Mode::Hardcore => "hardcore",
        }
    }

    pub fn starting_influence(self) -> u64 {
        match self {
            Mode::Scientist => 10,
            Mode::God => 50,
            Mode::Hardcore => 0,
        }
    }

    pub fn income_multiplier(self) -> u64 {
        match self {
            Mode::God => 2,
            Mode::Scientist | Mode::Hardcore => 1,
        }
    }

    pub fn cost_multiplier(self) -> u64 {
        match self {
            Mode::Hardcore => 2,
            Mode::Scientist | Mode::God => 1,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Mode::Scientist, Mode::God, Mode::Hardcore]
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ParseNameError {
                kind: "mode",
                name: s.to_string(),
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub seed: u64,
    pub mode: Mode,
    pub initial_species: usize,
    pub initial_population: u64,
    /// Ticks replayed per second of wall-clock absence.
    pub offline_ticks_per_second: f64,
    pub max_offline_ticks: u64,
    /// Simulation ticks before a radiation pulse reverts.
    pub rad_pulse_ticks: u64,
    pub environment: Environment,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            mode: Mode::default(),
            initial_species: 3,
            initial_population: 100,
            offline_ticks_per_second: 0.5,
            max_offline_ticks: 5_000,
            rad_pulse_ticks: 30,
            environment: Environment::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidInitialSpecies { max: usize, actual: usize },
    InvalidInitialPopulation,
    InvalidOfflineRate(f64),
    InvalidOfflineCap,
    InvalidRadPulseTicks,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidInitialSpecies { max, actual } => write!(
                f,
                "initial_species ({actual}) must be between 1 and {max}"
            ),
            SimConfigError::InvalidInitialPopulation => {
                write!(f, "initial_population must be positive")
            }
            SimConfigError::InvalidOfflineRate(rate) => write!(
                f,
                "offline_ticks_per_second ({rate}) must be finite and positive"
            ),
            SimConfigError::InvalidOfflineCap => write!(f, "max_offline_ticks must be positive"),
            SimConfigError::InvalidRadPulseTicks => write!(f, "rad_pulse_ticks must be positive"),
        }
    }
}

impl std::error::Error for SimConfigError {}

impl SimConfig {
    /// Upper bound on simultaneously live species.
    pub const MAX_LIVE_SPECIES: usize = 22;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.initial_species == 0 || self.initial_species > Self::MAX_LIVE_SPECIES {
            return Err(SimConfigError::InvalidInitialSpecies {
                max: Self::MAX_LIVE_SPECIES,
                actual: self.initial_species,
            });
        }
        if self.initial_population == 0 {
            return Err(SimConfigError::InvalidInitialPopulation);
        }
        if !self.offline_ticks_per_second.is_finite() || self.offline_ticks_per_second <= 0.0 {
            return Err(SimConfigError::InvalidOfflineRate(
                self.offline_ticks_per_second,
            ));
        }
        if self.max_offline_ticks == 0 {
            return Err(SimConfigError::InvalidOfflineCap);
        }
        if self.rad_pulse_ticks == 0 {
            return Err(SimConfigError::InvalidRadPulseTicks);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let too_many = SimConfig {
            initial_species: 23,
            ..SimConfig::default()
        };
        assert_eq!(
            too_many.validate(),
            Err(SimConfigError::InvalidInitialSpecies { max: 22, actual: 23 })
        );
        let bad_rate = SimConfig {
            offline_ticks_per_second: f64::INFINITY,
            ..SimConfig::default()
        };
        assert!(matches!(
            bad_rate.validate(),
            Err(SimConfigError::InvalidOfflineRate(_))
        ));
        let no_pulse = SimConfig {
            rad_pulse_ticks: 0,
            ..SimConfig::default()
        };
        assert_eq!(no_pulse.validate(), Err(SimConfigError::InvalidRadPulseTicks));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{"seed": 9, "mode": "god", "environment": {"water": 8.0}}"#)
                .unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.mode, Mode::God);
        assert_eq!(config.environment.water, 8.0);
        assert_eq!(config.environment.temperature, 5.0);
        assert_eq!(config.max_offline_ticks, 5_000);
    }

    #[test]
    fn mode_economics() {
        assert_eq!(Mode::Scientist.starting_influence(), 10);
        assert_eq!(Mode::God.income_multiplier(), 2);
        assert_eq!(Mode::Hardcore.cost_multiplier(), 2);
        assert_eq!("hardcore".parse::<Mode>(), Ok(Mode::Hardcore));
        assert!("easy".parse::<Mode>().is_err());
    }
}
