use crate::genome::ParseNameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENV_MIN: f64 = 0.0;
pub const ENV_MAX: f64 = 10.0;

/// Bounds used by the slow climate drift.
pub const DRIFT_MIN: f64 = 0.5;
pub const DRIFT_MAX: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvParam {
    Temperature,
    Water,
    Volcanic,
    Radiation,
    Catastrophes,
    Resources,
    PredatorPressure,
}

impl EnvParam {
    pub const ALL: [EnvParam; 7] = [
        EnvParam::Temperature,
        EnvParam::Water,
        EnvParam::Volcanic,
        EnvParam::Radiation,
        EnvParam::Catastrophes,
        EnvParam::Resources,
        EnvParam::PredatorPressure,
    ];

    /// Parameters eligible for the periodic climate drift.
    pub const DRIFTING: [EnvParam; 3] = [
        EnvParam::Resources,
        EnvParam::Radiation,
        EnvParam::Temperature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvParam::Temperature => "temperature",
            EnvParam::Water => "water",
            EnvParam::Volcanic => "volcanic",
            EnvParam::Radiation => "radiation",
            EnvParam::Catastrophes => "catastrophes",
            EnvParam::Resources => "resources",
            EnvParam::PredatorPressure => "predator_pressure",
        }
    }

    fn clamp(self, value: f64) -> f64 {
        let value = if value.is_nan() { ENV_MIN } else { value };
        match self {
            EnvParam::PredatorPressure => value.max(ENV_MIN),
            _ => value.clamp(ENV_MIN, ENV_MAX),
        }
    }
}

impl fmt::Display for EnvParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnvParam {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EnvParam::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ParseNameError {
                kind: "environment parameter",
                name: s.to_string(),
            })
    }
}

/// Shared abiotic parameters. Every field is in [0, 10] except
/// `predator_pressure`, which is only bounded below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub temperature: f64,
    pub water: f64,
    pub volcanic: f64,
    pub radiation: f64,
    pub catastrophes: f64,
    pub resources: f64,
    pub predator_pressure: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature: 5.0,
            water: 5.0,
            volcanic: 2.0,
            radiation: 2.0,
            catastrophes: 2.0,
            resources: 5.0,
            predator_pressure: 1.0,
        }
    }
}

impl Environment {
    pub fn from_overrides<I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (EnvParam, f64)>,
    {
        let mut env = Self::default();
        for (param, value) in overrides {
            env.set(param, value);
        }
        env
    }

    pub fn get(&self, param: EnvParam) -> f64 {
        match param {
            EnvParam::Temperature => self.temperature,
            EnvParam::Water => self.water,
            EnvParam::Volcanic => self.volcanic,
            EnvParam::Radiation => self.radiation,
            EnvParam::Catastrophes => self.catastrophes,
            EnvParam::Resources => self.resources,
            EnvParam::PredatorPressure => self.predator_pressure,
        }
    }

    /// Stores `value` clamped into the parameter's valid range.
    pub fn set(&mut self, param: EnvParam, value: f64) {
        let value = param.clamp(value);
        match param {
            EnvParam::Temperature => self.temperature = value,
            EnvParam::Water => self.water = value,
            EnvParam::Volcanic => self.volcanic = value,
            EnvParam::Radiation => self.radiation = value,
            EnvParam::Catastrophes => self.catastrophes = value,
            EnvParam::Resources => self.resources = value,
            EnvParam::PredatorPressure => self.predator_pressure = value,
        }
    }

    /// Re-clamps every field; used after deserialization.
    pub fn clamped(mut self) -> Self {
        for param in EnvParam::ALL {
            self.set(param, self.get(param));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnvParam, f64)> + '_ {
        EnvParam::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_are_clamped_per_parameter() {
        let env = Environment::from_overrides([
            (EnvParam::Temperature, 14.0),
            (EnvParam::Water, -1.0),
            (EnvParam::PredatorPressure, 25.0),
        ]);
        assert_eq!(env.temperature, ENV_MAX);
        assert_eq!(env.water, ENV_MIN);
        assert_eq!(env.predator_pressure, 25.0);
        assert_eq!(env.resources, Environment::default().resources);
    }

    #[test]
    fn clamped_repairs_out_of_range_fields() {
        let env = Environment {
            radiation: 99.0,
            predator_pressure: -4.0,
            volcanic: f64::NAN,
            ..Environment::default()
        }
        .clamped();
        assert_eq!(env.radiation, ENV_MAX);
        assert_eq!(env.predator_pressure, 0.0);
        assert_eq!(env.volcanic, 0.0);
    }

    #[test]
    fn parameter_names_round_trip() {
        for param in EnvParam::ALL {
            assert_eq!(param.as_str().parse::<EnvParam>(), Ok(param));
        }
        assert!("humidity".parse::<EnvParam>().is_err());
    }
}
