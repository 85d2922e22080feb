use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, types::ThermostatMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleProtectionConfig {
    pub minimum_on_secs: f64,
    pub minimum_off_secs: f64,
    /// Longest continuous run before the heater is forced off.
    pub maximum_on_secs: f64,
}

impl Default for CycleProtectionConfig {
    fn default() -> Self {
        Self {
            minimum_on_secs: 300.0,
            minimum_off_secs: 300.0,
            maximum_on_secs: 3_600.0,
        }
    }
}

impl CycleProtectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            self.minimum_on_secs,
            self.minimum_off_secs,
            self.maximum_on_secs,
        ];
        if durations.iter().any(|secs| !secs.is_finite() || *secs < 0.0) {
            return Err(ConfigError::Invalid(
                "cycle protection durations must be finite and non-negative",
            ));
        }
        if self.maximum_on_secs < self.minimum_on_secs {
            return Err(ConfigError::Invalid(
                "maximum_on_secs must not be shorter than minimum_on_secs",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    /// How long the temperature must stay past a threshold before the heater is switched.
    pub threshold_time_delay_secs: f64,
    pub threshold_band_f: f32,
    pub target_min_f: f32,
    pub target_max_f: f32,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            threshold_time_delay_secs: 300.0,
            threshold_band_f: 1.0,
            target_min_f: 40.0,
            target_max_f: 82.0,
        }
    }
}

impl ThermostatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold_time_delay_secs.is_finite() || self.threshold_time_delay_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "threshold_time_delay_secs must be finite and non-negative",
            ));
        }
        if !self.threshold_band_f.is_finite() || self.threshold_band_f <= 0.0 {
            return Err(ConfigError::Invalid("threshold_band_f must be positive"));
        }
        if !self.target_min_f.is_finite()
            || !self.target_max_f.is_finite()
            || self.target_min_f > self.target_max_f
        {
            return Err(ConfigError::Invalid(
                "target_min_f must not exceed target_max_f",
            ));
        }
        Ok(())
    }

    pub fn check_target(&self, temp_f: f32) -> Result<(), ConfigError> {
        if temp_f.is_finite() && (self.target_min_f..=self.target_max_f).contains(&temp_f) {
            Ok(())
        } else {
            Err(ConfigError::TargetOutOfRange {
                value: temp_f,
                min: self.target_min_f,
                max: self.target_max_f,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub mode: ThermostatMode,
    pub target_temp_f: Option<f32>,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            mode: ThermostatMode::Off,
            target_temp_f: Some(68.0),
        }
    }
}

/// Parameters of the simulated room used when no hardware is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub initial_temp_f: f32,
    pub ambient_temp_f: f32,
    pub heating_rate_f_per_min: f32,
    /// Fraction of the room/ambient difference lost per minute.
    pub loss_per_min: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_temp_f: 66.0,
            ambient_temp_f: 50.0,
            heating_rate_f_per_min: 0.5,
            loss_per_min: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub thermostat: ThermostatConfig,
    pub cycle: CycleProtectionConfig,
    pub settings: PersistedSettings,
    pub poll_interval_secs: u64,
    pub status_interval_secs: u64,
    pub simulation: SimulationConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thermostat: ThermostatConfig::default(),
            cycle: CycleProtectionConfig::default(),
            settings: PersistedSettings::default(),
            poll_interval_secs: 5,
            status_interval_secs: 60,
            simulation: SimulationConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thermostat.validate()?;
        self.cycle.validate()?;
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("poll_interval_secs must be positive"));
        }
        if self.status_interval_secs == 0 {
            return Err(ConfigError::Invalid("status_interval_secs must be positive"));
        }
        if let Some(target) = self.settings.target_temp_f {
            self.thermostat.check_target(target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_hardware_limits() {
        let config = RuntimeConfig::default();
        assert_eq!(config.cycle.minimum_on_secs, 300.0);
        assert_eq!(config.cycle.minimum_off_secs, 300.0);
        assert_eq!(config.cycle.maximum_on_secs, 3_600.0);
        assert_eq!(config.thermostat.threshold_time_delay_secs, 300.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = RuntimeConfig::parse(
            r#"{"settings": {"mode": "target", "target_temp_f": 70}, "poll_interval_secs": 2}"#,
        )
        .unwrap();

        assert_eq!(config.settings.mode, ThermostatMode::Target);
        assert_eq!(config.settings.target_temp_f, Some(70.0));
        assert_eq!(config.poll_interval_secs, 2);
        assert_eq!(config.cycle, CycleProtectionConfig::default());
    }

    #[test]
    fn rejects_max_on_shorter_than_min_on() {
        let err = RuntimeConfig::parse(
            r#"{"cycle": {"minimum_on_secs": 600, "maximum_on_secs": 60}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_initial_target() {
        let err = RuntimeConfig::parse(r#"{"settings": {"target_temp_f": 90}}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TargetOutOfRange {
                value: 90.0,
                min: 40.0,
                max: 82.0,
            }
        );
    }

    #[test]
    fn rejects_malformed_json() {
        let err = RuntimeConfig::parse("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
