use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    #[default]
    Off,
    On,
    Target,
}

impl ThermostatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThermostatMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "on" => Ok(Self::On),
            "target" | "auto" => Ok(Self::Target),
            _ => Err(ConfigError::InvalidMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermostatStatus {
    #[serde(rename = "currentTemp")]
    pub current_temp: f32,
    #[serde(rename = "targetTemp")]
    pub target_temp: Option<f32>,
    #[serde(rename = "thresholdLow")]
    pub threshold_low: Option<f32>,
    #[serde(rename = "thresholdHigh")]
    pub threshold_high: Option<f32>,
    pub mode: &'static str,
    #[serde(rename = "heaterOn")]
    pub heater_on: bool,
    #[serde(rename = "heaterActuallyOn")]
    pub heater_actually_on: bool,
    #[serde(rename = "pendingTransition")]
    pub pending_transition: Option<&'static str>,
    #[serde(rename = "pendingAt")]
    pub pending_at: Option<f64>,
    #[serde(rename = "belowLowSecs")]
    pub below_low_secs: Option<f64>,
    #[serde(rename = "aboveHighSecs")]
    pub above_high_secs: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!("off".parse::<ThermostatMode>(), Ok(ThermostatMode::Off));
        assert_eq!(" ON ".parse::<ThermostatMode>(), Ok(ThermostatMode::On));
        assert_eq!("target".parse::<ThermostatMode>(), Ok(ThermostatMode::Target));
        assert_eq!("auto".parse::<ThermostatMode>(), Ok(ThermostatMode::Target));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert_eq!(
            "heat".parse::<ThermostatMode>(),
            Err(ConfigError::InvalidMode("heat".to_string()))
        );
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&ThermostatMode::Target).unwrap();
        assert_eq!(json, "\"target\"");
    }
}
