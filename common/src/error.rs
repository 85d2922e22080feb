use thiserror::Error;

use crate::cycle::Transition;

/// Rejected configuration or command. Nothing changes when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("target temperature {value} outside allowed range [{min}, {max}]")]
    TargetOutOfRange { value: f32, min: f32, max: f32 },
    #[error("unrecognized mode: {0}")]
    InvalidMode(String),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Broken scheduling invariant detected during `iterate()`.
///
/// These are hard faults. They are returned as soon as they are found and the host
/// decides whether to keep running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolViolation {
    #[error("{second:?} became due at {at} after {first:?} was already applied in the same iteration")]
    DoubleTransition {
        first: Transition,
        second: Transition,
        at: f64,
    },
    #[error("clock moved backward from {previous} to {now}")]
    ClockRegression { previous: f64, now: f64 },
    #[error("cycle protection did not settle after {passes} passes")]
    Runaway { passes: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThermostatError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fault(#[from] ProtocolViolation),
}
