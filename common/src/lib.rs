pub mod clock;
pub mod config;
pub mod cycle;
pub mod error;
pub mod heater;
pub mod thermometer;
pub mod thermostat;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{
    CycleProtectionConfig, PersistedSettings, RuntimeConfig, SimulationConfig, ThermostatConfig,
};
pub use cycle::{HeaterCycleProtection, PhysicalState, Transition};
pub use error::{ConfigError, ProtocolViolation, ThermostatError};
pub use heater::{Heater, MemoryHeater};
pub use thermometer::{ManualThermometer, Thermometer};
pub use thermostat::{Thermostat, Thresholds};
pub use types::{ThermostatMode, ThermostatStatus};
