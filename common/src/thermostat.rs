use tracing::info;

use crate::{
    clock::Clock,
    config::ThermostatConfig,
    cycle::HeaterCycleProtection,
    error::{ConfigError, ThermostatError},
    heater::Heater,
    thermometer::Thermometer,
    types::{ThermostatMode, ThermostatStatus},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub low: f32,
    pub high: f32,
}

/// Decides whether the heater should run, and hands that decision to the
/// cycle-protection layer.
///
/// In [`ThermostatMode::Target`] the room must stay past a threshold for
/// `threshold_time_delay_secs` before the heater is switched.
#[derive(Debug)]
pub struct Thermostat<H, C, T> {
    protection: HeaterCycleProtection<H, C>,
    thermometer: T,
    clock: C,
    config: ThermostatConfig,

    mode: ThermostatMode,
    target_temp_f: Option<f32>,
    thresholds: Option<Thresholds>,

    crossed_below_low_at: Option<f64>,
    crossed_above_high_at: Option<f64>,
}

impl<H: Heater, C: Clock, T: Thermometer> Thermostat<H, C, T> {
    pub fn new(
        protection: HeaterCycleProtection<H, C>,
        thermometer: T,
        clock: C,
        config: ThermostatConfig,
    ) -> Self {
        Self {
            protection,
            thermometer,
            clock,
            config,
            mode: ThermostatMode::Off,
            target_temp_f: None,
            thresholds: None,
            crossed_below_low_at: None,
            crossed_above_high_at: None,
        }
    }

    pub fn protection(&self) -> &HeaterCycleProtection<H, C> {
        &self.protection
    }

    pub fn mode(&self) -> ThermostatMode {
        self.mode
    }

    pub fn thresholds(&self) -> Option<Thresholds> {
        self.thresholds
    }

    pub fn crossed_below_low_at(&self) -> Option<f64> {
        self.crossed_below_low_at
    }

    pub fn crossed_above_high_at(&self) -> Option<f64> {
        self.crossed_above_high_at
    }

    pub fn get_room_temperature(&self) -> f32 {
        self.thermometer.temperature()
    }

    pub fn get_heater_is_on(&self) -> bool {
        self.protection.is_on()
    }

    pub fn get_target_temperature(&self) -> Option<f32> {
        self.target_temp_f
    }

    pub fn set_target_temperature(&mut self, temp_f: f32) -> Result<(), ConfigError> {
        self.config.check_target(temp_f)?;

        let band = self.config.threshold_band_f;
        self.target_temp_f = Some(temp_f);
        self.thresholds = Some(Thresholds {
            low: temp_f - band,
            high: temp_f + band,
        });
        info!("target temperature set to {temp_f}");
        Ok(())
    }

    pub fn set_mode(&mut self, mode: ThermostatMode) -> Result<(), ThermostatError> {
        self.protection.check_clock(self.clock.now())?;

        match mode {
            ThermostatMode::On => {
                self.protection.set_to_on(true);
                self.protection.iterate()?;
            }
            ThermostatMode::Off => {
                self.protection.set_to_on(false);
                self.protection.iterate()?;
            }
            ThermostatMode::Target => {}
        }

        self.mode = mode;
        info!("thermostat mode set to {mode}");
        self.iterate()
    }

    pub fn set_mode_str(&mut self, mode: &str) -> Result<(), ThermostatError> {
        let mode = mode.parse::<ThermostatMode>()?;
        self.set_mode(mode)
    }

    pub fn iterate(&mut self) -> Result<(), ThermostatError> {
        // A backward reading must not leave a crossing timestamp or a request behind.
        self.protection.check_clock(self.clock.now())?;
        self.check_thresholds();

        if self.mode == ThermostatMode::Target {
            let now = self.clock.now();
            let delay = self.config.threshold_time_delay_secs;
            let held = |since: Option<f64>| since.is_some_and(|since| now - since >= delay);

            if held(self.crossed_below_low_at) && !self.protection.is_on() {
                info!("below low threshold for {delay}s, requesting heat");
                self.protection.set_to_on(true);
            }
            if held(self.crossed_above_high_at) && self.protection.is_on() {
                info!("above high threshold for {delay}s, releasing heat");
                self.protection.set_to_on(false);
            }
        }

        self.protection.iterate()?;
        Ok(())
    }

    /// Updates the threshold crossing timestamps from the current reading.
    pub fn check_thresholds(&mut self) {
        let Some(thresholds) = self.thresholds else {
            return;
        };
        let now = self.clock.now();
        let temp = self.thermometer.temperature();

        if temp < thresholds.low {
            self.crossed_below_low_at.get_or_insert(now);
        } else {
            self.crossed_below_low_at = None;
        }

        if temp > thresholds.high {
            self.crossed_above_high_at.get_or_insert(now);
        } else {
            self.crossed_above_high_at = None;
        }
    }

    pub fn status(&self) -> ThermostatStatus {
        let now = self.clock.now();
        let pending = self.protection.pending_transition();

        ThermostatStatus {
            current_temp: self.thermometer.temperature(),
            target_temp: self.target_temp_f,
            threshold_low: self.thresholds.map(|t| t.low),
            threshold_high: self.thresholds.map(|t| t.high),
            mode: self.mode.as_str(),
            heater_on: self.protection.is_on(),
            heater_actually_on: self.protection.is_actually_on(),
            pending_transition: pending.map(|(transition, _)| transition.as_str()),
            pending_at: pending.map(|(_, at)| at),
            below_low_secs: self.crossed_below_low_at.map(|since| now - since),
            above_high_secs: self.crossed_above_high_at.map(|since| now - since),
        }
    }
}
