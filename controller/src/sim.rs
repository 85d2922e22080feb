use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Instant,
};

use tracing::info;

use therm_common::{Heater, SimulationConfig, Thermometer};

/// Room temperature model: heats at a fixed rate while the relay is closed and
/// leaks toward the ambient temperature all the time.
#[derive(Debug)]
struct Room {
    config: SimulationConfig,
    temp_f: f32,
    heater_on: bool,
    last_update: Instant,
}

impl Room {
    fn new(config: SimulationConfig) -> Self {
        Self {
            temp_f: config.initial_temp_f,
            config,
            heater_on: false,
            last_update: Instant::now(),
        }
    }

    fn catch_up(&mut self) {
        let now = Instant::now();
        let minutes = now.duration_since(self.last_update).as_secs_f32() / 60.0;
        self.last_update = now;
        self.step(minutes);
    }

    fn step(&mut self, minutes: f32) {
        if self.heater_on {
            self.temp_f += self.config.heating_rate_f_per_min * minutes;
        }
        let fraction = (self.config.loss_per_min * minutes).clamp(0.0, 1.0);
        self.temp_f -= (self.temp_f - self.config.ambient_temp_f) * fraction;
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedRoom {
    room: Arc<Mutex<Room>>,
}

impl SimulatedRoom {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            room: Arc::new(Mutex::new(Room::new(config))),
        }
    }

    pub fn thermometer(&self) -> RoomThermometer {
        RoomThermometer { room: self.clone() }
    }

    pub fn heater(&self) -> RelayHeater {
        RelayHeater { room: self.clone() }
    }

    fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
pub struct RoomThermometer {
    room: SimulatedRoom,
}

impl Thermometer for RoomThermometer {
    fn temperature(&self) -> f32 {
        let mut room = self.room.lock();
        room.catch_up();
        room.temp_f
    }
}

#[derive(Debug)]
pub struct RelayHeater {
    room: SimulatedRoom,
}

impl Heater for RelayHeater {
    fn set_physical_state(&mut self, on: bool) {
        let mut room = self.room.lock();
        room.catch_up();
        room.heater_on = on;
        info!(
            "heater relay {} at {:.1}F",
            if on { "closed" } else { "opened" },
            room.temp_f
        );
    }

    fn physical_state(&self) -> bool {
        self.room.lock().heater_on
    }
}
