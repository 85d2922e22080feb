/// Physical on/off actuator.
///
/// Owned exclusively by [`HeaterCycleProtection`](crate::HeaterCycleProtection); nothing
/// else should switch it.
pub trait Heater {
    fn set_physical_state(&mut self, on: bool);
    fn physical_state(&self) -> bool;
}

/// In-memory heater that keeps every command it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryHeater {
    on: bool,
    commands: Vec<bool>,
}

impl MemoryHeater {
    pub fn new(on: bool) -> Self {
        Self {
            on,
            commands: Vec::new(),
        }
    }

    /// Every `set_physical_state` argument, oldest first.
    pub fn commands(&self) -> &[bool] {
        &self.commands
    }
}

impl Heater for MemoryHeater {
    fn set_physical_state(&mut self, on: bool) {
        self.on = on;
        self.commands.push(on);
    }

    fn physical_state(&self) -> bool {
        self.on
    }
}
