use tracing::{debug, info, warn};

use crate::{
    clock::Clock, config::CycleProtectionConfig, error::ProtocolViolation, heater::Heater,
};

// A forced shutdown needs one extra pass; anything beyond that is a scheduling bug.
const MAX_PASSES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TurnOn,
    TurnOff,
}

impl Transition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "TURN_ON",
            Self::TurnOff => "TURN_OFF",
        }
    }
}

/// Where the physical heater is, and what it is waiting to do.
///
/// Pending variants keep the timestamp of the state the heater is still in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicalState {
    Off { since: Option<f64> },
    On { since: f64 },
    PendingOn { fire_at: f64, off_since: Option<f64> },
    PendingOff { fire_at: f64, on_since: f64 },
}

impl PhysicalState {
    pub fn is_on(self) -> bool {
        matches!(self, Self::On { .. } | Self::PendingOff { .. })
    }

    pub fn on_since(self) -> Option<f64> {
        match self {
            Self::On { since } => Some(since),
            Self::PendingOff { on_since, .. } => Some(on_since),
            _ => None,
        }
    }

    pub fn off_since(self) -> Option<f64> {
        match self {
            Self::Off { since } => since,
            Self::PendingOn { off_since, .. } => off_since,
            _ => None,
        }
    }

    pub fn pending(self) -> Option<(Transition, f64)> {
        match self {
            Self::PendingOn { fire_at, .. } => Some((Transition::TurnOn, fire_at)),
            Self::PendingOff { fire_at, .. } => Some((Transition::TurnOff, fire_at)),
            _ => None,
        }
    }
}

enum Pass {
    Settled,
    ShutdownForced,
}

/// Switches a heater on and off while enforcing minimum run/rest times and a
/// maximum continuous run time.
///
/// Requests only record intent and a schedule; [`iterate`](Self::iterate) must be
/// called regularly for scheduled transitions to reach the heater.
#[derive(Debug)]
pub struct HeaterCycleProtection<H, C> {
    heater: H,
    clock: C,
    config: CycleProtectionConfig,
    intended_on: bool,
    state: PhysicalState,
    no_turn_on_before: Option<f64>,
    no_turn_off_before: Option<f64>,
    last_now: Option<f64>,
}

impl<H: Heater, C: Clock> HeaterCycleProtection<H, C> {
    pub fn new(heater: H, clock: C, config: CycleProtectionConfig) -> Self {
        let state = if heater.physical_state() {
            PhysicalState::On { since: clock.now() }
        } else {
            PhysicalState::Off { since: None }
        };

        Self {
            heater,
            clock,
            config,
            intended_on: state.is_on(),
            state,
            no_turn_on_before: None,
            no_turn_off_before: None,
            last_now: None,
        }
    }

    /// The state last requested, which the heater may not have reached yet.
    pub fn is_on(&self) -> bool {
        self.intended_on
    }

    pub fn is_actually_on(&self) -> bool {
        self.state.is_on()
    }

    pub fn state(&self) -> PhysicalState {
        self.state
    }

    pub fn heater(&self) -> &H {
        &self.heater
    }

    pub fn config(&self) -> &CycleProtectionConfig {
        &self.config
    }

    pub fn no_turn_on_before(&self) -> Option<f64> {
        self.no_turn_on_before
    }

    pub fn no_turn_off_before(&self) -> Option<f64> {
        self.no_turn_off_before
    }

    pub fn on_since(&self) -> Option<f64> {
        self.state.on_since()
    }

    pub fn off_since(&self) -> Option<f64> {
        self.state.off_since()
    }

    pub fn pending_transition(&self) -> Option<(Transition, f64)> {
        self.state.pending()
    }

    pub fn set_to_on(&mut self, on: bool) {
        let now = self.clock.now();
        self.request(on, now);
    }

    /// Fails if `now` is earlier than the reading seen by the last `iterate()`.
    pub fn check_clock(&self, now: f64) -> Result<(), ProtocolViolation> {
        match self.last_now {
            Some(previous) if now < previous => {
                Err(ProtocolViolation::ClockRegression { previous, now })
            }
            _ => Ok(()),
        }
    }

    pub fn iterate(&mut self) -> Result<(), ProtocolViolation> {
        let now = self.clock.now();
        self.check_clock(now)?;
        self.last_now = Some(now);

        let mut handled = None;
        for _ in 0..MAX_PASSES {
            match self.apply_due(now, &mut handled)? {
                Pass::Settled => return Ok(()),
                Pass::ShutdownForced => {}
            }
        }
        Err(ProtocolViolation::Runaway { passes: MAX_PASSES })
    }

    fn request(&mut self, on: bool, now: f64) {
        self.intended_on = on;
        self.state = match (on, self.state) {
            (true, PhysicalState::Off { since }) => {
                let fire_at = not_before(self.no_turn_on_before, now);
                debug!("heater set to turn on at {fire_at}");
                PhysicalState::PendingOn {
                    fire_at,
                    off_since: since,
                }
            }
            (true, PhysicalState::PendingOff { on_since, .. }) => {
                debug!("pending turn off cancelled");
                PhysicalState::On { since: on_since }
            }
            (false, PhysicalState::On { since }) => {
                let fire_at = not_before(self.no_turn_off_before, now);
                debug!("heater set to turn off at {fire_at}");
                PhysicalState::PendingOff {
                    fire_at,
                    on_since: since,
                }
            }
            (false, PhysicalState::PendingOn { off_since, .. }) => {
                debug!("pending turn on cancelled");
                PhysicalState::Off { since: off_since }
            }
            // Already there, or already scheduled to get there.
            (_, state) => state,
        };
    }

    fn apply_due(
        &mut self,
        now: f64,
        handled: &mut Option<Transition>,
    ) -> Result<Pass, ProtocolViolation> {
        if let PhysicalState::PendingOff { fire_at, on_since } = self.state {
            if now >= fire_at {
                match self.no_turn_off_before {
                    Some(floor) if floor > fire_at => {
                        warn!("turn off time falls inside minimum on time, deferring to {floor}");
                        self.state = PhysicalState::PendingOff {
                            fire_at: floor,
                            on_since,
                        };
                    }
                    _ => {
                        claim(handled, Transition::TurnOff, now)?;
                        info!("reached turn off time, turning heater off");
                        self.heater.set_physical_state(false);
                        self.state = PhysicalState::Off { since: Some(now) };
                        self.no_turn_off_before = None;
                        self.no_turn_on_before = Some(now + self.config.minimum_off_secs);
                    }
                }
            }
        }

        if let PhysicalState::PendingOn { fire_at, off_since } = self.state {
            if now >= fire_at {
                match self.no_turn_on_before {
                    Some(floor) if floor > fire_at => {
                        warn!("turn on time falls inside minimum off time, deferring to {floor}");
                        self.state = PhysicalState::PendingOn {
                            fire_at: floor,
                            off_since,
                        };
                    }
                    _ => {
                        claim(handled, Transition::TurnOn, now)?;
                        info!("reached turn on time, turning heater on");
                        self.heater.set_physical_state(true);
                        self.state = PhysicalState::On { since: now };
                        self.no_turn_off_before = Some(now + self.config.minimum_on_secs);
                        self.no_turn_on_before = None;
                    }
                }
            }
        }

        if let Some(on_since) = self.state.on_since() {
            if now - on_since >= self.config.maximum_on_secs {
                if let Some(first) = *handled {
                    return Err(ProtocolViolation::DoubleTransition {
                        first,
                        second: Transition::TurnOff,
                        at: now,
                    });
                }
                warn!(
                    "heater on since {on_since}, reached maximum on time of {}s, forcing shutdown",
                    self.config.maximum_on_secs
                );
                self.request(false, now);
                return Ok(Pass::ShutdownForced);
            }
        }

        Ok(Pass::Settled)
    }
}

fn not_before(floor: Option<f64>, now: f64) -> f64 {
    floor.map_or(now, |floor| floor.max(now))
}

fn claim(
    handled: &mut Option<Transition>,
    transition: Transition,
    now: f64,
) -> Result<(), ProtocolViolation> {
    if let Some(first) = *handled {
        return Err(ProtocolViolation::DoubleTransition {
            first,
            second: transition,
            at: now,
        });
    }
    *handled = Some(transition);
    Ok(())
}
