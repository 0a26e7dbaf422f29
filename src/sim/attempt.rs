//! Timed attempt meter
//!
//! Discrete timed actions (swing at a pitch, lock a power meter, stop the
//! dice) share one small state machine:
//!
//! ```text
//! Idle -> Committing -> Locked -> Resolved -> Idle
//! ```
//!
//! `Committing -> Locked` happens only through `lock()`, called from an input
//! handler. Every other transition is driven by the ruleset or by `tick()`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptPhase {
    Idle,
    /// Value is moving; waiting for input
    Committing,
    /// Value captured at the input instant
    Locked,
    /// Outcome applied; holding briefly before the next attempt
    Resolved,
}

/// How the value moves while committing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeterMotion {
    /// Bounces between 0 and 1 until locked
    PingPong,
    /// Travels 0 -> 1 once; passing 1 is an overrun
    Sweep,
}

/// Reported by `tick()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterTick {
    Moving,
    /// A sweep passed its end without input
    Overrun,
    /// The resolved hold finished; meter is idle again
    Ready,
    Waiting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptMeter {
    phase: AttemptPhase,
    motion: MeterMotion,
    value: f32,
    direction: f32,
    /// Full sweeps per second
    speed: f32,
    locked_value: Option<f32>,
    hold_ticks: u32,
}

impl AttemptMeter {
    pub fn new(motion: MeterMotion) -> Self {
        Self {
            phase: AttemptPhase::Idle,
            motion,
            value: 0.0,
            direction: 1.0,
            speed: 1.0,
            locked_value: None,
            hold_ticks: 0,
        }
    }

    pub fn phase(&self) -> AttemptPhase {
        self.phase
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn locked_value(&self) -> Option<f32> {
        self.locked_value
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AttemptPhase::Idle
    }

    /// Begin a new attempt. Only valid from Idle.
    pub fn start(&mut self, speed: f32) -> bool {
        if self.phase != AttemptPhase::Idle {
            return false;
        }
        self.phase = AttemptPhase::Committing;
        self.value = 0.0;
        self.direction = 1.0;
        self.speed = speed.max(0.0);
        self.locked_value = None;
        true
    }

    /// Capture the current value. Only valid while committing.
    pub fn lock(&mut self) -> Option<f32> {
        if self.phase != AttemptPhase::Committing {
            return None;
        }
        self.phase = AttemptPhase::Locked;
        self.locked_value = Some(self.value);
        self.locked_value
    }

    /// Finish a locked (or overrun) attempt and hold for `hold_ticks`
    pub fn resolve(&mut self, hold_ticks: u32) -> bool {
        if self.phase != AttemptPhase::Locked {
            return false;
        }
        self.phase = AttemptPhase::Resolved;
        self.hold_ticks = hold_ticks;
        true
    }

    pub fn tick(&mut self, dt: f32) -> MeterTick {
        match self.phase {
            AttemptPhase::Idle | AttemptPhase::Locked => MeterTick::Waiting,
            AttemptPhase::Committing => {
                let step = self.speed * dt;
                match self.motion {
                    MeterMotion::PingPong => {
                        self.value += step * self.direction;
                        if self.value >= 1.0 {
                            self.value = 2.0 - self.value;
                            self.direction = -1.0;
                        } else if self.value <= 0.0 {
                            self.value = -self.value;
                            self.direction = 1.0;
                        }
                        self.value = self.value.clamp(0.0, 1.0);
                        MeterTick::Moving
                    }
                    MeterMotion::Sweep => {
                        self.value += step;
                        if self.value > 1.0 {
                            // Counts as locked past the end so the ruleset can resolve it
                            self.value = 1.0;
                            self.phase = AttemptPhase::Locked;
                            self.locked_value = None;
                            MeterTick::Overrun
                        } else {
                            MeterTick::Moving
                        }
                    }
                }
            }
            AttemptPhase::Resolved => {
                self.hold_ticks = self.hold_ticks.saturating_sub(1);
                if self.hold_ticks == 0 {
                    self.phase = AttemptPhase::Idle;
                    MeterTick::Ready
                } else {
                    MeterTick::Waiting
                }
            }
        }
    }
}
