//! Time system for the tick-driven simulation
//!
//! Provides the simulation clock:
//! - `Tick` - Frame counter
//! - `SimTime` - Simulated seconds since the start of the game
//! - `Speed` - Game speed control
//! - `Clock` - Simulation clock with state
//!
//! Ticks are irregular: the driver reports how much real time passed and the
//! clock converts it to simulated seconds according to the current speed.

use serde::{Deserialize, Serialize};

/// A frame counter
pub type Tick = u64;

/// Simulated time in seconds
pub type SimTime = f64;

/// Seconds per minute (rates are expressed per minute)
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Game speed settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Speed {
    /// Simulation is paused
    Paused,
    /// Half speed
    Slow,
    /// Real time
    #[default]
    Normal,
    /// Double speed
    Fast,
    /// Quadruple speed
    VeryFast,
}

impl Speed {
    /// Multiplier applied to real elapsed time
    pub fn multiplier(&self) -> f64 {
        match self {
            Speed::Paused => 0.0,
            Speed::Slow => 0.5,
            Speed::Normal => 1.0,
            Speed::Fast => 2.0,
            Speed::VeryFast => 4.0,
        }
    }

    /// Check if the simulation is paused
    pub fn is_paused(&self) -> bool {
        matches!(self, Speed::Paused)
    }
}

/// Simulation clock state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    /// Number of ticks driven so far
    pub tick: Tick,
    /// Simulated seconds elapsed
    pub now: SimTime,
    /// Current game speed
    pub speed: Speed,
}

impl Clock {
    /// Create a new clock at time zero, running at normal speed
    pub fn new() -> Self {
        Self {
            tick: 0,
            now: 0.0,
            speed: Speed::Normal,
        }
    }

    /// Create a clock starting at a given simulated time
    pub fn starting_at(now: SimTime) -> Self {
        Self {
            now,
            ..Self::new()
        }
    }

    /// Advance by `real_seconds` of wall-clock time and return the new simulated time
    ///
    /// Negative or non-finite input is treated as zero.
    pub fn advance(&mut self, real_seconds: f64) -> SimTime {
        let dt = if real_seconds.is_finite() {
            real_seconds.max(0.0)
        } else {
            0.0
        };
        self.tick += 1;
        self.now += dt * self.speed.multiplier();
        self.now
    }

    /// Set the game speed
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Toggle pause, returning the new speed
    pub fn toggle_pause(&mut self, previous_speed: Speed) -> Speed {
        if self.speed.is_paused() {
            self.speed = if previous_speed.is_paused() {
                Speed::Normal
            } else {
                previous_speed
            };
        } else {
            self.speed = Speed::Paused;
        }
        self.speed
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
