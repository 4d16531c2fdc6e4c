use serde::{Deserialize, Serialize};

/// Per-update timing handed to every state hook.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Monotonic simulation frame counter.
    pub tick: u64,
    /// Simulation time in seconds since level start.
    pub time: f32,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, time: f32, dt_seconds: f32) -> Self {
        Self {
            tick,
            time,
            dt_seconds,
        }
    }

    /// The context one frame later.
    pub fn advance(self, dt_seconds: f32) -> Self {
        Self {
            tick: self.tick + 1,
            time: self.time + dt_seconds,
            dt_seconds,
        }
    }
}

/// Coarse phase of the simulated day, ordered from level start to the end of the day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    #[default]
    Dawn,
    Noon,
    Sundown,
    Midnight,
}
