//! Resumable, tick-driven tasks.
//!
//! Multi-tick work keeps its own progress and is advanced once per tick by
//! the host. Nothing blocks and nothing is scheduled on the wall clock.

/// Outcome of advancing a task by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Still running; advance again next tick.
    Continue,
    /// Finished on this tick.
    Done,
}

impl TaskStatus {
    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }
}

/// Slack absorbed when comparing accumulated `dt` against a duration.
/// Nine ticks of 1/60 s must count as 0.15 s even though the f32 sum is a hair short.
pub const TIME_EPSILON: f32 = 1e-5;

/// One-shot countdown on simulated time. Reports `Done` exactly once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    remaining: f32,
    fired: bool,
}

impl Countdown {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
            fired: false,
        }
    }

    /// Consume `dt` seconds. Returns `Done` on the tick the countdown expires
    /// and `Continue` both before and after.
    pub fn advance(&mut self, dt: f32) -> TaskStatus {
        if self.fired {
            return TaskStatus::Continue;
        }
        self.remaining -= dt;
        if self.remaining <= TIME_EPSILON {
            self.fired = true;
            TaskStatus::Done
        } else {
            TaskStatus::Continue
        }
    }

    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}
