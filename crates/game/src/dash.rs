//! Dash timers: end-of-dash followed by end-of-cooldown, both on simulated time.

use engine_core::Countdown;

/// Transition reported by [`DashTimers::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashEvent {
    /// The dash-active window closed; the cooldown has started.
    Ended,
    /// The cooldown expired; dashing is available again.
    Ready,
}

/// The two chained one-shot timers behind a dash.
///
/// At most one of them is pending. The cooldown is only created when the
/// active timer fires, so its duration is measured from the end of the dash.
#[derive(Debug, Clone, Default)]
pub struct DashTimers {
    active: Option<Countdown>,
    cooldown: Option<Countdown>,
    cooldown_seconds: f32,
}

impl DashTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the dash-active timer. Any cooldown left over from an earlier dash is dropped.
    pub fn start(&mut self, duration: f32, cooldown: f32) {
        self.active = Some(Countdown::new(duration));
        self.cooldown = None;
        self.cooldown_seconds = cooldown;
    }

    /// Advance whichever timer is pending by `dt`. At most one event per tick.
    pub fn advance(&mut self, dt: f32) -> Option<DashEvent> {
        if let Some(active) = self.active.as_mut() {
            if active.advance(dt).is_done() {
                self.active = None;
                self.cooldown = Some(Countdown::new(self.cooldown_seconds));
                return Some(DashEvent::Ended);
            }
            return None;
        }
        if let Some(cooldown) = self.cooldown.as_mut() {
            if cooldown.advance(dt).is_done() {
                self.cooldown = None;
                return Some(DashEvent::Ready);
            }
        }
        None
    }

    pub fn is_active_pending(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_cooldown_pending(&self) -> bool {
        self.cooldown.is_some()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.cooldown.is_none()
    }
}
