use serde_json::Value;

use crate::constants::{MAX_VALUE, MIN_VALUE};
use crate::event_log::{EventLog, LogSource};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    Autonomous, // The polling loop may run
    Manual,     // User has taken over; no autonomous ticks until re-enabled
}

/// All mutable session state, funneled through named transitions so the
/// polling loop and the mapper can be exercised without a window.
pub struct AppState {
    value: f64,
    mode: Mode,
    log: EventLog,
}

impl AppState {
    pub fn new() -> Self {
        Self { value: MIN_VALUE, mode: Mode::Autonomous, log: EventLog::new() }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Out-of-range values are clamped, never rejected.
    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(MIN_VALUE, MAX_VALUE);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn push_log(&mut self, source: LogSource, message: impl Into<String>, payload: Option<Value>) {
        self.log.push(source, message, payload);
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_clamps_to_domain() {
        let mut state = AppState::new();
        state.set_value(0.2);
        assert_eq!(state.value(), MIN_VALUE);
        state.set_value(42.0);
        assert_eq!(state.value(), MAX_VALUE);
        state.set_value(7.25);
        assert_eq!(state.value(), 7.25);
    }

    #[test]
    fn starts_autonomous_at_domain_floor() {
        let state = AppState::new();
        assert_eq!(state.mode(), Mode::Autonomous);
        assert_eq!(state.value(), MIN_VALUE);
    }
}
