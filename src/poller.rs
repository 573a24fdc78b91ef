use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;

use crate::event_log::LogSource;
use crate::state::{AppState, Mode};
use crate::uplink::MoodReading;

/// Where the polling loop is in its cycle. At most one timer is ever
/// outstanding: `Scheduled` is the only state holding a due time, and the
/// only transitions that arm it are `start` and tick completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scheduled { due: Instant },
    InFlight { started: Instant },
}

/// The autonomous update loop. The timer is virtual: the main loop asks
/// `tick_due` every frame and drives the transitions itself, so tests can
/// run the whole cycle with hand-built instants and a seeded RNG.
pub struct Poller {
    phase: Phase,
    min_interval: Duration,
    max_interval: Duration,
}

impl Poller {
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        Self { phase: Phase::Idle, min_interval, max_interval }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Arm continuous polling with an immediate first tick.
    pub fn start(&mut self, now: Instant) {
        self.phase = Phase::Scheduled { due: now };
    }

    /// Cancel the pending tick and prevent new ones. An in-flight fetch may
    /// still complete, but `complete_tick` discards it from Idle.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn tick_due(&self, now: Instant) -> bool {
        match self.phase {
            Phase::Scheduled { due } => now >= due,
            _ => false,
        }
    }

    /// Begin a tick: log the outbound request and move to InFlight. Returns
    /// false (and disarms) if the mode flipped to Manual between scheduling
    /// and firing, so the caller must not dispatch a fetch.
    pub fn begin_tick(&mut self, state: &mut AppState, now: Instant) -> bool {
        if state.mode() != Mode::Autonomous {
            self.phase = Phase::Idle;
            return false;
        }
        state.push_log(LogSource::System, "Initiating uplink to value source...", None);
        self.phase = Phase::InFlight { started: now };
        true
    }

    /// Apply a completed fetch and arm the next tick. Mode is re-checked
    /// here: a manual takeover while the request was in flight suppresses
    /// both the value change and the reschedule. Stale completions (phase
    /// no longer InFlight) are ignored entirely.
    pub fn complete_tick<R: Rng>(
        &mut self,
        state: &mut AppState,
        outcome: Result<MoodReading>,
        now: Instant,
        rng: &mut R,
    ) {
        let Phase::InFlight { started } = self.phase else {
            return;
        };
        if state.mode() != Mode::Autonomous {
            self.phase = Phase::Idle;
            return;
        }

        match outcome {
            Ok(reading) => {
                let elapsed_ms = now.duration_since(started).as_secs_f64() * 1000.0;
                state.set_value(reading.value);
                let payload = serde_json::to_value(&reading).ok();
                state.push_log(
                    LogSource::External,
                    format!("Received update in {elapsed_ms:.1}ms."),
                    payload,
                );
            }
            Err(e) => {
                state.push_log(LogSource::System, format!("Uplink failure: {e:#}"), None);
            }
        }

        let delay = Duration::from_millis(
            rng.random_range(self.min_interval.as_millis() as u64..=self.max_interval.as_millis() as u64),
        );
        state.push_log(
            LogSource::System,
            format!("Next poll scheduled in {:.1}s", delay.as_secs_f64()),
            None,
        );
        self.phase = Phase::Scheduled { due: now + delay };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::event_log::LogSource;

    fn poller() -> Poller {
        Poller::new(Duration::from_millis(3_000), Duration::from_millis(10_000))
    }

    fn reading(value: f64) -> MoodReading {
        MoodReading {
            value,
            reasoning: "test".to_string(),
            mood_vector: "#00FF9D".to_string(),
        }
    }

    fn count_logs(state: &AppState, source: LogSource) -> usize {
        state.log().entries().iter().filter(|e| e.source == source).count()
    }

    #[test]
    fn start_schedules_an_immediate_tick() {
        let mut p = poller();
        let now = Instant::now();
        p.start(now);
        assert!(p.tick_due(now));
    }

    #[test]
    fn success_applies_value_and_reschedules_once() {
        let mut p = poller();
        let mut state = AppState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        p.start(now);
        assert!(p.begin_tick(&mut state, now));
        p.complete_tick(&mut state, Ok(reading(7.0)), now + Duration::from_millis(120), &mut rng);

        assert_eq!(state.value(), 7.0);
        assert_eq!(count_logs(&state, LogSource::External), 1);
        let Phase::Scheduled { due } = p.phase() else {
            panic!("expected a single rescheduled tick, got {:?}", p.phase());
        };
        let delay = due - (now + Duration::from_millis(120));
        assert!(delay >= Duration::from_millis(3_000) && delay <= Duration::from_millis(10_000));
    }

    #[test]
    fn failure_keeps_value_and_logs_exactly_one_system_failure() {
        let mut p = poller();
        let mut state = AppState::new();
        state.set_value(4.0);
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        p.start(now);
        p.begin_tick(&mut state, now);
        let before = count_logs(&state, LogSource::System);
        p.complete_tick(&mut state, Err(anyhow!("connection reset")), now + Duration::from_millis(50), &mut rng);

        assert_eq!(state.value(), 4.0);
        assert_eq!(count_logs(&state, LogSource::External), 0);
        // one failure entry plus one reschedule entry
        assert_eq!(count_logs(&state, LogSource::System) - before, 2);
        assert!(matches!(p.phase(), Phase::Scheduled { .. }));
    }

    #[test]
    fn fallback_reading_counts_as_success() {
        let mut p = poller();
        let mut state = AppState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        p.start(now);
        p.begin_tick(&mut state, now);
        p.complete_tick(&mut state, Ok(MoodReading::fallback()), now + Duration::from_millis(10), &mut rng);

        assert_eq!(state.value(), 5.5);
        assert_eq!(count_logs(&state, LogSource::External), 1);
    }

    #[test]
    fn stop_cancels_the_pending_tick() {
        let mut p = poller();
        let now = Instant::now();
        p.start(now);
        p.stop();
        assert_eq!(p.phase(), Phase::Idle);
        assert!(!p.tick_due(now + Duration::from_secs(60)));
    }

    #[test]
    fn manual_mode_between_scheduling_and_firing_noops_the_tick() {
        let mut p = poller();
        let mut state = AppState::new();
        let now = Instant::now();

        p.start(now);
        state.set_mode(Mode::Manual);
        assert!(!p.begin_tick(&mut state, now));
        assert_eq!(p.phase(), Phase::Idle);
        assert!(state.log().is_empty());
    }

    #[test]
    fn manual_takeover_during_flight_suppresses_the_completion() {
        let mut p = poller();
        let mut state = AppState::new();
        state.set_value(2.0);
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        p.start(now);
        p.begin_tick(&mut state, now);
        state.set_mode(Mode::Manual);
        p.complete_tick(&mut state, Ok(reading(9.0)), now + Duration::from_millis(80), &mut rng);

        assert_eq!(state.value(), 2.0);
        assert_eq!(count_logs(&state, LogSource::External), 0);
        assert_eq!(p.phase(), Phase::Idle);
    }

    #[test]
    fn stale_completion_after_restart_is_ignored() {
        let mut p = poller();
        let mut state = AppState::new();
        let mut rng = StdRng::seed_from_u64(7);
        let now = Instant::now();

        p.start(now);
        p.begin_tick(&mut state, now);
        // User flips to manual and back; the poller is re-armed while the
        // old fetch is still in flight.
        state.set_mode(Mode::Manual);
        p.stop();
        state.set_mode(Mode::Autonomous);
        p.start(now + Duration::from_millis(500));
        let rearmed = p.phase();

        p.complete_tick(&mut state, Ok(reading(9.0)), now + Duration::from_millis(600), &mut rng);

        // The stale outcome neither mutates state nor re-arms a second timer.
        assert_eq!(state.value(), crate::constants::MIN_VALUE);
        assert_eq!(p.phase(), rearmed);
    }

    #[test]
    fn restart_after_manual_ticks_immediately() {
        let mut p = poller();
        let now = Instant::now();
        p.start(now);
        p.stop();

        let later = now + Duration::from_secs(30);
        p.start(later);
        assert!(p.tick_due(later));
    }
}
