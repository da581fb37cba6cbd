//! Adaptive AIMD + circuit-breaker concurrency controller (§4.4)
//!
//! A plain value type behind a short-critical-section `Mutex`, never a
//! process-global singleton, so isolated tests and multiple concurrent
//! pipelines in one process both work (§9).

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::config::ControllerConfig;
use crate::models::TaskOutcomeKind;

const WINDOW_CAPACITY: usize = 50;
const EVALUATE_EVERY_N_TASKS: usize = 10;
const EVALUATE_EVERY_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowOutcome {
    Success,
    TransientFail,
    RateLimited,
}

impl From<TaskOutcomeKind> for Option<WindowOutcome> {
    fn from(kind: TaskOutcomeKind) -> Self {
        match kind {
            TaskOutcomeKind::Success => Some(WindowOutcome::Success),
            TaskOutcomeKind::TransientFail => Some(WindowOutcome::TransientFail),
            TaskOutcomeKind::RateLimited => Some(WindowOutcome::RateLimited),
            // Expired / NonEnglish are not throughput signals (§4.4)
            TaskOutcomeKind::Expired | TaskOutcomeKind::NonEnglish => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Breaker {
    Closed,
    Open,
}

struct ControllerState {
    window: VecDeque<WindowOutcome>,
    concurrency: usize,
    base_delay: f64,
    breaker: Breaker,
    breaker_open_until: Option<Instant>,
    tasks_since_eval: usize,
    last_eval: Instant,
}

/// The current {concurrency, delay} operating point plus breaker state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub concurrency: usize,
    pub base_delay: f64,
    pub breaker_open: bool,
}

/// Shared, `Mutex`-guarded AIMD controller with a circuit breaker
pub struct AdaptiveController {
    config: ControllerConfig,
    state: Mutex<ControllerState>,
}

impl AdaptiveController {
    pub fn new(config: ControllerConfig) -> Self {
        let state = ControllerState {
            window: VecDeque::with_capacity(WINDOW_CAPACITY),
            concurrency: config.initial_concurrency,
            base_delay: config.initial_delay_s,
            breaker: Breaker::Closed,
            breaker_open_until: None,
            tasks_since_eval: 0,
            last_eval: Instant::now(),
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Current {concurrency, delay, breaker} snapshot, re-read every cycle by
    /// the worker pool — never cached.
    pub fn snapshot(&self) -> Snapshot {
        let mut state = self.state.lock().unwrap();
        self.maybe_close_breaker(&mut state);
        Snapshot {
            concurrency: state.concurrency,
            base_delay: state.base_delay,
            breaker_open: state.breaker == Breaker::Open,
        }
    }

    /// Per-task pacing sleep duration: `uniform(base_delay, base_delay + jitter_range)`
    pub fn next_pacing_delay(&self) -> Duration {
        let state = self.state.lock().unwrap();
        let jitter = self.config.jitter_range_s;
        let low = state.base_delay;
        let high = state.base_delay + jitter;
        let secs = if high > low {
            rand::thread_rng().gen_range(low..high)
        } else {
            low
        };
        Duration::from_secs_f64(secs)
    }

    /// Report one task's outcome; triggers AIMD re-evaluation and circuit
    /// breaker trip decisions as needed.
    pub fn report_outcome(&self, outcome: TaskOutcomeKind) {
        let mut state = self.state.lock().unwrap();
        self.maybe_close_breaker(&mut state);

        if let Some(window_outcome) = Option::<WindowOutcome>::from(outcome) {
            if state.window.len() == WINDOW_CAPACITY {
                state.window.pop_front();
            }
            state.window.push_back(window_outcome);
            state.tasks_since_eval += 1;
        }

        self.maybe_trip_breaker(&mut state);

        let due_by_count = state.tasks_since_eval >= EVALUATE_EVERY_N_TASKS;
        let due_by_time = state.last_eval.elapsed() >= Duration::from_secs(EVALUATE_EVERY_SECS);
        if due_by_count || due_by_time {
            self.evaluate(&mut state);
            state.tasks_since_eval = 0;
            state.last_eval = Instant::now();
        }
    }

    fn last_n(window: &VecDeque<WindowOutcome>, n: usize) -> Vec<WindowOutcome> {
        let len = window.len();
        let start = len.saturating_sub(n);
        window.iter().skip(start).copied().collect()
    }

    fn maybe_trip_breaker(&self, state: &mut ControllerState) {
        let recent = Self::last_n(&state.window, EVALUATE_EVERY_N_TASKS);
        let rate_limited = recent.iter().filter(|o| **o == WindowOutcome::RateLimited).count();
        if rate_limited >= self.config.breaker_rate_limit_threshold && state.breaker == Breaker::Closed {
            state.breaker = Breaker::Open;
            state.breaker_open_until = Some(Instant::now() + Duration::from_secs(self.config.breaker_open_s));
            tracing::info!(rate_limited, "circuit breaker opened");
        }
    }

    fn maybe_close_breaker(&self, state: &mut ControllerState) {
        if state.breaker == Breaker::Open {
            if let Some(until) = state.breaker_open_until {
                if Instant::now() >= until {
                    state.breaker = Breaker::Closed;
                    state.breaker_open_until = None;
                    tracing::info!("circuit breaker closed");
                }
            }
        }
    }

    fn evaluate(&self, state: &mut ControllerState) {
        if state.window.is_empty() {
            return;
        }

        let successes = state.window.iter().filter(|o| **o == WindowOutcome::Success).count();
        let s = successes as f64 / state.window.len() as f64;

        let recent = Self::last_n(&state.window, EVALUATE_EVERY_N_TASKS);
        let recent_rate_limited = recent.iter().any(|o| *o == WindowOutcome::RateLimited);

        if recent_rate_limited || s < 0.5 {
            state.concurrency = (state.concurrency.div_ceil(2)).max(self.config.min_concurrency);
            state.base_delay = (state.base_delay * 2.0).min(self.config.max_delay_s);
            tracing::debug!(concurrency = state.concurrency, base_delay = state.base_delay, "AIMD decrease");
        } else if s > 0.9 {
            if state.concurrency < self.config.max_concurrency {
                state.concurrency += 1;
            }
            state.base_delay = (state.base_delay - 0.25).max(1.0);
            tracing::debug!(concurrency = state.concurrency, base_delay = state.base_delay, "AIMD increase");
        }
    }
}
