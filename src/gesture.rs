//! Double-copy detection over polled clipboard change counters.

use std::time::{Duration, Instant};

/// Edge-triggered detector fed with the clipboard change counter on every poll.
///
/// A gesture fires when a counter change arrives within `gap` of the previous
/// change. Each consecutive pair of changes is judged on its own, so a burst of
/// three quick copies fires twice.
#[derive(Debug, Clone)]
pub struct GestureDetector {
    gap: Duration,
    last_seen_counter: u64,
    last_event_time: Instant,
}

impl GestureDetector {
    /// `initial_counter` is the clipboard counter at startup; `now` seeds the
    /// previous-event time, so a copy within `gap` of construction counts as a
    /// double copy.
    pub fn new(gap: Duration, initial_counter: u64, now: Instant) -> Self {
        Self {
            gap,
            last_seen_counter: initial_counter,
            last_event_time: now,
        }
    }

    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Returns `true` when this tick completes a double copy.
    pub fn on_tick(&mut self, current_counter: u64, now: Instant) -> bool {
        if current_counter == self.last_seen_counter {
            return false;
        }
        let elapsed = now.saturating_duration_since(self.last_event_time);
        let fired = elapsed <= self.gap;
        self.last_event_time = now;
        self.last_seen_counter = current_counter;
        fired
    }
}
