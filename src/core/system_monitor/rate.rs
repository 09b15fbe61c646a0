//! Rate calculation for monotonic counters.
//!
//! Converts successive readings of a counter that only grows (bytes sent,
//! CPU time consumed, sectors read) into units per second.

use std::time::Instant;

/// One recorded reading of a counter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterSample {
    pub timestamp: Instant,
    pub value: u64,
}

/// Tracks a single monotonic-non-decreasing counter and derives its rate.
///
/// A decrease in the raw value is treated as a counter reset (process
/// restart, adapter reset, wraparound): the delta is discarded, the
/// baseline restarts at the new value and the rate for that cycle is 0.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    baseline: Option<CounterSample>,
    last_rate: Option<f64>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a new reading. Returns `None` until two readings exist.
    pub fn observe(&mut self, value: u64, timestamp: Instant) -> Option<f64> {
        let Some(previous) = self.baseline else {
            self.baseline = Some(CounterSample { timestamp, value });
            return None;
        };

        // Zero or negative elapsed time: keep the old baseline and rate
        if timestamp <= previous.timestamp {
            return self.last_rate;
        }

        if value < previous.value {
            self.baseline = Some(CounterSample { timestamp, value });
            self.last_rate = Some(0.0);
            return self.last_rate;
        }

        let elapsed_secs = timestamp.duration_since(previous.timestamp).as_secs_f64();
        let rate = (value - previous.value) as f64 / elapsed_secs;

        self.baseline = Some(CounterSample { timestamp, value });
        self.last_rate = Some(rate);
        self.last_rate
    }

    /// Last rate returned by `observe`, if any.
    pub fn last_rate(&self) -> Option<f64> {
        self.last_rate
    }

    pub fn baseline(&self) -> Option<CounterSample> {
        self.baseline
    }

    /// Forget the baseline; the next reading starts over.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.last_rate = None;
    }
}

/// Two counters sampled together, e.g. received/sent bytes of one adapter
/// or read/written bytes of one volume.
#[derive(Debug, Clone, Default)]
pub struct CounterPair {
    pub inbound: RateTracker,
    pub outbound: RateTracker,
}

impl CounterPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe both counters at the same instant.
    ///
    /// Rates that are not yet defined come back as 0.0, which is what
    /// consumers display until the second reading arrives.
    pub fn observe(&mut self, inbound: u64, outbound: u64, timestamp: Instant) -> (f64, f64) {
        (
            self.inbound.observe(inbound, timestamp).unwrap_or(0.0),
            self.outbound.observe(outbound, timestamp).unwrap_or(0.0),
        )
    }
}
