//! Replay metrics
//!
//! Thin wrappers over the `metrics` facade so every crate uses the same
//! metric names and labels. Without an installed recorder they are no-ops.

use metrics::{counter, gauge, histogram};

/// Event timer armed
pub fn record_event_scheduled() {
    counter!("stream_emulator_events_scheduled_total").increment(1);
}

/// Event handed to a broker connection
pub fn record_event_fired(entity_kind: &str) {
    counter!(
        "stream_emulator_events_fired_total",
        "entity_kind" => entity_kind.to_string()
    )
    .increment(1);
}

/// Event not delivered (`unknown_broker`, `publish_failed`, `cancelled`)
pub fn record_event_dropped(reason: &'static str) {
    counter!("stream_emulator_events_dropped_total", "reason" => reason).increment(1);
}

/// Gap between the scheduled and actual fire instant
pub fn record_fire_lateness_ms(lateness_ms: f64) {
    histogram!("stream_emulator_fire_lateness_ms").record(lateness_ms);
}

/// Stream lines rejected by the parser
pub fn record_lines_skipped(count: usize) {
    if count > 0 {
        counter!("stream_emulator_stream_lines_skipped_total").increment(count as u64);
    }
}

/// Number of resolved entities of one kind
pub fn record_entities(entity_kind: &str, count: usize) {
    gauge!(
        "stream_emulator_entities_total",
        "entity_kind" => entity_kind.to_string()
    )
    .set(count as f64);
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a sample
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
