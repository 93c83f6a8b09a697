use std::time::Duration;

use parking_lot::RwLock;

// weight of a single measurement in the running estimate
const MEASUREMENT_IMPACT: f64 = 0.1;

// overshoot so a peer never locks into a lower-than-real capacity
const CAPACITY_OVERESTIMATION: f64 = 1.01;

pub const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

const MIN_CAPACITY: f64 = f64::MIN_POSITIVE;

/// Estimates the item throughput (items/second, not bytes) of one peer for
/// one data type. Several trackers may follow the same peer independently.
pub struct Tracker {
    capacity: RwLock<f64>,
    max_items: usize,
}

impl Tracker {
    pub fn new(capacity: f64) -> Self {
        Self::with_max_items(capacity, MAX_MESSAGE_SIZE)
    }

    pub fn with_max_items(capacity: f64, max_items: usize) -> Self {
        Self {
            capacity: RwLock::new(sanitize(capacity)),
            max_items: max_items.max(1),
        }
    }

    pub fn capacity(&self, target_rtt: Duration) -> usize {
        let capacity = *self.capacity.read();

        let throughput = capacity * target_rtt.as_secs_f64();

        // +1 so that a tiny throughput still produces a request the
        // overestimation can grow from
        round_capacity(1.0 + CAPACITY_OVERESTIMATION * throughput, self.max_items)
    }

    // zero items means a timeout or missing data and decays the estimate
    pub fn update(&self, elapsed: Duration, items: usize) {
        let elapsed = if elapsed.is_zero() { Duration::from_nanos(1) } else { elapsed };
        let measured = items as f64 / elapsed.as_secs_f64();

        let mut capacity = self.capacity.write();
        *capacity = sanitize((1.0 - MEASUREMENT_IMPACT) * *capacity + MEASUREMENT_IMPACT * measured);
    }

    pub fn capacity_value(&self) -> f64 {
        *self.capacity.read()
    }
}

fn round_capacity(capacity: f64, max_items: usize) -> usize {
    capacity.ceil().max(1.0).min(max_items as f64) as usize
}

// keeps the estimate strictly positive and finite
fn sanitize(capacity: f64) -> f64 {
    if capacity.is_nan() || capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else if capacity.is_infinite() {
        f64::MAX
    } else {
        capacity
    }
}
