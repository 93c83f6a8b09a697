use std::{collections::HashMap, sync::Arc, time::Duration};

use log::{debug, trace};
use parking_lot::RwLock;

use crate::{
    error::{Error, Result},
    rate::Tracker,
};

// The map lock is never held while a tracker is consulted.
#[derive(Default)]
pub struct Trackers {
    trackers: RwLock<HashMap<String, Arc<Tracker>>>,
}

impl Trackers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, id: &str, tracker: Arc<Tracker>) -> Result<()> {
        let capacity = tracker.capacity_value();
        let mut trackers = self.trackers.write();

        if trackers.contains_key(id) {
            return Err(Error::AlreadyTracking(id.to_string()));
        }
        trackers.insert(id.to_string(), tracker);
        drop(trackers);

        debug!("Tracking peer {id} with capacity {capacity:.3}. ");

        Ok(())
    }

    pub fn untrack(&self, id: &str) -> Result<()> {
        match self.trackers.write().remove(id) {
            Some(_) => {
                debug!("Stopped tracking peer {id}. ");
                Ok(())
            },
            None => Err(Error::NotTracking(id.to_string())),
        }
    }

    // an untracked peer (disconnect race) gets 1, never 0
    pub fn capacity(&self, id: &str, target_rtt: Duration) -> usize {
        match self.get(id) {
            Some(tracker) => tracker.capacity(target_rtt),
            None => {
                trace!("Capacity asked for untracked peer {id}. ");
                1
            },
        }
    }

    pub fn update(&self, id: &str, elapsed: Duration, items: usize) {
        if let Some(tracker) = self.get(id) {
            tracker.update(elapsed, items);
        }
    }

    pub fn mean_capacity(&self) -> Option<f64> {
        let trackers: Vec<_> = self.trackers.read().values().cloned().collect();
        if trackers.is_empty() {
            return None;
        }

        let sum: f64 = trackers.iter().map(|t| t.capacity_value()).sum();
        Some(sum / trackers.len() as f64)
    }

    pub fn is_tracking(&self, id: &str) -> bool {
        self.trackers.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.trackers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.read().is_empty()
    }

    fn get(&self, id: &str) -> Option<Arc<Tracker>> {
        self.trackers.read().get(id).cloned()
    }
}
