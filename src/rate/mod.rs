mod tracker;
mod trackers;

pub use tracker::{Tracker, MAX_MESSAGE_SIZE};
pub use trackers::Trackers;
