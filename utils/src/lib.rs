//! Shared formatting helpers.

pub mod progress;
pub mod time;

pub use progress::percentage;
pub use time::{format_ago, format_duration};
