//! Aggregated views over the herd records.

mod dashboard;

pub use dashboard::*;
