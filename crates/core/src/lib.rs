//! Domain core for adaptive arithmetic drills: problem generation, progress
//! tracking, recommendations, and reporting.
//!
//! Everything here is synchronous and free of I/O; persistence and
//! orchestration live in the `storage` and `services` crates.

#![forbid(unsafe_code)]

pub mod analysis;
pub mod assessment;
pub mod error;
pub mod generator;
pub mod model;
pub mod progress;
pub mod recommend;
pub mod report;
pub mod time;

pub use error::Error;
pub use time::Clock;
