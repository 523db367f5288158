//! Presence node firmware library.
//!
//! A battery-powered occupancy sensor: wake, range for a few seconds, vote on
//! presence, report only when the answer changed, then deep sleep for a
//! period that depends on the answer.
//!
//! The cycle logic is plain `std` Rust and is unit tested on the host. The
//! ESP-IDF bindings (`drivers`, `net`, `power`) only build for
//! `target_os = "espidf"`.

pub mod classifier;
pub mod config;
pub mod cycle;
pub mod error;
pub mod events;
pub mod power_budget;
pub mod report;
pub mod sampler;
pub mod scheduler;
pub mod state;

#[cfg(target_os = "espidf")]
pub mod drivers;
#[cfg(target_os = "espidf")]
pub mod net;
#[cfg(target_os = "espidf")]
pub mod power;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use cycle::{CycleController, CycleSummary};
pub use events::{PresenceVerdict, Sample};
