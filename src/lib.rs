//! Discrete-event simulation of an M/M/c queue.
//!
//! Poisson arrivals compete for `c` servers with exponential service times.
//! A run produces a time-ordered event log plus summary statistics, and can
//! report progress snapshots to a [`progress::ProgressSink`] while it runs.
//!
//! ```no_run
//! use mmc_sim::engine::run_to_completion;
//! use mmc_sim::models::SimulationParams;
//!
//! let params = SimulationParams::new(5.0, 6.0, 3, 60.0);
//! let results = run_to_completion(&params, 42)?;
//! println!("utilization: {:.2}", results.server_utilization);
//! # Ok::<(), mmc_sim::error::Error>(())
//! ```

pub mod arrivals;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod output;
pub mod progress;
pub mod random;
pub mod state;
pub mod stats;
