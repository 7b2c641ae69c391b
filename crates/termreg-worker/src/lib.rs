//! # termreg-worker
//!
//! Background worker that drains the export task queue for the termreg
//! registry. Coordination with other writers goes through per-version
//! processing leases in the document store, not through in-process state.

#![warn(missing_docs)]

pub mod config;
pub mod queue;

pub use config::WorkerConfig;
pub use queue::{run_worker, Task, TaskQueue};
