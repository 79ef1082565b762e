//! Scheduler layer for the worker
//!
//! This layer handles polling the queue service for new jobs and
//! coordinating job dispatch. It guarantees at most one job is ever in
//! flight per worker instance.

pub mod poller;

pub use poller::{JobPoller, WorkerState};
