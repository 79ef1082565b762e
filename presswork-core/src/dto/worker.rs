//! Worker DTOs
//!
//! Data transfer objects for worker liveness reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Periodic liveness signal from a worker to the queue service
///
/// Purely observational: the dashboard uses it to display worker
/// availability. It carries no control-plane meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Unique identifier of the worker instance
    pub worker_id: String,

    /// Worker build version
    pub version: String,

    /// Operating system the worker runs on
    pub os: String,

    /// True while a job is in flight on this worker
    pub busy: bool,

    /// When the signal was emitted
    pub timestamp: DateTime<Utc>,
}
