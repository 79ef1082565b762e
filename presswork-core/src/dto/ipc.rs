//! File-based worker/engine protocol
//!
//! The worker and the document engine communicate exclusively through the
//! filesystem: the worker writes a payload file and polls for a result or
//! error file; the engine writes exactly one of the two and terminates.
//! All spool file names are keyed by job id so distinct jobs never collide,
//! even if a previous cleanup failed. Both sides derive paths from the
//! helpers here so they can never disagree on naming.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::item::ExportConfig;
use crate::domain::job::JobKind;

/// Job specification handed to the document engine
///
/// Every template path is absolute (resolved by the worker against its
/// configured template root) so the engine needs no path configuration of
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPayload {
    pub job_id: Uuid,
    pub kind: JobKind,
    /// Absolute directory all artifacts are exported into
    pub output_dir: PathBuf,
    /// Ordered production items; order is preserved through rendering
    /// because press sheets must match the later manual cutting order
    pub items: Vec<PayloadItem>,
}

/// One production item, fully resolved for the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadItem {
    pub order_id: String,
    /// Absolute path of the design template document
    pub template_path: PathBuf,
    #[serde(default)]
    pub fields: HashMap<String, String>,
    #[serde(default)]
    pub export: ExportConfig,
    pub quantity: u32,
}

/// Status marker carried by result and error files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpcStatus {
    Done,
    Error,
}

/// Success outcome written by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultFile {
    pub status: IpcStatus,
    pub artifacts: Vec<PathBuf>,
}

impl ResultFile {
    pub fn new(artifacts: Vec<PathBuf>) -> Self {
        Self {
            status: IpcStatus::Done,
            artifacts,
        }
    }
}

/// Failure outcome written by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorFile {
    pub status: IpcStatus,
    pub message: String,
}

impl ErrorFile {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: IpcStatus::Error,
            message: message.into(),
        }
    }
}

/// Path of the payload file for a job inside the spool directory
pub fn payload_path(spool_dir: &Path, job_id: Uuid) -> PathBuf {
    spool_dir.join(format!("payload-{job_id}.json"))
}

/// Path of the result file for a job inside the spool directory
pub fn result_path(spool_dir: &Path, job_id: Uuid) -> PathBuf {
    spool_dir.join(format!("result-{job_id}.json"))
}

/// Path of the error file for a job inside the spool directory
pub fn error_path(spool_dir: &Path, job_id: Uuid) -> PathBuf {
    spool_dir.join(format!("error-{job_id}.json"))
}

/// Path of the generated launcher script for a job
pub fn launcher_path(spool_dir: &Path, job_id: Uuid) -> PathBuf {
    spool_dir.join(format!("launch-{job_id}.sh"))
}

/// Recovers the job id embedded in a payload file name
///
/// Lets the engine answer with an error file even when the payload body
/// itself cannot be read or parsed.
pub fn job_id_from_payload_path(path: &Path) -> Option<Uuid> {
    let name = path.file_name()?.to_str()?;
    let id = name.strip_prefix("payload-")?.strip_suffix(".json")?;
    Uuid::parse_str(id).ok()
}
