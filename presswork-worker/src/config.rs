//! Worker configuration
//!
//! Defines all configurable parameters for the worker including polling
//! intervals, the document engine command, and filesystem roots for
//! templates, output and the IPC spool.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration
///
/// All timeouts and intervals are configurable to allow tuning for
/// different deployment scenarios (fast local engine vs. slow shared host).
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this worker instance
    pub worker_id: String,

    /// Queue service base URL (e.g., "http://localhost:8080")
    pub queue_url: String,

    /// Local root directory design templates are resolved against
    pub template_root: PathBuf,

    /// Root directory exported artifacts land in, organized by date
    pub output_root: PathBuf,

    /// Directory for payload/result/error spool files shared with the
    /// document engine
    pub spool_dir: PathBuf,

    /// Command the generated launcher invokes to start the document engine
    pub engine_command: String,

    /// How often to poll the queue service for new jobs
    pub poll_interval: Duration,

    /// How often to check for a result or error file while a job is in flight
    pub result_poll_interval: Duration,

    /// Maximum time to wait for the document engine before reporting an error
    pub job_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(worker_id: String, queue_url: String) -> Self {
        Self {
            worker_id,
            queue_url,
            template_root: PathBuf::from("./templates"),
            output_root: PathBuf::from("./output"),
            spool_dir: std::env::temp_dir().join("presswork"),
            engine_command: "presswork-engine".to_string(),
            poll_interval: Duration::from_secs(5),
            result_poll_interval: Duration::from_secs(1),
            job_timeout: Duration::from_secs(120),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - WORKER_ID (required)
    /// - QUEUE_URL (required)
    /// - TEMPLATE_ROOT (optional, default: ./templates)
    /// - OUTPUT_ROOT (optional, default: ./output)
    /// - SPOOL_DIR (optional, default: <tmp>/presswork)
    /// - ENGINE_COMMAND (optional, default: presswork-engine)
    /// - POLL_INTERVAL_SECS (optional, default: 5)
    /// - RESULT_POLL_INTERVAL_SECS (optional, default: 1)
    /// - JOB_TIMEOUT_SECS (optional, default: 120)
    pub fn from_env() -> anyhow::Result<Self> {
        let worker_id = std::env::var("WORKER_ID")
            .map_err(|_| anyhow::anyhow!("WORKER_ID environment variable not set"))?;

        let queue_url = std::env::var("QUEUE_URL")
            .map_err(|_| anyhow::anyhow!("QUEUE_URL environment variable not set"))?;

        let mut config = Self::new(worker_id, queue_url);

        if let Ok(root) = std::env::var("TEMPLATE_ROOT") {
            config.template_root = PathBuf::from(root);
        }
        if let Ok(root) = std::env::var("OUTPUT_ROOT") {
            config.output_root = PathBuf::from(root);
        }
        if let Ok(dir) = std::env::var("SPOOL_DIR") {
            config.spool_dir = PathBuf::from(dir);
        }
        if let Ok(cmd) = std::env::var("ENGINE_COMMAND") {
            config.engine_command = cmd;
        }
        if let Some(secs) = read_secs("POLL_INTERVAL_SECS") {
            config.poll_interval = secs;
        }
        if let Some(secs) = read_secs("RESULT_POLL_INTERVAL_SECS") {
            config.result_poll_interval = secs;
        }
        if let Some(secs) = read_secs("JOB_TIMEOUT_SECS") {
            config.job_timeout = secs;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_id.is_empty() {
            anyhow::bail!("worker_id cannot be empty");
        }

        if self.queue_url.is_empty() {
            anyhow::bail!("queue_url cannot be empty");
        }

        if !self.queue_url.starts_with("http://") && !self.queue_url.starts_with("https://") {
            anyhow::bail!("queue_url must start with http:// or https://");
        }

        if self.engine_command.is_empty() {
            anyhow::bail!("engine_command cannot be empty");
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.result_poll_interval.is_zero() {
            anyhow::bail!("result_poll_interval must be greater than 0");
        }

        if self.job_timeout.is_zero() {
            anyhow::bail!("job_timeout must be greater than 0");
        }

        Ok(())
    }
}

fn read_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            "http://localhost:8080".to_string(),
        )
    }
}
