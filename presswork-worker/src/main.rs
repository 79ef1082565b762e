//! Presswork Worker
//!
//! A polling worker that claims print production jobs from the queue
//! service and drives the headless document engine through a file-based
//! protocol.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Queue seam: trait-based access to the remote queue service
//! - Scheduler: single-in-flight polling and job lifecycle
//! - Execution: payload building, engine launch, bounded wait, cleanup
//!
//! The worker claims at most one job per polling cycle, writes its payload
//! into the spool, launches the document engine detached, and polls for
//! the result or error file until a timeout elapses.

mod config;
mod execution;
mod ipc;
mod launcher;
mod output;
mod queue;
mod scheduler;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::queue::{QueueApi, make_heartbeat};
use crate::scheduler::JobPoller;
use presswork_client::QueueClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "presswork_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Presswork Worker");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: worker_id={}, queue_url={}",
        config.worker_id, config.queue_url
    );
    info!(
        "Template root: {}, output root: {}, spool: {}",
        config.template_root.display(),
        config.output_root.display(),
        config.spool_dir.display()
    );

    // Initialize queue client
    let queue: Arc<dyn QueueApi> = Arc::new(QueueClient::new(config.queue_url.clone()));
    info!("Queue client initialized");

    // Announce this worker (with retry logic)
    info!("Announcing worker to queue service");
    announce_with_retry(&queue, &config.worker_id).await?;
    info!("Worker announced successfully");

    // Create job poller
    let poller = JobPoller::new(config.clone(), queue);

    info!(
        "Worker initialized. Poll interval: {:?}, result poll interval: {:?}, job timeout: {:?}",
        config.poll_interval, config.result_poll_interval, config.job_timeout
    );

    // Start polling loop
    info!("Starting job polling loop");
    if let Err(e) = poller.run().await {
        error!("Poller error: {}", e);
        return Err(e);
    }

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(_) => {
            info!("Failed to load config from environment, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Sends the first liveness signal with retry and exponential backoff
///
/// This handles the case where the queue service may not be ready yet when
/// the worker starts (common in container environments).
async fn announce_with_retry(queue: &Arc<dyn QueueApi>, worker_id: &str) -> Result<()> {
    const MAX_RETRIES: u32 = 10;
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match queue.send_heartbeat(&make_heartbeat(worker_id, false)).await {
            Ok(_) => {
                if attempt > 1 {
                    info!(
                        "Successfully announced to queue service after {} attempt(s)",
                        attempt
                    );
                }
                return Ok(());
            }
            Err(e) => {
                if attempt >= MAX_RETRIES {
                    error!(
                        "Failed to announce to queue service after {} attempts",
                        MAX_RETRIES
                    );
                    return Err(anyhow::anyhow!(
                        "Failed to announce worker to queue service: {}",
                        e
                    ));
                }

                warn!(
                    "Failed to announce to queue service (attempt {}/{}): {}",
                    attempt, MAX_RETRIES, e
                );
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}
