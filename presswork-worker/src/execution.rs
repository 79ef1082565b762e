//! Per-job dispatch
//!
//! Takes a claimed job through the full production cycle: build the
//! absolute-path payload, hand it to the document engine through the spool,
//! wait for the outcome, report the terminal status, and clean the spool on
//! every exit path. Failures in the engine or in validation terminate the
//! job, never the polling loop.

use anyhow::{Context, Result, bail};
use presswork_core::domain::job::{Job, JobKind, JobResult, JobStatus};
use presswork_core::dto::ipc::{JobPayload, PayloadItem};
use presswork_core::dto::job::{LoadLayersRequest, MergeSheetRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::ipc::{JobChannel, Outcome};
use crate::launcher;
use crate::output;
use crate::queue::QueueApi;

/// Runs one claimed job to its terminal state and reports it
///
/// A failed status report is logged and swallowed; the next tick proceeds
/// normally (availability of the polling cycle over strict consistency of
/// one job's terminal state).
pub async fn run_job(job: Job, config: Config, queue: Arc<dyn QueueApi>) {
    info!("Processing job {} ({:?})", job.id, job.kind);

    let result = process(&job, &config).await;

    let status = if result.error_message.is_none() {
        JobStatus::Done
    } else {
        JobStatus::Error
    };

    info!("Job {} finished with status {}", job.id, status);

    if let Err(e) = queue.update_status(job.id, status, Some(result)).await {
        error!("Failed to report terminal status for job {}: {:#}", job.id, e);
    }
}

/// Produces the terminal result for a job, with guaranteed spool cleanup
async fn process(job: &Job, config: &Config) -> JobResult {
    let payload = match build_payload(job, config) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Job {} rejected during validation: {:#}", job.id, e);
            return JobResult::failed(format!("{e:#}"));
        }
    };

    let channel = JobChannel::new(&config.spool_dir, job.id);
    let result = dispatch(&channel, &payload, config).await;

    // Cleanup runs on every exit path: success, engine error, or timeout.
    channel.cleanup();

    result
}

/// Writes the spool files, launches the engine, and awaits the outcome
async fn dispatch(channel: &JobChannel, payload: &JobPayload, config: &Config) -> JobResult {
    let payload_path = match channel.write_payload(payload) {
        Ok(path) => path,
        Err(e) => return JobResult::failed(format!("{e:#}")),
    };

    let launcher_path = channel.launcher_path();
    if let Err(e) = launcher::write_launcher(&launcher_path, &config.engine_command, &payload_path)
        .and_then(|_| launcher::spawn_detached(&launcher_path))
    {
        return JobResult::failed(format!("{e:#}"));
    }

    let output_dir = payload.output_dir.display().to_string();

    match channel
        .await_outcome(config.result_poll_interval, config.job_timeout)
        .await
    {
        Ok(Outcome::Completed(result)) => {
            let artifacts = result
                .artifacts
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            JobResult::done(artifacts, output_dir)
        }
        Ok(Outcome::Failed(error)) => JobResult::failed(error.message),
        Ok(Outcome::TimedOut) => JobResult::failed(format!(
            "document engine timed out after {}s (no result or error file)",
            config.job_timeout.as_secs()
        )),
        Err(e) => JobResult::failed(format!("{e:#}")),
    }
}

/// Builds the absolute-path payload for the document engine
///
/// Every template key must resolve to an existing file under the template
/// root; a missing template fails validation before anything is launched.
fn build_payload(job: &Job, config: &Config) -> Result<JobPayload> {
    let (items, crm_id) = match job.kind {
        JobKind::MergeSheet => {
            let request: MergeSheetRequest = serde_json::from_value(job.payload.clone())
                .context("Malformed MERGE_SHEET payload")?;

            if request.items.is_empty() {
                bail!("MERGE_SHEET job carries no production items");
            }

            let crm_id = request.items[0].crm_id.clone();
            let mut items = Vec::with_capacity(request.items.len());
            for item in &request.items {
                item.validate().map_err(|e| anyhow::anyhow!(e))?;
                items.push(PayloadItem {
                    order_id: item.order_id.clone(),
                    template_path: resolve_template(&config.template_root, &item.template_key)?,
                    fields: item.fields.clone(),
                    export: item.export.clone(),
                    quantity: item.quantity,
                });
            }
            (items, crm_id)
        }
        JobKind::LoadLayers => {
            let request: LoadLayersRequest = serde_json::from_value(job.payload.clone())
                .context("Malformed LOAD_LAYERS payload")?;

            let items = vec![PayloadItem {
                order_id: request.template_key.clone(),
                template_path: resolve_template(&config.template_root, &request.template_key)?,
                fields: Default::default(),
                export: Default::default(),
                quantity: 1,
            }];
            (items, None)
        }
    };

    let first = &items[0];

    let output_dir = output::resolve_output_dir(
        &config.output_root,
        chrono::Local::now().date_naive(),
        &first.order_id,
        crm_id.as_deref(),
        job.id,
    )?;

    Ok(JobPayload {
        job_id: job.id,
        kind: job.kind,
        output_dir,
        items,
    })
}

/// Resolves a template key to an absolute path under the template root
fn resolve_template(template_root: &Path, template_key: &str) -> Result<PathBuf> {
    let path = template_root.join(format!("{template_key}.json"));
    if !path.is_file() {
        bail!(
            "template '{}' not found under {}",
            template_key,
            template_root.display()
        );
    }

    Ok(std::path::absolute(&path)
        .with_context(|| format!("Failed to absolutize {}", path.display()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use presswork_core::domain::item::{ExportConfig, ProductionItem};
    use std::collections::HashMap;
    use std::time::Duration;
    use uuid::Uuid;

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::new(
            "test-worker".to_string(),
            "http://localhost:8080".to_string(),
        );
        config.template_root = dir.join("templates");
        config.output_root = dir.join("output");
        config.spool_dir = dir.join("spool");
        config.result_poll_interval = Duration::from_millis(5);
        config.job_timeout = Duration::from_millis(50);
        config
    }

    fn merge_job(items: Vec<ProductionItem>) -> Job {
        Job {
            id: Uuid::new_v4(),
            kind: JobKind::MergeSheet,
            status: JobStatus::Processing,
            payload: serde_json::to_value(MergeSheetRequest { items }).unwrap(),
            result: None,
            requested_at: chrono::Utc::now(),
            started_at: Some(chrono::Utc::now()),
            completed_at: None,
            worker_id: Some("test-worker".to_string()),
        }
    }

    fn item(template_key: &str) -> ProductionItem {
        ProductionItem {
            order_id: "ORD-1".to_string(),
            crm_id: None,
            template_key: template_key.to_string(),
            fields: HashMap::new(),
            export: ExportConfig::default(),
            quantity: 1,
        }
    }

    #[test]
    fn test_missing_template_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.template_root).unwrap();

        let err = build_payload(&merge_job(vec![item("does-not-exist")]), &config).unwrap_err();
        assert!(format!("{err:#}").contains("does-not-exist"));
    }

    #[test]
    fn test_payload_resolves_absolute_template_paths() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.template_root).unwrap();
        std::fs::write(config.template_root.join("card.json"), "{}").unwrap();

        let payload = build_payload(&merge_job(vec![item("card")]), &config).unwrap();
        assert_eq!(payload.items.len(), 1);
        assert!(payload.items[0].template_path.is_absolute());
        assert!(payload.output_dir.is_absolute());
        assert!(payload.output_dir.is_dir());
    }

    #[test]
    fn test_empty_merge_sheet_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let err = build_payload(&merge_job(vec![]), &config).unwrap_err();
        assert!(format!("{err:#}").contains("no production items"));
    }

    #[tokio::test]
    async fn test_timeout_reports_error_and_cleans_spool() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(&config.template_root).unwrap();
        std::fs::write(config.template_root.join("card.json"), "{}").unwrap();

        // "true" exits immediately without writing any spool file, so the
        // bounded wait must elapse.
        let mut config = config;
        config.engine_command = "true".to_string();

        let job = merge_job(vec![item("card")]);
        let job_id = job.id;
        let result = process(&job, &config).await;

        let message = result.error_message.expect("timeout must be an error");
        assert!(message.contains("timed out"));

        let channel = JobChannel::new(&config.spool_dir, job_id);
        assert!(!channel.payload_path().exists());
        assert!(!channel.launcher_path().exists());
        assert!(!channel.result_path().exists());
        assert!(!channel.error_path().exists());
    }

    #[tokio::test]
    async fn test_engine_result_file_completes_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.job_timeout = Duration::from_secs(5);
        std::fs::create_dir_all(&config.template_root).unwrap();
        std::fs::write(config.template_root.join("card.json"), "{}").unwrap();

        let job = merge_job(vec![item("card")]);
        let channel = JobChannel::new(&config.spool_dir, job.id);

        // Stand in for the engine: pre-write the result file. "true" as the
        // engine command makes the launch itself a no-op.
        std::fs::create_dir_all(&config.spool_dir).unwrap();
        let result_file =
            presswork_core::dto::ipc::ResultFile::new(vec![PathBuf::from("/out/a.pdf")]);
        std::fs::write(
            channel.result_path(),
            serde_json::to_string(&result_file).unwrap(),
        )
        .unwrap();
        config.engine_command = "true".to_string();

        let result = process(&job, &config).await;
        assert!(result.error_message.is_none());
        assert_eq!(result.artifacts, vec!["/out/a.pdf".to_string()]);
        assert!(!channel.result_path().exists());
    }
}
