//! Output directory resolution
//!
//! Artifacts for a job land under `<output_root>/<YYYY-MM-DD>/<folder>`.
//! Operators often pre-create order folders by hand, so an existing folder
//! whose name contains the order id or the secondary CRM id is reused
//! (substring match); otherwise a folder name is synthesized from the order
//! id and a job id prefix.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Resolves (and creates, if needed) the output directory for a job
pub fn resolve_output_dir(
    output_root: &Path,
    date: NaiveDate,
    order_id: &str,
    crm_id: Option<&str>,
    job_id: Uuid,
) -> Result<PathBuf> {
    let day_dir = output_root.join(date.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&day_dir)
        .with_context(|| format!("Failed to create output directory {}", day_dir.display()))?;

    // The payload contract promises absolute paths; a relative output
    // root would otherwise leak into the engine's payload.
    let day_dir = std::path::absolute(&day_dir)
        .with_context(|| format!("Failed to absolutize {}", day_dir.display()))?;

    if let Some(existing) = find_matching_folder(&day_dir, order_id, crm_id)? {
        debug!(
            "Reusing existing output folder {} for order {}",
            existing.display(),
            order_id
        );
        return Ok(existing);
    }

    let job_prefix = &job_id.to_string()[..8];
    let synthesized = day_dir.join(format!("{order_id}-{job_prefix}"));
    std::fs::create_dir_all(&synthesized).with_context(|| {
        format!("Failed to create output directory {}", synthesized.display())
    })?;

    Ok(synthesized)
}

/// Finds the first existing folder whose name contains the order id or the
/// CRM id
fn find_matching_folder(
    day_dir: &Path,
    order_id: &str,
    crm_id: Option<&str>,
) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(day_dir)
        .with_context(|| format!("Failed to list {}", day_dir.display()))?;

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.contains(order_id) {
            return Ok(Some(entry.path()));
        }
        if let Some(crm) = crm_id
            && name.contains(crm)
        {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}
