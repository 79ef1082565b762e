//! Host process launcher
//!
//! Generates the minimal launcher script whose only contract is "invoke the
//! document engine with the payload file's absolute path as its sole
//! argument", and starts it as a detached host process. The worker never
//! controls the engine process beyond this launch; completion is observed
//! through the spool files only.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

/// Renders the launcher script body
pub fn render_script(engine_command: &str, payload_path: &Path) -> String {
    format!(
        "#!/bin/sh\nexec \"{}\" \"{}\"\n",
        engine_command,
        payload_path.display()
    )
}

/// Writes the launcher script for a job
pub fn write_launcher(path: &Path, engine_command: &str, payload_path: &Path) -> Result<()> {
    let script = render_script(engine_command, payload_path);
    std::fs::write(path, script)
        .with_context(|| format!("Failed to write launcher script {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to mark {} executable", path.display()))?;
    }

    Ok(())
}

/// Starts the launcher as a detached process
///
/// The child is not waited on and not killed on timeout; host process
/// control is outside this component's contract.
pub fn spawn_detached(script_path: &Path) -> Result<()> {
    let child = Command::new("sh")
        .arg(script_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to launch {}", script_path.display()))?;

    info!(
        "Launched document engine (pid {}) via {}",
        child.id(),
        script_path.display()
    );
    Ok(())
}
