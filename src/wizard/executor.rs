use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::{Result, WizardError};

/// Issue a HEAD request and fail on transport errors or error statuses
pub async fn head_request(client: reqwest::Client, url: String) -> Result<()> {
    debug!("HEAD {}", url);
    let response = client.head(&url).send().await?;
    response.error_for_status()?;
    Ok(())
}

/// Run `command` through the privileged terminal launcher and return its exit code.
///
/// A process killed by a signal has no exit code and is reported as -1.
pub async fn launch_in_terminal(launcher: String, command: String) -> Result<i32> {
    info!("Launching {} with: {}", launcher, command);

    let status = Command::new(&launcher)
        .arg(&command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| WizardError::Command(format!("failed to start {launcher}: {e}")))?;

    let code = status.code().unwrap_or(-1);
    if status.success() {
        info!("{} finished successfully", launcher);
    } else {
        warn!("{} exited with status {:?}", launcher, status.code());
    }
    Ok(code)
}

/// Remove the files a successful external script would have removed
pub fn consume_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}
