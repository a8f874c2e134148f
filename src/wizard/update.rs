use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::service::{SystemService, TerminalJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Succeeded,
    Failed,
}

/// Shell pipeline run in the terminal: upgrade, drop the sentinel on
/// success, then wait for the user.
pub fn update_pipeline(update_command: &str, sentinel: &Path) -> String {
    format!(
        "{} 2>&1 && rm {}; read -p 'Press Enter to Exit'",
        update_command,
        shell_escape::escape(sentinel.to_string_lossy())
    )
}

/// Run the system update in a privileged terminal.
///
/// It succeeded only if the command exited with 0 and the sentinel file is
/// gone afterwards.
pub async fn run_update(service: Arc<dyn SystemService>, update_command: String) -> UpdateOutcome {
    let sentinel = match tempfile::Builder::new()
        .prefix("blackbox-update-")
        .tempfile()
    {
        Ok(file) => file.into_temp_path(),
        Err(e) => {
            error!("Failed to create update sentinel: {}", e);
            return UpdateOutcome::Failed;
        }
    };

    let job = TerminalJob {
        command: update_pipeline(&update_command, &sentinel),
        consumes: vec![sentinel.to_path_buf()],
    };

    let outcome = match service.run_in_terminal(job).await {
        Ok(0) if !sentinel.exists() => UpdateOutcome::Succeeded,
        Ok(code) => {
            warn!("Update exited with {} (sentinel present: {})", code, sentinel.exists());
            UpdateOutcome::Failed
        }
        Err(e) => {
            warn!("Update could not run: {}", e);
            UpdateOutcome::Failed
        }
    };

    info!("Update finished: {:?}", outcome);
    // Dropping the path removes the sentinel if the command left it behind
    drop(sentinel);
    outcome
}
