use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempPath;
use tracing::{error, info, warn};

use super::error::Result;
use super::plan::InstallationPlan;
use super::service::{SystemService, TerminalJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Failed,
}

/// The three files handed to the apply script. Each is removed when dropped.
pub struct PlanFiles {
    pub prepare: TempPath,
    pub packages: TempPath,
    pub setup: TempPath,
}

impl PlanFiles {
    pub fn write(plan: &InstallationPlan) -> Result<Self> {
        Ok(Self {
            prepare: write_transient("blackbox-prepare-", &plan.prepare_script())?,
            packages: write_transient("blackbox-packages-", &plan.package_list())?,
            setup: write_transient("blackbox-setup-", &plan.setup_script())?,
        })
    }

    /// Command line running `script` with the three paths as arguments
    pub fn command(&self, script: &str) -> String {
        format!(
            "{} {} {} {}",
            script,
            quote(&self.prepare),
            quote(&self.packages),
            quote(&self.setup)
        )
    }
}

fn quote(path: &Path) -> String {
    shell_escape::escape(path.to_string_lossy()).into_owned()
}

fn write_transient(prefix: &str, content: &str) -> Result<TempPath> {
    let mut file = tempfile::Builder::new().prefix(prefix).tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

/// Persist `plan` and run the apply script in a privileged terminal.
///
/// The script deletes the packages file once everything is installed, so
/// success means exit code 0 and that file being gone.
pub async fn run_apply(
    service: Arc<dyn SystemService>,
    apply_script: String,
    plan: InstallationPlan,
) -> ApplyOutcome {
    let files = match PlanFiles::write(&plan) {
        Ok(files) => files,
        Err(e) => {
            error!("Failed to write installation plan: {}", e);
            return ApplyOutcome::Failed;
        }
    };

    info!(
        "Applying {} package(s), {} prepare and {} setup command(s)",
        plan.packages.len(),
        plan.prepare_commands.len(),
        plan.setup_commands.len()
    );

    let job = TerminalJob {
        command: files.command(&apply_script),
        consumes: vec![files.packages.to_path_buf()],
    };

    let outcome = match service.run_in_terminal(job).await {
        Ok(0) if !files.packages.exists() => ApplyOutcome::Applied,
        Ok(code) => {
            warn!(
                "Apply exited with {} (package list present: {})",
                code,
                files.packages.exists()
            );
            ApplyOutcome::Failed
        }
        Err(e) => {
            warn!("Apply could not run: {}", e);
            ApplyOutcome::Failed
        }
    };

    info!("Apply finished: {:?}", outcome);
    drop(files);
    outcome
}
