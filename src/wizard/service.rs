use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::info;

use super::config::BlackboxConfig;
use super::error::Result;
use super::executor;

/// A command for the privileged terminal wrapper.
///
/// `consumes` lists the files the command deletes when it succeeds; they are
/// the side channel the caller inspects after the exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalJob {
    pub command: String,
    pub consumes: Vec<PathBuf>,
}

/// Trait abstracting the network and process side of the wizard
pub trait SystemService: Send + Sync {
    /// Resolve once `url` answers a HEAD request. Never times out by itself.
    fn check_reachable(&self, url: &str) -> BoxFuture<'static, Result<()>>;

    /// Run a job in a visible privileged terminal and return its exit code
    fn run_in_terminal(&self, job: TerminalJob) -> BoxFuture<'static, Result<i32>>;
}

/// Live service that talks to the network and launches real commands
pub struct LiveService {
    client: reqwest::Client,
    launcher: String,
}

impl LiveService {
    pub fn new(launcher: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("snigdhaos-blackbox/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            launcher: launcher.into(),
        })
    }
}

impl SystemService for LiveService {
    fn check_reachable(&self, url: &str) -> BoxFuture<'static, Result<()>> {
        executor::head_request(self.client.clone(), url.to_string()).boxed()
    }

    fn run_in_terminal(&self, job: TerminalJob) -> BoxFuture<'static, Result<i32>> {
        executor::launch_in_terminal(self.launcher.clone(), job.command).boxed()
    }
}

/// Dryrun service that simulates a reachable network and successful commands
pub struct DryrunService;

impl SystemService for DryrunService {
    fn check_reachable(&self, url: &str) -> BoxFuture<'static, Result<()>> {
        info!("Dryrun: treating {} as reachable", url);
        future::ready(Ok(())).boxed()
    }

    fn run_in_terminal(&self, job: TerminalJob) -> BoxFuture<'static, Result<i32>> {
        info!("Dryrun: would run in terminal: {}", job.command);
        executor::consume_files(&job.consumes);
        future::ready(Ok(0)).boxed()
    }
}

/// Create the appropriate service based on dryrun mode
pub fn create_service(config: &BlackboxConfig) -> Result<Arc<dyn SystemService>> {
    if config.general.dryrun {
        Ok(Arc::new(DryrunService))
    } else {
        Ok(Arc::new(LiveService::new(config.commands.launch_terminal.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dryrun_consumes_marker_files() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("packages");
        std::fs::write(&marker, "docker").unwrap();

        let code = DryrunService
            .run_in_terminal(TerminalJob {
                command: "true".to_string(),
                consumes: vec![marker.clone()],
            })
            .await
            .unwrap();

        assert_eq!(code, 0);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn dryrun_network_is_reachable() {
        assert!(DryrunService.check_reachable("https://example.invalid/").await.is_ok());
    }
}
