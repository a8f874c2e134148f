use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::error::{Result, WizardError};
use super::service::SystemService;

/// One reachability check raced against `timeout`.
///
/// When the timer wins the in-flight request is dropped, which aborts it.
pub async fn probe_once(service: &dyn SystemService, url: &str, timeout: Duration) -> Result<()> {
    let request = service.check_reachable(url);
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(WizardError::Timeout(timeout)),
    }
}

/// Probe `url` until it answers, at most one attempt per `timeout` window.
///
/// A request that fails early waits out the rest of its window before the
/// next attempt. There is no retry limit: nothing after this step works
/// offline. Returns the number of attempts it took.
pub async fn wait_until_reachable(
    service: Arc<dyn SystemService>,
    url: String,
    timeout: Duration,
) -> u32 {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        debug!("Connectivity check #{} against {}", attempt, url);
        let window_end = Instant::now() + timeout;

        match probe_once(service.as_ref(), &url, timeout).await {
            Ok(()) => {
                info!("Network reachable after {} attempt(s)", attempt);
                return attempt;
            }
            Err(e) => warn!("Connectivity check #{} failed: {}", attempt, e),
        }

        tokio::time::sleep_until(window_end).await;
    }
}
