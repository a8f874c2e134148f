use std::path::Path;
use tracing::debug;

use super::config::BlackboxConfig;

/// Facts about the running system, gathered once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    /// Value of the session desktop variable, e.g. "gnome"
    pub desktop: Option<String>,
    /// First line of the DMI chassis type file
    pub chassis_type: Option<String>,
    /// Set when this process was started as part of a self-update
    pub selfupdate: bool,
}

impl HostContext {
    pub fn detect(config: &BlackboxConfig) -> Self {
        let desktop = std::env::var(&config.environment.session_desktop_var).ok();
        let selfupdate = std::env::var_os(&config.environment.selfupdate_marker).is_some();
        let chassis_type = read_first_line(&config.selection.chassis_path);

        let host = Self {
            desktop,
            chassis_type,
            selfupdate,
        };
        debug!("Detected host: {:?}", host);
        host
    }

    pub fn is_desktop_chassis(&self, desktop_types: &[String]) -> bool {
        self.chassis_type
            .as_ref()
            .is_some_and(|t| desktop_types.iter().any(|d| d == t))
    }

    pub fn desktop_is(&self, name: &str) -> bool {
        self.desktop.as_deref() == Some(name)
    }
}

fn read_first_line(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    content.lines().next().map(|line| line.trim().to_string())
}
