use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "/etc/snigdhaos/blackbox.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlackboxConfig {
    pub general: GeneralConfig,
    pub connectivity: ConnectivityConfig,
    pub commands: CommandsConfig,
    pub environment: EnvironmentConfig,
    pub selection: SelectionConfig,
    pub policy: PolicyConfig,
}

impl BlackboxConfig {
    pub fn load() -> Result<Self, super::error::WizardError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, super::error::WizardError> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: BlackboxConfig = toml::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub title: String,
    /// Dry run mode - no privileged commands are launched and the network
    /// probe always succeeds
    pub dryrun: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            title: "Snigdha OS Blackbox".to_string(),
            dryrun: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// URL that receives the HEAD request
    pub url: String,
    pub timeout_secs: u64,
}

impl ConnectivityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            url: "https://snigdha-os.github.io/".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Helper that opens a visible terminal and runs its argument as root
    pub launch_terminal: String,
    pub update_command: String,
    /// Receives the prepare, packages and setup file paths, in that order
    pub apply_script: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            launch_terminal: "/usr/lib/snigdhaos/launch-terminal".to_string(),
            update_command: "sudo pacman -Syyu".to_string(),
            apply_script: "/usr/lib/snigdhaos-blackbox/apply.sh".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Presence of this variable skips the connectivity check and update
    pub selfupdate_marker: String,
    pub session_desktop_var: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            selfupdate_marker: "SNIGDHAOS_BLACKBOX_SELFUPDATE".to_string(),
            session_desktop_var: "XDG_SESSION_DESKTOP".to_string(),
        }
    }
}

/// A file of 3-line software group records shown under its own tab
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupSourceConfig {
    pub path: PathBuf,
    pub label: String,
}

/// An item of the built-in tab
#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinItemConfig {
    pub label: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub prepare_commands: Vec<String>,
    #[serde(default)]
    pub setup_commands: Vec<String>,
    /// Only shown when the session desktop matches (e.g. "gnome")
    #[serde(default)]
    pub desktop: Option<String>,
    /// Only shown on desktop form-factor chassis
    #[serde(default)]
    pub desktop_chassis: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub builtin_label: String,
    pub builtin: Vec<BuiltinItemConfig>,
    pub sources: Vec<GroupSourceConfig>,
    pub chassis_path: PathBuf,
    /// DMI chassis type codes that count as a desktop machine
    pub desktop_chassis_types: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            builtin_label: "Recommended".to_string(),
            builtin: vec![
                BuiltinItemConfig {
                    label: "GNOME desktop extras".to_string(),
                    default: false,
                    packages: vec![
                        "gnome-tweaks".to_string(),
                        "gnome-shell-extensions".to_string(),
                    ],
                    prepare_commands: Vec::new(),
                    setup_commands: Vec::new(),
                    desktop: Some("gnome".to_string()),
                    desktop_chassis: false,
                },
                BuiltinItemConfig {
                    label: "Performance tuning".to_string(),
                    default: false,
                    packages: vec!["ananicy-cpp".to_string(), "irqbalance".to_string()],
                    prepare_commands: Vec::new(),
                    setup_commands: vec![
                        "systemctl enable --now ananicy-cpp".to_string(),
                        "systemctl enable --now irqbalance".to_string(),
                    ],
                    desktop: None,
                    desktop_chassis: true,
                },
            ],
            sources: vec![GroupSourceConfig {
                path: PathBuf::from("/usr/lib/snigdhaos-blackbox/eshan.txt"),
                label: "Eshan".to_string(),
            }],
            chassis_path: PathBuf::from("/sys/class/dmi/id/chassis_type"),
            desktop_chassis_types: ["3", "4", "6", "7", "23", "24"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Appends `command` to the setup commands when every package is planned
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceRule {
    pub packages: Vec<String>,
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub services: Vec<ServiceRule>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            services: vec![
                ServiceRule {
                    packages: vec!["docker".to_string()],
                    command: "systemctl enable --now docker.socket".to_string(),
                },
                ServiceRule {
                    packages: vec!["virt-manager-meta".to_string(), "gnome-boxes".to_string()],
                    command: "systemctl enable --now libvirtd".to_string(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BlackboxConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.connectivity.timeout(), Duration::from_secs(5));
        assert_eq!(config.selection.sources.len(), 1);
        assert_eq!(config.policy.services.len(), 2);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blackbox.toml");
        std::fs::write(
            &path,
            r#"
[general]
dryrun = true

[[selection.sources]]
path = "/tmp/groups.txt"
label = "Extra"
"#,
        )
        .unwrap();

        let config = BlackboxConfig::load_from(&path).unwrap();
        assert!(config.general.dryrun);
        assert_eq!(config.general.title, "Snigdha OS Blackbox");
        assert_eq!(
            config.selection.sources,
            vec![GroupSourceConfig {
                path: PathBuf::from("/tmp/groups.txt"),
                label: "Extra".to_string(),
            }]
        );
        assert_eq!(config.commands.launch_terminal, "/usr/lib/snigdhaos/launch-terminal");
        assert_eq!(config.selection.desktop_chassis_types.len(), 6);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blackbox.toml");
        std::fs::write(&path, "[general\n").unwrap();
        assert!(BlackboxConfig::load_from(&path).is_err());
    }
}
