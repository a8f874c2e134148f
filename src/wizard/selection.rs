//! Software groups the user can tick before applying.
//!
//! A group file is a sequence of 3-line records:
//!
//! ```text
//! true
//! base-devel git
//! Developer Tools
//! ```
//!
//! The first line is the default check state, the second the packages and
//! the third the label.

use tracing::{debug, info};

use super::config::{BuiltinItemConfig, GroupSourceConfig, SelectionConfig};
use super::host::HostContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareItem {
    pub default_checked: bool,
    pub checked: bool,
    pub label: String,
    pub packages: Vec<String>,
    pub prepare_commands: Vec<String>,
    pub setup_commands: Vec<String>,
}

impl SoftwareItem {
    /// Build an item from one record of a group file
    pub fn from_record(default: &str, packages: &str, label: &str) -> Self {
        let default_checked = default == "true";
        Self {
            default_checked,
            checked: default_checked,
            label: label.to_string(),
            packages: packages
                .split(' ')
                .filter(|p| !p.is_empty())
                .map(|p| p.to_string())
                .collect(),
            prepare_commands: Vec::new(),
            setup_commands: Vec::new(),
        }
    }

    fn from_builtin(item: &BuiltinItemConfig) -> Self {
        Self {
            default_checked: item.default,
            checked: item.default,
            label: item.label.clone(),
            packages: item.packages.clone(),
            prepare_commands: item.prepare_commands.clone(),
            setup_commands: item.setup_commands.clone(),
        }
    }
}

/// One tab of the selection screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareGroup {
    pub label: String,
    pub items: Vec<SoftwareItem>,
}

/// Parse group file content. A trailing incomplete record is ignored.
pub fn parse_records(content: &str) -> Vec<SoftwareItem> {
    let lines: Vec<&str> = content.lines().collect();
    lines
        .chunks_exact(3)
        .map(|record| SoftwareItem::from_record(record[0], record[1], record[2]))
        .collect()
}

/// Load a group file, or `None` when it cannot be read
pub fn load_group(source: &GroupSourceConfig) -> Option<SoftwareGroup> {
    match std::fs::read_to_string(&source.path) {
        Ok(content) => {
            let items = parse_records(&content);
            info!("Loaded {} item(s) from {:?}", items.len(), source.path);
            Some(SoftwareGroup {
                label: source.label.clone(),
                items,
            })
        }
        Err(e) => {
            debug!("Skipping group file {:?}: {}", source.path, e);
            None
        }
    }
}

fn builtin_visible(item: &BuiltinItemConfig, config: &SelectionConfig, host: &HostContext) -> bool {
    if let Some(ref desktop) = item.desktop {
        if !host.desktop_is(desktop) {
            return false;
        }
    }
    if item.desktop_chassis && !host.is_desktop_chassis(&config.desktop_chassis_types) {
        return false;
    }
    true
}

/// Tabs of software groups plus the cursor of the selection screen
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    pub groups: Vec<SoftwareGroup>,
    pub tab: usize,
    pub cursor: usize,
    loaded: bool,
}

impl SelectionModel {
    /// Fill the model once. Later calls keep the loaded groups and their
    /// check states.
    pub fn populate(&mut self, config: &SelectionConfig, host: &HostContext) {
        if self.loaded {
            return;
        }
        self.loaded = true;

        let builtin: Vec<SoftwareItem> = config
            .builtin
            .iter()
            .filter(|item| builtin_visible(item, config, host))
            .map(SoftwareItem::from_builtin)
            .collect();
        if builtin.is_empty() {
            debug!("No built-in item applies to this host");
        } else {
            self.groups.push(SoftwareGroup {
                label: config.builtin_label.clone(),
                items: builtin,
            });
        }

        for source in &config.sources {
            if let Some(group) = load_group(source) {
                self.groups.push(group);
            }
        }
    }

    /// Checked items of every tab, in tab order
    pub fn checked_items(&self) -> impl Iterator<Item = &SoftwareItem> {
        self.groups
            .iter()
            .flat_map(|group| group.items.iter())
            .filter(|item| item.checked)
    }

    pub fn current_group(&self) -> Option<&SoftwareGroup> {
        self.groups.get(self.tab)
    }

    pub fn next_tab(&mut self) {
        if !self.groups.is_empty() {
            self.tab = (self.tab + 1) % self.groups.len();
            self.cursor = 0;
        }
    }

    pub fn prev_tab(&mut self) {
        if !self.groups.is_empty() {
            self.tab = (self.tab + self.groups.len() - 1) % self.groups.len();
            self.cursor = 0;
        }
    }

    pub fn cursor_down(&mut self) {
        let len = self.current_group().map(|g| g.items.len()).unwrap_or(0);
        if self.cursor + 1 < len {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn toggle_current(&mut self) {
        if let Some(item) = self
            .groups
            .get_mut(self.tab)
            .and_then(|group| group.items.get_mut(self.cursor))
        {
            item.checked = !item.checked;
            debug!("{} -> {}", item.label, item.checked);
        }
    }
}
