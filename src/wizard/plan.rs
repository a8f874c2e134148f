use std::collections::HashSet;
use tracing::debug;

use super::config::ServiceRule;
use super::selection::SoftwareItem;

/// Everything the apply script needs for one attempt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallationPlan {
    pub packages: Vec<String>,
    pub prepare_commands: Vec<String>,
    pub setup_commands: Vec<String>,
}

impl InstallationPlan {
    /// Concatenate the lists of `items` in iteration order, without deduplication
    pub fn draft<'a>(items: impl IntoIterator<Item = &'a SoftwareItem>) -> Self {
        let mut plan = Self::default();
        for item in items {
            plan.packages.extend(item.packages.iter().cloned());
            plan.prepare_commands.extend(item.prepare_commands.iter().cloned());
            plan.setup_commands.extend(item.setup_commands.iter().cloned());
        }
        plan
    }

    /// Draft a plan, add policy commands and drop duplicate packages
    pub fn build<'a>(items: impl IntoIterator<Item = &'a SoftwareItem>, rules: &[ServiceRule]) -> Self {
        let mut plan = Self::draft(items);
        if plan.is_empty() {
            return plan;
        }
        plan.apply_policy(rules);
        plan.dedup_packages();
        plan
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Append each rule's command once when all of its packages are planned
    pub fn apply_policy(&mut self, rules: &[ServiceRule]) {
        for rule in rules {
            let matches = !rule.packages.is_empty()
                && rule.packages.iter().all(|p| self.packages.contains(p));
            if matches {
                debug!("Policy adds setup command: {}", rule.command);
                self.setup_commands.push(rule.command.clone());
            }
        }
    }

    /// Remove repeated packages, keeping the first occurrence
    pub fn dedup_packages(&mut self) {
        let mut seen = HashSet::new();
        self.packages.retain(|p| seen.insert(p.clone()));
    }

    pub fn prepare_script(&self) -> String {
        self.prepare_commands.join("\n")
    }

    pub fn package_list(&self) -> String {
        self.packages.join(" ")
    }

    pub fn setup_script(&self) -> String {
        self.setup_commands.join("\n")
    }
}
