//! Recipe and host builders for creating test fixtures

#![allow(dead_code)]

use preflight_core::{DiscoveredProcess, HostSnapshot, Recipe};

/// Builder for creating Recipe test fixtures
pub struct RecipeBuilder {
    name: String,
    display_name: String,
    process_match: Vec<String>,
    validation: String,
}

impl RecipeBuilder {
    pub fn new() -> Self {
        Self {
            name: "test-recipe".to_string(),
            display_name: "Test Recipe".to_string(),
            process_match: Vec::new(),
            validation: String::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = display_name.to_string();
        self
    }

    pub fn process_match(mut self, pattern: &str) -> Self {
        self.process_match.push(pattern.to_string());
        self
    }

    /// Validation command executed by the shell
    pub fn validation(mut self, command: &str) -> Self {
        self.validation = command.to_string();
        self
    }

    pub fn build(self) -> Recipe {
        Recipe::new(self.name)
            .with_display_name(self.display_name)
            .with_process_match(self.process_match)
            .with_validation(self.validation)
    }
}

impl Default for RecipeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating HostSnapshot test fixtures
pub struct HostBuilder {
    snapshot: HostSnapshot,
}

impl HostBuilder {
    /// A linux host with no running processes
    pub fn linux() -> Self {
        let mut snapshot = HostSnapshot::new("linux", "22.04");
        snapshot.platform = "ubuntu".to_string();
        snapshot.kernel_arch = "x86_64".to_string();
        Self { snapshot }
    }

    pub fn windows(version: &str) -> Self {
        let mut snapshot = HostSnapshot::new("windows", version);
        snapshot.platform = "Microsoft Windows Server 2019 Standard".to_string();
        snapshot.kernel_arch = "x86_64".to_string();
        Self { snapshot }
    }

    pub fn process(mut self, name: &str, cmdline: &str) -> Self {
        let pid = 1000 + self.snapshot.discovered_processes.len() as i32;
        self.snapshot
            .discovered_processes
            .push(DiscoveredProcess::new(name, cmdline, pid));
        self
    }

    pub fn build(self) -> HostSnapshot {
        self.snapshot
    }
}
