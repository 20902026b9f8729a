//! Host snapshot types
//!
//! The snapshot is produced by discovery and only ever read here.

use serde::{Deserialize, Serialize};

/// A process observed running on the target host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredProcess {
    /// Executable name
    pub name: String,

    /// Full command line
    #[serde(default)]
    pub cmdline: String,

    /// Process id
    pub pid: i32,
}

impl DiscoveredProcess {
    pub fn new(name: impl Into<String>, cmdline: impl Into<String>, pid: i32) -> Self {
        Self {
            name: name.into(),
            cmdline: cmdline.into(),
            pid,
        }
    }
}

/// Facts about the target host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSnapshot {
    /// Operating system identifier ("windows", "linux", "darwin", ...)
    #[serde(default)]
    pub os: String,

    /// Platform or distribution (e.g., "ubuntu", "Microsoft Windows Server 2019")
    #[serde(default)]
    pub platform: String,

    /// Dot-delimited platform version
    #[serde(default)]
    pub platform_version: String,

    /// Kernel architecture (e.g., "x86_64")
    #[serde(default)]
    pub kernel_arch: String,

    /// Processes running at discovery time
    #[serde(default)]
    pub discovered_processes: Vec<DiscoveredProcess>,
}

impl HostSnapshot {
    /// Create a snapshot for the given OS and platform version
    pub fn new(os: impl Into<String>, platform_version: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            platform_version: platform_version.into(),
            ..Default::default()
        }
    }

    /// Add discovered processes
    pub fn with_processes(mut self, processes: Vec<DiscoveredProcess>) -> Self {
        self.discovered_processes = processes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_snapshot_from_json() {
        let json = r#"{
            "os": "linux",
            "platform": "ubuntu",
            "platformVersion": "22.04",
            "discoveredProcesses": [
                {"name": "php-fpm", "cmdline": "php-fpm: master process", "pid": 1234}
            ]
        }"#;

        let host: HostSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(host.os, "linux");
        assert_eq!(host.platform_version, "22.04");
        assert!(host.kernel_arch.is_empty());
        assert_eq!(host.discovered_processes.len(), 1);
        assert_eq!(host.discovered_processes[0].pid, 1234);
    }

    #[test]
    fn test_host_snapshot_defaults() {
        let host: HostSnapshot = serde_yaml_ng::from_str("os: darwin").unwrap();
        assert_eq!(host.os, "darwin");
        assert!(host.discovered_processes.is_empty());
    }
}
