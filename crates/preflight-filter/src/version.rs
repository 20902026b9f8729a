//! Host rules
//!
//! A host rule looks only at the host snapshot and either stays silent or
//! returns a message explaining why nothing should be installed. The Windows
//! version rule is the only built-in one.

use preflight_core::HostSnapshot;

/// OS identifier the Windows version rule applies to
pub const WINDOWS_OS: &str = "windows";

/// Lowest supported Windows major version (6.0 itself is still unsupported)
pub const MINIMUM_WINDOWS_MAJOR: u64 = 6;

pub const WINDOWS_VERSION_UNSUPPORTED: &str = "This version of Windows is no longer supported";
pub const WINDOWS_VERSION_UNIDENTIFIED: &str = "Failed to identify a valid version of Windows";

/// A check applied to the host before any recipe is evaluated
pub trait HostRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// `None` when the host is acceptable, otherwise the reason it is not
    fn check(&self, host: &HostSnapshot) -> Option<String>;
}

/// Major/minor pair read from a dot-delimited version string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedVersion {
    Identified { major: u64, minor: u64 },
    Unidentified,
}

impl ParsedVersion {
    /// Parse the first two components of `version`
    ///
    /// A lone major component implies minor 0. When a second component is
    /// present it has to parse too; `"6.x"` is unidentified rather than 6.0.
    pub fn parse(version: &str) -> Self {
        let mut tokens = version.split('.');
        let major = tokens.next().and_then(parse_component);

        match (major, tokens.next()) {
            (Some(major), None) => Self::Identified { major, minor: 0 },
            (Some(major), Some(minor)) => match parse_component(minor) {
                Some(minor) => Self::Identified { major, minor },
                None => Self::Unidentified,
            },
            (None, _) => Self::Unidentified,
        }
    }
}

fn parse_component(token: &str) -> Option<u64> {
    token.parse().ok()
}

/// Rejects Windows hosts older than 6.1
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsVersionRule;

impl WindowsVersionRule {
    pub fn new() -> Self {
        Self
    }

    /// Check an OS identifier and platform version
    ///
    /// Returns `None` for non-Windows hosts and supported versions.
    pub fn check_version(&self, os: &str, version: &str) -> Option<&'static str> {
        if os != WINDOWS_OS {
            return None;
        }

        match ParsedVersion::parse(version) {
            ParsedVersion::Identified { major, minor } => ensure_minimum_version(major, minor),
            ParsedVersion::Unidentified => Some(WINDOWS_VERSION_UNIDENTIFIED),
        }
    }
}

fn ensure_minimum_version(major: u64, minor: u64) -> Option<&'static str> {
    if major < MINIMUM_WINDOWS_MAJOR || (major == MINIMUM_WINDOWS_MAJOR && minor == 0) {
        return Some(WINDOWS_VERSION_UNSUPPORTED);
    }
    None
}

impl HostRule for WindowsVersionRule {
    fn name(&self) -> &str {
        "windows-version"
    }

    fn check(&self, host: &HostSnapshot) -> Option<String> {
        self.check_version(&host.os, &host.platform_version)
            .map(str::to_string)
    }
}
