//! Process matching
//!
//! A recipe's `processMatch` patterns are compared against the name and
//! command line of every discovered process. Matching is a case-sensitive
//! substring test, so an exact name is always a match.

use preflight_core::DiscoveredProcess;

/// Processes matched by at least one non-empty pattern
pub fn matching_processes<'a>(
    patterns: &[String],
    processes: &'a [DiscoveredProcess],
) -> Vec<&'a DiscoveredProcess> {
    processes
        .iter()
        .filter(|process| {
            active_patterns(patterns).any(|pattern| process_matches(pattern, process))
        })
        .collect()
}

/// Whether the patterns are satisfied by the discovered processes
///
/// A recipe without patterns places no constraint on running processes.
pub fn matches_any(patterns: &[String], processes: &[DiscoveredProcess]) -> bool {
    if active_patterns(patterns).next().is_none() {
        return true;
    }

    processes.iter().any(|process| {
        active_patterns(patterns).any(|pattern| process_matches(pattern, process))
    })
}

fn active_patterns(patterns: &[String]) -> impl Iterator<Item = &str> {
    patterns
        .iter()
        .map(String::as_str)
        .filter(|pattern| !pattern.is_empty())
}

fn process_matches(pattern: &str, process: &DiscoveredProcess) -> bool {
    process.name.contains(pattern) || process.cmdline.contains(pattern)
}
