//! Eligibility rules for analyzed files.

use crate::config::GithubConfig;
use crate::domain::RepoEntry;

/// Decide whether an entry qualifies for analysis.
///
/// An unknown `byte_length` is accepted by name only; callers re-check once the
/// file has been fetched and its real length is known.
pub fn is_eligible(entry_name: &str, byte_length: Option<u64>, config: &GithubConfig) -> bool {
    if !entry_name.ends_with(config.source_suffix.as_str()) {
        return false;
    }
    match byte_length {
        Some(length) => within_size_limit(length, config),
        None => true,
    }
}

/// Whether a length fits under the configured ceiling.
pub fn within_size_limit(byte_length: u64, config: &GithubConfig) -> bool {
    byte_length <= config.max_file_size
}

/// Entries that pass the cheap pre-filter, in listing order.
pub fn eligible_entries<'a>(entries: &'a [RepoEntry], config: &GithubConfig) -> Vec<&'a RepoEntry> {
    entries
        .iter()
        .filter(|entry| is_eligible(&entry.name, entry.size, config))
        .collect()
}

const PREFERRED_KEYWORDS: [&str; 5] = ["main", "core", "app", "__init__", "base"];

/// Pick a representative file for single-file inspection.
///
/// Prefers entry-point-like names, then the first eligible entry.
pub fn select_default_file<'a>(entries: &'a [RepoEntry], config: &GithubConfig) -> Option<&'a str> {
    let eligible = eligible_entries(entries, config);
    eligible
        .iter()
        .copied()
        .find(|entry| {
            let lower = entry.name.to_lowercase();
            PREFERRED_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        })
        .or_else(|| eligible.first().copied())
        .map(|entry| entry.name.as_str())
}
