//! Domain entities for RepoScope.

use serde::{Deserialize, Serialize};

/// A top-level entry in a repository listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoEntry {
    /// Entry name as listed by the repository host.
    pub name: String,
    /// Size in bytes when the listing reports one.
    pub size: Option<u64>,
}

impl RepoEntry {
    /// Create an entry whose size is not known until it is fetched.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
        }
    }

    /// Create an entry with a size hint from the listing.
    pub fn sized(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size: Some(size),
        }
    }
}

/// Repository metadata fetched once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Repository name.
    pub name: String,
    /// Repository description, if set.
    pub description: Option<String>,
    /// Primary language reported by the host, if any.
    pub language: Option<String>,
    /// Popularity score (stargazer count).
    pub stars: u64,
    /// Top-level entries in host order.
    pub entries: Vec<RepoEntry>,
}

/// Cyclomatic complexity of a single function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolComplexity {
    /// Qualified symbol name (`Class.method`, `outer.inner`).
    pub symbol: String,
    /// Number of independent decision paths.
    pub score: u32,
}

impl SymbolComplexity {
    /// Create a new complexity entry.
    pub fn new(symbol: impl Into<String>, score: u32) -> Self {
        Self {
            symbol: symbol.into(),
            score,
        }
    }
}

/// Halstead volume, difficulty and effort for one file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeMetrics {
    /// Amount of information in the code.
    pub volume: f64,
    /// Potential for errors.
    pub difficulty: f64,
    /// Estimated mental effort to understand the code.
    pub effort: f64,
}

impl VolumeMetrics {
    /// Create a new volume triple.
    pub fn new(volume: f64, difficulty: f64, effort: f64) -> Self {
        Self {
            volume,
            difficulty,
            effort,
        }
    }
}

/// Metrics collected for one analyzed file.
///
/// All-zero metrics are a valid record: the volume triple and the
/// diagnostics fall back to defaults when their stage degrades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Per-symbol complexity in source order.
    pub complexity: Vec<SymbolComplexity>,
    /// Halstead volume triple.
    pub volume: VolumeMetrics,
    /// Lint output; empty means no issues.
    pub diagnostics: String,
}

/// Ordered mapping from file name to its metrics.
///
/// Keys are unique and iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    files: Vec<FileMetrics>,
}

/// A single file entry inside an [`AnalysisResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    /// File name from the listing.
    pub name: String,
    /// Metrics for the file.
    pub record: MetricRecord,
}

impl AnalysisResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any previous record for the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, record: MetricRecord) {
        let name = name.into();
        if let Some(existing) = self.files.iter_mut().find(|file| file.name == name) {
            existing.record = record;
            return;
        }
        self.files.push(FileMetrics { name, record });
    }

    /// Look up a record by file name.
    pub fn get(&self, name: &str) -> Option<&MetricRecord> {
        self.files
            .iter()
            .find(|file| file.name == name)
            .map(|file| &file.record)
    }

    /// Whether a record exists for the file name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// File names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|file| file.name.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FileMetrics> {
        self.files.iter()
    }

    /// Number of analyzed files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no file was analyzed.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
