use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Extension of convertible source documents.
pub const PUB_EXTENSION: &str = "pub";
/// Extension of the primary converted artifact.
pub const PRIMARY_SUFFIX: &str = ".htm";
/// Suffix of the sibling directory holding embedded resources.
pub const RESOURCE_SUFFIX: &str = "_files";

/// One conversion unit: a source document and its derived output location.
///
/// `output_base` is the output path without extension; Publisher derives
/// both the `.htm` file and the `_files` resource directory from it.
/// Immutable once created.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    output_base: PathBuf,
}

impl ConversionJob {
    pub fn new(source: &Path, output_dir: &Path) -> Self {
        let stem = source.file_stem().unwrap_or_default();
        Self {
            source: source.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            output_base: output_dir.join(stem),
        }
    }

    pub fn output_base(&self) -> &Path {
        &self.output_base
    }

    /// The main converted artifact, `{output_base}.htm`.
    ///
    /// Appends to the full file name rather than using `set_extension`, so a
    /// dotted stem like `spring.2004.pub` maps to `spring.2004.htm`.
    pub fn primary_output(&self) -> PathBuf {
        self.with_appended(PRIMARY_SUFFIX)
    }

    /// The companion resource directory, `{output_base}_files`.
    pub fn resource_dir(&self) -> PathBuf {
        self.with_appended(RESOURCE_SUFFIX)
    }

    fn with_appended(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.output_base.file_name().unwrap_or_default());
        name.push(suffix);
        self.output_base.with_file_name(name)
    }

    /// The idempotence predicate: the primary file exists and the resource
    /// directory exists, is a directory, and holds at least one entry.
    ///
    /// Side-effect free. Used both to skip work up front and to validate
    /// Publisher's output after a save.
    pub fn already_converted(&self) -> bool {
        let resources = self.resource_dir();
        self.primary_output().is_file()
            && resources.is_dir()
            && fs::read_dir(&resources)
                .map(|mut entries| entries.next().is_some())
                .unwrap_or(false)
    }

    /// Everything in the output directory sharing this job's base name.
    /// Purely diagnostic — logged after a save to show what Publisher wrote.
    pub fn sibling_artifacts(&self) -> Vec<PathBuf> {
        let Some(stem) = self.output_base.file_name().and_then(|n| n.to_str()) else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return Vec::new();
        };
        let mut found: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(stem))
            })
            .map(|e| e.path())
            .collect();
        found.sort();
        found
    }
}

/// How a job reached its terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionStatus {
    /// Publisher produced and we validated fresh output.
    Converted,
    /// Valid output already existed; no automation work performed.
    SkippedExisting,
}

/// Structured record produced for every completed conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRecord {
    pub id: String,
    pub source: PathBuf,
    pub output_html: PathBuf,
    pub status: ConversionStatus,
    pub attempts: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl ConversionRecord {
    pub fn new(
        job: &ConversionJob,
        status: ConversionStatus,
        attempts: u32,
        started_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source: job.source.clone(),
            output_html: job.primary_output(),
            status,
            attempts,
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds(),
        }
    }
}

/// Tally accumulated across one tree walk. Printed at the end, not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkSummary {
    pub converted: u32,
    pub skipped: u32,
}

impl WalkSummary {
    pub fn total(&self) -> u32 {
        self.converted + self.skipped
    }
}
