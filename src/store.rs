//! Versioned artifact store
//!
//! All pipeline stages communicate exclusively through files named by a
//! fixed convention: `<stem>_<timestamp>.<ext>` in a working directory,
//! and one canonical `<stem>.<ext>` per kind in the production directory.
//!
//! The timestamp format is `%y%m%d%H%M%S`: fixed-width, twelve digits, so
//! lexicographic order equals chronological order. This is a documented
//! invariant of the store, not an incidental string property. `put` never
//! overwrites an existing working artifact; callers obtain a free timestamp
//! from `fresh_timestamp`, which skips past names already taken within the
//! same second.

use crate::error::{PipelineError, Result};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Timestamp format embedded in working-area file names
pub const TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Width of a formatted timestamp
pub const TIMESTAMP_LEN: usize = 12;

/// The kinds of artifact the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Immutable merged dataset produced by one ingestion run
    Dataset,
    /// List of source CSV paths consumed to build a snapshot
    IngestionRecord,
    /// Serialized classifier blob
    Model,
    /// Single floating-point evaluation score
    Metric,
    /// Combined responses of the post-deployment smoke test
    ApiAudit,
}

impl ArtifactKind {
    fn stem(&self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "finaldata",
            ArtifactKind::IngestionRecord => "ingestedfiles",
            ArtifactKind::Model => "trainedmodel",
            ArtifactKind::Metric => "latestscore",
            ArtifactKind::ApiAudit => "apireturns",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "csv",
            ArtifactKind::Model => "pkl",
            ArtifactKind::IngestionRecord | ArtifactKind::Metric | ArtifactKind::ApiAudit => "txt",
        }
    }

    /// Un-timestamped name used in the production area
    pub fn canonical_file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.extension())
    }

    /// Timestamped name used in the working area
    pub fn timestamped_file_name(&self, timestamp: &str) -> String {
        format!("{}_{}.{}", self.stem(), timestamp, self.extension())
    }

    /// Whether `name` is a timestamped instance of this kind
    fn matches(&self, name: &str) -> bool {
        let prefix = format!("{}_", self.stem());
        let suffix = format!(".{}", self.extension());
        name.strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(&suffix))
            .map_or(false, |ts| {
                ts.len() == TIMESTAMP_LEN && ts.bytes().all(|b| b.is_ascii_digit())
            })
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Dataset => "dataset snapshot",
            ArtifactKind::IngestionRecord => "ingestion record",
            ArtifactKind::Model => "trained model",
            ArtifactKind::Metric => "metric",
            ArtifactKind::ApiAudit => "API audit",
        };
        f.write_str(name)
    }
}

/// Versioned artifact store over one working directory
///
/// The orchestrator and pipeline stages depend on this interface rather
/// than on raw filesystem globbing.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `dir`; the directory may not exist yet
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Working directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a new timestamped artifact, creating the directory if absent
    ///
    /// Working artifacts are an append-only audit trail: writing over an
    /// existing timestamped name is an error, never a silent replace.
    pub fn put(&self, kind: ArtifactKind, timestamp: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(kind.timestamped_file_name(timestamp));
        if path.exists() {
            return Err(PipelineError::ArtifactExists(path));
        }
        fs::write(&path, bytes)?;
        debug!(artifact = %path.display(), "wrote {}", kind);
        Ok(path)
    }

    /// Timestamp, starting from now, under which none of `kinds` has an
    /// artifact in this store yet
    ///
    /// Two runs within one wall-clock second would otherwise collide on the
    /// second-resolution naming convention; the later run claims the next
    /// free second instead.
    pub fn fresh_timestamp(&self, kinds: &[ArtifactKind]) -> String {
        let mut at = chrono::Local::now().naive_local();
        loop {
            let ts = at.format(TIMESTAMP_FORMAT).to_string();
            let taken = kinds
                .iter()
                .any(|kind| self.dir.join(kind.timestamped_file_name(&ts)).exists());
            if !taken {
                return ts;
            }
            at += chrono::Duration::seconds(1);
        }
    }

    /// Latest artifact of `kind`, or `None` when no instance exists
    ///
    /// "Latest" is the lexicographically greatest matching file name,
    /// independent of directory iteration order.
    pub fn latest(&self, kind: ArtifactKind) -> Result<Option<PathBuf>> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let mut matches: Vec<String> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_file() && kind.matches(&name) {
                matches.push(name);
            }
        }
        matches.sort();

        debug!(
            dir = %self.dir.display(),
            found = matches.len(),
            "searched for latest {}",
            kind
        );
        Ok(matches.pop().map(|name| self.dir.join(name)))
    }

    /// Latest artifact of `kind`, failing when none exists
    pub fn latest_required(&self, kind: ArtifactKind) -> Result<PathBuf> {
        self.latest(kind)?.ok_or(PipelineError::MissingArtifact {
            kind,
            dir: self.dir.clone(),
        })
    }

    /// Copy the latest artifact of `kind` into `prod_dir` under its
    /// canonical name, overwriting any previous production artifact.
    ///
    /// There is no rollback: the previous production file is gone once the
    /// copy lands. Promoting the same source twice is idempotent.
    pub fn promote<P: AsRef<Path>>(&self, kind: ArtifactKind, prod_dir: P) -> Result<PathBuf> {
        let source = self.latest_required(kind)?;
        let prod_dir = prod_dir.as_ref();
        fs::create_dir_all(prod_dir)?;
        let dest = prod_dir.join(kind.canonical_file_name());
        fs::copy(&source, &dest)?;
        info!(from = %source.display(), to = %dest.display(), "promoted {}", kind);
        Ok(dest)
    }
}

/// Canonical production path of an artifact kind
pub fn production_path<P: AsRef<Path>>(prod_dir: P, kind: ArtifactKind) -> PathBuf {
    prod_dir.as_ref().join(kind.canonical_file_name())
}

/// Read a metric artifact: a single float on the first line
pub fn read_metric(path: &Path) -> Result<f64> {
    let raw = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingArtifact {
                kind: ArtifactKind::Metric,
                dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
            }
        } else {
            PipelineError::Io(e)
        }
    })?;
    let line = raw.lines().next().unwrap_or("").trim();
    line.parse::<f64>()
        .map_err(|e| PipelineError::Data(format!("malformed metric in {}: {}", path.display(), e)))
}

/// Advisory lock enforcing at most one orchestrator run at a time
///
/// Created with `create_new`, so a second acquire fails while the first
/// holds the file; released on drop. Overlapping runs would otherwise race
/// on the timestamped-filename convention within one second of resolution.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock or fail with `LockHeld`
    pub fn acquire<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(lock = %path.display(), "acquired run lock");
                Ok(Self { path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(PipelineError::LockHeld(path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(lock = %self.path.display(), "failed to release run lock: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_latest_picks_chronologically_greatest() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        // Written out of chronological order on purpose
        store.put(ArtifactKind::Model, "240301120000", b"b").unwrap();
        store.put(ArtifactKind::Model, "240501120000", b"c").unwrap();
        store.put(ArtifactKind::Model, "240101120000", b"a").unwrap();

        let latest = store.latest(ArtifactKind::Model).unwrap().unwrap();
        assert_eq!(
            latest.file_name().unwrap().to_str().unwrap(),
            "trainedmodel_240501120000.pkl"
        );
    }

    #[test]
    fn test_latest_ignores_other_kinds_and_malformed_names() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.put(ArtifactKind::Metric, "240101120000", b"0.5").unwrap();
        std::fs::write(dir.path().join("trainedmodel_notatimestamp.pkl"), b"x").unwrap();
        std::fs::write(dir.path().join("trainedmodel.pkl"), b"x").unwrap();

        assert!(store.latest(ArtifactKind::Model).unwrap().is_none());
    }

    #[test]
    fn test_latest_on_missing_directory_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("never-created"));
        assert!(store.latest(ArtifactKind::Dataset).unwrap().is_none());
    }

    #[test]
    fn test_latest_required_reports_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.latest_required(ArtifactKind::Metric).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingArtifact {
                kind: ArtifactKind::Metric,
                ..
            }
        ));
    }

    #[test]
    fn test_promote_strips_timestamp_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let prod = dir.path().join("production");
        let store = ArtifactStore::new(dir.path().join("working"));

        store.put(ArtifactKind::Metric, "240101120000", b"0.70").unwrap();
        store.promote(ArtifactKind::Metric, &prod).unwrap();
        let canonical = production_path(&prod, ArtifactKind::Metric);
        assert_eq!(std::fs::read_to_string(&canonical).unwrap(), "0.70");

        store.put(ArtifactKind::Metric, "240201120000", b"0.75").unwrap();
        store.promote(ArtifactKind::Metric, &prod).unwrap();
        assert_eq!(std::fs::read_to_string(&canonical).unwrap(), "0.75");

        // Exactly one metric file in production
        let count = std::fs::read_dir(&prod).unwrap().count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_promote_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let prod = dir.path().join("production");
        let store = ArtifactStore::new(dir.path().join("working"));

        store.put(ArtifactKind::Model, "240101120000", b"blob").unwrap();
        store.promote(ArtifactKind::Model, &prod).unwrap();
        store.promote(ArtifactKind::Model, &prod).unwrap();

        let entries: Vec<_> = std::fs::read_dir(&prod)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["trainedmodel.pkl".to_string()]);
        assert_eq!(
            std::fs::read(production_path(&prod, ArtifactKind::Model)).unwrap(),
            b"blob"
        );
    }

    #[test]
    fn test_read_metric_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_metric(&dir.path().join("latestscore.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact { .. }));
    }

    #[test]
    fn test_read_metric_parses_first_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latestscore.txt");
        std::fs::write(&path, "0.5714285714285714\n").unwrap();
        assert!((read_metric(&path).unwrap() - 0.5714285714285714).abs() < f64::EPSILON);
    }

    #[test]
    fn test_run_lock_excludes_second_acquire() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join(".driftgate.lock");

        let lock = RunLock::acquire(&lock_path).unwrap();
        let err = RunLock::acquire(&lock_path).unwrap_err();
        assert!(matches!(err, PipelineError::LockHeld(_)));

        drop(lock);
        let _relocked = RunLock::acquire(&lock_path).unwrap();
    }

    #[test]
    fn test_fresh_timestamp_is_fixed_width() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert_eq!(
            store.fresh_timestamp(&[ArtifactKind::Dataset]).len(),
            TIMESTAMP_LEN
        );
    }

    #[test]
    fn test_put_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .put(ArtifactKind::Dataset, "240101120000", b"first")
            .unwrap();
        let err = store
            .put(ArtifactKind::Dataset, "240101120000", b"second")
            .unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactExists(_)));

        // The original artifact is untouched
        let path = dir.path().join("finaldata_240101120000.csv");
        assert_eq!(std::fs::read(&path).unwrap(), b"first");
    }

    #[test]
    fn test_fresh_timestamp_skips_taken_names() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let taken = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        store.put(ArtifactKind::Dataset, &taken, b"snapshot").unwrap();
        store
            .put(ArtifactKind::IngestionRecord, &taken, b"record")
            .unwrap();

        let fresh =
            store.fresh_timestamp(&[ArtifactKind::Dataset, ArtifactKind::IngestionRecord]);
        assert!(fresh.as_str() > taken.as_str());
        assert!(!dir
            .path()
            .join(ArtifactKind::Dataset.timestamped_file_name(&fresh))
            .exists());
    }
}
