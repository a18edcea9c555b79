//! On-disk cache of processed graph records.
//!
//! Directory layout under the dataset root:
//!
//! ```text
//! <root>/raw/*.hit              raw samples, processed in file-name order
//! <root>/processed/data_<i>.hgr one graph record per raw sample
//! ```
//!
//! The cache assumes a single writer per dataset root.

use std::fs;
use std::path::{Path, PathBuf};

use hitgraph_core::{fingerprint_hex, Fnv1a64, GraphBuilder, GraphRecord, FINGERPRINT_LEN};

use crate::error::{HitIoError, Result};
use crate::format::{load_raw_sample, read_graph, write_graph, GRAPH_EXTENSION, RAW_EXTENSION};

/// Subdirectory holding raw samples.
pub const RAW_DIR: &str = "raw";

/// Subdirectory holding processed records.
pub const PROCESSED_DIR: &str = "processed";

/// Lazily materialized dataset of graph records.
pub struct DatasetCache {
    root: PathBuf,
    builder: GraphBuilder,
    force_reprocess: bool,
    len: usize,
}

impl DatasetCache {
    /// Open a cache rooted at `root`.
    ///
    /// # Errors
    /// `Path` if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>, builder: GraphBuilder) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(HitIoError::Path { path: root });
        }
        Ok(Self {
            root,
            builder,
            force_reprocess: false,
            len: 0,
        })
    }

    /// Discard any existing processed records on the next [`ensure_processed`](Self::ensure_processed).
    pub fn with_force_reprocess(mut self, force: bool) -> Self {
        self.force_reprocess = force;
        self
    }

    /// Dataset root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of raw samples.
    pub fn raw_dir(&self) -> PathBuf {
        self.root.join(RAW_DIR)
    }

    /// Directory of processed records.
    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(PROCESSED_DIR)
    }

    /// Path of the processed record for `index`.
    pub fn record_path(&self, index: usize) -> PathBuf {
        self.processed_dir()
            .join(format!("data_{}.{}", index, GRAPH_EXTENSION))
    }

    /// Number of records made available by the last `ensure_processed` call.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no records are available.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// List raw sample files sorted by file name.
    ///
    /// # Errors
    /// `Path` if the raw directory is missing.
    pub fn discover_raw(&self) -> Result<Vec<PathBuf>> {
        let raw_dir = self.raw_dir();
        if !raw_dir.is_dir() {
            return Err(HitIoError::Path { path: raw_dir });
        }

        let entries = fs::read_dir(&raw_dir).map_err(|e| HitIoError::storage(&raw_dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| HitIoError::storage(&raw_dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(RAW_EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Stable fingerprint over the dataset root and raw file names.
    pub fn fingerprint(&self, raw_paths: &[PathBuf]) -> String {
        let mut hasher = Fnv1a64::new();
        hasher.write_str(&self.root.to_string_lossy());
        for path in raw_paths {
            if let Some(name) = path.file_name() {
                hasher.write_str(&name.to_string_lossy());
            }
        }
        fingerprint_hex(hasher.finish(), FINGERPRINT_LEN)
    }

    /// Convert every raw sample without a processed record.
    ///
    /// Record `i` corresponds to `raw_paths[i]`. In forced mode the processed
    /// directory is removed first. Stops at the first failing sample.
    ///
    /// # Returns
    /// Number of records built by this call.
    pub fn ensure_processed(&mut self, raw_paths: &[PathBuf]) -> Result<usize> {
        let processed_dir = self.processed_dir();

        if self.force_reprocess && processed_dir.is_dir() {
            log::warn!(
                "Removing {} to force reprocessing",
                processed_dir.display()
            );
            fs::remove_dir_all(&processed_dir)
                .map_err(|e| HitIoError::storage(&processed_dir, e))?;
        }

        fs::create_dir_all(&processed_dir).map_err(|e| HitIoError::storage(&processed_dir, e))?;

        let missing: Vec<usize> = (0..raw_paths.len())
            .filter(|&i| !self.record_path(i).is_file())
            .collect();

        if missing.is_empty() {
            log::debug!(
                "All {} records already processed in {}",
                raw_paths.len(),
                processed_dir.display()
            );
        } else {
            log::info!(
                "Processing {} of {} raw samples into {}",
                missing.len(),
                raw_paths.len(),
                processed_dir.display()
            );
        }

        for &index in &missing {
            self.process_one(index, &raw_paths[index])?;
        }

        self.len = raw_paths.len();
        Ok(missing.len())
    }

    fn process_one(&self, index: usize, raw_path: &Path) -> Result<()> {
        log::debug!("Processing {}", raw_path.display());

        let sample = load_raw_sample(raw_path).map_err(|e| match e {
            HitIoError::Storage { path, source } => HitIoError::invalid_input(format!(
                "cannot read raw sample {}: {}",
                path.display(),
                source
            )),
            other => other,
        })?;
        let record = self.builder.build(&sample)?;

        let out_path = self.record_path(index);
        let tmp_path = out_path.with_extension(format!("{}.tmp", GRAPH_EXTENSION));
        log::debug!("Saving {}", out_path.display());

        let file = fs::File::create(&tmp_path).map_err(|e| HitIoError::storage(&tmp_path, e))?;
        let mut writer = std::io::BufWriter::new(file);
        write_graph(&record, &mut writer)?;
        std::io::Write::flush(&mut writer).map_err(|e| HitIoError::storage(&tmp_path, e))?;
        drop(writer);

        fs::rename(&tmp_path, &out_path).map_err(|e| HitIoError::storage(&out_path, e))
    }

    /// Read the processed record for `index`.
    ///
    /// # Errors
    /// `NotFound` if the record has not been processed.
    pub fn load(&self, index: usize) -> Result<GraphRecord> {
        let path = self.record_path(index);
        if !path.is_file() {
            return Err(HitIoError::NotFound { index });
        }
        let file = fs::File::open(&path).map_err(|e| HitIoError::storage(&path, e))?;
        let mut reader = std::io::BufReader::new(file);
        read_graph(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::save_raw_sample;
    use hitgraph_core::{GraphBuilderConfig, RawSample};
    use tempfile::TempDir;

    fn write_samples(root: &Path, count: usize) -> Vec<PathBuf> {
        let raw = root.join(RAW_DIR);
        fs::create_dir_all(&raw).unwrap();
        (0..count)
            .map(|i| {
                let features: Vec<f32> = (0..12).map(|j| (i * 12 + j) as f32 * 0.1).collect();
                let sample = RawSample::new(features, 2, vec![1, 1, 2, 2, 3, 3]).unwrap();
                let path = raw.join(format!("event_{:03}.hit", i));
                save_raw_sample(&sample, &path).unwrap();
                path
            })
            .collect()
    }

    fn cache(root: &Path) -> DatasetCache {
        let builder = GraphBuilder::new(GraphBuilderConfig::default()).unwrap();
        DatasetCache::new(root, builder).unwrap()
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let result = DatasetCache::new(dir.path().join("absent"), GraphBuilder::default());
        assert!(matches!(result, Err(HitIoError::Path { .. })));
    }

    #[test]
    fn test_discover_sorted() {
        let dir = TempDir::new().unwrap();
        write_samples(dir.path(), 3);
        fs::write(dir.path().join(RAW_DIR).join("notes.txt"), b"x").unwrap();

        let paths = cache(dir.path()).discover_raw().unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["event_000.hit", "event_001.hit", "event_002.hit"]);
    }

    #[test]
    fn test_process_then_load() {
        let dir = TempDir::new().unwrap();
        let raw = write_samples(dir.path(), 3);
        let mut cache = cache(dir.path());

        assert!(matches!(cache.load(0), Err(HitIoError::NotFound { index: 0 })));

        assert_eq!(cache.ensure_processed(&raw).unwrap(), 3);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.ensure_processed(&raw).unwrap(), 0);

        let a = cache.load(1).unwrap();
        let b = cache.load(1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.num_nodes(), 6);
        assert!(matches!(cache.load(3), Err(HitIoError::NotFound { index: 3 })));
    }

    #[test]
    fn test_force_reprocess_removes_stale() {
        let dir = TempDir::new().unwrap();
        let raw = write_samples(dir.path(), 2);
        let stale = dir.path().join(PROCESSED_DIR).join("stale.bin");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        let mut cache = cache(dir.path()).with_force_reprocess(true);
        assert_eq!(cache.ensure_processed(&raw).unwrap(), 2);
        assert!(!stale.exists());
        assert!(cache.record_path(1).is_file());
    }

    #[test]
    fn test_corrupt_raw_aborts() {
        let dir = TempDir::new().unwrap();
        let mut raw = write_samples(dir.path(), 2);
        let bad = dir.path().join(RAW_DIR).join("event_999.hit");
        fs::write(&bad, b"garbage").unwrap();
        raw.push(bad);

        let err = cache(dir.path()).ensure_processed(&raw).unwrap_err();
        assert!(matches!(err, HitIoError::InvalidInput { .. }));
    }

    #[test]
    fn test_fingerprint_stable() {
        let dir = TempDir::new().unwrap();
        let raw = write_samples(dir.path(), 2);
        let cache = cache(dir.path());

        let a = cache.fingerprint(&raw);
        assert_eq!(a.len(), FINGERPRINT_LEN);
        assert_eq!(a, cache.fingerprint(&raw));
        assert_ne!(a, cache.fingerprint(&raw[..1]));
    }
}
