//! Dataset cache round trips through the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use hitgraph_core::{GraphBuilder, GraphBuilderConfig, RawSample};
use hitgraph_io::{
    load_raw_sample, save_raw_sample, DatasetCache, HitIoError, SplitPolicy, RAW_DIR,
};
use tempfile::TempDir;

fn write_raw(root: &Path, count: usize) -> Vec<PathBuf> {
    let raw = root.join(RAW_DIR);
    fs::create_dir_all(&raw).unwrap();
    (0..count)
        .map(|i| {
            let features: Vec<f32> = (0..16).map(|j| ((i + 1) * j) as f32 * 0.25).collect();
            let labels = vec![1, 1, 2, 2, 3, 3, 0, 0];
            let path = raw.join(format!("sample_{:02}.hit", i));
            save_raw_sample(&RawSample::new(features, 2, labels).unwrap(), &path).unwrap();
            path
        })
        .collect()
}

fn builder() -> GraphBuilder {
    GraphBuilder::new(GraphBuilderConfig::default().with_k(3)).unwrap()
}

#[test]
fn test_raw_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let sample = RawSample::new(vec![0.5, -1.0, 2.0, 3.5], 2, vec![4, 0]).unwrap();
    let path = dir.path().join("one.hit");

    save_raw_sample(&sample, &path).unwrap();
    assert_eq!(load_raw_sample(&path).unwrap(), sample);
}

#[test]
fn test_reopened_cache_reuses_records() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path(), 4);

    let mut first = DatasetCache::new(dir.path(), builder()).unwrap();
    assert_eq!(first.ensure_processed(&raw).unwrap(), 4);
    let bytes = fs::read(first.record_path(2)).unwrap();
    let record = first.load(2).unwrap();

    let mut second = DatasetCache::new(dir.path(), builder()).unwrap();
    assert_eq!(second.ensure_processed(&raw).unwrap(), 0);
    assert_eq!(second.len(), 4);
    assert_eq!(fs::read(second.record_path(2)).unwrap(), bytes);
    assert_eq!(second.load(2).unwrap(), record);

    // records follow raw file order
    let direct = builder().build(&load_raw_sample(&raw[2]).unwrap()).unwrap();
    assert_eq!(record, direct);
}

#[test]
fn test_forced_rebuild_matches() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path(), 3);

    let mut cache = DatasetCache::new(dir.path(), builder()).unwrap();
    cache.ensure_processed(&raw).unwrap();
    let before: Vec<_> = (0..3).map(|i| cache.load(i).unwrap()).collect();

    let mut forced = DatasetCache::new(dir.path(), builder())
        .unwrap()
        .with_force_reprocess(true);
    assert_eq!(forced.ensure_processed(&raw).unwrap(), 3);
    let after: Vec<_> = (0..3).map(|i| forced.load(i).unwrap()).collect();
    assert_eq!(before, after);
}

#[test]
fn test_split_over_cache() {
    let dir = TempDir::new().unwrap();
    let raw = write_raw(dir.path(), 10);
    let mut cache = DatasetCache::new(dir.path(), builder()).unwrap();
    cache.ensure_processed(&raw).unwrap();

    let split = SplitPolicy::Fixed {
        boundaries: [0, 7, 10],
    }
    .split(cache.len())
    .unwrap();
    for index in split.train.clone().chain(split.valid.clone()) {
        assert!(cache.load(index).is_ok());
    }

    let too_long = SplitPolicy::Fixed {
        boundaries: [0, 7, 11],
    }
    .split(cache.len());
    assert!(matches!(too_long, Err(HitIoError::InvalidSplit { .. })));
}

#[test]
fn test_missing_raw_dir() {
    let dir = TempDir::new().unwrap();
    let cache = DatasetCache::new(dir.path(), builder()).unwrap();
    assert!(matches!(cache.discover_raw(), Err(HitIoError::Path { .. })));
}
