//! End-to-end session tests on a small synthetic hit dataset.

use std::fs;
use std::path::{Path, PathBuf};

use burn::backend::{Autodiff, NdArray};
use tempfile::TempDir;

use hitgraph_io::{save_raw_sample, PROCESSED_DIR, RAW_DIR};
use hitgraph_train::training::{checkpoint_exists, read_summaries, SUMMARIES_FILE};
use hitgraph_train::{HitTrainError, ModelKind, RunConfig, Session, SessionState};
use hitgraph_core::RawSample;

type TestBackend = Autodiff<NdArray>;

/// Three clusters of four points, labels 1..=3, shifted per sample.
fn write_dataset(root: &Path, count: usize) {
    let raw = root.join(RAW_DIR);
    fs::create_dir_all(&raw).unwrap();
    for s in 0..count {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for label in 1..=3i64 {
            for p in 0..4 {
                features.push(label as f32 * 10.0 + p as f32 * 0.3 + s as f32 * 0.01);
                features.push((p % 2) as f32 * 0.5 - s as f32 * 0.02);
                labels.push(label);
            }
        }
        let sample = RawSample::new(features, 2, labels).unwrap();
        save_raw_sample(&sample, raw.join(format!("event_{:03}.hit", s))).unwrap();
    }
}

fn small_config(root: &Path, output: PathBuf) -> RunConfig {
    RunConfig::debug(root)
        .with_output_dir(output)
        .with_hidden_dim(8)
        .with_n_iters(1)
        .with_epochs(1)
}

fn session(config: RunConfig) -> Session<TestBackend> {
    Session::new(config, Default::default()).unwrap()
}

#[test]
fn test_debug_dataset_split_and_reprocess() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let stale = dir.path().join(PROCESSED_DIR).join("stale.hgr");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, b"old cache").unwrap();

    let mut session = session(small_config(dir.path(), dir.path().join("out")));
    assert_eq!(session.state(), SessionState::Unconfigured);

    let splits = session.get_dataset().unwrap();
    assert_eq!(splits.full.len(), 10);
    assert_eq!(splits.train.indices(), 0..7);
    assert_eq!(splits.valid.indices(), 7..10);
    assert!(!stale.exists());
    assert_eq!(session.state(), SessionState::DatasetLoaded);
}

#[test]
fn test_proportional_split() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);

    let config = RunConfig::production(dir.path()).with_output_dir(dir.path().join("out"));
    let mut session = session(config);
    let splits = session.get_dataset().unwrap();
    assert_eq!(splits.train.indices(), 0..8);
    assert_eq!(splits.valid.indices(), 8..10);
}

#[test]
fn test_missing_dataset_path() {
    let dir = TempDir::new().unwrap();
    let mut session = session(small_config(
        &dir.path().join("absent"),
        dir.path().join("out"),
    ));
    assert!(matches!(
        session.get_dataset(),
        Err(HitTrainError::Path { .. })
    ));
    assert_eq!(session.state(), SessionState::Unconfigured);
}

#[test]
fn test_train_evaluate_finish() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let output = dir.path().join("out");
    let mut session = session(small_config(dir.path(), output.clone()));

    let summary = session.train().unwrap();
    assert_eq!(summary.epochs.len(), 1);
    assert_eq!(session.state(), SessionState::Training);

    let epoch = summary.last().unwrap();
    assert_eq!(epoch.epoch, 1);
    assert!(epoch.train_loss.unwrap().is_finite());
    assert!(epoch.valid_loss.is_some());

    let checkpoint = summary.last_checkpoint.clone().unwrap();
    assert!(checkpoint_exists(&checkpoint));
    let name = checkpoint.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("model_checkpoint_EdgeNetWithCategories_"));
    assert!(name.ends_with("_hitgraph_001"));

    let history = read_summaries(&output.join(SUMMARIES_FILE)).unwrap();
    assert_eq!(history.len(), 1);

    let eval = session.evaluate().unwrap();
    assert_eq!(session.state(), SessionState::Evaluating);
    let indices: Vec<usize> = eval.samples.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![7, 8, 9]);
    assert!(eval.accuracy.is_some());

    // training again continues the epoch count
    let again = session.train().unwrap();
    assert_eq!(again.last().unwrap().epoch, 2);
    assert_eq!(session.trainer().unwrap().history().len(), 2);

    session.finish();
    assert!(matches!(
        session.train(),
        Err(HitTrainError::InvalidState { .. })
    ));
    assert!(matches!(
        session.evaluate(),
        Err(HitTrainError::InvalidState { .. })
    ));
}

#[test]
fn test_eval_truncates_validation() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let config = small_config(dir.path(), dir.path().join("out")).with_eval_samples(2);

    let mut session = session(config);
    let eval = session.evaluate().unwrap();
    assert_eq!(eval.samples.len(), 2);
    assert_eq!(eval.samples[0].index, 7);
}

#[test]
fn test_checkpoint_resume_and_mismatch() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let output = dir.path().join("out");

    let checkpoint = {
        let mut first = session(small_config(dir.path(), output.clone()));
        first.train().unwrap().last_checkpoint.unwrap()
    };

    let resume = small_config(dir.path(), output.clone())
        .with_force_reprocess(false)
        .with_load_checkpoint(Some(checkpoint.clone()));
    let mut resumed = session(resume);
    assert_eq!(resumed.get_trainer().unwrap().epoch(), 1);
    let summary = resumed.train().unwrap();
    assert_eq!(summary.last().unwrap().epoch, 2);

    let mismatched = small_config(dir.path(), output)
        .with_force_reprocess(false)
        .with_hidden_dim(16)
        .with_load_checkpoint(Some(checkpoint));
    let mut broken = session(mismatched);
    assert!(matches!(
        broken.get_trainer(),
        Err(HitTrainError::Checkpoint { .. })
    ));
    assert_eq!(broken.state(), SessionState::DatasetLoaded);
}

#[test]
fn test_trainer_memo_and_clear_cache() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let mut session = session(small_config(dir.path(), dir.path().join("out")));

    let params = session.build_trainer(4, 2).unwrap().num_params();
    assert_eq!(session.state(), SessionState::TrainerBuilt);

    // later calls return the first trainer whatever the arguments
    assert_eq!(session.build_trainer(7, 2).unwrap().num_params(), params);
    assert_eq!(session.get_trainer().unwrap().num_params(), params);

    session.clear_cache();
    assert_eq!(session.state(), SessionState::Unconfigured);
    assert!(session.trainer().is_none());

    let rebuilt = session.build_trainer(7, 2).unwrap().num_params();
    assert_ne!(rebuilt, params);
}

#[test]
fn test_point_cloud_model() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let config = small_config(dir.path(), dir.path().join("out")).with_model(ModelKind::PointCloudNet);

    let mut session = session(config);
    assert_eq!(
        session.get_trainer().unwrap().kind(),
        ModelKind::PointCloudNet
    );
    let summary = session.train().unwrap();
    assert!(summary.last().unwrap().train_loss.unwrap().is_finite());
    assert_eq!(session.evaluate().unwrap().samples.len(), 3);
}

#[test]
fn test_norm_must_match_features() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path(), 10);
    let config = small_config(dir.path(), dir.path().join("out"))
        .with_norm(Some(vec![0.1, 0.1, 0.1]));

    let mut session = session(config);
    assert!(matches!(
        session.get_trainer(),
        Err(HitTrainError::InvalidConfig { .. })
    ));
}
