//! Session orchestration: memoized dataset and trainer, and the train/evaluate lifecycle.

mod memo;
mod orchestrator;

pub use memo::{clear_all, Memo, MemoState, Resettable};
pub use orchestrator::{
    create_trainer, load_dataset, DatasetSplits, Session, SessionState, SessionTrainer,
};
