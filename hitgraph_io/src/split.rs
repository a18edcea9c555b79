//! Positional train/validation splits.
//!
//! Splits never shuffle: the train block is a prefix and the validation block
//! follows it, so a split is fully determined by the dataset order.

use std::ops::Range;

use crate::error::{HitIoError, Result};

/// Default fraction of records held out for validation.
pub const DEFAULT_VALID_FRACTION: f64 = 0.2;

/// How to partition a dataset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitPolicy {
    /// `ceil(total * valid_fraction)` trailing records for validation, the rest for training.
    Proportional {
        /// Fraction in `[0, 1]`.
        valid_fraction: f64,
    },
    /// Explicit cumulative boundaries `[start, train_end, valid_end]`:
    /// train is `start..train_end`, validation `train_end..valid_end`.
    Fixed {
        /// Boundaries, non-decreasing and within the dataset length.
        boundaries: [usize; 3],
    },
}

impl Default for SplitPolicy {
    fn default() -> Self {
        SplitPolicy::Proportional {
            valid_fraction: DEFAULT_VALID_FRACTION,
        }
    }
}

/// A pair of disjoint index ranges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    /// Training indices.
    pub train: Range<usize>,
    /// Validation indices.
    pub valid: Range<usize>,
}

impl Split {
    /// Training indices as a vector.
    pub fn train_indices(&self) -> Vec<usize> {
        self.train.clone().collect()
    }

    /// Validation indices as a vector.
    pub fn valid_indices(&self) -> Vec<usize> {
        self.valid.clone().collect()
    }
}

impl SplitPolicy {
    /// Partition `total` records.
    ///
    /// # Errors
    /// `InvalidSplit` for a fraction outside `[0, 1]` or boundaries that are
    /// decreasing or exceed `total`.
    pub fn split(&self, total: usize) -> Result<Split> {
        match *self {
            SplitPolicy::Proportional { valid_fraction } => {
                if !(0.0..=1.0).contains(&valid_fraction) {
                    return Err(HitIoError::InvalidSplit {
                        message: format!("validation fraction {} not in [0, 1]", valid_fraction),
                    });
                }
                let valid_len = ((total as f64) * valid_fraction).ceil() as usize;
                let valid_len = valid_len.min(total);
                let train_end = total - valid_len;
                Ok(Split {
                    train: 0..train_end,
                    valid: train_end..total,
                })
            }
            SplitPolicy::Fixed {
                boundaries: [start, train_end, valid_end],
            } => {
                if start > train_end || train_end > valid_end {
                    return Err(HitIoError::InvalidSplit {
                        message: format!(
                            "boundaries [{}, {}, {}] are not non-decreasing",
                            start, train_end, valid_end
                        ),
                    });
                }
                if valid_end > total {
                    return Err(HitIoError::InvalidSplit {
                        message: format!(
                            "boundary {} exceeds dataset length {}",
                            valid_end, total
                        ),
                    });
                }
                Ok(Split {
                    train: start..train_end,
                    valid: train_end..valid_end,
                })
            }
        }
    }
}

/// Split `total` records with the proportional rule.
pub fn split(total: usize, valid_fraction: f64) -> Result<Split> {
    SplitPolicy::Proportional { valid_fraction }.split(total)
}
