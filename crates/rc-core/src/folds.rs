//! Stratified k-fold assignment.
//!
//! Each class's row indices are shuffled with a seeded RNG and dealt
//! round-robin across folds, continuing the deal position from one class to
//! the next. Every fold therefore holds either ⌊n_c/K⌋ or ⌈n_c/K⌉ rows of
//! each class c, and fold sizes differ by at most one.

use rc_common::labels::{Label, NEGATIVE, POSITIVE};
use rc_common::{Error, Result};
use rc_config::FoldConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

/// Seeded stratified fold assigner.
#[derive(Debug, Clone)]
pub struct FoldAssigner {
    folds: usize,
    shuffle: bool,
    seed: u64,
}

impl FoldAssigner {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self {
            folds,
            shuffle: true,
            seed,
        }
    }

    pub fn from_config(cfg: &FoldConfig) -> Self {
        Self {
            folds: cfg.count,
            shuffle: cfg.shuffle,
            seed: cfg.seed,
        }
    }

    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Assign a fold id in `1..=K` to every row.
    ///
    /// Only the labels drive the split. Fails with `Dataset` on a label other
    /// than 0 or 1, and with `InsufficientSamples` if a class has fewer than K
    /// members.
    pub fn assign(&self, labels: &[Label]) -> Result<FoldAssignment> {
        if self.folds < 2 {
            return Err(Error::Config(format!(
                "fold count must be at least 2, got {}",
                self.folds
            )));
        }

        if let Some(i) = labels.iter().position(|&l| l != NEGATIVE && l != POSITIVE) {
            return Err(Error::Dataset {
                row: i + 1,
                message: format!("label {} is not binary", labels[i]),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut ids = vec![0usize; labels.len()];
        let mut position = 0usize;

        for class in [NEGATIVE, POSITIVE] {
            let mut members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == class)
                .map(|(i, _)| i)
                .collect();
            if members.len() < self.folds {
                return Err(Error::InsufficientSamples {
                    class,
                    count: members.len(),
                    folds: self.folds,
                });
            }
            if self.shuffle {
                members.shuffle(&mut rng);
            }
            for idx in members {
                ids[idx] = position % self.folds + 1;
                position += 1;
            }
        }

        debug!(folds = self.folds, rows = labels.len(), "folds assigned");
        Ok(FoldAssignment {
            ids,
            folds: self.folds,
        })
    }
}

/// Fold id per row, ids in `1..=K`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldAssignment {
    ids: Vec<usize>,
    folds: usize,
}

impl FoldAssignment {
    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Row indices held out in `fold`.
    pub fn held_out(&self, fold: usize) -> Vec<usize> {
        self.ids
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f == fold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Row indices used for training when `fold` is held out.
    pub fn training(&self, fold: usize) -> Vec<usize> {
        self.ids
            .iter()
            .enumerate()
            .filter(|&(_, &f)| f != fold)
            .map(|(i, _)| i)
            .collect()
    }

    /// Rows per fold, index 0 = fold 1.
    pub fn fold_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.folds];
        for &f in &self.ids {
            sizes[f - 1] += 1;
        }
        sizes
    }
}
