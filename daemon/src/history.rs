//! Bounded per-metric history

use crate::error::StatsError;
use crate::stats::{self, StatDigest};
use std::collections::VecDeque;

/// Time-ordered values of one metric, oldest first, holding at most
/// `depth` entries.
#[derive(Debug, Clone)]
pub struct History {
    depth: usize,
    values: VecDeque<f64>,
}

impl History {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            depth,
            values: VecDeque::with_capacity(depth),
        }
    }

    /// Append a value, dropping the oldest one when full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.depth {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Values from oldest to latest.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn digest(&self) -> Result<StatDigest, StatsError> {
        match self.values.as_slices() {
            (front, []) => stats::digest(front),
            _ => stats::digest(&self.values().collect::<Vec<_>>()),
        }
    }
}
