//! Bounded per-node scores for one scheduling attempt.
//!
//! Every node starts at [`DEFAULT_SCORE`]. Stages raise or lower it within
//! `[MIN_SCORE, MAX_SCORE]` or disable the node for the rest of the attempt.

use std::cmp::Reverse;

use dashmap::DashMap;
use serde::Serialize;

use crate::errors::ScoreError;

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 100;
pub const DEFAULT_SCORE: u8 = 20;

/// Desirability of a node. `Disabled` orders below every scored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Score {
    Disabled,
    Scored(u8),
}

impl Score {
    pub fn value(&self) -> Option<u8> {
        match self {
            Score::Disabled => None,
            Score::Scored(v) => Some(*v),
        }
    }
}

/// Node name to [`Score`] map, safe to mutate and read from several tasks.
#[derive(Debug, Clone, Default)]
pub struct ScoreMap {
    scores: DashMap<String, Score>,
}

impl ScoreMap {
    /// Seeds every node at [`DEFAULT_SCORE`].
    pub fn new<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scores: nodes
                .into_iter()
                .map(|n| (n.into(), Score::Scored(DEFAULT_SCORE)))
                .collect(),
        }
    }

    pub fn get(&self, node: &str) -> Result<Score, ScoreError> {
        self.scores
            .get(node)
            .map(|s| *s)
            .ok_or_else(|| ScoreError::NotFound(node.to_string()))
    }

    /// Adds `delta` and clamps into range. Returns the new score.
    pub fn add(&self, node: &str, delta: i64) -> Result<u8, ScoreError> {
        let mut entry = self
            .scores
            .get_mut(node)
            .ok_or_else(|| ScoreError::NotFound(node.to_string()))?;
        match *entry {
            Score::Disabled => Err(ScoreError::Disabled(node.to_string())),
            Score::Scored(current) => {
                let next = i64::from(current)
                    .saturating_add(delta)
                    .clamp(i64::from(MIN_SCORE), i64::from(MAX_SCORE)) as u8;
                *entry = Score::Scored(next);
                Ok(next)
            }
        }
    }

    /// Overwrites the score. Values outside the range are rejected, never clamped.
    pub fn set(&self, node: &str, value: i64) -> Result<(), ScoreError> {
        if value < i64::from(MIN_SCORE) || value > i64::from(MAX_SCORE) {
            return Err(ScoreError::OutOfRange(value));
        }
        let mut entry = self
            .scores
            .get_mut(node)
            .ok_or_else(|| ScoreError::NotFound(node.to_string()))?;
        if *entry == Score::Disabled {
            return Err(ScoreError::Disabled(node.to_string()));
        }
        *entry = Score::Scored(value as u8);
        Ok(())
    }

    /// Disables the node for the lifetime of this map. Repeated calls succeed.
    pub fn disable(&self, node: &str) -> Result<(), ScoreError> {
        let mut entry = self
            .scores
            .get_mut(node)
            .ok_or_else(|| ScoreError::NotFound(node.to_string()))?;
        *entry = Score::Disabled;
        Ok(())
    }

    pub fn is_disabled(&self, node: &str) -> bool {
        matches!(self.scores.get(node).as_deref(), Some(Score::Disabled))
    }

    /// Node names in lexicographic order.
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.scores.iter().map(|e| e.key().clone()).collect();
        nodes.sort();
        nodes
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Highest scored node. Ties go to the lexicographically smallest name.
    /// `None` when the map is empty or every node is disabled.
    pub fn select_best(&self) -> Option<(String, u8)> {
        self.scores
            .iter()
            .filter_map(|e| e.value().value().map(|v| (e.key().clone(), v)))
            .min_by(|(a_name, a), (b_name, b)| b.cmp(a).then_with(|| a_name.cmp(b_name)))
    }

    /// Snapshot sorted by score, lowest first. Equal scores are ordered by name.
    pub fn list_ascending(&self) -> Vec<(String, Score)> {
        let mut list = self.snapshot();
        list.sort_by(|(a_name, a), (b_name, b)| a.cmp(b).then_with(|| a_name.cmp(b_name)));
        list
    }

    /// Snapshot sorted by score, highest first. Equal scores are ordered by name.
    pub fn list_descending(&self) -> Vec<(String, Score)> {
        let mut list = self.snapshot();
        list.sort_by_key(|(name, score)| (Reverse(*score), name.clone()));
        list
    }

    fn snapshot(&self) -> Vec<(String, Score)> {
        self.scores
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }
}
