//! Confusable raga pairs
//!
//! Some ragas share their scale and differ mainly in how notes are
//! approached. When two such ragas finish first and second by a narrow
//! margin, the ranking is recomputed with dyad-heavy weights.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Symmetric relation between raga labels known to be confused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiblingPairs {
    pairs: BTreeSet<(String, String)>,
}

impl SiblingPairs {
    /// Empty relation
    pub fn new() -> Self {
        Self {
            pairs: BTreeSet::new(),
        }
    }

    /// Register `a` and `b` as siblings (order does not matter)
    pub fn with_pair(mut self, a: &str, b: &str) -> Self {
        self.insert(a, b);
        self
    }

    /// Register `a` and `b` as siblings; a label is never its own sibling
    pub fn insert(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        self.pairs.insert((lo.to_string(), hi.to_string()));
    }

    /// True if `a` and `b` are registered siblings, in either order
    pub fn are_siblings(&self, a: &str, b: &str) -> bool {
        self.pairs.iter().any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    /// Number of registered pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no pair is registered
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for SiblingPairs {
    /// Kalyani and Shankarabharanam
    fn default() -> Self {
        Self::new().with_pair("Kalyani", "Shankarabharanam")
    }
}
