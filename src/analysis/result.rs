//! Recognition result types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::tonic::TonicEstimate;

/// Verdict text emitted when the engine abstains
pub const UNKNOWN_VERDICT: &str = "UNKNOWN/LOW CONFIDENCE";

/// Score of one candidate raga
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Raga label
    pub label: String,

    /// PCD similarity to the signature mean
    pub pcd_similarity: f32,

    /// Dyad similarity (mean of up and down)
    pub dyad_similarity: f32,

    /// Weighted PCD + dyad similarity
    pub raw_score: f32,

    /// Raw score after genericness / sparse-transition shaping
    pub final_score: f32,

    /// Genericness index of the query
    pub genericness_index: f32,

    /// Stable transitions in the query
    pub transition_count: usize,

    /// Gating ratio of the query
    pub gating_ratio: f32,
}

/// Why the engine declined to name a raga
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbstentionReason {
    /// Top-2 margin below the hard floor
    NarrowLead,
    /// Top-2 margin below the soft floor and a flat 2-3 gap
    FlatTop,
    /// The stability gate kept no frame
    EmptyFeatures,
    /// No signature to compare against
    NoCandidates,
}

/// Final decision for a query clip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Confident match
    Raga(String),
    /// No confident match
    Unknown(AbstentionReason),
}

impl Verdict {
    /// Matched label, if any
    pub fn label(&self) -> Option<&str> {
        match self {
            Verdict::Raga(label) => Some(label),
            Verdict::Unknown(_) => None,
        }
    }

    /// True for an abstention
    pub fn is_unknown(&self) -> bool {
        matches!(self, Verdict::Unknown(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Raga(label) => f.write_str(label),
            Verdict::Unknown(_) => f.write_str(UNKNOWN_VERDICT),
        }
    }
}

/// Conditions worth surfacing alongside a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionFlag {
    /// Too few transitions to trust dyads; uniform discount applied
    SparseTransitions,
    /// Top-2 were siblings; ranking recomputed with escalated weights
    SiblingEscalation,
}

/// Ranked candidates and verdict for one query clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionOutcome {
    /// Candidates by descending final score, ties by label
    pub ranking: Vec<CandidateScore>,

    /// Raga label or abstention
    pub verdict: Verdict,

    /// Genericness index of the query
    pub genericness_index: f32,

    /// Stable transitions in the query
    pub transitions: usize,

    /// Gating ratio of the query
    pub gating_ratio: f32,

    /// `score[0] - score[1]` (`None` with fewer than two candidates)
    pub margin_12: Option<f32>,

    /// `score[1] - score[2]` (`None` with fewer than three candidates)
    pub margin_23: Option<f32>,

    /// True if sibling escalation replaced the default ranking
    pub escalated: bool,

    /// Tonic estimate, when the engine estimated it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tonic: Option<TonicEstimate>,

    /// Flags raised during recognition
    pub flags: Vec<RecognitionFlag>,
}

impl RecognitionOutcome {
    /// Highest-ranked candidate, regardless of abstention
    pub fn top(&self) -> Option<&CandidateScore> {
        self.ranking.first()
    }
}
