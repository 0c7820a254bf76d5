//! Recognition and evaluation modules
//!
//! Compares one clip's features against every raga signature:
//! - Similarity measures and genericness index
//! - Candidate scoring and sibling escalation
//! - Confidence shaping and abstention
//! - Result types
//! - Batch evaluation

pub mod confidence;
pub mod engine;
pub mod evaluation;
pub mod genericness;
pub mod result;
pub mod scoring;
pub mod siblings;
pub mod similarity;

pub use confidence::decide_verdict;
pub use engine::RecognitionEngine;
pub use evaluation::{evaluate_corpus, EvaluationReport, EvaluationRow, EvaluationSummary};
pub use genericness::genericness_index;
pub use result::{AbstentionReason, CandidateScore, RecognitionFlag, RecognitionOutcome, Verdict};
pub use siblings::SiblingPairs;
