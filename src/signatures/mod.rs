//! Raga signatures
//!
//! Per-raga reference statistics built from a labeled corpus:
//! - Element-wise mean/std of PCD and dyad matrices
//! - Schema and gating guardrails with counted rejections
//! - Run metadata for reproducible recognition

pub mod aggregator;
pub mod signature;
pub mod statistics;

pub use aggregator::SignatureAggregator;
pub use signature::{AggregationCounts, AggregationMetadata, RagaSignature, SignatureSet};
