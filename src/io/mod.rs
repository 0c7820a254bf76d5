//! Input and persistence
//!
//! Pitch-track interchange files, labeled corpus layout, per-clip feature
//! records and the signature store.

pub mod corpus;
pub mod feature_store;
pub mod pitch_track;
pub mod signature_store;
mod versioned;

pub use corpus::{scan_corpus, CorpusFile};
pub use feature_store::{load_clip_features, save_clip_features};
pub use pitch_track::{load_pitch_track, save_pitch_track, LabeledPitchTrack, PitchTrack};
pub use signature_store::{load_signature_set, save_signature_set};
