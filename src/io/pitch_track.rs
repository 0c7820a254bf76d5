//! Pitch-track input from an external pitch tracker
//!
//! A pitch track is a per-frame fundamental-frequency sequence (Hz, `NaN` for
//! unvoiced frames) plus a parallel voiced flag at a fixed frame rate. JSON
//! files store unvoiced pitch as `null`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;

/// Per-frame pitch and voicing produced by an external pitch tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchTrack {
    /// Frames per second of the pitch tracker (sample rate / hop size)
    frame_rate_hz: f32,

    /// Pitch per frame in Hz; `NaN` for unvoiced frames
    #[serde(with = "nan_as_null")]
    pitch_hz: Vec<f32>,

    /// Voiced flag per frame
    voiced: Vec<bool>,
}

impl PitchTrack {
    /// Create a pitch track from parallel pitch and voiced-flag sequences
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the sequences differ in length or the frame
    /// rate is not a positive finite number.
    pub fn new(
        pitch_hz: Vec<f32>,
        voiced: Vec<bool>,
        frame_rate_hz: f32,
    ) -> Result<Self, RecognitionError> {
        if pitch_hz.len() != voiced.len() {
            return Err(RecognitionError::InvalidInput(format!(
                "pitch ({}) and voiced flag ({}) lengths differ",
                pitch_hz.len(),
                voiced.len()
            )));
        }
        if !(frame_rate_hz.is_finite() && frame_rate_hz > 0.0) {
            return Err(RecognitionError::InvalidInput(format!(
                "frame rate must be positive, got {}",
                frame_rate_hz
            )));
        }
        Ok(Self {
            frame_rate_hz,
            pitch_hz,
            voiced,
        })
    }

    /// Create a pitch track whose voiced flag is derived from the pitch itself
    pub fn from_pitch(pitch_hz: Vec<f32>, frame_rate_hz: f32) -> Result<Self, RecognitionError> {
        let voiced = pitch_hz.iter().map(|p| p.is_finite() && *p > 0.0).collect();
        Self::new(pitch_hz, voiced, frame_rate_hz)
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.pitch_hz.len()
    }

    /// True if the track has no frames
    pub fn is_empty(&self) -> bool {
        self.pitch_hz.is_empty()
    }

    /// Frames per second
    pub fn frame_rate_hz(&self) -> f32 {
        self.frame_rate_hz
    }

    /// Track duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.len() as f32 / self.frame_rate_hz
    }

    /// Raw per-frame pitch in Hz
    pub fn pitch_hz(&self) -> &[f32] {
        &self.pitch_hz
    }

    /// Raw per-frame voiced flag
    pub fn voiced_flags(&self) -> &[bool] {
        &self.voiced
    }

    /// True if frame `i` is flagged voiced and carries a finite positive pitch
    pub fn is_usable(&self, i: usize) -> bool {
        self.voiced[i] && self.pitch_hz[i].is_finite() && self.pitch_hz[i] > 0.0
    }

    /// Number of usable (voiced, finite pitch) frames
    pub fn voiced_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_usable(i)).count()
    }

    /// Pitch of every usable frame, in time order
    pub fn voiced_pitches(&self) -> Vec<f32> {
        (0..self.len())
            .filter(|&i| self.is_usable(i))
            .map(|i| self.pitch_hz[i])
            .collect()
    }

    /// Copy of the track cut to at most `max_duration_secs`
    pub fn truncated(&self, max_duration_secs: f32) -> Self {
        let max_frames = (max_duration_secs.max(0.0) * self.frame_rate_hz).floor() as usize;
        if max_frames >= self.len() {
            return self.clone();
        }
        log::debug!(
            "Truncating pitch track from {} to {} frames ({:.1}s cap)",
            self.len(),
            max_frames,
            max_duration_secs
        );
        Self {
            frame_rate_hz: self.frame_rate_hz,
            pitch_hz: self.pitch_hz[..max_frames].to_vec(),
            voiced: self.voiced[..max_frames].to_vec(),
        }
    }

    /// Re-run constructor checks on a deserialized track
    fn into_checked(self) -> Result<Self, RecognitionError> {
        Self::new(self.pitch_hz, self.voiced, self.frame_rate_hz)
    }
}

/// A pitch track with its raga label, as used for corpora
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPitchTrack {
    /// Clip identifier (usually the source file name)
    pub id: String,

    /// Raga label
    pub label: String,

    /// Pitch track
    pub track: PitchTrack,
}

/// Load a pitch track from a JSON file
///
/// # Errors
///
/// Returns `PersistenceError` if the file cannot be read or parsed and
/// `InvalidInput` if the decoded sequences are inconsistent.
pub fn load_pitch_track<P: AsRef<Path>>(path: P) -> Result<PitchTrack, RecognitionError> {
    let path = path.as_ref();
    log::debug!("Loading pitch track: {}", path.display());
    let data = fs::read_to_string(path)?;
    let track: PitchTrack = serde_json::from_str(&data)?;
    track.into_checked()
}

/// Save a pitch track as JSON
pub fn save_pitch_track<P: AsRef<Path>>(track: &PitchTrack, path: P) -> Result<(), RecognitionError> {
    let data = serde_json::to_string(track)?;
    fs::write(path, data)?;
    Ok(())
}

/// Serialize `NaN` pitch as JSON `null` and back
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
        let opts: Vec<Option<f32>> = values
            .iter()
            .map(|v| if v.is_finite() { Some(*v) } else { None })
            .collect();
        opts.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
        let opts: Vec<Option<f32>> = Vec::deserialize(deserializer)?;
        Ok(opts.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
    }
}
