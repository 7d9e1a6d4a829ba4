use serde::{Deserialize, Serialize};

/// Outcome of scanning an audio clip for a sustained loud vocal episode.
///
/// When `present` is false every optional field is `None`, which serializes
/// as explicit `null`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoutDetection {
    pub present: bool,
    pub start_ms: Option<u64>,
    pub end_ms: Option<u64>,
    pub peak_dbfs: Option<f64>,
    pub confidence: Option<f64>,
}

impl ShoutDetection {
    /// The "nothing found" shape.
    pub fn absent() -> Self {
        Self {
            present: false,
            start_ms: None,
            end_ms: None,
            peak_dbfs: None,
            confidence: None,
        }
    }

    /// A detected episode.
    pub fn detected(start_ms: u64, end_ms: u64, peak_dbfs: f64, confidence: f64) -> Self {
        Self {
            present: true,
            start_ms: Some(start_ms),
            end_ms: Some(end_ms),
            peak_dbfs: Some(peak_dbfs),
            confidence: Some(confidence),
        }
    }
}

impl Default for ShoutDetection {
    fn default() -> Self {
        Self::absent()
    }
}
