//! Core types for the narration engine

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Default blink cycle period
pub const BLINK_PERIOD: Duration = Duration::from_millis(4000);
/// Default time the eyes stay closed within a blink cycle
pub const BLINK_DURATION: Duration = Duration::from_millis(200);
/// Default mouth cycle period while talking
pub const MOUTH_PERIOD: Duration = Duration::from_millis(250);
/// Default time the mouth stays closed within a mouth cycle
pub const MOUTH_DURATION: Duration = Duration::from_millis(120);
/// Default render tick (20 FPS)
pub const RENDER_PERIOD: Duration = Duration::from_millis(50);
/// Default time an emotion stays on screen before it clears itself
pub const EMOTION_DELAY: Duration = Duration::from_millis(3000);

/// Error type for story catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A story index or document could not be read
    #[error("failed to fetch '{reference}': {source}")]
    Fetch {
        reference: String,
        #[source]
        source: io::Error,
    },
    /// A story index or document is not valid JSON for its format
    #[error("failed to parse '{reference}': {source}")]
    Parse {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
    /// Story selection outside of the loaded catalog
    #[error("story index {index} out of range (catalog holds {count})")]
    IndexOutOfRange { index: usize, count: usize },
}

/// Error type for audio transports
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("cannot open audio source '{source_ref}': {reason}")]
    Open { source_ref: String, reason: String },
    #[error("cannot decode audio source '{source_ref}': {reason}")]
    Decode { source_ref: String, reason: String },
    #[error("audio output is not available")]
    Disconnected,
}

/// Error type for narrator operations
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Audio(#[from] AudioError),
}

/// Result type for narrator operations
pub type NarrationResult<T> = Result<T, NarrationError>;

/// Convert fractional seconds to a duration. Negatives and NaN clamp to
/// zero, values too large for a `Duration` saturate.
pub fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
