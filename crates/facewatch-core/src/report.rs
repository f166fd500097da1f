//! Turn a face's best score into the reported [`MatchResult`].

use crate::config::Threshold;
use crate::scorer::clamp_confidence;
use crate::types::{FaceBox, MatchResult};

/// Round to two decimal places (half away from zero).
pub fn round_confidence(value: f32) -> f32 {
    ((value as f64 * 100.0).round() / 100.0) as f32
}

/// Build the result for one face.
///
/// `best` is the winning gallery identity, if any entry was scored. The face is
/// matched only when an identity exists and the clamped confidence is strictly
/// above `threshold`. Threshold comparison happens before rounding.
pub fn assemble(
    face: FaceBox,
    best: Option<&str>,
    confidence: f32,
    threshold: Threshold,
) -> MatchResult {
    let clamped = clamp_confidence(confidence);
    let rounded = round_confidence(clamped);
    match best {
        Some(identity) if threshold.is_exceeded_by(clamped) => MatchResult::Matched {
            identity: identity.to_string(),
            confidence: rounded,
            face,
        },
        _ => MatchResult::Unmatched {
            confidence: rounded,
            face,
        },
    }
}
