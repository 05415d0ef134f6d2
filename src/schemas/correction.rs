use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Points awarded to one answer, with the question's point value supplied by
/// the caller as the ceiling the award is checked against.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct ScoreEntry {
    pub(crate) points: f64,
    pub(crate) max_points: f64,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CorrectionRequest {
    #[validate(length(min = 1, message = "at least one score entry is required"))]
    pub(crate) scores: HashMap<String, ScoreEntry>,
}
