//! The structured descriptors returned to the caller (SPEC_FULL.md §3, §6).

use serde::{Deserialize, Serialize};

/// One rendered clip, referenced by the index and owned by the caller on return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipRecord {
    pub clip_id: u32,
    pub filename: String,
    pub path: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_s: u64,
    pub text: String,
    pub relevance_score: f64,
    pub reasoning: String,
}

/// Ordered list of successfully rendered clips. A clip that failed to render is
/// simply absent — rendering failures are local and never abort the request.
pub type ClipIndex = Vec<ClipRecord>;
