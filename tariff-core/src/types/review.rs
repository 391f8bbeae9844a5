//! `NeedsReviewQueue` — durable queue of failed verifications (spec.md
//! §3, §4.6, C11).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::program::Metal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewStatus {
    Pending,
    Resolved,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsReviewEntry {
    pub id: String,
    pub hts_code: String,
    pub query_type: String,
    pub material: Option<Metal>,
    pub reader_output: Option<String>,
    pub validator_output: Option<String>,
    pub block_reason: String,
    pub block_details: String,
    pub status: ReviewStatus,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
}
