//! On-chain record types

use serde::{Deserialize, Serialize};

use truthchain_core::{ContentType, VerificationResult};

/// A verdict as stored by the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    /// Account that submitted the verdict
    pub verifier: String,
    /// Block time in unix seconds, 0 when never recorded
    pub timestamp: u64,
    pub is_verified: bool,
    pub confidence_score: u8,
    pub content_type: String,
    pub ai_model_used: String,
}

impl VerificationRecord {
    pub fn exists(&self) -> bool {
        self.timestamp > 0
    }
}

/// Arguments of a ledger write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRequest {
    pub content_hash: String,
    pub is_verified: bool,
    pub confidence_score: u8,
    pub content_type: ContentType,
    pub ai_model_used: String,
}

impl RecordRequest {
    pub fn new(content_hash: &str, content_type: ContentType, result: &VerificationResult) -> Self {
        Self {
            content_hash: content_hash.to_string(),
            is_verified: result.is_verified,
            confidence_score: result.confidence_score,
            content_type,
            ai_model_used: result.ai_model_used.clone(),
        }
    }
}
