//! Verification history entries and aggregate statistics

use serde::{Deserialize, Serialize};

use crate::{Content, ContentType, VerificationResult};

/// A verdict cached in local history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVerification {
    /// Content hash
    pub id: String,
    /// Truncated content (placeholder for images)
    pub content: String,
    pub content_type: ContentType,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub is_verified: bool,
    pub confidence_score: u8,
    pub ai_model_used: String,
    pub explanation: String,
}

impl StoredVerification {
    pub fn new(content: &Content, result: &VerificationResult, timestamp: i64) -> Self {
        Self {
            id: content.hash(),
            content: content.history_excerpt(),
            content_type: content.content_type(),
            timestamp,
            is_verified: result.is_verified,
            confidence_score: result.confidence_score,
            ai_model_used: result.ai_model_used.clone(),
            explanation: result.explanation.clone(),
        }
    }
}

/// Aggregate counts over a set of verdicts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total_verifications: usize,
    pub verified_content: usize,
    pub rejected_content: usize,
    /// Mean confidence, rounded to one decimal
    pub avg_confidence_score: f64,
}

pub fn calculate_stats(verifications: &[StoredVerification]) -> VerificationStats {
    if verifications.is_empty() {
        return VerificationStats::default();
    }

    let total = verifications.len();
    let verified = verifications.iter().filter(|v| v.is_verified).count();
    let confidence_sum: u64 = verifications.iter().map(|v| v.confidence_score as u64).sum();
    let avg = confidence_sum as f64 / total as f64;

    VerificationStats {
        total_verifications: total,
        verified_content: verified,
        rejected_content: total - verified,
        avg_confidence_score: (avg * 10.0).round() / 10.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(score: u8) -> StoredVerification {
        let content = Content::Text(format!("claim {}", score));
        let result = VerificationResult::from_score(score, "test", String::new());
        StoredVerification::new(&content, &result, 0)
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(calculate_stats(&[]), VerificationStats::default());
    }

    #[test]
    fn test_stats() {
        let stats = calculate_stats(&[entry(95), entry(37), entry(70)]);
        assert_eq!(stats.total_verifications, 3);
        assert_eq!(stats.verified_content, 2);
        assert_eq!(stats.rejected_content, 1);
        // 202 / 3 = 67.33
        assert_eq!(stats.avg_confidence_score, 67.3);
    }

    #[test]
    fn test_stored_entry_serializes_camel_case() {
        let json = serde_json::to_value(entry(80)).unwrap();
        assert_eq!(json["contentType"], "text");
        assert_eq!(json["confidenceScore"], 80);
        assert!(json["id"].as_str().unwrap().starts_with("0x"));
    }
}
