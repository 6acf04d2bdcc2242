//! Verification verdicts
//!
//! A verdict is produced fresh for every piece of submitted content and never
//! mutated afterwards. The serialized form uses camelCase keys, the same shape
//! the remote models are asked to answer with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{MAX_SCORE, VERIFIED_THRESHOLD};

/// Kinds of content that can be submitted for verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Image,
    Url,
}

impl ContentType {
    /// Wire and on-chain name
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::Url => "url",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Text => "Text",
            ContentType::Image => "Image",
            ContentType::Url => "URL",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentType::Text),
            "image" => Ok(ContentType::Image),
            "url" => Ok(ContentType::Url),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// Outcome of verifying one piece of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Whether the content is judged credible/authentic
    pub is_verified: bool,
    /// Confidence score (0 - 100)
    pub confidence_score: u8,
    /// Model or heuristic that produced the verdict
    pub ai_model_used: String,
    /// Human-readable reasoning
    pub explanation: String,
    /// Source URL, when the content was a link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl VerificationResult {
    /// Build a verdict whose verified flag follows the score threshold
    pub fn from_score(score: u8, model: &str, explanation: String) -> Self {
        let score = score.min(MAX_SCORE);
        Self {
            is_verified: is_verified_score(score),
            confidence_score: score,
            ai_model_used: model.to_string(),
            explanation,
            source_url: None,
        }
    }

    /// Zero-confidence, unverified verdict
    pub fn rejected(model: &str, explanation: &str) -> Self {
        Self {
            is_verified: false,
            confidence_score: 0,
            ai_model_used: model.to_string(),
            explanation: explanation.to_string(),
            source_url: None,
        }
    }

    pub fn with_source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }
}

/// Verification threshold shared by every scoring path
pub fn is_verified_score(score: u8) -> bool {
    score >= VERIFIED_THRESHOLD
}

/// A ranked label from an image classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLabel {
    pub label: String,
    /// Probability (0.0 - 1.0)
    pub score: f64,
}

impl ClassLabel {
    pub fn new(label: &str, score: f64) -> Self {
        Self {
            label: label.to_string(),
            score: score.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        assert!(!is_verified_score(69));
        assert!(is_verified_score(70));
        assert!(is_verified_score(100));
    }

    #[test]
    fn test_from_score_caps_at_hundred() {
        let result = VerificationResult::from_score(140, "test", String::new());
        assert_eq!(result.confidence_score, 100);
        assert!(result.is_verified);
    }

    #[test]
    fn test_camel_case_serialization() {
        let result = VerificationResult::from_score(72, "Pattern Analysis", "ok".to_string());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isVerified"], true);
        assert_eq!(json["confidenceScore"], 72);
        assert_eq!(json["aiModelUsed"], "Pattern Analysis");
        assert!(json.get("sourceUrl").is_none());
    }

    #[test]
    fn test_content_type_parse() {
        assert_eq!("URL".parse::<ContentType>().unwrap(), ContentType::Url);
        assert_eq!(ContentType::Image.to_string(), "image");
        assert!("video".parse::<ContentType>().is_err());
    }
}
