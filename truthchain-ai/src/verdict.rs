//! Parsing of model responses into verdicts

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use truthchain_core::{VerificationResult, MAX_SCORE};

use crate::backend::LlmError;

/// Outermost JSON object in a response, greedy across lines
static JSON_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Verdict as returned by a remote model
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteVerdict {
    pub is_verified: bool,
    pub confidence_score: f64,
    #[serde(default)]
    pub explanation: String,
}

impl RemoteVerdict {
    /// Confidence clamped and rounded to 0 - 100
    pub fn score(&self) -> u8 {
        if self.confidence_score.is_nan() {
            return 0;
        }
        self.confidence_score.round().clamp(0.0, MAX_SCORE as f64) as u8
    }

    /// Keep the model's own verified flag alongside the clamped score
    pub fn into_result(self, model: String) -> VerificationResult {
        VerificationResult {
            is_verified: self.is_verified,
            confidence_score: self.score(),
            ai_model_used: model,
            explanation: self.explanation,
            source_url: None,
        }
    }
}

/// Extract and deserialize the JSON verdict embedded in a model response
pub fn parse_verdict(response: &str) -> Result<RemoteVerdict, LlmError> {
    let block = JSON_BLOCK
        .find(response)
        .ok_or_else(|| LlmError::Malformed("no JSON object in response".to_string()))?;

    serde_json::from_str(block.as_str()).map_err(|e| LlmError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let verdict =
            parse_verdict(r#"{"isVerified": true, "confidenceScore": 88, "explanation": "ok"}"#)
                .unwrap();
        assert!(verdict.is_verified);
        assert_eq!(verdict.score(), 88);
        assert_eq!(verdict.explanation, "ok");
    }

    #[test]
    fn test_parse_prose_wrapped_json() {
        let response = "Here is my analysis:\n```json\n{\n  \"isVerified\": false,\n  \"confidenceScore\": 22,\n  \"explanation\": \"No evidence {at all}.\"\n}\n```\nHope this helps.";
        let verdict = parse_verdict(response).unwrap();
        assert!(!verdict.is_verified);
        assert_eq!(verdict.score(), 22);
        assert_eq!(verdict.explanation, "No evidence {at all}.");
    }

    #[test]
    fn test_confidence_clamped() {
        let high = parse_verdict(r#"{"isVerified": true, "confidenceScore": 140}"#).unwrap();
        assert_eq!(high.score(), 100);
        let low = parse_verdict(r#"{"isVerified": false, "confidenceScore": -5}"#).unwrap();
        assert_eq!(low.score(), 0);
        let fractional = parse_verdict(r#"{"isVerified": true, "confidenceScore": 72.6}"#).unwrap();
        assert_eq!(fractional.score(), 73);
    }

    #[test]
    fn test_malformed_responses() {
        assert!(matches!(
            parse_verdict("I cannot verify this."),
            Err(LlmError::Malformed(_))
        ));
        assert!(matches!(
            parse_verdict(r#"{"verdict": "true"}"#),
            Err(LlmError::Malformed(_))
        ));
    }

    #[test]
    fn test_into_result() {
        let verdict = parse_verdict(r#"{"isVerified": true, "confidenceScore": 91, "explanation": "Well sourced."}"#)
            .unwrap();
        let result = verdict.into_result("Google Gemini 2.0 Flash".to_string());
        assert!(result.is_verified);
        assert_eq!(result.confidence_score, 91);
        assert_eq!(result.ai_model_used, "Google Gemini 2.0 Flash");
    }
}
