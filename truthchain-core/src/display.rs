//! Formatting helpers for verdicts, hashes and addresses

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shorten an address to `0x1234...abcd`
pub fn format_address(address: &str) -> String {
    if address.len() < 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Shorten a content hash to its first 10 and last 8 characters
pub fn format_content_hash(hash: &str) -> String {
    if hash.len() < 10 || !hash.is_ascii() {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..10], &hash[hash.len().saturating_sub(8)..])
}

/// Coarse strength of a verdict, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Strong,
    Moderate,
    Weak,
    Doubtful,
    Suspect,
    Rejected,
}

impl ConfidenceBand {
    pub fn classify(score: u8, is_verified: bool) -> Self {
        if is_verified {
            match score {
                s if s > 85 => ConfidenceBand::Strong,
                s if s > 70 => ConfidenceBand::Moderate,
                _ => ConfidenceBand::Weak,
            }
        } else {
            match score {
                s if s < 30 => ConfidenceBand::Rejected,
                s if s < 50 => ConfidenceBand::Suspect,
                _ => ConfidenceBand::Doubtful,
            }
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfidenceBand::Strong => "strong",
            ConfidenceBand::Moderate => "moderate",
            ConfidenceBand::Weak => "weak",
            ConfidenceBand::Doubtful => "doubtful",
            ConfidenceBand::Suspect => "suspect",
            ConfidenceBand::Rejected => "rejected",
        };
        f.write_str(name)
    }
}
