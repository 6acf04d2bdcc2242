//! Weighted pattern rules for text credibility
//!
//! Two disjoint rule tables are evaluated against the submitted text:
//! - Credibility markers (citations, samples, institutions) add to the score
//! - Misinformation indicators (sensationalism, miracle claims) subtract
//!
//! Every matching rule applies. Table order only decides which names are
//! listed first in the explanation.

use regex::Regex;
use std::sync::LazyLock;

use crate::{VerificationResult, BASELINE_SCORE, MAX_SCORE};

/// Model label reported for pattern-based text verdicts
pub const TEXT_FALLBACK_MODEL: &str = "Pattern Analysis (fallback)";

/// A weighted pattern rule
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub weight: i32,
    pub name: &'static str,
}

impl Rule {
    fn new(pattern: &str, weight: i32, name: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            weight,
            name,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

// Credibility markers, in explanation order
pub static CREDIBILITY_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            r"(?i)according to (a study|research|report) (published|conducted) (by|in) ([A-Z][a-z]+ ?)+",
            15,
            "Specific citation",
        ),
        Rule::new(r"(?i)published in ([A-Z][a-z]+ ?)+", 10, "Publication mention"),
        Rule::new(
            r"(?i)(study|research|survey) (of|with|involving) \d[,\d]* (participants|people|subjects)",
            10,
            "Research sample",
        ),
        Rule::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b", 5, "Contains dates"),
        Rule::new(r"(?i)university|institute|laboratory|academy", 5, "Academic institution"),
        Rule::new(r"(?i)\b(percent|percentage|\d+%)\b", 5, "Contains statistics"),
    ]
});

// Misinformation indicators (negative weights)
pub static MISINFORMATION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(r"(?i)\b(exclusive|breaking|shocking)\b", -5, "Sensationalist terms"),
        Rule::new(
            r"(?i)\b(doctors won['’]t tell you|scientists can['’]t explain)\b",
            -10,
            "Authority undermining",
        ),
        Rule::new(r"(?i)\b(miracle|cure|secret)\b", -8, "Miracle claims"),
        Rule::new(r"(?i)\b(banned|censored|suppressed)\b", -7, "Suppression claims"),
        Rule::new(r"(?i)\b(100%|guaranteed|proven)\b", -5, "Absolute claims"),
    ]
});

/// Intermediate result of running both rule tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAnalysis {
    /// Clamped score (0 - 100)
    pub score: u8,
    /// Names of matching credibility rules, in table order
    pub credibility: Vec<&'static str>,
    /// Names of matching misinformation rules, in table order
    pub misinformation: Vec<&'static str>,
}

/// Apply every rule to the text and clamp the accumulated score
pub fn analyze_text(text: &str) -> TextAnalysis {
    let mut score = BASELINE_SCORE;
    let mut credibility = Vec::new();
    let mut misinformation = Vec::new();

    for rule in CREDIBILITY_RULES.iter() {
        if rule.matches(text) {
            score += rule.weight;
            credibility.push(rule.name);
        }
    }

    for rule in MISINFORMATION_RULES.iter() {
        if rule.matches(text) {
            score += rule.weight;
            misinformation.push(rule.name);
        }
    }

    TextAnalysis {
        score: score.clamp(0, MAX_SCORE as i32) as u8,
        credibility,
        misinformation,
    }
}

/// Score text with the pattern rules
pub fn score_text(text: &str) -> VerificationResult {
    let analysis = analyze_text(text);
    let explanation = explain(&analysis);
    VerificationResult::from_score(analysis.score, TEXT_FALLBACK_MODEL, explanation)
}

fn explain(analysis: &TextAnalysis) -> String {
    let mut explanation = String::from("API unavailable. Using pattern analysis: ");

    if analysis.score >= 80 {
        explanation.push_str("This content appears credible based on language patterns.");
        if !analysis.credibility.is_empty() {
            explanation.push_str(&format!(
                " It contains credibility indicators including: {}.",
                list_names(&analysis.credibility, 3, true)
            ));
        }
    } else if analysis.score >= 65 {
        explanation.push_str(
            "This content appears somewhat credible but could benefit from additional verification.",
        );
        if !analysis.credibility.is_empty() {
            explanation.push_str(&format!(
                " Positive indicators include: {}.",
                list_names(&analysis.credibility, 2, false)
            ));
        }
    } else {
        explanation
            .push_str("This content contains patterns often associated with misleading information.");
        if !analysis.misinformation.is_empty() {
            explanation.push_str(&format!(
                " Concerning indicators include: {}.",
                list_names(&analysis.misinformation, 2, true)
            ));
        }
    }

    explanation
}

/// First `limit` names, optionally noting when more were found
fn list_names(names: &[&str], limit: usize, note_more: bool) -> String {
    let mut listed = names.iter().take(limit).copied().collect::<Vec<_>>().join(", ");
    if note_more && names.len() > limit {
        listed.push_str(", and others");
    }
    listed
}
