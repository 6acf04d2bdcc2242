//! Domain reputation scoring for URLs
//!
//! Three tiers, first hit wins:
//! 1. Trusted allowlist (exact host or dot-separated suffix)
//! 2. Keyword categories (academic, government, educational, news)
//! 3. Top-level domain

use url::Url;

use crate::{is_verified_score, VerificationResult};

/// Model label reported for domain-based URL verdicts
pub const URL_FALLBACK_MODEL: &str = "Domain Analysis (fallback)";

/// Model label for URLs that cannot be parsed
pub const URL_INVALID_MODEL: &str = "URL Analysis";

/// Score assigned to allowlisted domains
pub const TRUSTED_DOMAIN_SCORE: u8 = 95;

/// High-reputation host suffixes
pub const TRUSTED_DOMAINS: &[&str] = &[
    "wikipedia.org", "github.com", "stackoverflow.com", "medium.com",
    "reuters.com", "apnews.com", "bbc.com", "nytimes.com",
    "washingtonpost.com", "wsj.com", "economist.com", "nature.com",
    "science.org", "nasa.gov", "nih.gov", "who.int",
    "un.org", "coursera.org", "edx.org", "khanacademy.org",
    "udemy.com", "microsoft.com", "apple.com", "google.com",
    "ibm.com", "adobe.com", "oracle.com", "cisco.com",
    "mit.edu", "harvard.edu", "stanford.edu", "berkeley.edu",
    "yale.edu", "princeton.edu", "caltech.edu", "ted.com",
    "britannica.com", "snopes.com", "factcheck.org", "politifact.com",
    "ieee.org", "acm.org", "springer.com", "jstor.org",
    "netflix.com",
];

/// Domain categories recognised by keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainCategory {
    Academic,
    Government,
    Educational,
    News,
}

impl DomainCategory {
    /// Evaluation order; ties go to the earlier category
    pub const ALL: [DomainCategory; 4] = [
        DomainCategory::Academic,
        DomainCategory::Government,
        DomainCategory::Educational,
        DomainCategory::News,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DomainCategory::Academic => "academic",
            DomainCategory::Government => "government",
            DomainCategory::Educational => "educational",
            DomainCategory::News => "news",
        }
    }

    pub fn score(&self) -> u8 {
        match self {
            DomainCategory::Academic | DomainCategory::Government => 95,
            DomainCategory::Educational => 90,
            DomainCategory::News => 80,
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            DomainCategory::Academic => &[".edu", "university", "college", "academic", "school"],
            DomainCategory::Government => &[".gov", ".mil", "government", "federal", "state."],
            DomainCategory::Educational => &["coursera", "edx", "udemy", "khan", "learn", "education"],
            DomainCategory::News => &["news", "times", "post", "herald", "tribune", "journal"],
        }
    }

    fn matches(&self, domain: &str) -> bool {
        self.keywords().iter().any(|kw| domain.contains(kw))
    }
}

/// Which tier decided a domain's score
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainBasis {
    Trusted,
    Category(DomainCategory),
    TopLevel,
}

/// Domain reputation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAssessment {
    pub domain: String,
    pub score: u8,
    pub basis: DomainBasis,
}

/// Extract the lowercased host of a URL, `None` if it does not parse
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    Some(parsed.host_str().unwrap_or_default().to_lowercase())
}

/// Whether a host is on the trusted allowlist
pub fn is_trusted_domain(domain: &str) -> bool {
    TRUSTED_DOMAINS.iter().any(|trusted| {
        domain == *trusted
            || domain
                .strip_suffix(trusted)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Best-scoring keyword category for a host
pub fn categorize_domain(domain: &str) -> Option<DomainCategory> {
    let mut best: Option<DomainCategory> = None;
    for category in DomainCategory::ALL {
        if category.matches(domain) && best.is_none_or(|b| category.score() > b.score()) {
            best = Some(category);
        }
    }
    best
}

/// Score by top-level domain alone
pub fn tld_score(domain: &str) -> u8 {
    if domain.ends_with(".org") {
        75
    } else if domain.ends_with(".com") {
        65
    } else if domain.ends_with(".net") {
        60
    } else {
        50
    }
}

/// Run the three reputation tiers over a host
pub fn assess_domain(domain: &str) -> DomainAssessment {
    let (score, basis) = if is_trusted_domain(domain) {
        (TRUSTED_DOMAIN_SCORE, DomainBasis::Trusted)
    } else if let Some(category) = categorize_domain(domain) {
        (category.score(), DomainBasis::Category(category))
    } else {
        (tld_score(domain), DomainBasis::TopLevel)
    };

    DomainAssessment {
        domain: domain.to_string(),
        score,
        basis,
    }
}

/// Score a URL by the reputation of its domain
pub fn score_url(url: &str) -> VerificationResult {
    let Some(domain) = extract_domain(url) else {
        return invalid_url_result();
    };

    let assessment = assess_domain(&domain);
    let verified = is_verified_score(assessment.score);

    let mut explanation = String::from("API unavailable. Using domain analysis: ");
    match &assessment.basis {
        DomainBasis::Trusted => explanation.push_str(&format!(
            "This URL is from a well-known, generally reliable domain ({}).",
            assessment.domain
        )),
        DomainBasis::Category(category) => {
            explanation.push_str(&format!("This appears to be a {} website. ", category.name()));
            explanation.push_str(if verified {
                "Generally considered a reliable category."
            } else {
                "Consider verifying with additional sources."
            });
        }
        DomainBasis::TopLevel if verified => explanation.push_str(&format!(
            "This domain ({}) appears to have good reputation indicators.",
            assessment.domain
        )),
        DomainBasis::TopLevel => explanation.push_str(
            "This URL is not from a recognized reliable source. Verify its content carefully.",
        ),
    }

    VerificationResult::from_score(assessment.score, URL_FALLBACK_MODEL, explanation)
        .with_source_url(url)
}

/// Verdict for input that is not a URL
pub fn invalid_url_result() -> VerificationResult {
    VerificationResult::rejected(URL_INVALID_MODEL, "Invalid URL format.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_suffix() {
        let result = score_url("https://en.wikipedia.org/wiki/Test");
        assert_eq!(result.confidence_score, 95);
        assert!(result.is_verified);
        assert!(result.explanation.contains("en.wikipedia.org"));
        assert_eq!(result.source_url.as_deref(), Some("https://en.wikipedia.org/wiki/Test"));
    }

    #[test]
    fn test_invalid_url() {
        let result = score_url("not a url");
        assert_eq!(result.confidence_score, 0);
        assert!(!result.is_verified);
        assert_eq!(result.explanation, "Invalid URL format.");
    }

    #[test]
    fn test_unknown_tld() {
        let result = score_url("https://randomblog.xyz");
        assert_eq!(result.confidence_score, 50);
        assert!(!result.is_verified);
        assert!(result.explanation.contains("not from a recognized reliable source"));
    }

    #[test]
    fn test_lookalike_is_not_trusted() {
        assert!(is_trusted_domain("github.com"));
        assert!(is_trusted_domain("docs.github.com"));
        assert!(!is_trusted_domain("notgithub.com"));
    }

    #[test]
    fn test_category_scores() {
        assert_eq!(score_url("https://cs.someuniversity.ac.uk/x").confidence_score, 95);
        assert_eq!(score_url("https://www.ca.gov").confidence_score, 95);
        assert_eq!(score_url("https://learnrust.io").confidence_score, 90);
        assert_eq!(score_url("https://dailyherald.example").confidence_score, 80);
    }

    #[test]
    fn test_highest_category_wins() {
        // "news" (80) and "school" (95) both match
        assert_eq!(
            categorize_domain("schoolnews.example"),
            Some(DomainCategory::Academic)
        );
        // Academic and government tie at 95, academic is checked first
        assert_eq!(
            categorize_domain("university.gov"),
            Some(DomainCategory::Academic)
        );
    }

    #[test]
    fn test_tld_fallback() {
        assert_eq!(score_url("https://example.org").confidence_score, 75);
        assert!(score_url("https://example.org").is_verified);
        assert_eq!(score_url("https://example.com").confidence_score, 65);
        assert_eq!(score_url("https://example.net").confidence_score, 60);
    }

    #[test]
    fn test_host_is_case_insensitive() {
        assert_eq!(score_url("HTTPS://EN.WIKIPEDIA.ORG/").confidence_score, 95);
    }
}
