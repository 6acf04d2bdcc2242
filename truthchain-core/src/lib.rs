//! TruthChain Core - Verdict types and local scoring for content verification
//!
//! This crate provides the foundational primitives:
//! - Verification verdicts and content descriptors
//! - Weighted pattern rules for text credibility
//! - Domain reputation scoring for URLs
//! - Dual-classifier blending for images
//! - Content validation, hashing and history statistics

pub mod content;
pub mod display;
pub mod domains;
pub mod image;
pub mod rules;
pub mod stats;
pub mod verdict;

pub use content::*;
pub use display::*;
pub use domains::*;
pub use image::*;
pub use rules::*;
pub use stats::*;
pub use verdict::*;

/// Starting score for text analysis before any rule applies
pub const BASELINE_SCORE: i32 = 65;

/// Minimum confidence for a verdict to count as verified
pub const VERIFIED_THRESHOLD: u8 = 70;

/// Upper bound of the confidence scale
pub const MAX_SCORE: u8 = 100;
