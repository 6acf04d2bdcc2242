//! TruthChain AI
//!
//! Remote verification with local fallbacks:
//! - **Backends**: Gemini, OpenAI-compatible and Anthropic chat models
//! - **Prompts**: per content type, from TOML files in `prompts/`
//! - **Verdicts**: JSON verdicts pulled out of free-form model replies
//! - **Classifiers**: Hugging Face image classifiers for the image fallback
//! - **Analyzer**: picks the remote path and falls back to heuristics
//!
//! See [`analyzer::ContentAnalyzer`] for the entry point.

pub mod analyzer;
pub mod backend;
pub mod classifier;
pub mod prompts;
pub mod verdict;

pub use analyzer::*;
pub use backend::*;
pub use classifier::*;
pub use prompts::*;
pub use verdict::*;
