//! TruthChain Runtime
//!
//! Wires analysis, the ledger and local history into one verification
//! pipeline. Collaborators are built by the caller and handed to
//! [`Verifier::new`] through [`VerifierConfig`].

pub mod history;
pub mod verifier;

pub use history::*;
pub use verifier::*;
