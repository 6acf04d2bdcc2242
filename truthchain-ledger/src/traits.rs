//! Common interface for verification ledgers

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::record::{RecordRequest, VerificationRecord};

/// Errors from ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Ledger is read-only: no sender account configured")]
    ReadOnly,

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("Transaction {0} not mined before timeout")]
    Timeout(String),
}

/// Persistent store of verification records keyed by content hash
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Record a verdict, returning the transaction hash
    async fn record(&self, request: &RecordRequest) -> Result<String, LedgerError>;

    /// Fetch the record for a content hash, `None` if never recorded
    async fn lookup(&self, content_hash: &str) -> Result<Option<VerificationRecord>, LedgerError>;

    /// Short description for status output
    fn describe(&self) -> String;

    /// Whether `record` can succeed at all
    fn is_writable(&self) -> bool {
        true
    }
}

/// Thread-safe reference to a ledger
pub type SharedLedger = Arc<dyn Ledger>;
