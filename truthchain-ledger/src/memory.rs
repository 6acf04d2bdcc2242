//! In-process ledger for offline runs and tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use truthchain_core::content_hash;

use crate::record::{RecordRequest, VerificationRecord};
use crate::rpc::ZERO_ADDRESS;
use crate::traits::{Ledger, LedgerError};

/// Keeps records in a map guarded by a mutex
pub struct MemoryLedger {
    verifier: String,
    records: Mutex<HashMap<String, VerificationRecord>>,
    nonce: AtomicU64,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(ZERO_ADDRESS)
    }
}

impl MemoryLedger {
    pub fn new(verifier: &str) -> Self {
        Self {
            verifier: verifier.to_string(),
            records: Mutex::new(HashMap::new()),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn record(&self, request: &RecordRequest) -> Result<String, LedgerError> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let record = VerificationRecord {
            verifier: self.verifier.clone(),
            timestamp: chrono::Utc::now().timestamp().max(1) as u64,
            is_verified: request.is_verified,
            confidence_score: request.confidence_score,
            content_type: request.content_type.as_str().to_string(),
            ai_model_used: request.ai_model_used.clone(),
        };

        self.records.lock().insert(request.content_hash.clone(), record);

        Ok(content_hash(&format!("{}:{}", request.content_hash, nonce)))
    }

    async fn lookup(&self, content_hash: &str) -> Result<Option<VerificationRecord>, LedgerError> {
        Ok(self.records.lock().get(content_hash).cloned())
    }

    fn describe(&self) -> String {
        format!("in-memory ledger ({} records)", self.len())
    }
}
