//! Verification pipeline
//!
//! For each submission:
//! 1. Validate and hash the content
//! 2. Return an existing ledger record if there is one
//! 3. Otherwise analyze it (remote model or heuristics)
//! 4. Record the verdict on the ledger
//! 5. Cache it in local history
//!
//! Ledger and history failures are logged and reported on the result. Only
//! invalid content fails a verification.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use truthchain_ai::ContentAnalyzer;
use truthchain_core::{
    Content, ContentType, StoredVerification, VerificationResult, MAX_SCORE,
};
use truthchain_ledger::{LedgerError, RecordRequest, SharedLedger, VerificationRecord};

use crate::history::HistoryStore;

/// Outcome of the ledger step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerStatus {
    /// No ledger configured
    None,
    /// Write submitted, not yet confirmed
    Pending,
    Success,
    Failed,
    /// Ledger can be read but not written
    ReadOnly,
    /// Content was already on the ledger
    Existing,
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedgerStatus::None => "none",
            LedgerStatus::Pending => "pending",
            LedgerStatus::Success => "success",
            LedgerStatus::Failed => "failed",
            LedgerStatus::ReadOnly => "readonly",
            LedgerStatus::Existing => "existing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMetadata {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub ledger_status: LedgerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Everything known about one verification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub id: Uuid,
    pub content_hash: String,
    pub content_type: ContentType,
    pub result: VerificationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<VerificationRecord>,
    pub metadata: VerificationMetadata,
}

/// Verifier configuration
pub struct VerifierConfig {
    /// Remote analysis with heuristic fallbacks
    pub analyzer: ContentAnalyzer,
    /// Ledger for lookups and writes (None = offline)
    pub ledger: Option<SharedLedger>,
    /// Local history cache (None = disabled)
    pub history: Option<HistoryStore>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            analyzer: ContentAnalyzer::new(),
            ledger: None,
            history: None,
        }
    }
}

/// Runs the verification pipeline
pub struct Verifier {
    analyzer: ContentAnalyzer,
    ledger: Option<SharedLedger>,
    history: Option<HistoryStore>,
}

impl Verifier {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            analyzer: config.analyzer,
            ledger: config.ledger,
            history: config.history,
        }
    }

    pub fn analyzer(&self) -> &ContentAnalyzer {
        &self.analyzer
    }

    pub fn ledger(&self) -> Option<&SharedLedger> {
        self.ledger.as_ref()
    }

    pub fn history(&self) -> Option<&HistoryStore> {
        self.history.as_ref()
    }

    /// Verify one piece of content
    pub async fn verify(&self, content: &Content) -> anyhow::Result<VerificationReport> {
        let start = Instant::now();
        content.validate().context("Invalid content")?;

        let content_type = content.content_type();
        let content_hash = content.hash();
        info!("Verifying {} content {}", content_type.label(), content_hash);

        if let Some(record) = self.existing_record(&content_hash).await {
            info!("Found existing ledger record for {}", content_hash);
            let result = previous_result(content, &record);
            return Ok(self.report(
                content_hash,
                content_type,
                result,
                Some(record),
                LedgerStatus::Existing,
                None,
                start,
            ));
        }

        let result = self.analyzer.analyze(content).await;
        info!(
            "Verdict: {} ({}%) by {}",
            if result.is_verified { "verified" } else { "unverified" },
            result.confidence_score,
            result.ai_model_used
        );

        let (ledger_status, transaction_hash, record) =
            self.write_record(&content_hash, content_type, &result).await;

        if let Some(history) = &self.history {
            let entry = StoredVerification::new(content, &result, Utc::now().timestamp_millis());
            if let Err(e) = history.save(entry) {
                warn!("Failed to save history: {}", e);
            }
        }

        Ok(self.report(
            content_hash,
            content_type,
            result,
            record,
            ledger_status,
            transaction_hash,
            start,
        ))
    }

    /// Ledger record for a content hash
    pub async fn lookup(&self, content_hash: &str) -> anyhow::Result<Option<VerificationRecord>> {
        let ledger = self.ledger.as_ref().context("No ledger configured")?;
        ledger
            .lookup(content_hash)
            .await
            .with_context(|| format!("Ledger lookup failed for {}", content_hash))
    }

    async fn existing_record(&self, content_hash: &str) -> Option<VerificationRecord> {
        let ledger = self.ledger.as_ref()?;
        match ledger.lookup(content_hash).await {
            Ok(record) => record.filter(|r| r.exists()),
            Err(e) => {
                warn!("Ledger lookup failed, continuing with analysis: {}", e);
                None
            }
        }
    }

    async fn write_record(
        &self,
        content_hash: &str,
        content_type: ContentType,
        result: &VerificationResult,
    ) -> (LedgerStatus, Option<String>, Option<VerificationRecord>) {
        let Some(ledger) = &self.ledger else {
            return (LedgerStatus::None, None, None);
        };

        if !ledger.is_writable() {
            debug!("Skipping write to read-only {}", ledger.describe());
            return (LedgerStatus::ReadOnly, None, None);
        }

        let request = RecordRequest::new(content_hash, content_type, result);
        debug!("Recording {} on {}", content_hash, ledger.describe());

        let tx_hash = match ledger.record(&request).await {
            Ok(tx_hash) => tx_hash,
            Err(LedgerError::Timeout(tx_hash)) => {
                warn!("Transaction {} not yet mined", tx_hash);
                return (LedgerStatus::Pending, Some(tx_hash), None);
            }
            Err(e) => {
                error!("Failed to record verification on ledger: {}", e);
                return (LedgerStatus::Failed, None, None);
            }
        };

        match ledger.lookup(content_hash).await {
            Ok(record) => (LedgerStatus::Success, Some(tx_hash), record),
            Err(e) => {
                warn!("Recorded in {} but read-back failed: {}", tx_hash, e);
                (LedgerStatus::Success, Some(tx_hash), None)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn report(
        &self,
        content_hash: String,
        content_type: ContentType,
        result: VerificationResult,
        record: Option<VerificationRecord>,
        ledger_status: LedgerStatus,
        transaction_hash: Option<String>,
        start: Instant,
    ) -> VerificationReport {
        VerificationReport {
            id: Uuid::new_v4(),
            content_hash,
            content_type,
            result,
            record,
            metadata: VerificationMetadata {
                timestamp: Utc::now(),
                duration_ms: start.elapsed().as_millis() as u64,
                ledger_status,
                transaction_hash,
            },
        }
    }
}

/// Verdict rebuilt from a record already on the ledger
fn previous_result(content: &Content, record: &VerificationRecord) -> VerificationResult {
    let explanation = if record.is_verified {
        "This content was previously verified as authentic."
    } else {
        "This content was previously verified as potentially misleading."
    };

    let result = VerificationResult {
        is_verified: record.is_verified,
        confidence_score: record.confidence_score.min(MAX_SCORE),
        ai_model_used: record.ai_model_used.clone(),
        explanation: explanation.to_string(),
        source_url: None,
    };

    match content {
        Content::Url(url) => result.with_source_url(url),
        _ => result,
    }
}
