//! Ethereum JSON-RPC ledger
//!
//! Reads go through `eth_call`. Writes use `eth_sendTransaction` from an
//! account unlocked on the node, then poll for the receipt.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::abi::{
    decode_verification, encode_get_verification, encode_verify_content, from_hex, to_hex,
};
use crate::record::{RecordRequest, VerificationRecord};
use crate::traits::{Ledger, LedgerError};

pub const DEFAULT_RPC_URL: &str = "https://rpc.sepolia.org";

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Configuration for the JSON-RPC ledger
#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Deployed verification contract
    pub contract_address: String,
    /// Unlocked account used for writes
    pub sender: Option<String>,
    /// Timeout for each RPC request
    pub request_timeout: Duration,
    /// How long to wait for a transaction to be mined
    pub receipt_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
}

impl Default for RpcLedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: env::var("TRUTHCHAIN_RPC_URL")
                .unwrap_or_else(|_| DEFAULT_RPC_URL.to_string()),
            contract_address: env::var("TRUTHCHAIN_CONTRACT_ADDRESS")
                .unwrap_or_else(|_| ZERO_ADDRESS.to_string()),
            sender: env::var("TRUTHCHAIN_SENDER").ok().filter(|s| !s.is_empty()),
            request_timeout: Duration::from_secs(30),
            receipt_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl RpcLedgerConfig {
    /// Whether a real contract address is set
    pub fn has_contract(&self) -> bool {
        !self.contract_address.is_empty() && self.contract_address != ZERO_ADDRESS
    }
}

/// Ledger backed by a deployed verification contract
pub struct RpcLedger {
    client: Client,
    config: RpcLedgerConfig,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("TruthChain/0.1")
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &RpcLedgerConfig {
        &self.config
    }

    /// Send one JSON-RPC request and return its `result`
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("{}: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(LedgerError::Rpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))?;

        rpc_result(json)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<(), LedgerError> {
        let deadline = Instant::now() + self.config.receipt_timeout;

        loop {
            let receipt = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if !receipt.is_null() {
                return match receipt["status"].as_str() {
                    Some("0x0") => Err(LedgerError::Reverted(tx_hash.to_string())),
                    _ => Ok(()),
                };
            }

            if Instant::now() >= deadline {
                return Err(LedgerError::Timeout(tx_hash.to_string()));
            }
            debug!("Waiting for {} to be mined", tx_hash);
            sleep(self.config.poll_interval).await;
        }
    }
}

/// Split a JSON-RPC response into its result or error
fn rpc_result(mut json: Value) -> Result<Value, LedgerError> {
    if let Some(error) = json.get("error").filter(|e| !e.is_null()) {
        let message = error["message"]
            .as_str()
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string());
        return Err(LedgerError::Rpc(message));
    }
    json.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| LedgerError::Decode("response has no result".to_string()))
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn record(&self, request: &RecordRequest) -> Result<String, LedgerError> {
        let sender = self.config.sender.as_ref().ok_or(LedgerError::ReadOnly)?;

        let data = encode_verify_content(
            &request.content_hash,
            request.is_verified,
            request.confidence_score,
            request.content_type.as_str(),
            &request.ai_model_used,
        )?;

        let tx = json!({
            "from": sender,
            "to": self.config.contract_address,
            "data": to_hex(&data),
        });

        let tx_hash = self
            .call("eth_sendTransaction", json!([tx]))
            .await?
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| LedgerError::Decode("transaction hash is not a string".to_string()))?;

        info!("Submitted verification for {} in {}", request.content_hash, tx_hash);
        self.wait_for_receipt(&tx_hash).await?;
        Ok(tx_hash)
    }

    async fn lookup(&self, content_hash: &str) -> Result<Option<VerificationRecord>, LedgerError> {
        let data = encode_get_verification(content_hash)?;
        let call = json!({
            "to": self.config.contract_address,
            "data": to_hex(&data),
        });

        let result = self.call("eth_call", json!([call, "latest"])).await?;
        let output = from_hex(result.as_str().unwrap_or("0x"))?;

        if output.is_empty() {
            warn!("No contract code at {}", self.config.contract_address);
            return Ok(None);
        }

        let record = decode_verification(&output)?;
        Ok(record.exists().then_some(record))
    }

    fn describe(&self) -> String {
        format!(
            "contract {} via {}",
            self.config.contract_address, self.config.rpc_url
        )
    }

    fn is_writable(&self) -> bool {
        self.config.sender.is_some() && self.config.has_contract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truthchain_core::ContentType;

    fn config() -> RpcLedgerConfig {
        RpcLedgerConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            contract_address: ZERO_ADDRESS.to_string(),
            sender: None,
            request_timeout: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_rpc_result() {
        let ok = rpc_result(json!({"jsonrpc": "2.0", "id": 1, "result": "0x01"})).unwrap();
        assert_eq!(ok, json!("0x01"));

        let null = rpc_result(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert!(null.is_null());

        let err = rpc_result(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "execution reverted"}
        }));
        assert!(matches!(err, Err(LedgerError::Rpc(m)) if m == "execution reverted"));

        assert!(matches!(
            rpc_result(json!({"jsonrpc": "2.0", "id": 1})),
            Err(LedgerError::Decode(_))
        ));
    }

    #[test]
    fn test_contract_configured() {
        let mut config = config();
        assert!(!config.has_contract());
        config.contract_address = "0x1234567890abcdef1234567890abcdef12345678".to_string();
        assert!(config.has_contract());
    }

    #[tokio::test]
    async fn test_record_without_sender_is_read_only() {
        let ledger = RpcLedger::new(config()).unwrap();
        assert!(!ledger.is_writable());

        let request = RecordRequest {
            content_hash: format!("0x{}", "ab".repeat(32)),
            is_verified: true,
            confidence_score: 90,
            content_type: ContentType::Text,
            ai_model_used: "test".to_string(),
        };
        assert!(matches!(
            ledger.record(&request).await,
            Err(LedgerError::ReadOnly)
        ));
    }

    #[tokio::test]
    async fn test_lookup_rejects_bad_hash() {
        let ledger = RpcLedger::new(config()).unwrap();
        assert!(matches!(
            ledger.lookup("0x1234").await,
            Err(LedgerError::Decode(_))
        ));
    }
}
