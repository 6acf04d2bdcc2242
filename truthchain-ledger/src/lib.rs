//! TruthChain Ledger
//!
//! Verdicts are recorded on chain keyed by content hash. [`RpcLedger`]
//! talks to a deployed contract over Ethereum JSON-RPC; [`MemoryLedger`]
//! keeps records in process.

pub mod abi;
pub mod memory;
pub mod record;
pub mod rpc;
pub mod traits;

pub use memory::*;
pub use record::*;
pub use rpc::*;
pub use traits::*;
