//! HTTP implementations of the chain-facing ports: node queries, middleware
//! token scans, and unsigned-transaction building.

pub mod helper;
pub mod ledger;
pub mod middleware;
pub mod node;
pub mod txs;

pub use helper::ContractHelperClient;
pub use ledger::ContractLedgerClient;
pub use middleware::MiddlewareClient;
pub use node::NodeHttpClient;
pub use txs::ChainTxBuilder;
