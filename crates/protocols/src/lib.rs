//! Ledger and routing adapters for Uniswap V3 style pools.
//!
//! - [`Ledger`]: capability trait over the ledger node
//! - [`RouteQuoter`]: best-route quoting
//! - [`rpc::JsonRpcLedger`] and [`onchain::OnChainQuoter`]: implementations over an alloy provider
//! - [`PoolOracle`]: pool state bound to domain tokens

mod convert;
pub mod error;
pub mod ledger;
pub mod onchain;
pub mod oracle;
pub mod quoter;
pub mod rpc;
pub mod uniswap;

pub use error::ProtocolError;
pub use ledger::{Ledger, Log, PoolState, PositionState, TransactionReceipt, TransactionRequest, TxHash};
pub use onchain::{OnChainQuoter, PoolFactory};
pub use oracle::{PoolInfo, PoolOracle};
pub use quoter::RouteQuoter;
pub use rpc::{HttpProvider, JsonRpcLedger, connect_http};
