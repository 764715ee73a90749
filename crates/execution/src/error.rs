use clmm_trader_domain::DomainError;
use clmm_trader_protocols::{ProtocolError, TxHash};
use primitive_types::U256;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while quoting, submitting or monitoring.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Invalid caller input (range, fee tier, amounts).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or inconsistent configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The quoter found no pool able to fill the swap.
    #[error("no route found from {token_in} to {token_out}")]
    NoRouteFound {
        /// Symbol of the token sold.
        token_in: String,
        /// Symbol of the token bought.
        token_out: String,
    },

    /// The quote carries no executable route.
    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    /// The quote reached its deadline before submission.
    #[error("quote expired: deadline {deadline}, now {now}")]
    QuoteExpired {
        /// Quote deadline, unix seconds.
        deadline: u64,
        /// Clock reading at submission.
        now: u64,
    },

    /// The ledger reverted the transaction.
    #[error("transaction {tx_hash:?} reverted: {reason}")]
    ExecutionReverted {
        /// Hash of the mined transaction.
        tx_hash: TxHash,
        /// Revert reason, if the node reported one.
        reason: String,
    },

    /// A close removed liquidity but its collect failed. Retry with
    /// `collect(token_id)` alone; repeating the close would remove liquidity again.
    #[error("liquidity of position {token_id} removed in {decrease_tx:?} but collect failed: {source}")]
    CollectPending {
        /// Position NFT id.
        token_id: U256,
        /// Confirmed decrease transaction.
        decrease_tx: TxHash,
        /// Why the collect failed.
        #[source]
        source: Box<ExecutionError>,
    },

    /// Price could not be read.
    #[error("oracle read failed: {0}")]
    OracleRead(String),

    /// Node communication failure.
    #[error("ledger error: {0}")]
    Ledger(#[from] ProtocolError),

    /// A network call exceeded its timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that was abandoned.
        operation: &'static str,
        /// Configured limit.
        after: Duration,
    },
}

impl ExecutionError {
    /// True for failures a caller may retry after re-reading state or re-quoting.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExecutionError::NoRouteFound { .. }
                | ExecutionError::RouteUnavailable(_)
                | ExecutionError::QuoteExpired { .. }
                | ExecutionError::OracleRead(_)
                | ExecutionError::Ledger(_)
                | ExecutionError::Timeout { .. }
        )
    }
}

/// Runs `future` under `after`, mapping expiry to [`ExecutionError::Timeout`].
pub async fn with_timeout<T, E, F>(
    operation: &'static str,
    after: Duration,
    future: F,
) -> Result<T, ExecutionError>
where
    F: std::future::Future<Output = Result<T, E>>,
    ExecutionError: From<E>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result.map_err(ExecutionError::from),
        Err(_) => Err(ExecutionError::Timeout { operation, after }),
    }
}
