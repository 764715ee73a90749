use crate::error::ProtocolError;
use async_trait::async_trait;
use clmm_trader_domain::{Amount, Quote, Token};

/// Source of best-route quotes.
#[async_trait]
pub trait RouteQuoter: Send + Sync {
    /// Best route for swapping exactly `amount_in` into `token_out`.
    ///
    /// `Ok(None)` means no pool can fill the swap. `deadline` is unix seconds
    /// and is copied onto the returned quote.
    async fn quote(
        &self,
        amount_in: &Amount,
        token_out: &Token,
        deadline: u64,
    ) -> Result<Option<Quote>, ProtocolError>;
}
