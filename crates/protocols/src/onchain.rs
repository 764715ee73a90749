//! Route quoting and pool discovery through the on-chain periphery contracts.

use crate::convert::{IntoAlloy, IntoLegacy, uint24};
use crate::error::ProtocolError;
use crate::quoter::RouteQuoter;
use crate::uniswap::interfaces::{IQuoter, IUniswapV3Factory};
use crate::uniswap::{Contracts, encode_path};
use alloy::primitives::Bytes;
use alloy::primitives::aliases::U160;
use alloy::providers::Provider;
use async_trait::async_trait;
use clmm_trader_domain::{Address, Amount, FeeTier, Quote, Route, RouteHop, Token};
use primitive_types::U256;
use tracing::debug;

/// Fixed overhead of a router swap.
pub const SWAP_GAS_BASE: u64 = 60_000;
/// Added per pool crossed.
pub const SWAP_GAS_PER_HOP: u64 = 100_000;

pub fn estimate_swap_gas(hops: usize) -> u64 {
    SWAP_GAS_BASE + SWAP_GAS_PER_HOP * hops as u64
}

/// Resolves pool addresses through the factory.
pub struct PoolFactory<P> {
    factory: IUniswapV3Factory::IUniswapV3FactoryInstance<P>,
}

impl<P: Provider> PoolFactory<P> {
    pub fn new(provider: P, factory: Address) -> Self {
        Self {
            factory: IUniswapV3Factory::new(factory.into_alloy(), provider),
        }
    }

    /// Pool for the pair and fee, `None` if it was never created.
    pub async fn pool_address(&self, a: &Token, b: &Token, fee_tier: FeeTier) -> Result<Option<Address>, ProtocolError> {
        let pool = self
            .factory
            .getPool(a.address.into_alloy(), b.address.into_alloy(), uint24(fee_tier.fee())?)
            .call()
            .await?;
        Ok((!pool.is_zero()).then(|| pool.into_legacy()))
    }
}

/// [`RouteQuoter`] over single-pool routes, trying every configured fee tier
/// and keeping the best output.
pub struct OnChainQuoter<P> {
    factory: PoolFactory<P>,
    quoter: IQuoter::IQuoterInstance<P>,
    fee_tiers: Vec<FeeTier>,
}

impl<P: Provider + Clone> OnChainQuoter<P> {
    pub fn new(provider: P, contracts: &Contracts) -> Self {
        Self {
            factory: PoolFactory::new(provider.clone(), contracts.factory),
            quoter: IQuoter::new(contracts.quoter.into_alloy(), provider),
            fee_tiers: FeeTier::ALL.to_vec(),
        }
    }

    /// Restricts the tiers searched.
    pub fn with_fee_tiers(mut self, fee_tiers: Vec<FeeTier>) -> Self {
        self.fee_tiers = fee_tiers;
        self
    }

    pub fn factory(&self) -> &PoolFactory<P> {
        &self.factory
    }

    /// Output of one pool, `None` when the pool is missing or the quote reverts.
    async fn quote_pool(&self, amount_in: &Amount, token_out: &Token, fee_tier: FeeTier) -> Result<Option<(RouteHop, U256)>, ProtocolError> {
        let Some(pool) = self.factory.pool_address(&amount_in.token, token_out, fee_tier).await? else {
            return Ok(None);
        };
        let call = self.quoter.quoteExactInputSingle(
            amount_in.token.address.into_alloy(),
            token_out.address.into_alloy(),
            uint24(fee_tier.fee())?,
            amount_in.raw.into_alloy(),
            U160::ZERO,
        );
        let amount_out = match call.call().await.map_err(ProtocolError::from) {
            Ok(out) => out.into_legacy(),
            Err(ProtocolError::Reverted(reason)) => {
                debug!(fee = fee_tier.fee(), %reason, "quote reverted");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let hop = RouteHop {
            pool,
            token_in: amount_in.token.clone(),
            token_out: token_out.clone(),
            fee_tier,
        };
        Ok(Some((hop, amount_out)))
    }

    /// Quotes an explicit, possibly multi-hop, route.
    pub async fn quote_route(&self, amount_in: &Amount, route: Route, deadline: u64) -> Result<Option<Quote>, ProtocolError> {
        let Some(last) = route.hops.last() else {
            return Ok(None);
        };
        let token_out = last.token_out.clone();
        let call = self
            .quoter
            .quoteExactInput(Bytes::from(encode_path(&route)), amount_in.raw.into_alloy());
        let amount_out = match call.call().await.map_err(ProtocolError::from) {
            Ok(out) => out.into_legacy(),
            Err(ProtocolError::Reverted(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        if amount_out.is_zero() {
            return Ok(None);
        }
        Ok(Some(Quote {
            amount_in: amount_in.clone(),
            amount_out: Amount::new(token_out, amount_out),
            estimated_gas: estimate_swap_gas(route.hops.len()),
            route,
            deadline,
        }))
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> RouteQuoter for OnChainQuoter<P> {
    async fn quote(&self, amount_in: &Amount, token_out: &Token, deadline: u64) -> Result<Option<Quote>, ProtocolError> {
        if &amount_in.token == token_out || amount_in.is_zero() {
            return Ok(None);
        }
        let mut best: Option<(RouteHop, U256)> = None;
        for tier in &self.fee_tiers {
            if let Some((hop, out)) = self.quote_pool(amount_in, token_out, *tier).await? {
                debug!(fee = tier.fee(), pool = ?hop.pool, amount_out = %out, "pool quote");
                if best.as_ref().is_none_or(|(_, b)| out > *b) {
                    best = Some((hop, out));
                }
            }
        }
        Ok(best
            .filter(|(_, out)| !out.is_zero())
            .map(|(hop, out)| Quote {
                amount_in: amount_in.clone(),
                amount_out: Amount::new(token_out.clone(), out),
                route: Route::single(hop),
                estimated_gas: estimate_swap_gas(1),
                deadline,
            }))
    }
}
