use crate::fees::FeeTier;
use crate::token::{Address, Amount, Token};
use serde::{Deserialize, Serialize};

/// One pool traversed by a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool: Address,
    pub token_in: Token,
    pub token_out: Token,
    pub fee_tier: FeeTier,
}

/// Ordered pools a swap passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub hops: Vec<RouteHop>,
}

impl Route {
    pub fn new(hops: Vec<RouteHop>) -> Self {
        Self { hops }
    }

    pub fn single(hop: RouteHop) -> Self {
        Self { hops: vec![hop] }
    }

    pub fn is_single_hop(&self) -> bool {
        self.hops.len() == 1
    }

    /// True when the hops chain from `token_in` to `token_out` without gaps.
    pub fn connects(&self, token_in: &Token, token_out: &Token) -> bool {
        let (Some(first), Some(last)) = (self.hops.first(), self.hops.last()) else {
            return false;
        };
        &first.token_in == token_in
            && &last.token_out == token_out
            && self
                .hops
                .windows(2)
                .all(|pair| pair[0].token_out == pair[1].token_in)
    }
}

/// Best execution estimate for an exact-input swap.
///
/// A quote is ephemeral: once `deadline` (unix seconds) is reached it must be
/// discarded and a new one requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: Amount,
    /// Expected output; realized output may be lower by the slippage tolerance.
    pub amount_out: Amount,
    pub route: Route,
    pub estimated_gas: u64,
    pub deadline: u64,
}

impl Quote {
    /// The deadline itself counts as expired.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.deadline
    }

    pub fn is_executable(&self) -> bool {
        self.route.connects(&self.amount_in.token, &self.amount_out.token)
    }
}
