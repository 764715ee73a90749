//! Swap submission through the router.

mod executor;

pub use executor::{PendingSwap, SwapExecutor, SwapResult, min_amount_out};
