use thiserror::Error;

/// Errors raised by domain validation and math.
///
/// All of these are caller-input errors: the operation is aborted and
/// retrying with the same input yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Tick or price outside the AMM's representable range.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Fee tier with no known tick spacing.
    #[error("unknown fee tier: {0}")]
    UnknownFeeTier(u32),

    /// Offered amounts are too small to mint any liquidity.
    #[error("insufficient amount: liquidity rounds to zero")]
    InsufficientAmount,

    /// Tick range not ordered or not aligned to the spacing.
    #[error("invalid tick range [{lower}, {upper}) for tick spacing {spacing}")]
    InvalidTickRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
        /// Pool tick spacing.
        spacing: i32,
    },

    /// Price not strictly positive or not convertible.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Slippage tolerance outside [0, 1].
    #[error("invalid slippage tolerance: {0}")]
    InvalidSlippage(String),

    /// Malformed address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Both sides of a pair are the same token.
    #[error("pair tokens must differ: {0}")]
    IdenticalTokens(String),

    /// Intermediate value does not fit its target width.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Zero denominator.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
}
