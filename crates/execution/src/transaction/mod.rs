//! Nonce ownership and submission for the trading account.

mod sequencer;

pub use sequencer::TransactionSequencer;
