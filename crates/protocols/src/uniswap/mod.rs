//! Uniswap V3 periphery: addresses, contract interfaces, calldata and events.

pub mod calls;
pub mod contracts;
pub mod events;
pub mod interfaces;

pub use calls::{
    CollectParams, ContractCall, DecreaseLiquidityParams, ExactInputParams,
    ExactInputSingleParams, MintParams, encode_path,
};
pub use contracts::Contracts;
