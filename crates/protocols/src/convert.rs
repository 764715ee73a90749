//! Conversions between the workspace's `primitive-types` values and alloy's.
//!
//! Domain math runs on `primitive-types`; alloy types stay inside this crate.

use crate::error::ProtocolError;
use alloy::primitives::aliases::{I24, U24, U160};
use alloy::primitives::{Address as AlloyAddress, B256, U256 as AlloyU256};
use clmm_trader_domain::Address;
use primitive_types::{H256, U256};

pub trait IntoAlloy {
    type Output;

    fn into_alloy(self) -> Self::Output;
}

pub trait IntoLegacy {
    type Output;

    fn into_legacy(self) -> Self::Output;
}

impl IntoAlloy for Address {
    type Output = AlloyAddress;

    fn into_alloy(self) -> AlloyAddress {
        AlloyAddress::from(self.0)
    }
}

impl IntoAlloy for U256 {
    type Output = AlloyU256;

    fn into_alloy(self) -> AlloyU256 {
        // Both store little-endian u64 limbs.
        AlloyU256::from_limbs(self.0)
    }
}

impl IntoAlloy for H256 {
    type Output = B256;

    fn into_alloy(self) -> B256 {
        B256::from(self.0)
    }
}

impl IntoLegacy for AlloyAddress {
    type Output = Address;

    fn into_legacy(self) -> Address {
        Address::from(self.0.0)
    }
}

impl IntoLegacy for AlloyU256 {
    type Output = U256;

    fn into_legacy(self) -> U256 {
        U256(self.into_limbs())
    }
}

impl IntoLegacy for B256 {
    type Output = H256;

    fn into_legacy(self) -> H256 {
        H256(self.0)
    }
}

pub(crate) fn uint24(value: u32) -> Result<U24, ProtocolError> {
    U24::checked_from_limbs_slice(&[u64::from(value)])
        .ok_or_else(|| ProtocolError::Encode(format!("{value} exceeds uint24")))
}

pub(crate) fn int24(value: i32) -> Result<I24, ProtocolError> {
    I24::try_from(value).map_err(|_| ProtocolError::Encode(format!("{value} exceeds int24")))
}

pub(crate) fn uint160(value: U256) -> Result<U160, ProtocolError> {
    U160::checked_from_limbs_slice(&value.0)
        .ok_or_else(|| ProtocolError::Encode(format!("{value} exceeds uint160")))
}

pub(crate) fn tick_from(value: I24) -> Result<i32, ProtocolError> {
    i32::try_from(value).map_err(|_| ProtocolError::Decode(format!("tick {value} out of range")))
}
