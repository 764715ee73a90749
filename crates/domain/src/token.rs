use crate::error::DomainError;
use crate::math::decimal::{decimal_to_ratio, ratio_to_decimal};
use primitive_types::{H160, U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 20-byte ledger address.
pub type Address = H160;

/// Parses a `0x`-prefixed (or bare) 40 hex digit address.
pub fn parse_address(s: &str) -> Result<Address, DomainError> {
    let trimmed = s.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(digits).map_err(|_| DomainError::InvalidAddress(s.to_string()))?;
    if bytes.len() != 20 {
        return Err(DomainError::InvalidAddress(s.to_string()));
    }
    Ok(Address::from_slice(&bytes))
}

/// Full lowercase hex form, `0x` prefixed.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// An ERC-20 style token.
///
/// Identity is the address: two tokens with the same address compare equal
/// regardless of symbol or name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: u64,
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl Token {
    pub fn new(
        chain_id: u64,
        address: Address,
        decimals: u8,
        symbol: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            address,
            decimals,
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// True when this token is token0 of a pool with `other`.
    pub fn sorts_before(&self, other: &Token) -> bool {
        self.address < other.address
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A quantity of a token in its smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub token: Token,
    pub raw: U256,
}

impl Amount {
    pub fn new(token: Token, raw: impl Into<U256>) -> Self {
        Self {
            token,
            raw: raw.into(),
        }
    }

    pub fn zero(token: Token) -> Self {
        Self {
            token,
            raw: U256::zero(),
        }
    }

    /// Converts a human amount (e.g. `0.1` WETH) to raw units, truncating
    /// digits below the token's precision.
    pub fn from_decimal(token: Token, value: Decimal) -> Result<Self, DomainError> {
        if value.is_sign_negative() {
            return Err(DomainError::OutOfRange(format!("negative amount {value}")));
        }
        if value.is_zero() {
            return Ok(Self::zero(token));
        }
        let (num, den) = decimal_to_ratio(value)?;
        let scaled = U512::from(num)
            .checked_mul(U512::from(U256::exp10(usize::from(token.decimals))))
            .ok_or(DomainError::Overflow("amount scaling"))?;
        let raw = U256::try_from(scaled / U512::from(den))
            .map_err(|_| DomainError::Overflow("amount scaling"))?;
        Ok(Self { token, raw })
    }

    /// Human value for display.
    pub fn to_decimal(&self) -> Result<Decimal, DomainError> {
        ratio_to_decimal(
            U512::from(self.raw),
            U512::from(U256::exp10(usize::from(self.token.decimals))),
        )
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(d) => write!(f, "{} {}", d, self.token.symbol),
            Err(_) => write!(f, "{} raw {}", self.raw, self.token.symbol),
        }
    }
}

/// Tokens known to the trader, addressable by symbol or address.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<Address, Token>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a token.
    pub fn insert(&mut self, token: Token) {
        self.by_address.insert(token.address, token);
    }

    pub fn by_address(&self, address: &Address) -> Option<&Token> {
        self.by_address.get(address)
    }

    /// Case-insensitive symbol lookup.
    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.by_address
            .values()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Resolves a symbol or a hex address.
    pub fn resolve(&self, symbol_or_address: &str) -> Result<&Token, DomainError> {
        if let Some(token) = self.by_symbol(symbol_or_address) {
            return Ok(token);
        }
        let address = parse_address(symbol_or_address)?;
        self.by_address(&address)
            .ok_or_else(|| DomainError::InvalidAddress(format!("unknown token {symbol_or_address}")))
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.by_address.values()
    }
}

impl FromIterator<Token> for TokenRegistry {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        let mut registry = Self::new();
        for token in iter {
            registry.insert(token);
        }
        registry
    }
}
