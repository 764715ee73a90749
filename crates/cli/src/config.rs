//! Trader configuration: a TOML file plus environment overrides.

use clmm_trader_domain::{
    Address, Amount, Direction, DomainError, FeeTier, MonitorRule, Percentage, Token,
    TokenRegistry, TriggerMode, parse_address,
};
use clmm_trader_execution::config::ExecutionConfig;
use clmm_trader_protocols::uniswap::Contracts;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Mainnet chain id.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Errors in the trader configuration. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("{0} is required for this command")]
    Missing(&'static str),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn invalid(field: impl Into<String>, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.to_string(),
    }
}

/// Contract address overrides; unset entries keep the mainnet deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractsConfig {
    pub swap_router: Option<String>,
    pub position_manager: Option<String>,
    pub quoter: Option<String>,
    pub factory: Option<String>,
}

impl ContractsConfig {
    fn resolve(&self) -> Result<Contracts, ConfigError> {
        let defaults = Contracts::mainnet();
        let pick = |field: &str, value: &Option<String>, default: Address| match value {
            Some(s) => parse_address(s).map_err(|e| invalid(format!("contracts.{field}"), e)),
            None => Ok(default),
        };
        Ok(Contracts {
            swap_router: pick("swap_router", &self.swap_router, defaults.swap_router)?,
            position_manager: pick("position_manager", &self.position_manager, defaults.position_manager)?,
            quoter: pick("quoter", &self.quoter, defaults.quoter)?,
            factory: pick("factory", &self.factory, defaults.factory)?,
        })
    }
}

/// Timeouts, in seconds unless noted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub call_secs: u64,
    pub receipt_secs: u64,
    pub deadline_secs: u64,
    pub receipt_poll_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        let defaults = ExecutionConfig::default();
        Self {
            call_secs: defaults.call_timeout.as_secs(),
            receipt_secs: defaults.receipt_timeout.as_secs(),
            deadline_secs: defaults.deadline_secs,
            receipt_poll_ms: 1_000,
        }
    }
}

/// A token in addition to the built-in ones.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

/// One `[[rules]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Defaults to `BASE/QUOTE direction@target`, e.g. `WETH/USDC buy@3000`.
    #[serde(default)]
    pub pair_key: Option<String>,
    pub base: String,
    pub quote: String,
    #[serde(default = "default_fee")]
    pub fee: u32,
    /// Pool address; looked up through the factory when absent.
    #[serde(default)]
    pub pool: Option<String>,
    /// Price of base in quote.
    pub target_price: Decimal,
    pub direction: Direction,
    /// Human amount of the token spent: quote for buys, base for sells.
    pub amount: Decimal,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub trigger_mode: TriggerMode,
    /// Overrides the global slippage.
    #[serde(default)]
    pub slippage_bps: Option<u32>,
}

fn default_fee() -> u32 {
    FeeTier::MEDIUM.fee()
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_slippage_bps() -> u32 {
    50
}

fn default_chain_id() -> u64 {
    MAINNET_CHAIN_ID
}

/// Raw configuration as read from TOML and the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct TraderConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Account the node signs for.
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    #[serde(default)]
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            signer: None,
            chain_id: default_chain_id(),
            slippage_bps: default_slippage_bps(),
            contracts: ContractsConfig::default(),
            timeouts: TimeoutsConfig::default(),
            tokens: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl TraderConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path` when given, otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Applies `RPC_URL`, `SIGNER_ADDRESS` and `SLIPPAGE_BPS` from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RPC_URL") {
            self.rpc_url = url;
        }
        if let Some(signer) = lookup("SIGNER_ADDRESS") {
            self.signer = Some(signer);
        }
        if let Some(bps) = lookup("SLIPPAGE_BPS") {
            self.slippage_bps = bps.trim().parse().map_err(|e| invalid("SLIPPAGE_BPS", e))?;
        }
        Ok(())
    }

    /// Checks every field and produces the typed settings.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(invalid("rpc_url", "must not be empty"));
        }
        let signer = self
            .signer
            .as_deref()
            .map(|s| parse_address(s).map_err(|e| invalid("signer", e)))
            .transpose()?;
        let slippage = Percentage::from_bps(self.slippage_bps).map_err(|e| invalid("slippage_bps", e))?;
        let contracts = self.contracts.resolve()?;

        let mut tokens = builtin_tokens(self.chain_id);
        for token in &self.tokens {
            let address = parse_address(&token.address).map_err(|e| invalid(format!("tokens.{}", token.symbol), e))?;
            let name = token.name.clone().unwrap_or_else(|| token.symbol.clone());
            tokens.insert(Token::new(self.chain_id, address, token.decimals, &token.symbol, &name));
        }

        let t = &self.timeouts;
        if t.call_secs == 0 || t.receipt_secs == 0 || t.deadline_secs == 0 || t.receipt_poll_ms == 0 {
            return Err(invalid("timeouts", "every timeout must be positive"));
        }
        let execution = ExecutionConfig {
            call_timeout: Duration::from_secs(t.call_secs),
            receipt_timeout: Duration::from_secs(t.receipt_secs),
            deadline_secs: t.deadline_secs,
        };

        let mut rules: Vec<RuleSettings> = Vec::with_capacity(self.rules.len());
        for (i, rule) in self.rules.iter().enumerate() {
            let resolved = rule.resolve(i, &tokens, slippage)?;
            if rules.iter().any(|r| r.rule.pair_key == resolved.rule.pair_key) {
                return Err(invalid(
                    format!("rules[{i}].pair_key"),
                    format!("duplicate key {}; set a distinct pair_key", resolved.rule.pair_key),
                ));
            }
            rules.push(resolved);
        }

        Ok(Settings {
            rpc_url: self.rpc_url.clone(),
            signer,
            slippage,
            contracts,
            tokens,
            execution,
            receipt_poll_interval: Duration::from_millis(t.receipt_poll_ms),
            rules,
        })
    }
}

impl RuleConfig {
    fn resolve(&self, index: usize, tokens: &TokenRegistry, default_slippage: Percentage) -> Result<RuleSettings, ConfigError> {
        let field = |name: &str| format!("rules[{index}].{name}");
        let base = tokens.resolve(&self.base).map_err(|e| invalid(field("base"), e))?.clone();
        let quote = tokens.resolve(&self.quote).map_err(|e| invalid(field("quote"), e))?.clone();
        let fee_tier = FeeTier::from_fee(self.fee).map_err(|e| invalid(field("fee"), e))?;
        let pool = self
            .pool
            .as_deref()
            .map(|s| parse_address(s).map_err(|e| invalid(field("pool"), e)))
            .transpose()?;
        let slippage = match self.slippage_bps {
            Some(bps) => Percentage::from_bps(bps).map_err(|e| invalid(field("slippage_bps"), e))?,
            None => default_slippage,
        };
        let spent = match self.direction {
            Direction::Buy => &quote,
            Direction::Sell => &base,
        };
        let trade_amount = Amount::from_decimal(spent.clone(), self.amount)
            .map_err(|e| invalid(field("amount"), e))?
            .raw;

        let rule = MonitorRule {
            pair_key: self
                .pair_key
                .clone()
                .unwrap_or_else(|| format!("{}/{} {}@{}", base.symbol, quote.symbol, self.direction, self.target_price)),
            pool_address: pool.unwrap_or_default(),
            base,
            quote,
            fee_tier,
            target_price: self.target_price,
            direction: self.direction,
            trade_amount,
            poll_interval_ms: self.poll_interval_ms,
            trigger_mode: self.trigger_mode,
            slippage,
        };
        rule.validate().map_err(|e| invalid(format!("rules[{index}]"), e))?;
        Ok(RuleSettings {
            rule,
            pool_known: pool.is_some(),
        })
    }
}

/// A validated rule. When `pool_known` is false the pool address must be
/// looked up before the rule runs.
#[derive(Debug, Clone)]
pub struct RuleSettings {
    pub rule: MonitorRule,
    pub pool_known: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub signer: Option<Address>,
    pub slippage: Percentage,
    pub contracts: Contracts,
    pub tokens: TokenRegistry,
    pub execution: ExecutionConfig,
    pub receipt_poll_interval: Duration,
    pub rules: Vec<RuleSettings>,
}

impl Settings {
    /// Signer address, required by commands that send transactions.
    pub fn signer(&self) -> Result<Address, ConfigError> {
        self.signer.ok_or(ConfigError::Missing("SIGNER_ADDRESS"))
    }

    pub fn token(&self, symbol_or_address: &str) -> Result<Token, ConfigError> {
        self.tokens
            .resolve(symbol_or_address)
            .cloned()
            .map_err(|e| invalid("token", e))
    }
}

/// WETH, USDC, USDT and DAI at their mainnet addresses.
pub fn builtin_tokens(chain_id: u64) -> TokenRegistry {
    [
        ("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18, "WETH", "Wrapped Ether"),
        ("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6, "USDC", "USD Coin"),
        ("0xdAC17F958D2ee523a2206206994597C13D831ec7", 6, "USDT", "Tether USD"),
        ("0x6B175474E89094C44Da98b954EedeAC495271d0F", 18, "DAI", "Dai Stablecoin"),
    ]
    .into_iter()
    .filter_map(|(address, decimals, symbol, name)| {
        parse_address(address)
            .ok()
            .map(|address| Token::new(chain_id, address, decimals, symbol, name))
    })
    .collect()
}
