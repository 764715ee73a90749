//! Command Line Interface for the concentrated-liquidity trader.
mod config;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use clmm_trader_domain::{Amount, FeeTier, Percentage, Pool, PoolKey, Quote, Token};
use clmm_trader_execution::prelude::*;
use clmm_trader_protocols::{
    HttpProvider, JsonRpcLedger, Ledger, OnChainQuoter, PoolOracle, RouteQuoter, connect_http,
};
use config::{Settings, TraderConfig};
use dotenv::dotenv;
use primitive_types::U256;
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "clmm-trader")]
#[command(about = "Price-triggered trader and position manager for concentrated-liquidity AMMs", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current state of a pool
    PoolInfo {
        /// First token (symbol or address)
        #[arg(long, default_value = "WETH")]
        token_a: String,

        /// Second token (symbol or address)
        #[arg(long, default_value = "USDC")]
        token_b: String,

        /// Fee in hundredths of a bip (100, 500, 3000, 10000)
        #[arg(long, default_value_t = 3000)]
        fee: u32,
    },
    /// Quote a swap without sending it
    Quote {
        #[arg(long)]
        token_in: String,

        #[arg(long)]
        token_out: String,

        /// Human amount of the input token
        #[arg(long)]
        amount: Decimal,
    },
    /// Swap an exact input amount
    Swap {
        #[arg(long)]
        token_in: String,

        #[arg(long)]
        token_out: String,

        /// Human amount of the input token
        #[arg(long)]
        amount: Decimal,

        /// Slippage tolerance in basis points (defaults to the configured one)
        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Add liquidity between two prices
    OpenPosition {
        #[arg(long)]
        token_a: String,

        #[arg(long)]
        token_b: String,

        #[arg(long, default_value_t = 3000)]
        fee: u32,

        /// Lower price of token A in token B
        #[arg(long)]
        min_price: Decimal,

        /// Upper price of token A in token B
        #[arg(long)]
        max_price: Decimal,

        /// Human amount of token A to deposit
        #[arg(long)]
        amount_a: Decimal,

        /// Human amount of token B to deposit
        #[arg(long)]
        amount_b: Decimal,

        #[arg(long)]
        slippage_bps: Option<u32>,
    },
    /// Remove liquidity and collect the tokens
    ClosePosition {
        /// Position NFT id
        #[arg(long)]
        token_id: String,

        /// Liquidity to remove (defaults to all of it)
        #[arg(long)]
        liquidity: Option<u128>,

        /// Minimum raw token0 out
        #[arg(long, default_value_t = 0)]
        amount0_min: u128,

        /// Minimum raw token1 out
        #[arg(long, default_value_t = 0)]
        amount1_min: u128,
    },
    /// Show a position
    Position {
        #[arg(long)]
        token_id: String,
    },
    /// Run the configured monitor rules until interrupted
    Monitor,
}

/// Connections shared by every command.
struct App {
    settings: Settings,
    ledger: Arc<dyn Ledger>,
    oracle: PoolOracle,
    quoter: Arc<OnChainQuoter<HttpProvider>>,
    clock: Arc<dyn Clock>,
}

impl App {
    fn connect(settings: Settings) -> Result<Self> {
        let provider = connect_http(&settings.rpc_url, settings.execution.call_timeout)
            .context("failed to build RPC client")?;
        let ledger: Arc<dyn Ledger> = Arc::new(JsonRpcLedger::new(
            provider.clone(),
            settings.contracts.position_manager,
            settings.receipt_poll_interval,
        ));
        let quoter = Arc::new(OnChainQuoter::new(provider, &settings.contracts));
        info!(rpc = %settings.rpc_url, "Connected");
        Ok(Self {
            oracle: PoolOracle::new(ledger.clone()),
            ledger,
            quoter,
            clock: Arc::new(SystemClock),
            settings,
        })
    }

    async fn pool(&self, a: &Token, b: &Token, fee_tier: FeeTier) -> Result<Pool> {
        let key = PoolKey::new(a.clone(), b.clone(), fee_tier)?;
        let address = self
            .quoter
            .factory()
            .pool_address(a, b, fee_tier)
            .await?
            .ok_or_else(|| anyhow!("no {key} pool deployed"))?;
        Ok(self.oracle.read_pool(&key, address).await?)
    }

    fn sequencer(&self) -> Result<Arc<TransactionSequencer>> {
        Ok(Arc::new(TransactionSequencer::new(
            self.ledger.clone(),
            self.settings.signer()?,
            self.settings.execution.clone(),
        )))
    }

    fn slippage(&self, bps: Option<u32>) -> Result<Percentage> {
        match bps {
            Some(bps) => Ok(Percentage::from_bps(bps)?),
            None => Ok(self.settings.slippage),
        }
    }

    fn deadline(&self) -> u64 {
        self.clock.now() + self.settings.execution.deadline_secs
    }

    async fn quote(&self, token_in: &str, token_out: &str, amount: Decimal) -> Result<Quote> {
        let token_in = self.settings.token(token_in)?;
        let token_out = self.settings.token(token_out)?;
        let amount_in = Amount::from_decimal(token_in, amount)?;
        self.quoter
            .quote(&amount_in, &token_out, self.deadline())
            .await?
            .ok_or_else(|| anyhow!("no route found from {} to {}", amount_in.token.symbol, token_out.symbol))
    }
}

fn parse_token_id(s: &str) -> Result<U256> {
    let s = s.trim();
    match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| anyhow!("invalid token id {s}: {e:?}")),
        None => U256::from_dec_str(s).map_err(|e| anyhow!("invalid token id {s}: {e:?}")),
    }
}

/// Logs trade events as they arrive.
fn spawn_event_logger() -> EventSink {
    let (tx, mut rx) = mpsc::unbounded_channel::<TradeEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(id = %event.id, kind = ?event.event_type, tx = ?event.tx_hash, data = ?event.data, "Trade event");
        }
    });
    EventSink::new(tx)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = TraderConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    config
        .apply_env(|key| env::var(key).ok())
        .context("invalid environment override")?;
    let settings = config.validate().context("invalid configuration")?;
    let app = App::connect(settings)?;

    match cli.command {
        Commands::PoolInfo { token_a, token_b, fee } => {
            let a = app.settings.token(&token_a)?;
            let b = app.settings.token(&token_b)?;
            let fee_tier = FeeTier::from_fee(fee)?;
            let pool = app.pool(&a, &b, fee_tier).await?;
            let info = app.oracle.pool_info(&pool.key(), pool.address).await?;
            println!("{info}");
        }
        Commands::Quote {
            token_in,
            token_out,
            amount,
        } => {
            let quote = app.quote(&token_in, &token_out, amount).await?;
            println!("in        {}", quote.amount_in);
            println!("out       {}", quote.amount_out);
            for hop in &quote.route.hops {
                println!("via       {:?} ({})", hop.pool, hop.fee_tier);
            }
            println!("gas       {}", quote.estimated_gas);
            println!("deadline  {}", quote.deadline);
        }
        Commands::Swap {
            token_in,
            token_out,
            amount,
            slippage_bps,
        } => {
            let slippage = app.slippage(slippage_bps)?;
            let quote = app.quote(&token_in, &token_out, amount).await?;
            let executor = SwapExecutor::new(app.sequencer()?, app.settings.contracts.swap_router, app.clock.clone())
                .with_events(spawn_event_logger());

            println!("Swapping {} for at least {}", quote.amount_in, min_amount_out(&quote, slippage)?);
            let result = executor.execute(&quote, slippage).await.context("swap failed")?;
            println!("tx        {:?}", result.tx_hash);
            println!("spent     {}", result.amount_in);
            println!("received  {}", result.amount_out);
            println!("gas used  {}", result.gas_used);
        }
        Commands::OpenPosition {
            token_a,
            token_b,
            fee,
            min_price,
            max_price,
            amount_a,
            amount_b,
            slippage_bps,
        } => {
            let slippage = app.slippage(slippage_bps)?;
            let a = app.settings.token(&token_a)?;
            let b = app.settings.token(&token_b)?;
            if min_price <= Decimal::ZERO || min_price >= max_price {
                bail!("price range must satisfy 0 < min-price < max-price");
            }
            let pool = app.pool(&a, &b, FeeTier::from_fee(fee)?).await?;

            // Pool prices are token1 per token0.
            let raw_a = Amount::from_decimal(a.clone(), amount_a)?.raw;
            let raw_b = Amount::from_decimal(b, amount_b)?.raw;
            let (lower, upper, amount0, amount1) = if pool.token0 == a {
                (min_price, max_price, raw_a, raw_b)
            } else {
                (Decimal::ONE / max_price, Decimal::ONE / min_price, raw_b, raw_a)
            };

            let manager = PositionManager::new(
                app.sequencer()?,
                app.settings.contracts.position_manager,
                app.clock.clone(),
                app.settings.tokens.clone(),
            )
            .with_events(spawn_event_logger());
            let opened = manager
                .open_position_in_price_range(&pool, lower, upper, amount0, amount1, slippage)
                .await
                .context("failed to open position")?;

            println!("token id  {}", opened.position.token_id);
            println!("ticks     [{}, {})", opened.position.tick_lower, opened.position.tick_upper);
            println!("liquidity {}", opened.position.liquidity);
            println!("deposited {} / {}", Amount::new(pool.token0.clone(), opened.amount0), Amount::new(pool.token1.clone(), opened.amount1));
            println!("tx        {:?}", opened.tx_hash);
        }
        Commands::ClosePosition {
            token_id,
            liquidity,
            amount0_min,
            amount1_min,
        } => {
            let token_id = parse_token_id(&token_id)?;
            let manager = PositionManager::new(
                app.sequencer()?,
                app.settings.contracts.position_manager,
                app.clock.clone(),
                app.settings.tokens.clone(),
            )
            .with_events(spawn_event_logger());
            let liquidity = match liquidity {
                Some(liquidity) => liquidity,
                None => manager.position(token_id).await?.liquidity,
            };
            let closed = manager
                .close_position(token_id, liquidity, U256::from(amount0_min), U256::from(amount1_min))
                .await
                .context("failed to close position")?;

            println!("removed   {}", closed.liquidity_removed);
            println!("received  {} token0 / {} token1 (raw)", closed.amount0, closed.amount1);
            if let Some(tx) = closed.decrease_tx {
                println!("decrease  {tx:?}");
            }
            if let Some(tx) = closed.collect_tx {
                println!("collect   {tx:?}");
            }
        }
        Commands::Position { token_id } => {
            let token_id = parse_token_id(&token_id)?;
            let sequencer = app.sequencer()?;
            let manager = PositionManager::new(
                sequencer,
                app.settings.contracts.position_manager,
                app.clock.clone(),
                app.settings.tokens.clone(),
            );
            let position = manager.position(token_id).await?;
            let pool = app.pool(&position.pool.token0, &position.pool.token1, position.pool.fee_tier).await?;
            let (amount0, amount1) = position.amounts(&pool)?;

            println!("token id  {}", position.token_id);
            println!("owner     {:?}", position.owner);
            println!("pool      {}", position.pool);
            println!("ticks     [{}, {}) current {}", position.tick_lower, position.tick_upper, pool.tick_current);
            println!("status    {:?}", position.status(pool.tick_current));
            println!("liquidity {}", position.liquidity);
            println!("holdings  {} / {}", Amount::new(pool.token0.clone(), amount0), Amount::new(pool.token1.clone(), amount1));
            println!(
                "owed      {} / {}",
                Amount::new(pool.token0.clone(), position.tokens_owed0),
                Amount::new(pool.token1.clone(), position.tokens_owed1)
            );
        }
        Commands::Monitor => run_monitors(app).await?,
    }

    Ok(())
}

async fn run_monitors(app: App) -> Result<()> {
    if app.settings.rules.is_empty() {
        bail!("no [[rules]] configured");
    }

    let mut rules = Vec::with_capacity(app.settings.rules.len());
    for configured in &app.settings.rules {
        let mut rule = configured.rule.clone();
        if !configured.pool_known {
            rule.pool_address = app
                .quoter
                .factory()
                .pool_address(&rule.base, &rule.quote, rule.fee_tier)
                .await?
                .ok_or_else(|| anyhow!("rule {}: no {} pool deployed", rule.pair_key, rule.fee_tier))?;
        }
        rules.push(rule);
    }

    let execution = &app.settings.execution;
    let executor = Arc::new(
        SwapExecutor::new(app.sequencer()?, app.settings.contracts.swap_router, app.clock.clone())
            .with_events(spawn_event_logger()),
    );
    let trigger = Arc::new(SwapTrigger::new(
        app.quoter.clone(),
        executor,
        app.clock.clone(),
        execution.deadline_secs,
        execution.call_timeout,
    ));
    let feed = Arc::new(OraclePriceFeed::new(app.oracle.clone()));

    let (reports_tx, mut reports_rx) = mpsc::unbounded_channel();
    let mut monitors = MonitorSet::new(feed, trigger, execution.call_timeout).with_reports(reports_tx);
    monitors.start_all(rules)?;

    tokio::spawn(async move {
        while let Some(report) = reports_rx.recv().await {
            match report.outcome {
                CycleOutcome::Fired { price, tx_hash } => {
                    println!("{} cycle {}: fired at {} ({:?})", report.pair_key, report.cycle, price, tx_hash);
                }
                CycleOutcome::Failed { reason } => {
                    warn!(rule = %report.pair_key, cycle = report.cycle, %reason, "cycle failed");
                }
                _ => {}
            }
        }
    });

    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")?;
    info!("Shutting down monitors");
    let stopped = monitors.stop_all().await;
    for monitor in stopped {
        println!("{}: {} cycles", monitor.rule().pair_key, monitor.cycles());
    }
    Ok(())
}
