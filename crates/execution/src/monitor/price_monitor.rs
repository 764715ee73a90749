//! Price-triggered trading state machine.
//!
//! A monitor samples its rule's price once on start and then every poll
//! interval. When the condition holds it fires its [`TriggerAction`]:
//! - [`TriggerMode::Level`] fires on every satisfied poll
//! - [`TriggerMode::Edge`] fires once, then stays latched until the
//!   condition turns false or [`PriceMonitor::rearm`] is called
//!
//! Failures inside a cycle are logged and reported as
//! [`CycleOutcome::Failed`]; the monitor keeps polling.

use super::feed::PriceFeed;
use super::trigger::TriggerAction;
use crate::error::with_timeout;
use clmm_trader_domain::{MonitorRule, TriggerMode};
use clmm_trader_protocols::TxHash;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Where the monitor is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorState {
    Idle,
    Polling,
    ConditionMet,
    Executing,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Armed,
    Fired,
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CycleOutcome {
    /// Condition false.
    NotMet { price: Decimal },
    /// Condition true and the action submitted a transaction.
    Fired { price: Decimal, tx_hash: TxHash },
    /// Condition true but the edge latch already fired.
    Suppressed { price: Decimal },
    /// Price read or action failed.
    Failed { reason: String },
}

impl CycleOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, CycleOutcome::Fired { .. })
    }
}

/// One cycle as reported to observers.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub pair_key: String,
    /// 1-based cycle number.
    pub cycle: u64,
    pub outcome: CycleOutcome,
}

/// Polls one rule and fires its action.
pub struct PriceMonitor {
    rule: MonitorRule,
    feed: Arc<dyn PriceFeed>,
    action: Arc<dyn TriggerAction>,
    call_timeout: Duration,
    state: MonitorState,
    latch: Latch,
    cycles: u64,
    reports: Option<mpsc::UnboundedSender<CycleReport>>,
}

impl PriceMonitor {
    pub fn new(
        rule: MonitorRule,
        feed: Arc<dyn PriceFeed>,
        action: Arc<dyn TriggerAction>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            rule,
            feed,
            action,
            call_timeout,
            state: MonitorState::Idle,
            latch: Latch::Armed,
            cycles: 0,
            reports: None,
        }
    }

    /// Sends every cycle's outcome to `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<CycleReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn rule(&self) -> &MonitorRule {
        &self.rule
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Re-enables an edge-triggered rule that has fired.
    pub fn rearm(&mut self) {
        if self.latch == Latch::Fired {
            debug!(rule = %self.rule.pair_key, "rearmed");
        }
        self.latch = Latch::Armed;
    }

    /// Samples the price once and fires when due.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.cycles += 1;
        self.state = MonitorState::Polling;

        let price = match with_timeout("price read", self.call_timeout, self.feed.price(&self.rule)).await {
            Ok(price) => price,
            Err(err) => {
                warn!(rule = %self.rule.pair_key, cycle = self.cycles, error = %err, "price read failed");
                return CycleOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        if !self.rule.is_satisfied(price) {
            debug!(rule = %self.rule.pair_key, cycle = self.cycles, %price, "condition not met");
            self.latch = Latch::Armed;
            return CycleOutcome::NotMet { price };
        }

        self.state = MonitorState::ConditionMet;
        if self.rule.trigger_mode == TriggerMode::Edge && self.latch == Latch::Fired {
            debug!(rule = %self.rule.pair_key, cycle = self.cycles, %price, "condition still met, latched");
            self.state = MonitorState::Polling;
            return CycleOutcome::Suppressed { price };
        }

        self.state = MonitorState::Executing;
        let outcome = match self.action.fire(&self.rule, price).await {
            Ok(tx_hash) => {
                self.latch = Latch::Fired;
                info!(
                    rule = %self.rule.pair_key,
                    cycle = self.cycles,
                    %price,
                    target = %self.rule.target_price,
                    tx = ?tx_hash,
                    "Monitor fired"
                );
                CycleOutcome::Fired { price, tx_hash }
            }
            Err(err) => {
                warn!(rule = %self.rule.pair_key, cycle = self.cycles, %price, error = %err, "trigger failed");
                CycleOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };
        self.state = MonitorState::Polling;
        outcome
    }

    fn report(&self, outcome: &CycleOutcome) {
        if let Some(reports) = &self.reports {
            let _ = reports.send(CycleReport {
                pair_key: self.rule.pair_key.clone(),
                cycle: self.cycles,
                outcome: outcome.clone(),
            });
        }
    }

    /// Runs the monitor on its own task until stopped.
    ///
    /// Dropping the handle without calling [`MonitorHandle::stop`] also stops
    /// the monitor at its next poll boundary.
    pub fn spawn(mut self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let rearm = Arc::new(AtomicBool::new(false));
        let rearm_requested = rearm.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval(self.rule.poll_interval().max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                rule = %self.rule.pair_key,
                direction = %self.rule.direction,
                target = %self.rule.target_price,
                interval_ms = self.rule.poll_interval_ms,
                mode = ?self.rule.trigger_mode,
                "Starting price monitor"
            );

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if rearm_requested.swap(false, Ordering::SeqCst) {
                            self.rearm();
                        }
                        let outcome = self.run_cycle().await;
                        self.report(&outcome);
                    }
                }
            }

            self.state = MonitorState::Stopped;
            info!(rule = %self.rule.pair_key, cycles = self.cycles, "Price monitor stopped");
            self
        });

        MonitorHandle {
            stop: stop_tx,
            rearm,
            task,
        }
    }
}

/// Control handle of a spawned [`PriceMonitor`].
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    rearm: Arc<AtomicBool>,
    task: JoinHandle<PriceMonitor>,
}

impl MonitorHandle {
    /// Requests a re-arm before the next cycle.
    pub fn rearm(&self) {
        self.rearm.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops at the next poll boundary, letting an in-flight cycle finish,
    /// and returns the stopped monitor.
    pub async fn stop(self) -> Result<PriceMonitor, tokio::task::JoinError> {
        let _ = self.stop.send(true);
        self.task.await
    }
}
