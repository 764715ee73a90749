use super::feed::PriceFeed;
use super::price_monitor::{CycleReport, MonitorHandle, PriceMonitor};
use super::trigger::TriggerAction;
use crate::error::ExecutionError;
use clmm_trader_domain::MonitorRule;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Runs one [`PriceMonitor`] per rule, sharing a feed and an action.
pub struct MonitorSet {
    feed: Arc<dyn PriceFeed>,
    action: Arc<dyn TriggerAction>,
    call_timeout: Duration,
    reports: Option<mpsc::UnboundedSender<CycleReport>>,
    running: Vec<(String, MonitorHandle)>,
}

impl MonitorSet {
    pub fn new(feed: Arc<dyn PriceFeed>, action: Arc<dyn TriggerAction>, call_timeout: Duration) -> Self {
        Self {
            feed,
            action,
            call_timeout,
            reports: None,
            running: Vec::new(),
        }
    }

    /// Forwards every monitor's cycle reports to `reports`.
    #[must_use]
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<CycleReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Validates and starts a monitor for `rule`.
    pub fn start(&mut self, rule: MonitorRule) -> Result<(), ExecutionError> {
        rule.validate()?;
        if self.running.iter().any(|(key, _)| key == &rule.pair_key) {
            return Err(ExecutionError::Configuration(format!(
                "duplicate monitor rule {}; rules on the same pair need distinct pair_key labels",
                rule.pair_key
            )));
        }

        let pair_key = rule.pair_key.clone();
        let mut monitor = PriceMonitor::new(rule, self.feed.clone(), self.action.clone(), self.call_timeout);
        if let Some(reports) = &self.reports {
            monitor = monitor.with_reports(reports.clone());
        }
        self.running.push((pair_key, monitor.spawn()));
        Ok(())
    }

    /// Starts every rule, rejecting the whole set if any rule is invalid.
    pub fn start_all(&mut self, rules: Vec<MonitorRule>) -> Result<(), ExecutionError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.pair_key.as_str()) {
                return Err(ExecutionError::Configuration(format!(
                    "duplicate monitor rule {}; rules on the same pair need distinct pair_key labels",
                    rule.pair_key
                )));
            }
        }
        for rule in rules {
            self.start(rule)?;
        }
        info!(count = self.running.len(), "Monitors running");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    pub fn pair_keys(&self) -> impl Iterator<Item = &str> {
        self.running.iter().map(|(key, _)| key.as_str())
    }

    /// Re-arms an edge-triggered monitor. Returns false for unknown keys.
    pub fn rearm(&self, pair_key: &str) -> bool {
        match self.running.iter().find(|(key, _)| key == pair_key) {
            Some((_, handle)) => {
                handle.rearm();
                true
            }
            None => false,
        }
    }

    /// Stops every monitor and returns them in start order.
    pub async fn stop_all(&mut self) -> Vec<PriceMonitor> {
        let mut stopped = Vec::with_capacity(self.running.len());
        for (pair_key, handle) in self.running.drain(..) {
            match handle.stop().await {
                Ok(monitor) => stopped.push(monitor),
                Err(err) => warn!(rule = %pair_key, error = %err, "monitor task failed"),
            }
        }
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::price_monitor::MonitorState;
    use crate::test_support::{pool_address, token_a, token_b};
    use async_trait::async_trait;
    use clmm_trader_domain::{Direction, FeeTier, Percentage, TriggerMode};
    use clmm_trader_protocols::TxHash;
    use primitive_types::U256;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct ConstantFeed(Decimal);

    #[async_trait]
    impl PriceFeed for ConstantFeed {
        async fn price(&self, _rule: &MonitorRule) -> Result<Decimal, ExecutionError> {
            Ok(self.0)
        }
    }

    #[derive(Default)]
    struct Recorder {
        fired: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TriggerAction for Recorder {
        async fn fire(&self, rule: &MonitorRule, _price: Decimal) -> Result<TxHash, ExecutionError> {
            self.fired.lock().unwrap().push(rule.pair_key.clone());
            Ok(TxHash::zero())
        }
    }

    fn rule(pair_key: &str, direction: Direction, target: Decimal) -> MonitorRule {
        MonitorRule {
            pair_key: pair_key.into(),
            pool_address: pool_address(),
            base: token_a(),
            quote: token_b(),
            fee_tier: FeeTier::MEDIUM,
            target_price: target,
            direction,
            trade_amount: U256::from(10u8),
            poll_interval_ms: 500,
            trigger_mode: TriggerMode::Edge,
            slippage: Percentage::from_bps(50).unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rules_run_independently() {
        let recorder = Arc::new(Recorder::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut set = MonitorSet::new(Arc::new(ConstantFeed(dec!(2000))), recorder.clone(), Duration::from_secs(1))
            .with_reports(tx);

        set.start_all(vec![
            rule("buy-dip", Direction::Buy, dec!(2100)),
            rule("sell-top", Direction::Sell, dec!(2500)),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);

        // Two cycles each.
        for _ in 0..4 {
            rx.recv().await.unwrap();
        }
        let stopped = set.stop_all().await;
        assert!(set.is_empty());
        assert_eq!(stopped.len(), 2);
        assert!(stopped.iter().all(|m| m.state() == MonitorState::Stopped));

        // Edge mode: the buy rule fires once, the sell rule never.
        assert_eq!(*recorder.fired.lock().unwrap(), vec!["buy-dip".to_string()]);
    }

    #[tokio::test]
    async fn test_rejects_invalid_and_duplicate_rules() {
        let mut set = MonitorSet::new(
            Arc::new(ConstantFeed(dec!(1))),
            Arc::new(Recorder::default()),
            Duration::from_secs(1),
        );

        let mut zero_interval = rule("a", Direction::Buy, dec!(1));
        zero_interval.poll_interval_ms = 0;
        assert!(set.start_all(vec![zero_interval]).is_err());

        let dup = vec![rule("a", Direction::Buy, dec!(1)), rule("a", Direction::Sell, dec!(2))];
        match set.start_all(dup) {
            Err(ExecutionError::Configuration(reason)) => assert!(reason.contains("distinct pair_key")),
            other => panic!("unexpected {other:?}"),
        }
        assert!(set.is_empty());
        assert!(!set.rearm("a"));
    }
}
