//! Acting on a decided strategy.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Result,
    client::upbit::{CreateOrderBody, Order, UpbitClient},
    strategy::{Action, StrategyArtifact},
};

/// What an [`Executor`] did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Execution {
    /// Nothing was done.
    Skipped { reason: String },
    /// The action was logged but not sent. `amount` is the quote budget of
    /// a buy; a sell would use the whole balance.
    Simulated {
        action: Action,
        market: String,
        amount: Option<f64>,
    },
    /// The exchange accepted an order.
    Placed { order: Order },
}

pub trait Executor: Debug + Send + Sync {
    /// # Errors
    ///
    /// Whatever the exchange returns for the calls the action needs.
    fn act_on_strategy(&self, strategy: &StrategyArtifact) -> Result<Execution>;
}

/// Logs intended actions without touching the network.
#[derive(Debug, Clone, Copy)]
pub struct DryRunExecutor {
    budget: f64,
}

impl DryRunExecutor {
    #[must_use]
    pub fn new(budget: f64) -> Self {
        Self { budget }
    }
}

impl Executor for DryRunExecutor {
    fn act_on_strategy(&self, strategy: &StrategyArtifact) -> Result<Execution> {
        let action = strategy.signal.action;
        let amount = match action {
            Action::Hold => return Ok(hold(strategy)),
            Action::Buy => Some(self.budget),
            Action::Sell => None,
        };

        info!(market = %strategy.market, %action, ?amount, "dry run; no order sent");
        Ok(Execution::Simulated {
            action,
            market: strategy.market.clone(),
            amount,
        })
    }
}

/// Places market orders on Upbit.
///
/// BUY spends `budget` of the quote currency; SELL sells the whole available
/// balance of the base asset.
#[derive(Debug, Clone)]
pub struct OrderExecutor {
    upbit: UpbitClient,
    budget: f64,
}

impl OrderExecutor {
    #[must_use]
    pub fn new(upbit: UpbitClient, budget: f64) -> Self {
        Self { upbit, budget }
    }

    fn sell_all(&self, market: &str) -> Result<Execution> {
        let base = market.split_once('-').map_or(market, |(_, base)| base);
        let balance = self
            .upbit
            .accounts()?
            .into_iter()
            .find(|a| a.currency == base)
            .and_then(|a| a.available())
            .unwrap_or(0.0);

        if balance <= 0.0 {
            warn!(market, currency = base, "nothing to sell");
            return Ok(Execution::Skipped {
                reason: format!("no {base} balance to sell"),
            });
        }

        let order = self
            .upbit
            .create_order(&CreateOrderBody::market_sell(market, balance))?;
        Ok(Execution::Placed { order })
    }
}

impl Executor for OrderExecutor {
    fn act_on_strategy(&self, strategy: &StrategyArtifact) -> Result<Execution> {
        match strategy.signal.action {
            Action::Hold => Ok(hold(strategy)),
            Action::Buy => {
                let order = self
                    .upbit
                    .create_order(&CreateOrderBody::market_buy(&strategy.market, self.budget))?;
                Ok(Execution::Placed { order })
            }
            Action::Sell => self.sell_all(&strategy.market),
        }
    }
}

fn hold(strategy: &StrategyArtifact) -> Execution {
    info!(market = %strategy.market, reason = %strategy.signal.reason, "holding");
    Execution::Skipped {
        reason: format!("hold: {}", strategy.signal.reason),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        client::{
            HttpClient, Method,
            auth::{Authenticator, Credentials},
            upbit::{UPBIT_BASE_URL, tests::ORDER_JSON},
        },
        sentiment::SentimentState,
        strategy::{Signal, SignalLevel},
        test_util::StubTransport,
    };

    fn strategy(action: Action) -> StrategyArtifact {
        StrategyArtifact {
            market: "KRW-BTC".into(),
            signal: Signal::new(SignalLevel::Green, action, "test"),
            sentiment: SentimentState::Fear,
            sentiment_index: Some(30),
            latest_sma: Some(100.0),
            latest_volatility: Some(5.0),
        }
    }

    fn order_executor(stub: &Arc<StubTransport>) -> OrderExecutor {
        let upbit = UpbitClient::new(HttpClient::new(stub.clone(), UPBIT_BASE_URL))
            .with_authenticator(Authenticator::new(Credentials::new("a", "s").unwrap()));
        OrderExecutor::new(upbit, 5000.0)
    }

    fn accounts_json(btc: &str) -> String {
        format!(
            r#"[
            {{"currency": "KRW", "balance": "100000", "locked": "0", "avg_buy_price": "0",
              "avg_buy_price_modified": false, "unit_currency": "KRW"}},
            {{"currency": "BTC", "balance": "{btc}", "locked": "0", "avg_buy_price": "90000000",
              "avg_buy_price_modified": false, "unit_currency": "KRW"}}
        ]"#
        )
    }

    mod dry_run {
        use super::*;

        #[test]
        fn hold_is_skipped() {
            let execution = DryRunExecutor::new(5000.0)
                .act_on_strategy(&strategy(Action::Hold))
                .unwrap();
            assert_eq!(execution, Execution::Skipped { reason: "hold: test".into() });
        }

        #[test]
        fn buy_is_simulated_with_budget() {
            let execution = DryRunExecutor::new(5000.0)
                .act_on_strategy(&strategy(Action::Buy))
                .unwrap();

            assert_eq!(
                execution,
                Execution::Simulated {
                    action: Action::Buy,
                    market: "KRW-BTC".into(),
                    amount: Some(5000.0),
                }
            );
        }

        #[test]
        fn serializes_with_status_tag() {
            let json = serde_json::to_value(Execution::Skipped { reason: "r".into() }).unwrap();
            assert_eq!(json, serde_json::json!({"status": "skipped", "reason": "r"}));
        }
    }

    mod orders {
        use super::*;

        #[test]
        fn hold_sends_nothing() {
            let stub = Arc::new(StubTransport::new());
            let execution = order_executor(&stub)
                .act_on_strategy(&strategy(Action::Hold))
                .unwrap();

            assert!(matches!(execution, Execution::Skipped { .. }));
            assert!(stub.requests().is_empty());
        }

        #[test]
        fn buy_places_market_buy_for_budget() {
            let stub = Arc::new(StubTransport::new().route("/v1/orders", 201, ORDER_JSON));
            let execution = order_executor(&stub)
                .act_on_strategy(&strategy(Action::Buy))
                .unwrap();

            assert!(matches!(execution, Execution::Placed { .. }));
            let sent = &stub.requests()[0];
            assert_eq!(sent.method, Method::Post);
            assert_eq!(
                sent.body,
                Some(serde_json::json!({
                    "market": "KRW-BTC", "side": "bid", "price": "5000", "ord_type": "price"
                }))
            );
        }

        #[test]
        fn sell_uses_full_base_balance() {
            let stub = Arc::new(
                StubTransport::new()
                    .route("/v1/accounts", 200, accounts_json("0.5"))
                    .route("/v1/orders", 201, ORDER_JSON),
            );

            order_executor(&stub)
                .act_on_strategy(&strategy(Action::Sell))
                .unwrap();

            let order = &stub.requests_to("/v1/orders")[0];
            assert_eq!(
                order.body,
                Some(serde_json::json!({
                    "market": "KRW-BTC", "side": "ask", "volume": "0.5", "ord_type": "market"
                }))
            );
        }

        #[test]
        fn sell_without_balance_is_skipped() {
            let stub = Arc::new(StubTransport::new().route("/v1/accounts", 200, accounts_json("0")));

            let execution = order_executor(&stub)
                .act_on_strategy(&strategy(Action::Sell))
                .unwrap();

            assert!(matches!(execution, Execution::Skipped { .. }));
            assert!(stub.requests_to("/v1/orders").is_empty());
        }

        #[test]
        fn exchange_error_propagates() {
            let body = r#"{"error": {"name": "insufficient_funds_bid", "message": "no funds"}}"#;
            let stub = Arc::new(StubTransport::new().route("/v1/orders", 400, body));

            let err = order_executor(&stub)
                .act_on_strategy(&strategy(Action::Buy))
                .unwrap_err();

            assert_eq!(err.status(), Some(400));
        }
    }
}
