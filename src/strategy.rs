//! Turns the sentiment and technical artifacts into a trading signal.
//!
//! The decision itself is a [`SignalRule`]. The bundled [`FixedSignalRule`]
//! is a placeholder that ignores its inputs; supply a real rule with
//! [`StrategyExecutor::with_rule`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Price,
    sentiment::{SentimentArtifact, SentimentState},
    technical::TechnicalArtifact,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLevel {
    Red,
    Yellow,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub level: SignalLevel,
    /// Human-readable justification.
    pub reason: String,
    /// Recommended action.
    pub action: Action,
}

impl Signal {
    #[must_use]
    pub fn new(level: SignalLevel, action: Action, reason: impl Into<String>) -> Self {
        Self {
            level,
            reason: reason.into(),
            action,
        }
    }
}

/// Decides a [`Signal`] from one run's artifacts.
///
/// Implemented for any `Fn(&SentimentArtifact, &TechnicalArtifact) -> Signal`.
pub trait SignalRule: Send + Sync {
    fn decide(&self, sentiment: &SentimentArtifact, technical: &TechnicalArtifact) -> Signal;
}

impl<F> SignalRule for F
where
    F: Fn(&SentimentArtifact, &TechnicalArtifact) -> Signal + Send + Sync,
{
    fn decide(&self, sentiment: &SentimentArtifact, technical: &TechnicalArtifact) -> Signal {
        self(sentiment, technical)
    }
}

/// Always YELLOW / HOLD, whatever the inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSignalRule;

impl FixedSignalRule {
    pub const REASON: &'static str = "placeholder rule";
}

impl SignalRule for FixedSignalRule {
    fn decide(&self, _: &SentimentArtifact, _: &TechnicalArtifact) -> Signal {
        Signal::new(SignalLevel::Yellow, Action::Hold, Self::REASON)
    }
}

/// What the executor acts on, with the readings the rule saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyArtifact {
    /// Market the action applies to.
    pub market: String,
    pub signal: Signal,
    pub sentiment: SentimentState,
    pub sentiment_index: Option<u8>,
    pub latest_sma: Option<Price>,
    pub latest_volatility: Option<Price>,
}

pub struct StrategyExecutor {
    market: String,
    rule: Box<dyn SignalRule>,
}

impl fmt::Debug for StrategyExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyExecutor")
            .field("market", &self.market)
            .finish_non_exhaustive()
    }
}

impl StrategyExecutor {
    /// Executor for `market` using [`FixedSignalRule`].
    #[must_use]
    pub fn new(market: impl Into<String>) -> Self {
        Self {
            market: market.into(),
            rule: Box::new(FixedSignalRule),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl SignalRule + 'static) -> Self {
        self.rule = Box::new(rule);
        self
    }

    #[must_use]
    pub fn market(&self) -> &str {
        &self.market
    }

    #[must_use]
    pub fn execute(
        &self,
        sentiment: &SentimentArtifact,
        technical: &TechnicalArtifact,
    ) -> StrategyArtifact {
        let signal = self.rule.decide(sentiment, technical);
        info!(
            market = %self.market,
            level = ?signal.level,
            action = %signal.action,
            reason = %signal.reason,
            "strategy decided"
        );

        StrategyArtifact {
            market: self.market.clone(),
            signal,
            sentiment: sentiment.state,
            sentiment_index: sentiment.sentiment_index,
            latest_sma: technical.latest_sma(),
            latest_volatility: technical.latest_volatility(),
        }
    }
}
