//! Lifecycle markers a run reports to its observer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Result, executor::Execution, market::MarketData, sentiment::SentimentArtifact,
    strategy::StrategyArtifact, technical::TechnicalArtifact,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    System,
    Data,
    Analysis,
    Execution,
}

/// One step of a run, in emission order:
/// `start`, `market_data_fetched`, `sentiment_computed`,
/// `technical_computed`, `strategy_decided`, `executed`, `finished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub run_id: Uuid,
    /// Serialized artifact of the step, when it has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl Event {
    pub const START: &'static str = "start";
    pub const MARKET_DATA_FETCHED: &'static str = "market_data_fetched";
    pub const SENTIMENT_COMPUTED: &'static str = "sentiment_computed";
    pub const TECHNICAL_COMPUTED: &'static str = "technical_computed";
    pub const STRATEGY_DECIDED: &'static str = "strategy_decided";
    pub const EXECUTED: &'static str = "executed";
    pub const FINISHED: &'static str = "finished";

    fn bare(id: &str, kind: EventKind, run_id: Uuid) -> Self {
        Self {
            id: id.to_owned(),
            kind,
            run_id,
            payload: None,
        }
    }

    fn with_payload(
        id: &str,
        kind: EventKind,
        run_id: Uuid,
        payload: &impl Serialize,
    ) -> Result<Self> {
        Ok(Self {
            payload: Some(serde_json::to_value(payload)?),
            ..Self::bare(id, kind, run_id)
        })
    }

    #[must_use]
    pub fn start(run_id: Uuid) -> Self {
        Self::bare(Self::START, EventKind::System, run_id)
    }

    /// # Errors
    ///
    /// [`Error::Serialize`](crate::Error::Serialize) if the snapshot cannot
    /// be encoded.
    pub fn market_data_fetched(run_id: Uuid, data: &MarketData) -> Result<Self> {
        Self::with_payload(Self::MARKET_DATA_FETCHED, EventKind::Data, run_id, data)
    }

    /// # Errors
    ///
    /// [`Error::Serialize`](crate::Error::Serialize) if the artifact cannot
    /// be encoded.
    pub fn sentiment_computed(run_id: Uuid, artifact: &SentimentArtifact) -> Result<Self> {
        Self::with_payload(Self::SENTIMENT_COMPUTED, EventKind::Analysis, run_id, artifact)
    }

    /// # Errors
    ///
    /// [`Error::Serialize`](crate::Error::Serialize) if the artifact cannot
    /// be encoded.
    pub fn technical_computed(run_id: Uuid, artifact: &TechnicalArtifact) -> Result<Self> {
        Self::with_payload(Self::TECHNICAL_COMPUTED, EventKind::Analysis, run_id, artifact)
    }

    /// # Errors
    ///
    /// [`Error::Serialize`](crate::Error::Serialize) if the artifact cannot
    /// be encoded.
    pub fn strategy_decided(run_id: Uuid, artifact: &StrategyArtifact) -> Result<Self> {
        Self::with_payload(Self::STRATEGY_DECIDED, EventKind::Analysis, run_id, artifact)
    }

    /// # Errors
    ///
    /// [`Error::Serialize`](crate::Error::Serialize) if the outcome cannot
    /// be encoded.
    pub fn executed(run_id: Uuid, execution: &Execution) -> Result<Self> {
        Self::with_payload(Self::EXECUTED, EventKind::Execution, run_id, execution)
    }

    #[must_use]
    pub fn finished(run_id: Uuid) -> Self {
        Self::bare(Self::FINISHED, EventKind::System, run_id)
    }
}
