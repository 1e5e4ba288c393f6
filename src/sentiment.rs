//! Fear-and-Greed classification.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{client::alternative::FearAndGreedEntry, config::SentimentThresholds, market::MarketData};

const NOT_AVAILABLE: &str = "N/A";

/// Bucket a reading falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentState {
    #[serde(rename = "Extreme Fear")]
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    #[serde(rename = "Extreme Greed")]
    ExtremeGreed,
    /// No reading to classify.
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl SentimentState {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ExtremeFear => "Extreme Fear",
            Self::Fear => "Fear",
            Self::Neutral => "Neutral",
            Self::Greed => "Greed",
            Self::ExtremeGreed => "Extreme Greed",
            Self::NotAvailable => NOT_AVAILABLE,
        }
    }

    #[must_use]
    pub fn interpretation(self) -> &'static str {
        match self {
            Self::ExtremeFear => {
                "Investors are extremely fearful; selling pressure may be overdone."
            }
            Self::Fear => "Market sentiment is fearful.",
            Self::Neutral => "Market sentiment is balanced.",
            Self::Greed => "Investors are getting greedy.",
            Self::ExtremeGreed => {
                "Investors are extremely greedy; the market may be due for a correction."
            }
            Self::NotAvailable => NOT_AVAILABLE,
        }
    }

    #[must_use]
    pub fn hint(self) -> &'static str {
        match self {
            Self::ExtremeFear => {
                "Look for accumulation opportunities; consider scaling into positions."
            }
            Self::Fear => "Be cautious but watch for buying opportunities.",
            Self::Neutral => "Follow the technical trend; no sentiment edge.",
            Self::Greed => "Consider tightening stops and taking partial profits.",
            Self::ExtremeGreed => "Avoid chasing; consider reducing exposure.",
            Self::NotAvailable => "No data available to analyze sentiment.",
        }
    }
}

impl fmt::Display for SentimentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of classifying one run's sentiment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentArtifact {
    /// Index value that was classified, `None` without data.
    pub sentiment_index: Option<u8>,
    /// Label the provider attached to the reading.
    pub original_classification: String,
    pub state: SentimentState,
    pub interpretation: String,
    pub hint: String,
}

impl SentimentArtifact {
    /// Artifact for a run without any sentiment readings.
    #[must_use]
    pub fn failed() -> Self {
        let state = SentimentState::NotAvailable;
        Self {
            sentiment_index: None,
            original_classification: NOT_AVAILABLE.to_owned(),
            state,
            interpretation: state.interpretation().to_owned(),
            hint: state.hint().to_owned(),
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.sentiment_index.is_none()
    }
}

/// Maps the day's Fear-and-Greed reading to a [`SentimentState`].
///
/// Thresholds are exclusive upper bounds. By default there are four buckets
/// and the band between `fear` and `greed` counts as Greed, so Neutral is
/// never produced. With [`neutral_band`](SentimentThresholds::neutral_band)
/// set that band is Neutral and Greed starts at `greed`.
#[derive(Debug, Clone, Copy)]
pub struct SentimentAnalyzer {
    thresholds: SentimentThresholds,
}

impl SentimentAnalyzer {
    #[must_use]
    pub fn new(thresholds: SentimentThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn classify(&self, value: u8) -> SentimentState {
        let t = &self.thresholds;

        if value < t.extreme_fear {
            SentimentState::ExtremeFear
        } else if value < t.fear {
            SentimentState::Fear
        } else if !t.neutral_band {
            if value < t.greed {
                SentimentState::Greed
            } else {
                SentimentState::ExtremeGreed
            }
        } else if value < t.greed {
            SentimentState::Neutral
        } else if value < t.extreme_greed {
            SentimentState::Greed
        } else {
            SentimentState::ExtremeGreed
        }
    }

    /// Classifies the reading for the current UTC date.
    #[must_use]
    pub fn analyze(&self, data: &MarketData) -> SentimentArtifact {
        self.analyze_on(data, Utc::now().date_naive())
    }

    /// Classifies the reading dated `today`, or the latest reading when
    /// none matches.
    #[must_use]
    pub fn analyze_on(&self, data: &MarketData, today: NaiveDate) -> SentimentArtifact {
        let Some(entry) = select_entry(&data.fear_and_greed.entries, today) else {
            debug!("no fear and greed entries; sentiment unavailable");
            return SentimentArtifact::failed();
        };

        let state = self.classify(entry.value);
        debug!(value = entry.value, %state, timestamp = entry.timestamp, "sentiment classified");

        SentimentArtifact {
            sentiment_index: Some(entry.value),
            original_classification: entry.value_classification.clone(),
            state,
            interpretation: state.interpretation().to_owned(),
            hint: state.hint().to_owned(),
        }
    }
}

fn select_entry(entries: &[FearAndGreedEntry], today: NaiveDate) -> Option<&FearAndGreedEntry> {
    entries
        .iter()
        .find(|e| e.date() == Some(today))
        .or_else(|| entries.iter().max_by_key(|e| e.timestamp))
}
