//! Application configuration, parsed from YAML.
//!
//! ```yaml
//! name: upbit-assistant
//! thresholds:
//!   sentiment:
//!     extreme_fear: 25
//!     fear: 45
//!     greed: 55
//!     extreme_greed: 75
//!   technical:
//!     ma_period: 20
//! ```
//!
//! Everything outside `name` and `thresholds` is optional and falls back to
//! the defaults documented on each field.

use std::{num::NonZero, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_SMA_LENGTH, DEFAULT_VOLATILITY_LENGTH, Error, Result, SmaConfig, VolatilityConfig,
    client::{alternative::ALTERNATIVE_BASE_URL, upbit::UPBIT_BASE_URL},
};

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Name of the application, used in log output.
    pub name: String,

    /// Sentiment and technical parameters.
    pub thresholds: Thresholds,

    #[serde(default)]
    pub market: MarketConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    pub sentiment: SentimentThresholds,
    pub technical: TechnicalThresholds,
}

/// Fear-and-Greed bucket boundaries, strictly increasing within `0..=100`.
///
/// Boundaries are exclusive upper bounds: an index equal to `fear` is not
/// classified as fear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentimentThresholds {
    /// Below this the market is in extreme fear.
    pub extreme_fear: u8,
    /// Below this the market is in fear.
    pub fear: u8,
    /// Upper boundary of the band between fear and greed.
    pub greed: u8,
    /// At or above this the market is in extreme greed.
    pub extreme_greed: u8,
    /// Classify the band between `fear` and `greed` as Neutral instead of
    /// Greed. Off by default.
    #[serde(default)]
    pub neutral_band: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TechnicalThresholds {
    /// Moving average lookback in bars.
    pub ma_period: NonZero<usize>,
    /// True-range averaging lookback in bars. Defaults to 14.
    #[serde(default = "default_volatility_period")]
    pub volatility_period: NonZero<usize>,
}

impl Default for TechnicalThresholds {
    fn default() -> Self {
        Self {
            ma_period: DEFAULT_SMA_LENGTH,
            volatility_period: DEFAULT_VOLATILITY_LENGTH,
        }
    }
}

impl TechnicalThresholds {
    #[must_use]
    pub fn sma_config(&self) -> SmaConfig {
        SmaConfig::close(self.ma_period)
    }

    #[must_use]
    pub fn volatility_config(&self) -> VolatilityConfig {
        VolatilityConfig::new(self.volatility_period)
    }
}

/// What the aggregator fetches for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Market whose day candles feed the technical stage.
    pub reference_market: String,
    /// Number of day candles to request.
    pub candle_count: u32,
    /// Number of most recent Fear-and-Greed entries to request.
    pub fear_and_greed_limit: u32,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            reference_market: "KRW-BTC".to_owned(),
            candle_count: 200,
            fear_and_greed_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub upbit_base_url: String,
    pub alternative_base_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            upbit_base_url: UPBIT_BASE_URL.to_owned(),
            alternative_base_url: ALTERNATIVE_BASE_URL.to_owned(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorConfig {
    /// Log decisions instead of placing orders.
    pub dry_run: bool,
    /// Quote-currency amount spent by one market buy.
    pub order_budget: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            order_budget: 5000.0,
        }
    }
}

fn default_volatility_period() -> NonZero<usize> {
    DEFAULT_VOLATILITY_LENGTH
}

impl AppConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// [`Error::Yaml`] when the document does not match the schema,
    /// [`Error::Config`] when values are inconsistent.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] when the file cannot be read, otherwise as
    /// [`from_yaml_str`](Self::from_yaml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Checks cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let s = &self.thresholds.sentiment;
        let ordered = s.extreme_fear < s.fear && s.fear < s.greed && s.greed < s.extreme_greed;
        if !ordered {
            return Err(Error::Config(format!(
                "sentiment thresholds must strictly increase: extreme_fear={} fear={} greed={} extreme_greed={}",
                s.extreme_fear, s.fear, s.greed, s.extreme_greed
            )));
        }
        if s.extreme_greed > 100 {
            return Err(Error::Config(format!(
                "extreme_greed must be at most 100, got {}",
                s.extreme_greed
            )));
        }
        if !self.market.reference_market.contains('-') {
            return Err(Error::Config(format!(
                "reference_market must look like QUOTE-BASE, got {:?}",
                self.market.reference_market
            )));
        }
        if self.market.candle_count == 0 || self.market.fear_and_greed_limit == 0 {
            return Err(Error::Config(
                "candle_count and fear_and_greed_limit must be positive".to_owned(),
            ));
        }
        if !(self.executor.order_budget.is_finite() && self.executor.order_budget > 0.0) {
            return Err(Error::Config(format!(
                "order_budget must be positive, got {}",
                self.executor.order_budget
            )));
        }
        Ok(())
    }
}
