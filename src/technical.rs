//! SMA and volatility over the reference market's day candles.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    IndicatorSeries, OhlcvSeries, Price, Sma, SmaConfig, Volatility, VolatilityConfig,
    compute_series, config::TechnicalThresholds, market::MarketData,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Simple moving average of closes.
    pub sma: IndicatorSeries,
    /// Simple moving average of true range.
    pub volatility: IndicatorSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalArtifact {
    pub metrics: Metrics,
}

impl TechnicalArtifact {
    /// SMA at the most recent bar, `None` while still warming up.
    #[must_use]
    pub fn latest_sma(&self) -> Option<Price> {
        self.metrics.sma.latest().and_then(|(_, v)| v)
    }

    /// Volatility at the most recent bar, `None` while still warming up.
    #[must_use]
    pub fn latest_volatility(&self) -> Option<Price> {
        self.metrics.volatility.latest().and_then(|(_, v)| v)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalAnalyzer {
    sma: SmaConfig,
    volatility: VolatilityConfig,
}

impl TechnicalAnalyzer {
    #[must_use]
    pub fn new(sma: SmaConfig, volatility: VolatilityConfig) -> Self {
        Self { sma, volatility }
    }

    #[must_use]
    pub fn from_thresholds(thresholds: &TechnicalThresholds) -> Self {
        Self::new(thresholds.sma_config(), thresholds.volatility_config())
    }

    #[must_use]
    pub fn analyze(&self, data: &MarketData) -> TechnicalArtifact {
        self.analyze_series(&data.ohlcv_series())
    }

    /// Both series share the input's timestamps.
    #[must_use]
    pub fn analyze_series(&self, series: &OhlcvSeries) -> TechnicalArtifact {
        let sma = compute_series::<Sma>(self.sma, series);
        let volatility = compute_series::<Volatility>(self.volatility, series);

        debug!(
            bars = series.len(),
            sma = %self.sma,
            volatility = %self.volatility,
            sma_defined = sma.defined_count(),
            volatility_defined = volatility.defined_count(),
            "technical metrics computed"
        );

        TechnicalArtifact {
            metrics: Metrics { sma, volatility },
        }
    }
}
