use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, price_window::PriceWindow};

/// Lookback used when the configuration does not name one.
pub const DEFAULT_VOLATILITY_LENGTH: NonZero<usize> = NonZero::new(14).unwrap();

/// Configuration for the [`Volatility`] indicator.
///
/// The source is always [`PriceSource::TrueRange`].
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct VolatilityConfig {
    length: usize,
}

impl VolatilityConfig {
    /// Volatility averaged over `length` true-range samples.
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VOLATILITY_LENGTH)
    }
}

impl IndicatorConfig for VolatilityConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        PriceSource::TrueRange
    }
}

impl Display for VolatilityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VolatilityConfig({})", self.length)
    }
}

/// Simple moving average of the true range (an ATR variant without
/// Wilder smoothing).
///
/// The first bar contributes `high - low`; every later bar contributes
/// `max(high - low, |high - prev_close|, |low - prev_close|)`. Returns `None`
/// until `length` samples have accumulated.
///
/// # Example
///
/// ```rust
/// use quantedge_upbit::{Indicator, OhlcvBar, Volatility, VolatilityConfig};
/// use chrono::{TimeZone, Utc};
/// use std::num::NonZero;
///
/// let mut atr = Volatility::new(VolatilityConfig::new(NonZero::new(1).unwrap()));
/// let bar = OhlcvBar {
///     open_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
///     open: 10.0, high: 30.0, low: 5.0, close: 20.0,
///     volume: 0.0, value: 0.0,
/// };
///
/// assert_eq!(atr.compute(&bar), Some(25.0));
/// ```
#[derive(Clone, Debug)]
pub struct Volatility {
    config: VolatilityConfig,
    window: PriceWindow,
    current: Option<Price>,
}

impl Indicator for Volatility {
    type Config = VolatilityConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            window: PriceWindow::new(config.length, config.source()),
            current: None,
        }
    }

    #[inline]
    fn compute(&mut self, kline: &impl Ohlcv) -> Option<Price> {
        self.window.add(kline);
        self.current = self.window.mean();
        self.current
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.current
    }
}

impl Display for Volatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VOL({})", self.config.length)
    }
}
