use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, price_window::PriceWindow};

/// Lookback used when the configuration does not name one.
pub const DEFAULT_SMA_LENGTH: NonZero<usize> = NonZero::new(20).unwrap();

/// Configuration for the Simple Moving Average ([`Sma`]) indicator.
///
/// # Example
///
/// ```rust
/// use quantedge_upbit::{IndicatorConfig, SmaConfig};
/// use std::num::NonZero;
///
/// let config = SmaConfig::close(NonZero::new(20).unwrap());
/// assert_eq!(config.length(), 20);
/// assert_eq!(SmaConfig::default(), config);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for SmaConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl SmaConfig {
    /// SMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
            source: PriceSource::Close,
        }
    }

    /// SMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
            source: PriceSource::HL2,
        }
    }
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self::close(DEFAULT_SMA_LENGTH)
    }
}

impl Display for SmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SmaConfig({}, {})", self.length, self.source)
    }
}

/// Simple Moving Average (SMA).
///
/// Unweighted mean of the last *n* source prices, where *n* is the configured
/// length. Returns `None` until *n* bars have been seen.
#[derive(Clone, Debug)]
pub struct Sma {
    config: SmaConfig,
    window: PriceWindow,
    current: Option<Price>,
}

impl Indicator for Sma {
    type Config = SmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            window: PriceWindow::new(config.length, config.source),
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

impl Display for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, bar, ohlc_bar};

    fn sma(length: usize) -> Sma {
        Sma::new(SmaConfig::close(NonZero::new(length).unwrap()))
    }

    mod filling {
        use super::*;

        #[test]
        fn none_until_window_full() {
            let mut sma = sma(3);
            assert_eq!(sma.compute(&bar(10.0, 1)), None);
            assert_eq!(sma.compute(&bar(20.0, 2)), None);
        }

        #[test]
        fn returns_average_when_full() {
            let mut sma = sma(3);
            sma.compute(&bar(10.0, 1));
            sma.compute(&bar(20.0, 2));
            assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
        }
    }

    mod sliding {
        use super::*;

        #[test]
        fn five_bar_series_period_three() {
            let mut sma = sma(3);
            let out: Vec<_> = [10.0, 20.0, 30.0, 40.0, 50.0]
                .into_iter()
                .zip(1..)
                .map(|(close, day)| sma.compute(&bar(close, day)))
                .collect();

            assert_eq!(out, vec![None, None, Some(20.0), Some(30.0), Some(40.0)]);
        }

        #[test]
        fn fractional_mean() {
            let mut sma = sma(3);
            sma.compute(&bar(15.0, 1));
            sma.compute(&bar(20.0, 2));
            let result = sma.compute(&bar(30.0, 3));
            assert_approx!(result.unwrap(), 65.0 / 3.0);
        }
    }

    mod price_source {
        use super::*;

        #[test]
        fn hl2_source() {
            let mut sma = Sma::new(SmaConfig::hl2(NonZero::new(2).unwrap()));
            sma.compute(&ohlc_bar(1, 0.0, 20.0, 10.0, 0.0)); // HL2 = 15
            let result = sma.compute(&ohlc_bar(2, 0.0, 30.0, 20.0, 0.0)); // HL2 = 25
            assert_eq!(result, Some(20.0));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn formats_indicator() {
            assert_eq!(sma(20).to_string(), "SMA(20, Close)");
        }

        #[test]
        fn formats_config() {
            assert_eq!(SmaConfig::default().to_string(), "SmaConfig(20, Close)");
        }
    }

    mod clone {
        use super::*;

        #[test]
        fn produces_independent_state() {
            let mut sma = sma(3);
            sma.compute(&bar(10.0, 1));
            sma.compute(&bar(20.0, 2));

            let mut cloned = sma.clone();

            assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
            assert_eq!(cloned.value(), None);
            assert_eq!(cloned.compute(&bar(90.0, 3)), Some(40.0));
        }
    }

    mod value_accessor {
        use super::*;

        #[test]
        fn none_before_convergence() {
            assert_eq!(sma(3).value(), None);
        }

        #[test]
        fn matches_last_compute() {
            let mut sma = sma(2);
            sma.compute(&bar(10.0, 1));
            let computed = sma.compute(&bar(20.0, 2));
            assert_eq!(sma.value(), computed);
            assert_eq!(computed, Some(15.0));
        }
    }
}
