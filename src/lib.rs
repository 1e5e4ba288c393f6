//! Sentiment and technical analysis assistant for the Upbit exchange.
//!
//! A [`Runner`](runner::Runner) fetches one [`MarketData`](market::MarketData)
//! snapshot (tickers, day candles, Fear-and-Greed readings), classifies
//! sentiment, computes SMA and volatility series, asks a
//! [`SignalRule`](strategy::SignalRule) for a signal and hands the result to
//! an [`Executor`](executor::Executor).
//!
//! The indicators are streaming: they accept any type implementing
//! [`Ohlcv`] and return `None` until enough bars have been seen. Each
//! indicator type ([`Sma`], [`Volatility`]) exposes [`new`](Sma::new),
//! [`compute`](Sma::compute), and [`value`](Sma::value) as inherent methods,
//! so no trait import is needed. Import [`Indicator`] only for generic code.

pub mod client;
pub mod config;
mod error;
pub mod event;
pub mod executor;
mod indicator;
pub mod market;
mod ohlcv;
mod price_source;
mod price_window;
mod ring_buffer;
pub mod runner;
pub mod sentiment;
mod series;
mod sma;
pub mod strategy;
pub mod technical;
mod volatility;

pub use crate::config::AppConfig;
pub use crate::error::{ApiErrorPayload, Error, Result};
pub use crate::indicator::{Indicator, IndicatorConfig};
pub use crate::ohlcv::{Ohlcv, OhlcvBar, OhlcvSeries, Price, Timestamp};
pub use crate::price_source::PriceSource;
pub use crate::series::{IndicatorSeries, compute_series};

pub use crate::sma::{DEFAULT_SMA_LENGTH, Sma, SmaConfig};
pub use crate::volatility::{DEFAULT_VOLATILITY_LENGTH, Volatility, VolatilityConfig};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::compute`].
            #[inline]
            pub fn compute(&mut self, kline: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::compute(self, kline)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, Price);
impl_indicator_methods!(Volatility, VolatilityConfig, Price);

#[cfg(test)]
mod test_util;
