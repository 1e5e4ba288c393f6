use crate::{Ohlcv, PriceSource};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// Configuration for a technical [`Indicator`].
///
/// Configs are value types: cheap to copy, compare, and hash.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Eq + Hash + Display + Debug {
    /// Window length (number of bars).
    fn length(&self) -> usize;

    /// Price source extracted from each bar.
    fn source(&self) -> PriceSource;
}

/// A streaming technical indicator.
///
/// Indicators keep their window internally and update on each call to
/// [`compute`](Indicator::compute). Output is `None` until the window has
/// filled.
///
/// # Example
///
/// ```
/// use quantedge_upbit::{Indicator, OhlcvBar, Sma, SmaConfig};
/// use chrono::{TimeZone, Utc};
/// use std::num::NonZero;
///
/// let bar = |close: f64, day: u32| OhlcvBar {
///     open_time: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
///     open: close, high: close, low: close, close,
///     volume: 0.0, value: 0.0,
/// };
///
/// let mut sma = Sma::new(SmaConfig::close(NonZero::new(3).unwrap()));
///
/// assert_eq!(sma.compute(&bar(10.0, 1)), None);
/// assert_eq!(sma.compute(&bar(20.0, 2)), None);
/// assert_eq!(sma.compute(&bar(30.0, 3)), Some(20.0));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type.
    type Output: Copy + Send + Sync + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// Feeds the next bar and returns the updated value,
    /// or `None` while the window is still filling.
    fn compute(&mut self, kline: &impl Ohlcv) -> Option<Self::Output>;

    /// Last computed value, without advancing state.
    fn value(&self) -> Option<Self::Output>;
}
