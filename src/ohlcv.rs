use std::collections::{BTreeMap, btree_map};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A price value.
///
/// Semantic alias for [`f64`]. Upbit quotes KRW markets in whole won and
/// BTC/USDT markets fractionally, so every price is carried as a float.
pub type Price = f64;

/// Bar open time in UTC.
///
/// Series are keyed by this value and indicators require it to strictly
/// increase between consecutive calls to [`Indicator::compute`](crate::Indicator::compute).
pub type Timestamp = DateTime<Utc>;

/// OHLCV bar data used as input to all indicators.
///
/// Implemented by [`OhlcvBar`] and directly by the exchange's
/// [`Candle`](crate::client::upbit::Candle), so fetched candles can be fed to
/// an indicator without conversion.
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Bar open time.
    fn open_time(&self) -> Timestamp;

    /// Trade volume during the bar. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// One price bar detached from its exchange record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    /// Bar open time in UTC.
    pub open_time: Timestamp,
    /// Opening price.
    pub open: Price,
    /// Highest price.
    pub high: Price,
    /// Lowest price.
    pub low: Price,
    /// Closing price.
    pub close: Price,
    /// Traded volume.
    pub volume: f64,
    /// Traded value (price × volume accumulated over the bar).
    pub value: f64,
}

impl Ohlcv for OhlcvBar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn open_time(&self) -> Timestamp {
        self.open_time
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Bars keyed by open time.
///
/// The order in which bars are inserted does not matter: iteration always
/// yields bars by ascending [`open_time`](OhlcvBar::open_time). Inserting a
/// bar whose time is already present replaces the old bar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<OhlcvBar>", into = "Vec<OhlcvBar>")]
pub struct OhlcvSeries {
    bars: BTreeMap<Timestamp, OhlcvBar>,
}

impl OhlcvSeries {
    /// Creates an empty series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a bar, returning the bar it replaced, if any.
    pub fn insert(&mut self, bar: OhlcvBar) -> Option<OhlcvBar> {
        self.bars.insert(bar.open_time, bar)
    }

    /// Bar at `open_time`.
    #[must_use]
    pub fn get(&self, open_time: &Timestamp) -> Option<&OhlcvBar> {
        self.bars.get(open_time)
    }

    /// Number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// `true` when the series holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Bars by ascending open time.
    pub fn iter(&self) -> btree_map::Values<'_, Timestamp, OhlcvBar> {
        self.bars.values()
    }

    /// Open times in ascending order.
    pub fn timestamps(&self) -> btree_map::Keys<'_, Timestamp, OhlcvBar> {
        self.bars.keys()
    }
}

impl FromIterator<OhlcvBar> for OhlcvSeries {
    fn from_iter<I: IntoIterator<Item = OhlcvBar>>(iter: I) -> Self {
        let mut series = Self::new();
        for bar in iter {
            series.insert(bar);
        }
        series
    }
}

impl From<Vec<OhlcvBar>> for OhlcvSeries {
    fn from(bars: Vec<OhlcvBar>) -> Self {
        bars.into_iter().collect()
    }
}

impl From<OhlcvSeries> for Vec<OhlcvBar> {
    fn from(series: OhlcvSeries) -> Self {
        series.bars.into_values().collect()
    }
}

impl<'a> IntoIterator for &'a OhlcvSeries {
    type Item = &'a OhlcvBar;
    type IntoIter = btree_map::Values<'a, Timestamp, OhlcvBar>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
