use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize};

use crate::{Indicator, OhlcvSeries, Price, Timestamp};

/// Indicator output keyed by bar open time.
///
/// `None` marks bars inside the warm-up region. Once an indicator has
/// converged every later bar is defined, so the defined keys form a suffix
/// of the timestamp domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries {
    values: BTreeMap<Timestamp, Option<Price>>,
}

impl IndicatorSeries {
    /// Value at `open_time`. The outer `Option` is `None` when the timestamp
    /// is not part of the series.
    #[must_use]
    pub fn get(&self, open_time: &Timestamp) -> Option<Option<Price>> {
        self.values.get(open_time).copied()
    }

    /// Number of timestamps, defined or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the series has no timestamps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of timestamps with a defined value.
    #[must_use]
    pub fn defined_count(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }

    /// Most recent timestamp and its value.
    #[must_use]
    pub fn latest(&self) -> Option<(Timestamp, Option<Price>)> {
        self.values.last_key_value().map(|(t, v)| (*t, *v))
    }

    /// Entries by ascending timestamp.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Option<Price>)> + '_ {
        self.values.iter().map(|(t, v)| (*t, *v))
    }

    /// Timestamps in ascending order.
    pub fn timestamps(&self) -> btree_map::Keys<'_, Timestamp, Option<Price>> {
        self.values.keys()
    }

    /// First difference of consecutive values, keyed by the later timestamp.
    ///
    /// The earliest timestamp has no predecessor and is absent from the
    /// result. A difference is `None` when either endpoint is undefined.
    #[must_use]
    pub fn slope(&self) -> Self {
        let values = self
            .values
            .iter()
            .zip(self.values.iter().skip(1))
            .map(|((_, &prev), (&t, &cur))| (t, prev.zip(cur).map(|(p, c)| c - p)))
            .collect();

        Self { values }
    }
}

impl FromIterator<(Timestamp, Option<Price>)> for IndicatorSeries {
    fn from_iter<I: IntoIterator<Item = (Timestamp, Option<Price>)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Feeds every bar of `series`, oldest first, through a fresh indicator
/// built from `config` and records the value after each bar.
///
/// The result has exactly the input's timestamps.
pub fn compute_series<I>(config: I::Config, series: &OhlcvSeries) -> IndicatorSeries
where
    I: Indicator<Output = Price>,
{
    let mut indicator = I::new(config);

    series
        .iter()
        .map(|bar| (bar.open_time, indicator.compute(bar)))
        .collect()
}
