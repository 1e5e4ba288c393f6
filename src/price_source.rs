use crate::{Ohlcv, Price};

use std::fmt::Display;

/// Value extracted from an [`Ohlcv`] bar before it enters an indicator
/// window.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub enum PriceSource {
    /// Closing price.
    #[default]
    Close,
    /// Median price: `(high + low) / 2`.
    HL2,
    /// True range: `max(high - low, |high - prev_close|, |low - prev_close|)`.
    ///
    /// On the first bar (no previous close) this is `high - low`.
    TrueRange,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl PriceSource {
    #[inline]
    pub(crate) fn extract(self, ohlcv: &impl Ohlcv, prev_close: Option<Price>) -> Price {
        match self {
            Self::Close => ohlcv.close(),
            Self::HL2 => f64::midpoint(ohlcv.high(), ohlcv.low()),
            Self::TrueRange => {
                let range = ohlcv.high() - ohlcv.low();

                prev_close.map_or(range, |prev_close| {
                    let up = (ohlcv.high() - prev_close).abs();
                    let down = (ohlcv.low() - prev_close).abs();
                    range.max(up).max(down)
                })
            }
        }
    }
}
