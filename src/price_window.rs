use crate::{Ohlcv, Price, PriceSource, Timestamp, ring_buffer::RingBuffer};

/// Trailing window of source prices extracted from consecutive bars.
///
/// Remembers the previous bar's close so that [`PriceSource::TrueRange`]
/// can be extracted.
#[derive(Clone, Debug)]
pub(crate) struct PriceWindow {
    source: PriceSource,
    values: RingBuffer,
    length_reciprocal: f64,
    prev_close: Option<Price>,
    last_open_time: Option<Timestamp>,
}

impl PriceWindow {
    pub(crate) fn new(length: usize, source: PriceSource) -> Self {
        Self {
            source,
            values: RingBuffer::new(length),
            #[allow(clippy::cast_precision_loss)]
            length_reciprocal: 1.0 / length as f64,
            prev_close: None,
            last_open_time: None,
        }
    }

    #[inline]
    pub(crate) fn add(&mut self, ohlcv: &impl Ohlcv) {
        debug_assert!(
            self.last_open_time.is_none_or(|t| t < ohlcv.open_time()),
            "open_time must strictly increase: last={:?}, got={}",
            self.last_open_time,
            ohlcv.open_time(),
        );

        let price = self.source.extract(ohlcv, self.prev_close);
        self.values.push(price);

        self.prev_close = Some(ohlcv.close());
        self.last_open_time = Some(ohlcv.open_time());
    }

    /// Mean of the window, or `None` until it is full.
    ///
    /// Summed afresh on every call, so no drift accumulates over long series.
    #[inline]
    pub(crate) fn mean(&self) -> Option<Price> {
        self.values
            .is_full()
            .then(|| self.values.sum() * self.length_reciprocal)
    }
}
