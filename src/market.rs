//! Market data aggregation: one immutable snapshot per run.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    Error, OhlcvSeries, Result,
    client::{
        alternative::{AlternativeClient, FearAndGreedEntry},
        upbit::{Candle, Ticker, UpbitClient},
    },
    config::MarketConfig,
};

/// Quote currencies Upbit lists markets in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Krw,
    Btc,
    Usdt,
}

impl Currency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Krw => "KRW",
            Self::Btc => "BTC",
            Self::Usdt => "USDT",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "KRW" => Ok(Self::Krw),
            "BTC" => Ok(Self::Btc),
            "USDT" => Ok(Self::Usdt),
            _ => Err(Error::Usage(format!("unsupported currency {s:?}"))),
        }
    }
}

/// Recent Fear-and-Greed readings, newest first as the provider sends them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FearAndGreedData {
    pub entries: Vec<FearAndGreedEntry>,
}

/// Everything one run reads from the outside world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub currency: Currency,
    /// Tickers of every market quoted in `currency`.
    pub tickers: Vec<Ticker>,
    /// Day candles of the reference market.
    pub candles: Vec<Candle>,
    pub fear_and_greed: FearAndGreedData,
}

impl MarketData {
    /// Candles as a series ordered by open time.
    #[must_use]
    pub fn ohlcv_series(&self) -> OhlcvSeries {
        self.candles.iter().collect()
    }

    /// Tickers with derived metrics, sorted and truncated per `ranking`.
    #[must_use]
    pub fn rank_tickers(&self, ranking: &TickerRanking) -> Vec<ValidatedTicker> {
        let mut ranked: Vec<ValidatedTicker> = self
            .tickers
            .iter()
            .map(|ticker| ValidatedTicker {
                volume: (ranking.volume)(ticker),
                change: (ranking.change)(ticker),
                volatility: (ranking.volatility)(ticker),
                ticker: ticker.clone(),
            })
            .collect();

        let key = ranking.sort_key;
        if ranking.descending {
            ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
        } else {
            ranked.sort_by(|a, b| key(a).total_cmp(&key(b)));
        }
        if let Some(n) = ranking.top_n {
            ranked.truncate(n);
        }
        ranked
    }
}

/// A ticker with the metrics it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedTicker {
    pub ticker: Ticker,
    pub volume: f64,
    /// Percent.
    pub change: f64,
    /// Intraday range as a percent of the last price.
    pub volatility: f64,
}

/// How [`MarketData::rank_tickers`] derives and orders metrics.
#[derive(Debug, Clone, Copy)]
pub struct TickerRanking {
    pub volume: fn(&Ticker) -> f64,
    pub change: fn(&Ticker) -> f64,
    pub volatility: fn(&Ticker) -> f64,
    pub sort_key: fn(&ValidatedTicker) -> f64,
    pub descending: bool,
    pub top_n: Option<usize>,
}

impl Default for TickerRanking {
    fn default() -> Self {
        Self {
            volume: volume_24h,
            change: change_percent,
            volatility: range_percent,
            sort_key: change_times_volume,
            descending: true,
            top_n: None,
        }
    }
}

impl TickerRanking {
    #[must_use]
    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = Some(n);
        self
    }

    #[must_use]
    pub fn ascending(mut self) -> Self {
        self.descending = false;
        self
    }

    #[must_use]
    pub fn sort_key(mut self, key: fn(&ValidatedTicker) -> f64) -> Self {
        self.sort_key = key;
        self
    }
}

/// Traded volume over the last 24 hours.
#[must_use]
pub fn volume_24h(ticker: &Ticker) -> f64 {
    ticker.acc_trade_volume_24h
}

/// Signed change against the previous close, in percent.
#[must_use]
pub fn change_percent(ticker: &Ticker) -> f64 {
    ticker.signed_change_rate * 100.0
}

/// `(high - low) / last * 100`, or `0` without a positive last price.
#[must_use]
pub fn range_percent(ticker: &Ticker) -> f64 {
    if ticker.trade_price > 0.0 {
        (ticker.high_price - ticker.low_price) / ticker.trade_price * 100.0
    } else {
        0.0
    }
}

#[must_use]
pub fn change_times_volume(ticker: &ValidatedTicker) -> f64 {
    ticker.change * ticker.volume
}

/// Fetches a [`MarketData`] snapshot from Upbit and alternative.me.
#[derive(Debug, Clone)]
pub struct MarketService {
    config: MarketConfig,
    upbit: UpbitClient,
    alternative: AlternativeClient,
}

impl MarketService {
    #[must_use]
    pub fn new(config: MarketConfig, upbit: UpbitClient, alternative: AlternativeClient) -> Self {
        Self {
            config,
            upbit,
            alternative,
        }
    }

    #[must_use]
    pub fn upbit(&self) -> &UpbitClient {
        &self.upbit
    }

    /// Snapshot with candles up to now.
    ///
    /// # Errors
    ///
    /// The first failing fetch; no partial snapshot is returned.
    pub fn get_data(&self, currency: Currency) -> Result<MarketData> {
        self.get_data_at(currency, Utc::now())
    }

    /// Snapshot with candles up to `to`.
    ///
    /// # Errors
    ///
    /// The first failing fetch; no partial snapshot is returned.
    pub fn get_data_at(&self, currency: Currency, to: DateTime<Utc>) -> Result<MarketData> {
        let markets: Vec<String> = self
            .upbit
            .markets()?
            .into_iter()
            .filter(|m| m.quote_currency() == currency.as_str())
            .map(|m| m.market)
            .collect();

        let tickers = self.upbit.tickers(&markets)?;
        let candles = self.upbit.candles_by_days(
            &self.config.reference_market,
            self.config.candle_count,
            to,
        )?;
        let fng = self
            .alternative
            .fear_and_greed(self.config.fear_and_greed_limit)?;

        info!(
            %currency,
            markets = markets.len(),
            tickers = tickers.len(),
            candles = candles.len(),
            fear_and_greed = fng.data.len(),
            "market data fetched"
        );

        Ok(MarketData {
            currency,
            tickers,
            candles,
            fear_and_greed: FearAndGreedData { entries: fng.data },
        })
    }
}
