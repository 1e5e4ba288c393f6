#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex};

use chrono::{Days, NaiveDate};
use quantedge_upbit::{
    Error, Ohlcv, OhlcvSeries, Price, Result, Timestamp,
    client::{HttpRequest, HttpResponse, Transport},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;

/// Day bar parsed from the KRW-BTC CSV.
#[derive(Debug, Clone, Deserialize)]
pub struct RefBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub value: f64,
}

impl Ohlcv for RefBar {
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
        self.date.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}

/// Reference value keyed by bar date.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub date: NaiveDate,
    pub expected: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/krw-btc-1d.csv";
pub const SMA_20_PATH: &str = "tests/fixtures/data/sma-20-close.csv";
pub const VOLATILITY_14_PATH: &str = "tests/fixtures/data/volatility-14.csv";

/// Load the 200 KRW-BTC day bars, oldest first.
pub fn load_reference_ohlcvs() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Load single-value reference data (SMA, volatility).
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

pub fn reference_series() -> OhlcvSeries {
    load_reference_ohlcvs()
        .iter()
        .map(|bar| quantedge_upbit::OhlcvBar {
            open_time: bar.open_time(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            value: bar.value,
        })
        .collect()
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// `/v1/candles/days` body for `bars`, newest first like the exchange.
pub fn candles_json(bars: &[RefBar]) -> String {
    let candles: Vec<_> = bars
        .iter()
        .rev()
        .map(|bar| {
            json!({
                "market": "KRW-BTC",
                "candle_date_time_utc": format!("{}T00:00:00", bar.date),
                "candle_date_time_kst": format!("{}T09:00:00", bar.date),
                "opening_price": bar.open,
                "high_price": bar.high,
                "low_price": bar.low,
                "trade_price": bar.close,
                "timestamp": bar.open_time().timestamp_millis() + 86_399_000,
                "candle_acc_trade_price": bar.value,
                "candle_acc_trade_volume": bar.volume,
            })
        })
        .collect();

    serde_json::Value::Array(candles).to_string()
}

/// `/fng/` body with one entry per value, the first dated `today` and each
/// following entry one day earlier. Values are sent as strings.
pub fn fng_json(today: NaiveDate, values: &[u8]) -> String {
    let data: Vec<_> = values
        .iter()
        .zip(0_u64..)
        .map(|(value, days_back)| {
            let date = today - Days::new(days_back);
            let timestamp = date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
            json!({
                "value": value.to_string(),
                "value_classification": "fixture",
                "timestamp": timestamp.to_string(),
            })
        })
        .collect();

    json!({"name": "Fear and Greed Index", "data": data, "metadata": {"error": null}}).to_string()
}

pub const MARKETS_JSON: &str = r#"[
    {"market": "KRW-BTC", "korean_name": "비트코인", "english_name": "Bitcoin",
     "market_event": {"warning": false, "caution": {}}},
    {"market": "KRW-ETH", "korean_name": "이더리움", "english_name": "Ethereum",
     "market_event": {"warning": false, "caution": {}}},
    {"market": "BTC-XRP", "korean_name": "리플", "english_name": "XRP",
     "market_event": {"warning": false, "caution": {}}}
]"#;

pub fn ticker_json(market: &str, trade_price: f64, signed_change_rate: f64, volume: f64) -> serde_json::Value {
    json!({
        "market": market,
        "trade_date": "20250719", "trade_time": "120000",
        "trade_date_kst": "20250719", "trade_time_kst": "210000",
        "trade_timestamp": 1_752_926_400_000_i64,
        "opening_price": trade_price, "high_price": trade_price * 1.02,
        "low_price": trade_price * 0.97, "trade_price": trade_price,
        "prev_closing_price": trade_price, "change": "RISE",
        "change_price": 0.0, "change_rate": signed_change_rate.abs(),
        "signed_change_price": 0.0, "signed_change_rate": signed_change_rate,
        "trade_volume": 0.01, "acc_trade_price": 1.0, "acc_trade_price_24h": 1.0,
        "acc_trade_volume": 1.0, "acc_trade_volume_24h": volume,
        "highest_52_week_price": trade_price * 1.5, "highest_52_week_date": "2025-03-01",
        "lowest_52_week_price": trade_price * 0.5, "lowest_52_week_date": "2024-08-05",
        "timestamp": 1_752_926_400_500_i64
    })
}

pub fn tickers_json() -> String {
    serde_json::Value::Array(vec![
        ticker_json("KRW-BTC", 150_000_000.0, 0.012, 2100.0),
        ticker_json("KRW-ETH", 5_200_000.0, -0.031, 48000.0),
    ])
    .to_string()
}

/// Serves canned bodies by URL path suffix and records every request.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    routes: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exchange and sentiment endpoints answering with the 200-bar candle
    /// fixture and `fng_values` readings ending at `today`.
    pub fn full(today: NaiveDate, fng_values: &[u8]) -> Self {
        Self::new()
            .route("/v1/market/all", 200, MARKETS_JSON)
            .route("/v1/ticker", 200, tickers_json())
            .route("/v1/candles/days", 200, candles_json(&load_reference_ohlcvs()))
            .route("/fng/", 200, fng_json(today, fng_values))
    }

    pub fn route(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.insert(path.to_owned(), (status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for FixtureTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        self.routes
            .iter()
            .find(|(path, _)| request.url.ends_with(path.as_str()))
            .map(|(_, (status, body))| HttpResponse {
                status: *status,
                body: body.clone(),
            })
            .ok_or_else(|| Error::Network {
                url: request.url.clone(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "no fixture route",
                )),
            })
    }
}

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
