// src/test_util.rs

use std::sync::Mutex;

use chrono::{Days, TimeZone, Utc};

use crate::{
    Error, OhlcvBar, OhlcvSeries, Price, Result, Timestamp,
    client::{HttpRequest, HttpResponse, Transport},
};

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

/// Midnight UTC of day `n`, counting 2025-01-01 as day 1.
pub fn day(n: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Days::new(u64::from(n) - 1)
}

pub fn ohlc_bar(day_n: u32, open: Price, high: Price, low: Price, close: Price) -> OhlcvBar {
    OhlcvBar {
        open_time: day(day_n),
        open,
        high,
        low,
        close,
        volume: 0.0,
        value: 0.0,
    }
}

/// Convenience: bar with just a close price and day (OHLC all equal to close).
pub fn bar(close: Price, day_n: u32) -> OhlcvBar {
    ohlc_bar(day_n, close, close, close, close)
}

/// Close-only bars on consecutive days starting at day 1.
pub fn close_series(closes: &[Price]) -> OhlcvSeries {
    closes
        .iter()
        .zip(1..)
        .map(|(&close, day_n)| bar(close, day_n))
        .collect()
}

/// Transport answering from canned responses keyed by URL path suffix.
///
/// Unrouted requests fail as network errors. Every request is recorded.
#[derive(Debug, Default)]
pub struct StubTransport {
    routes: Vec<(String, u16, String)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((path.to_owned(), status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL ends with `path`.
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(path))
            .collect()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        self.routes
            .iter()
            .find(|(path, _, _)| request.url.ends_with(path.as_str()))
            .map(|(_, status, body)| HttpResponse {
                status: *status,
                body: body.clone(),
            })
            .ok_or_else(|| {
                Error::network(
                    &request.url,
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "no route"),
                )
            })
    }
}
