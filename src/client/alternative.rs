//! alternative.me Crypto Fear & Greed Index.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use tracing::debug;

use crate::{
    Result,
    client::{HttpClient, HttpRequest, Method},
};

/// Production API root.
pub const ALTERNATIVE_BASE_URL: &str = "https://api.alternative.me";

const FNG_PATH: &str = "/fng/";

/// Response of `/fng/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FearAndGreedResponse {
    pub name: String,
    pub data: Vec<FearAndGreedEntry>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// One daily index reading.
///
/// The API sends `value` and `timestamp` as strings; integers are accepted
/// too. Both are stored as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FearAndGreedEntry {
    /// Index value in `0..=100`.
    #[serde(deserialize_with = "index_value")]
    pub value: u8,
    /// Label assigned by the provider, e.g. `"Extreme Fear"`.
    pub value_classification: String,
    /// Seconds since the UNIX epoch.
    #[serde(deserialize_with = "unix_seconds")]
    pub timestamp: i64,
    /// Seconds until the next reading. Only present on the latest entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_until_update: Option<String>,
}

impl FearAndGreedEntry {
    /// Reading time, `None` if the timestamp is out of range.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// UTC calendar date of the reading.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.time().map(|t| t.date_naive())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInt {
    Int(i64),
    String(String),
}

impl StringOrInt {
    fn into_i64<E: de::Error>(self) -> std::result::Result<i64, E> {
        match self {
            Self::Int(n) => Ok(n),
            Self::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(&s), &"an integer")),
        }
    }
}

fn unix_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    StringOrInt::deserialize(deserializer)?.into_i64()
}

fn index_value<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    let raw = StringOrInt::deserialize(deserializer)?.into_i64::<D::Error>()?;

    u8::try_from(raw)
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Signed(raw), &"a value in 0..=100"))
}

/// Client for the Fear & Greed endpoint.
#[derive(Debug, Clone)]
pub struct AlternativeClient {
    http: HttpClient,
}

impl AlternativeClient {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The `limit` most recent readings, newest first.
    ///
    /// # Errors
    ///
    /// Network, HTTP or decode failures, including values outside `0..=100`.
    pub fn fear_and_greed(&self, limit: u32) -> Result<FearAndGreedResponse> {
        let request = HttpRequest::new(Method::Get, self.http.url(FNG_PATH))
            .query(&[("limit", limit.to_string())]);
        let response: FearAndGreedResponse = self.http.execute(&request)?;

        debug!(limit, count = response.data.len(), "fetched fear and greed index");
        Ok(response)
    }
}
