//! Upbit REST API: wire records and a client for the endpoints the pipeline
//! uses.
//!
//! Quotation endpoints (markets, tickers, candles) are public and sent
//! unsigned. Exchange endpoints (accounts, orders) need an
//! [`Authenticator`].

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Ohlcv, OhlcvBar, OhlcvSeries, Price, Result, Timestamp,
    client::{HttpClient, HttpRequest, Method, auth::Authenticator},
};

/// Production API root.
pub const UPBIT_BASE_URL: &str = "https://api.upbit.com";

const MARKETS_PATH: &str = "/v1/market/all";
const TICKER_PATH: &str = "/v1/ticker";
const CANDLES_DAYS_PATH: &str = "/v1/candles/days";
const ACCOUNTS_PATH: &str = "/v1/accounts";
const ORDERS_PATH: &str = "/v1/orders";

/// Format of the candles endpoint's `to` parameter.
const TO_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Splits `QUOTE-BASE` market codes.
fn split_market(market: &str) -> (&str, &str) {
    market.split_once('-').unwrap_or((market, ""))
}

/// A tradable pair from `/v1/market/all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    /// Market code, e.g. `KRW-BTC`.
    pub market: String,
    pub korean_name: String,
    pub english_name: String,
    /// Present when listed with `is_details=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_event: Option<MarketEvent>,
}

impl Market {
    /// Quote currency: the part before `-` (`KRW` in `KRW-BTC`).
    #[must_use]
    pub fn quote_currency(&self) -> &str {
        split_market(&self.market).0
    }

    /// Base asset: the part after `-` (`BTC` in `KRW-BTC`).
    #[must_use]
    pub fn base_currency(&self) -> &str {
        split_market(&self.market).1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEvent {
    /// Investment warning designation.
    pub warning: bool,
    pub caution: Caution,
}

/// Investment caution flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct Caution {
    pub price_fluctuations: bool,
    pub trading_volume_soaring: bool,
    pub deposit_amount_soaring: bool,
    pub global_price_differences: bool,
    pub concentration_of_small_accounts: bool,
}

impl Caution {
    /// `true` when any flag is raised.
    #[must_use]
    pub fn any(&self) -> bool {
        self.price_fluctuations
            || self.trading_volume_soaring
            || self.deposit_amount_soaring
            || self.global_price_differences
            || self.concentration_of_small_accounts
    }
}

/// Direction of the move against the previous UTC close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Change {
    Even,
    Rise,
    Fall,
}

/// Current quote from `/v1/ticker`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub market: String,
    /// `yyyyMMdd`, UTC.
    pub trade_date: String,
    /// `HHmmss`, UTC.
    pub trade_time: String,
    pub trade_date_kst: String,
    pub trade_time_kst: String,
    /// Last trade time, milliseconds since the epoch.
    pub trade_timestamp: i64,
    pub opening_price: Price,
    pub high_price: Price,
    pub low_price: Price,
    /// Last trade price.
    pub trade_price: Price,
    pub prev_closing_price: Price,
    pub change: Change,
    pub change_price: Price,
    pub change_rate: f64,
    pub signed_change_price: Price,
    /// Fractional change, `0.015` for +1.5%.
    pub signed_change_rate: f64,
    pub trade_volume: f64,
    pub acc_trade_price: f64,
    pub acc_trade_price_24h: f64,
    pub acc_trade_volume: f64,
    pub acc_trade_volume_24h: f64,
    pub highest_52_week_price: Price,
    pub highest_52_week_date: String,
    pub lowest_52_week_price: Price,
    pub lowest_52_week_date: String,
    /// Response time, milliseconds since the epoch.
    pub timestamp: i64,
}

impl Ticker {
    #[must_use]
    pub fn quote_currency(&self) -> &str {
        split_market(&self.market).0
    }

    #[must_use]
    pub fn base_currency(&self) -> &str {
        split_market(&self.market).1
    }
}

/// `candle_date_time_utc` arrives as `yyyy-MM-ddTHH:mm:ss` without an
/// offset. A trailing `Z` is tolerated on input.
mod candle_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), FORMAT).map_err(D::Error::custom)
    }
}

/// One day bar from `/v1/candles/days`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub market: String,
    /// Bar open time in UTC.
    #[serde(with = "candle_time")]
    pub candle_date_time_utc: NaiveDateTime,
    /// Bar open time in KST, kept verbatim.
    pub candle_date_time_kst: String,
    pub opening_price: Price,
    pub high_price: Price,
    pub low_price: Price,
    /// Close, or last trade for the running bar.
    pub trade_price: Price,
    /// Time of the last trade in the bar, milliseconds since the epoch.
    pub timestamp: i64,
    pub candle_acc_trade_price: f64,
    pub candle_acc_trade_volume: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_closing_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_rate: Option<f64>,
}

impl Candle {
    /// Exchange-independent copy of the bar.
    #[must_use]
    pub fn to_bar(&self) -> OhlcvBar {
        OhlcvBar {
            open_time: self.open_time(),
            open: self.opening_price,
            high: self.high_price,
            low: self.low_price,
            close: self.trade_price,
            volume: self.candle_acc_trade_volume,
            value: self.candle_acc_trade_price,
        }
    }
}

impl Ohlcv for Candle {
    fn open(&self) -> Price {
        self.opening_price
    }

    fn high(&self) -> Price {
        self.high_price
    }

    fn low(&self) -> Price {
        self.low_price
    }

    fn close(&self) -> Price {
        self.trade_price
    }

    fn open_time(&self) -> Timestamp {
        self.candle_date_time_utc.and_utc()
    }

    fn volume(&self) -> f64 {
        self.candle_acc_trade_volume
    }
}

impl<'a> FromIterator<&'a Candle> for OhlcvSeries {
    fn from_iter<I: IntoIterator<Item = &'a Candle>>(iter: I) -> Self {
        iter.into_iter().map(Candle::to_bar).collect()
    }
}

/// A balance from `/v1/accounts`. Amounts are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub currency: String,
    /// Amount available for new orders.
    pub balance: String,
    /// Amount locked by open orders or withdrawals.
    pub locked: String,
    pub avg_buy_price: String,
    pub avg_buy_price_modified: bool,
    pub unit_currency: String,
}

impl Account {
    /// [`balance`](Self::balance) as a number, `None` if it does not parse.
    #[must_use]
    pub fn available(&self) -> Option<f64> {
        self.balance.parse().ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Sell.
    Ask,
    /// Buy.
    Bid,
}

impl Side {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Bid => "bid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    /// Market buy for a quote amount.
    Price,
    /// Market sell of a base volume.
    Market,
    Best,
}

impl OrderType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Price => "price",
            Self::Market => "market",
            Self::Best => "best",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Wait,
    Watch,
    Done,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    Fok,
    Ioc,
    PostOnly,
}

impl TimeInForce {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fok => "fok",
            Self::Ioc => "ioc",
            Self::PostOnly => "post_only",
        }
    }
}

/// Self-match prevention mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmpType {
    CancelMaker,
    CancelTaker,
    Reduce,
}

impl SmpType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CancelMaker => "cancel_maker",
            Self::CancelTaker => "cancel_taker",
            Self::Reduce => "reduce",
        }
    }
}

/// An order as returned by `POST /v1/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub market: String,
    pub uuid: String,
    pub side: Side,
    pub ord_type: OrderType,
    #[serde(default)]
    pub price: Option<String>,
    pub state: OrderState,
    /// KST, `yyyy-MM-ddTHH:mm:ss+09:00`.
    pub created_at: String,
    #[serde(default)]
    pub volume: Option<String>,
    pub remaining_volume: String,
    pub executed_volume: String,
    pub reserved_fee: String,
    pub remaining_fee: String,
    pub paid_fee: String,
    pub locked: String,
    pub trades_count: u32,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub smp_type: Option<SmpType>,
    #[serde(default)]
    pub prevented_volume: String,
    #[serde(default)]
    pub prevented_locked: String,
}

/// Body of `POST /v1/orders`.
///
/// The same fields, in declaration order, are hashed into the request's
/// JWT, so [`query_pairs`](Self::query_pairs) must agree with the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderBody {
    pub market: String,
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub ord_type: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smp_type: Option<SmpType>,
}

impl CreateOrderBody {
    /// Market buy spending `amount` of the quote currency.
    #[must_use]
    pub fn market_buy(market: impl Into<String>, amount: f64) -> Self {
        Self {
            market: market.into(),
            side: Side::Bid,
            volume: None,
            price: Some(amount.to_string()),
            ord_type: OrderType::Price,
            identifier: None,
            time_in_force: None,
            smp_type: None,
        }
    }

    /// Market sell of `volume` units of the base asset.
    #[must_use]
    pub fn market_sell(market: impl Into<String>, volume: f64) -> Self {
        Self {
            market: market.into(),
            side: Side::Ask,
            volume: Some(volume.to_string()),
            price: None,
            ord_type: OrderType::Market,
            identifier: None,
            time_in_force: None,
            smp_type: None,
        }
    }

    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Checks the field combinations Upbit requires per order type.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] naming the missing field.
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| -> Result<()> {
            Err(Error::Usage(format!(
                "{} {} order requires `{field}`",
                self.ord_type.as_str(),
                self.side.as_str()
            )))
        };

        match (self.ord_type, self.side) {
            (OrderType::Limit, _) if self.volume.is_none() => missing("volume"),
            (OrderType::Limit, _) if self.price.is_none() => missing("price"),
            (OrderType::Price, Side::Bid) if self.price.is_none() => missing("price"),
            (OrderType::Market, Side::Ask) if self.volume.is_none() => missing("volume"),
            (OrderType::Best, _) if self.time_in_force.is_none() => missing("time_in_force"),
            (OrderType::Best, Side::Bid) if self.price.is_none() => missing("price"),
            (OrderType::Best, Side::Ask) if self.volume.is_none() => missing("volume"),
            (OrderType::Price, Side::Ask) | (OrderType::Market, Side::Bid) => {
                Err(Error::Usage(format!(
                    "ord_type {} cannot be used with side {}",
                    self.ord_type.as_str(),
                    self.side.as_str()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Present fields as form pairs, in JSON field order, for the query hash.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("market", self.market.clone()),
            ("side", self.side.as_str().to_owned()),
        ];
        if let Some(volume) = &self.volume {
            pairs.push(("volume", volume.clone()));
        }
        if let Some(price) = &self.price {
            pairs.push(("price", price.clone()));
        }
        pairs.push(("ord_type", self.ord_type.as_str().to_owned()));
        if let Some(identifier) = &self.identifier {
            pairs.push(("identifier", identifier.clone()));
        }
        if let Some(tif) = self.time_in_force {
            pairs.push(("time_in_force", tif.as_str().to_owned()));
        }
        if let Some(smp) = self.smp_type {
            pairs.push(("smp_type", smp.as_str().to_owned()));
        }
        pairs
    }
}

/// Upbit REST client.
///
/// Cloning is cheap; clones share the transport.
#[derive(Debug, Clone)]
pub struct UpbitClient {
    http: HttpClient,
    auth: Option<Authenticator>,
}

impl UpbitClient {
    /// Client for the public quotation endpoints only.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http, auth: None }
    }

    /// Enables the signed exchange endpoints.
    #[must_use]
    pub fn with_authenticator(mut self, auth: Authenticator) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    /// All listed markets, with caution details.
    ///
    /// # Errors
    ///
    /// Network, HTTP or decode failures.
    pub fn markets(&self) -> Result<Vec<Market>> {
        let request = HttpRequest::new(Method::Get, self.http.url(MARKETS_PATH))
            .query(&[("is_details", "true")]);
        let markets: Vec<Market> = self.http.execute(&request)?;

        debug!(count = markets.len(), "fetched markets");
        Ok(markets)
    }

    /// Tickers for `markets` in a single request. An empty list returns no
    /// tickers without calling the API.
    ///
    /// # Errors
    ///
    /// Network, HTTP or decode failures.
    pub fn tickers<S: AsRef<str>>(&self, markets: &[S]) -> Result<Vec<Ticker>> {
        if markets.is_empty() {
            return Ok(Vec::new());
        }

        let joined = markets
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        let request = HttpRequest::new(Method::Get, self.http.url(TICKER_PATH))
            .query(&[("markets", joined)]);
        let tickers: Vec<Ticker> = self.http.execute(&request)?;

        debug!(requested = markets.len(), count = tickers.len(), "fetched tickers");
        Ok(tickers)
    }

    /// Up to `count` day candles for `market` ending at `to`, newest first
    /// as Upbit returns them.
    ///
    /// # Errors
    ///
    /// Network, HTTP or decode failures.
    pub fn candles_by_days(
        &self,
        market: &str,
        count: u32,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>> {
        let request = HttpRequest::new(Method::Get, self.http.url(CANDLES_DAYS_PATH)).query(&[
            ("market", market.to_owned()),
            ("to", to.format(TO_FORMAT).to_string()),
            ("count", count.to_string()),
        ]);
        let candles: Vec<Candle> = self.http.execute(&request)?;

        debug!(market, count = candles.len(), "fetched day candles");
        Ok(candles)
    }

    /// Balances of the authenticated account.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] without an authenticator, otherwise network, HTTP or
    /// decode failures.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        let bearer = self.authenticator()?.bearer::<&str, &str>(&[])?;
        let request = HttpRequest::new(Method::Get, self.http.url(ACCOUNTS_PATH))
            .header("Authorization", bearer);

        self.http.execute(&request)
    }

    /// Places an order.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] without an authenticator or for an invalid body,
    /// otherwise network, HTTP or decode failures.
    pub fn create_order(&self, body: &CreateOrderBody) -> Result<Order> {
        body.validate()?;
        let bearer = self.authenticator()?.bearer(&body.query_pairs())?;
        let request = HttpRequest::new(Method::Post, self.http.url(ORDERS_PATH))
            .header("Authorization", bearer)
            .json(serde_json::to_value(body)?);

        let order: Order = self.http.execute(&request)?;
        info!(
            market = %order.market,
            side = order.side.as_str(),
            ord_type = order.ord_type.as_str(),
            uuid = %order.uuid,
            "order placed"
        );
        Ok(order)
    }

    fn authenticator(&self) -> Result<&Authenticator> {
        self.auth
            .as_ref()
            .ok_or_else(|| Error::Usage("this endpoint requires Upbit credentials".to_owned()))
    }
}
