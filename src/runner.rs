//! One analysis run, start to finish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    Result,
    client::{
        BlockingTransport, HttpClient, Transport,
        alternative::AlternativeClient,
        auth::{Authenticator, Credentials},
        upbit::UpbitClient,
    },
    config::AppConfig,
    event::Event,
    executor::{DryRunExecutor, Execution, Executor, OrderExecutor},
    market::{Currency, MarketData, MarketService},
    sentiment::{SentimentAnalyzer, SentimentArtifact},
    strategy::{SignalRule, StrategyArtifact, StrategyExecutor},
    technical::{TechnicalAnalyzer, TechnicalArtifact},
};

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub run_id: Uuid,
    pub data: MarketData,
    pub sentiment: SentimentArtifact,
    pub technical: TechnicalArtifact,
    pub strategy: StrategyArtifact,
    pub execution: Execution,
}

/// Fetch, analyze, decide, act.
#[derive(Debug)]
pub struct Runner {
    name: String,
    market: MarketService,
    sentiment: SentimentAnalyzer,
    technical: TechnicalAnalyzer,
    strategy: StrategyExecutor,
    executor: Box<dyn Executor>,
}

impl Runner {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        market: MarketService,
        sentiment: SentimentAnalyzer,
        technical: TechnicalAnalyzer,
        strategy: StrategyExecutor,
        executor: Box<dyn Executor>,
    ) -> Self {
        Self {
            name: name.into(),
            market,
            sentiment,
            technical,
            strategy,
            executor,
        }
    }

    /// Wires every stage from `config` over a blocking HTTP transport.
    ///
    /// Credentials are required even for a dry run; load them with
    /// [`Credentials::from_env`] or [`Credentials::new`], both of which fail
    /// with [`Error::Usage`](crate::Error::Usage) before anything touches the network.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`](crate::Error::Usage) when the HTTP client cannot be
    /// built.
    pub fn from_config(config: &AppConfig, credentials: Credentials) -> Result<Self> {
        let transport = BlockingTransport::new(config.http.timeout())?;
        Ok(Self::with_transport(config, credentials, Arc::new(transport)))
    }

    /// As [`from_config`](Self::from_config), over `transport`.
    #[must_use]
    pub fn with_transport(
        config: &AppConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let upbit = UpbitClient::new(HttpClient::new(
            Arc::clone(&transport),
            &config.http.upbit_base_url,
        ))
        .with_authenticator(Authenticator::new(credentials));
        let alternative =
            AlternativeClient::new(HttpClient::new(transport, &config.http.alternative_base_url));

        let executor: Box<dyn Executor> = if config.executor.dry_run {
            Box::new(DryRunExecutor::new(config.executor.order_budget))
        } else {
            Box::new(OrderExecutor::new(upbit.clone(), config.executor.order_budget))
        };

        Self::new(
            &config.name,
            MarketService::new(config.market.clone(), upbit, alternative),
            SentimentAnalyzer::new(config.thresholds.sentiment),
            TechnicalAnalyzer::from_thresholds(&config.thresholds.technical),
            StrategyExecutor::new(&config.market.reference_market),
            executor,
        )
    }

    /// Replaces the placeholder decision rule.
    #[must_use]
    pub fn with_signal_rule(mut self, rule: impl SignalRule + 'static) -> Self {
        self.strategy = self.strategy.with_rule(rule);
        self
    }

    #[must_use]
    pub fn with_executor(mut self, executor: Box<dyn Executor>) -> Self {
        self.executor = executor;
        self
    }

    /// Runs once against the current time.
    ///
    /// # Errors
    ///
    /// See [`run_at`](Self::run_at).
    pub fn run(&self, currency: Currency, observer: impl FnMut(&Event)) -> Result<RunReport> {
        self.run_at(currency, Utc::now(), observer)
    }

    /// Runs once as if the current time were `now`: candles end at `now` and
    /// sentiment is read for `now`'s UTC date.
    ///
    /// `observer` sees each [`Event`] as it happens. A fetch failure ends the
    /// run right after `start`.
    ///
    /// # Errors
    ///
    /// The first fetch or execution failure.
    pub fn run_at(
        &self,
        currency: Currency,
        now: DateTime<Utc>,
        mut observer: impl FnMut(&Event),
    ) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        info!(name = %self.name, %run_id, %currency, "run started");
        observer(&Event::start(run_id));

        let data = self
            .market
            .get_data_at(currency, now)
            .inspect_err(|e| error!(%run_id, error = %e, "market data fetch failed"))?;
        observer(&Event::market_data_fetched(run_id, &data)?);

        let sentiment = self.sentiment.analyze_on(&data, now.date_naive());
        observer(&Event::sentiment_computed(run_id, &sentiment)?);

        let technical = self.technical.analyze(&data);
        observer(&Event::technical_computed(run_id, &technical)?);

        let strategy = self.strategy.execute(&sentiment, &technical);
        observer(&Event::strategy_decided(run_id, &strategy)?);

        let execution = self
            .executor
            .act_on_strategy(&strategy)
            .inspect_err(|e| error!(%run_id, error = %e, "execution failed"))?;
        observer(&Event::executed(run_id, &execution)?);

        info!(%run_id, state = %sentiment.state, action = %strategy.signal.action, "run finished");
        observer(&Event::finished(run_id));

        Ok(RunReport {
            run_id,
            data,
            sentiment,
            technical,
            strategy,
            execution,
        })
    }
}
