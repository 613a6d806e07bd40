//! Fallback market-data provider client.
//!
//! Last tier of the resolution chain: a rate-limited third-party HTTP
//! API. Every request is tried directly first, then exactly once more
//! through a URL-encoding relay when the direct attempt fails (the
//! relay exists for environments where direct cross-origin access is
//! blocked; it also papers over transient provider refusals).

pub mod chart;
pub mod news;
pub mod rate_limit;

use tracing::{debug, warn};
use url::Url;

use common::config::ProviderConfig;
use common::{Error, NewsItem, Series};

use crate::rate_limit::RateLimiter;

/// Async client for the provider's chart and news endpoints.
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    config: ProviderConfig,
    limiter: RateLimiter,
}

impl YahooClient {
    pub fn new(config: ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("quotefeed/0.1 (series cache warmer)")
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("failed to build provider HTTP client");

        let limiter = RateLimiter::new(config.requests_per_sec);

        Self {
            client,
            config,
            limiter,
        }
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/{}?range={}&interval=1d",
            self.config.chart_base_url, symbol, self.config.chart_range
        )
    }

    fn news_url(&self, symbol: &str) -> String {
        format!(
            "{}?q={}&newsCount={}",
            self.config.news_base_url, symbol, self.config.news_limit
        )
    }

    /// Wrap a target URL in the relay, URL-encoded as a query param.
    fn relay_url(&self, target: &str) -> Result<String, Error> {
        let mut relay = Url::parse(&self.config.relay_base_url)
            .map_err(|e| Error::Config(format!("bad relay_base_url: {e}")))?;
        relay.query_pairs_mut().append_pair("url", target);
        Ok(relay.into())
    }

    /// GET a URL, honoring the shared rate limiter. Non-200 statuses
    /// are errors; 429 is split out so callers can log it distinctly.
    async fn get_text(&self, url: &str) -> Result<String, Error> {
        self.limiter.acquire().await;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(Error::RateLimited);
        }
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                status,
                message: body[..body.len().min(200)].to_string(),
            });
        }

        resp.text().await.map_err(|e| Error::Http(e.to_string()))
    }

    async fn try_chart(&self, url: &str) -> Result<Series, Error> {
        let body = self.get_text(url).await?;
        chart::parse_chart(&body)
    }

    async fn try_news(&self, url: &str) -> Result<Vec<NewsItem>, Error> {
        let body = self.get_text(url).await?;
        news::parse_news(&body, self.config.news_limit)
    }

    /// Fetch the daily series for a symbol: direct, then once via relay.
    pub async fn fetch_daily(&self, symbol: &str) -> Result<Series, Error> {
        let url = self.chart_url(symbol);
        debug!("Fetching chart: {}", url);

        match self.try_chart(&url).await {
            Ok(series) => Ok(series),
            Err(e) => {
                warn!("{}: direct chart fetch failed ({}); retrying via relay", symbol, e);
                let relayed = self.relay_url(&url)?;
                self.try_chart(&relayed).await
            }
        }
    }

    /// Fetch recent headlines for a symbol: direct, then once via relay.
    pub async fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, Error> {
        let url = self.news_url(symbol);
        debug!("Fetching news: {}", url);

        match self.try_news(&url).await {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("{}: direct news fetch failed ({}); retrying via relay", symbol, e);
                let relayed = self.relay_url(&url)?;
                self.try_news(&relayed).await
            }
        }
    }
}
