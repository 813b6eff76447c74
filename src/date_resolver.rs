use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::constants;

/// Format used for history keys.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Source of "today". Never fails: implementations fall back instead.
#[async_trait]
pub trait TodaySource: Send + Sync {
    async fn today(&self) -> NaiveDate;
}

// Body of the time API; everything except `date` is ignored.
#[derive(Deserialize, Debug)]
struct TimeApiResponse {
    date: String,
}

/// Asks a remote time API for the date in its configured timezone, falling
/// back to the local clock on any failure.
#[derive(Debug, Clone)]
pub struct TimeApiDateResolver {
    client: Client,
    url: String,
    timeout: Duration,
}

impl TimeApiDateResolver {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            timeout: Duration::from_secs(constants::TIME_API_TIMEOUT_SECS),
        }
    }

    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_remote(&self) -> Result<NaiveDate> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .context(format!("Failed to reach time API at {}", self.url))?
            .error_for_status()
            .context("Time API returned an error status")?;

        let body = response
            .json::<TimeApiResponse>()
            .await
            .context("Failed to parse JSON response from time API")?;
        debug!(date = %body.date, "Received time API response");

        parse_month_day_year(&body.date)
    }
}

impl Default for TimeApiDateResolver {
    fn default() -> Self {
        Self::new(constants::TIME_API_URL.as_str())
    }
}

#[async_trait]
impl TodaySource for TimeApiDateResolver {
    #[instrument(skip_all)]
    async fn today(&self) -> NaiveDate {
        match self.fetch_remote().await {
            Ok(date) => date,
            Err(e) => {
                warn!(url = %self.url, "Falling back to local clock: {:#}", e);
                Local::now().date_naive()
            }
        }
    }
}

/// Always answers with the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedDate(pub NaiveDate);

#[async_trait]
impl TodaySource for FixedDate {
    async fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parses `MM/DD/YYYY` as the time API sends it.
pub fn parse_month_day_year(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y")
        .with_context(|| format!("Unrecognized date '{}' in time API response", raw))
}
