use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::{
    config::DEFAULT_BASE_URL,
    error::FetchError,
    model::{FetchRequest, WeatherObservation},
};

use super::HistoricalWeather;

const TIMEMACHINE_PATH: &str = "/onecall/timemachine";

/// Client for the One Call 3.0 time machine endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Default)]
pub struct OpenWeatherClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OpenWeatherClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OpenWeatherClient, FetchError> {
        let mut http = Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let http = http.build().map_err(FetchError::ClientSetup)?;

        let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');

        Ok(OpenWeatherClient { http, base_url: base_url.to_string() })
    }
}

impl OpenWeatherClient {
    pub fn new() -> Self {
        Self { http: Client::new(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    pub fn builder() -> OpenWeatherClientBuilder {
        OpenWeatherClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timemachine_url(&self) -> String {
        format!("{}{}", self.base_url, TIMEMACHINE_PATH)
    }
}

impl Default for OpenWeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoricalWeather for OpenWeatherClient {
    async fn observation(&self, request: &FetchRequest) -> Result<WeatherObservation, FetchError> {
        let url = self.timemachine_url();
        tracing::debug!(?request, "GET {url}");

        // reqwest errors carry the full URL, query string and key included.
        let transport = |source: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            source: source.without_url(),
        };

        let res = self
            .http
            .get(&url)
            .query(&request.query_pairs())
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        let body = res.text().await.map_err(transport)?;

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url,
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: Value = serde_json::from_str(&body).map_err(FetchError::InvalidJson)?;

        WeatherObservation::from_response(&parsed)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
