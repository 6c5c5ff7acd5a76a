use crate::{
    config::Config,
    error::FetchError,
    model::{FetchRequest, WeatherObservation},
    provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// A source of point-in-time weather observations.
#[async_trait]
pub trait HistoricalWeather: Send + Sync + Debug {
    async fn observation(&self, request: &FetchRequest) -> Result<WeatherObservation, FetchError>;
}

/// Build the OpenWeather client described by `config`.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherClient, FetchError> {
    let timeout = config.open_weather.timeout_secs.map(std::time::Duration::from_secs);
    OpenWeatherClient::builder().base_url(config.base_url()).timeout(timeout).build()
}
