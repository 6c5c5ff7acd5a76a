//! Core library for the `weather-scraper` daily job.
//!
//! This crate defines:
//! - The fixed set of cities and the per-city fetch task
//! - A client for the OpenWeather time machine endpoint
//! - Configuration and call-time credential lookup
//! - The daily job runner with catchup and backfill date selection
//!
//! It is used by the `weather-scraper` binary, but the task can be driven by
//! any other scheduler through [`fetch_weather_data`].

pub mod city;
pub mod config;
pub mod date;
pub mod error;
pub mod job;
pub mod model;
pub mod provider;
pub mod task;
pub mod variables;

pub use city::{CITIES, City, find_city};
pub use config::Config;
pub use date::TimestampZone;
pub use error::{ConfigError, FetchError, JobError, TaskError};
pub use job::{DailyJob, RunReport, TaskRecord, TaskState};
pub use model::{FetchRequest, TaskOutcome, WeatherObservation};
pub use provider::{HistoricalWeather, openweather::OpenWeatherClient, provider_from_config};
pub use task::{TaskContext, fetch_weather_data};
pub use variables::{
    ConfigFileVariables, EnvVariables, LayeredVariables, OPEN_WEATHER_API_KEY, VariableStore,
};
