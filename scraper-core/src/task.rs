//! The per-city fetch task.

use std::{error::Error as _, sync::Arc};

use tracing::instrument;

use crate::{
    city::City,
    date::{TimestampZone, midnight_timestamp, parse_date},
    error::TaskError,
    model::{FetchRequest, TaskOutcome},
    provider::HistoricalWeather,
    variables::{OPEN_WEATHER_API_KEY, VariableStore},
};

/// Collaborators shared by every task of a run.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub provider: Arc<dyn HistoricalWeather>,
    pub variables: Arc<dyn VariableStore>,
    pub zone: TimestampZone,
}

impl TaskContext {
    pub fn new(
        provider: Arc<dyn HistoricalWeather>,
        variables: Arc<dyn VariableStore>,
        zone: TimestampZone,
    ) -> Self {
        Self { provider, variables, zone }
    }
}

/// Fetch and report the weather for `city` on the logical day `date`.
///
/// Transport failures are logged and reported as
/// [`TaskOutcome::TransportFailed`]. A bad date, a missing API key or a
/// response without a usable observation are returned as errors.
#[instrument(skip(ctx, city), fields(city = city.name))]
pub async fn fetch_weather_data(
    ctx: &TaskContext,
    city: &City,
    date: &str,
) -> Result<TaskOutcome, TaskError> {
    let day = parse_date(date)?;

    let api_key = ctx
        .variables
        .get(OPEN_WEATHER_API_KEY)
        .ok_or(TaskError::MissingCredential(OPEN_WEATHER_API_KEY))?;

    let timestamp = midnight_timestamp(day, ctx.zone)?;
    let request = FetchRequest::new(city, timestamp, api_key);

    match ctx.provider.observation(&request).await {
        Ok(observation) => {
            tracing::info!("Fetched weather for {}", city.name);
            Ok(TaskOutcome::Fetched { city: city.name.to_string(), observation })
        }
        Err(e) if e.is_recoverable() => {
            let error = error_chain(&e);
            tracing::warn!("Error fetching weather data for {}: {error}", city.name);
            Ok(TaskOutcome::TransportFailed { city: city.name.to_string(), error })
        }
        Err(source) => Err(TaskError::Response { city: city.name.to_string(), source }),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}
