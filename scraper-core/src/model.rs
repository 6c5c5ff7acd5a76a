use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{city::City, error::FetchError};

/// Everything needed to issue one time machine lookup for a city and day.
#[derive(Clone, PartialEq)]
pub struct FetchRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: i64,
    pub api_key: String,
    pub units: &'static str,
}

impl FetchRequest {
    pub fn new(city: &City, timestamp: i64, api_key: String) -> Self {
        Self {
            latitude: city.latitude,
            longitude: city.longitude,
            timestamp,
            api_key,
            units: "metric",
        }
    }

    /// Query parameters in the order the endpoint documents them.
    pub fn query_pairs(&self) -> [(&'static str, String); 5] {
        [
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("dt", self.timestamp.to_string()),
            ("appid", self.api_key.clone()),
            ("units", self.units.to_string()),
        ]
    }
}

// The key ends up in logs through `#[instrument]` otherwise.
impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("timestamp", &self.timestamp)
            .field("api_key", &"<redacted>")
            .field("units", &self.units)
            .finish()
    }
}

/// The four values read from the first entry of a time machine response.
/// Any of them may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherObservation {
    pub temperature: Option<f64>,
    pub humidity: Option<u8>,
    pub cloudiness: Option<u8>,
    pub wind_speed: Option<f64>,
}

impl WeatherObservation {
    /// Pull the observation out of a parsed response body.
    ///
    /// Only the presence of a non-empty `data` list with an object at its head
    /// is required. Individual fields that are absent or of an unexpected type
    /// come back as `None`.
    pub fn from_response(body: &Value) -> Result<Self, FetchError> {
        let data = body
            .get("data")
            .and_then(Value::as_array)
            .ok_or(FetchError::MissingObservations)?;

        let first = data.first().ok_or(FetchError::EmptyObservations)?;
        let entry = first.as_object().ok_or(FetchError::MalformedObservation)?;

        let percent = |key: &str| {
            entry.get(key).and_then(Value::as_u64).and_then(|v| u8::try_from(v).ok())
        };

        Ok(Self {
            temperature: entry.get("temp").and_then(Value::as_f64),
            humidity: percent("humidity"),
            cloudiness: percent("clouds"),
            wind_speed: entry.get("wind_speed").and_then(Value::as_f64),
        })
    }
}

/// How a fetch task that did not fault ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Fetched { city: String, observation: WeatherObservation },
    TransportFailed { city: String, error: String },
}

impl TaskOutcome {
    pub fn city(&self) -> &str {
        match self {
            TaskOutcome::Fetched { city, .. } | TaskOutcome::TransportFailed { city, .. } => city,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, TaskOutcome::Fetched { .. })
    }
}

struct Reading<T>(Option<T>);

// Debug keeps the fractional part of whole floats: `5.0`, not `5`.
impl<T: fmt::Debug> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{v:?}"),
            None => f.write_str("null"),
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Fetched { city, observation: o } => write!(
                f,
                "Weather for {city}: Temperature: {}, Humidity: {}, Cloudiness: {}, Wind Speed: {}",
                Reading(o.temperature),
                Reading(o.humidity),
                Reading(o.cloudiness),
                Reading(o.wind_speed),
            ),
            TaskOutcome::TransportFailed { city, error } => {
                write!(f, "Error fetching weather data for {city}: {error}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::find_city;
    use serde_json::json;

    #[test]
    fn request_carries_city_coordinates_and_metric_units() {
        let lviv = find_city("Lviv").expect("configured");
        let req = FetchRequest::new(lviv, 1_705_276_800, "KEY".into());

        let pairs = req.query_pairs();
        assert_eq!(pairs[0], ("lat", "49.8397".to_string()));
        assert_eq!(pairs[1], ("lon", "24.0297".to_string()));
        assert_eq!(pairs[2], ("dt", "1705276800".to_string()));
        assert_eq!(pairs[3], ("appid", "KEY".to_string()));
        assert_eq!(pairs[4], ("units", "metric".to_string()));
    }

    #[test]
    fn debug_hides_api_key() {
        let kyiv = find_city("Kyiv").expect("configured");
        let req = FetchRequest::new(kyiv, 0, "super-secret".into());
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn extracts_all_fields() {
        let body = json!({"data": [{"temp": 5.2, "humidity": 80, "clouds": 90, "wind_speed": 3.1}]});
        let obs = WeatherObservation::from_response(&body).expect("valid shape");

        assert_eq!(obs.temperature, Some(5.2));
        assert_eq!(obs.humidity, Some(80));
        assert_eq!(obs.cloudiness, Some(90));
        assert_eq!(obs.wind_speed, Some(3.1));
    }

    #[test]
    fn integer_temperature_is_accepted() {
        let body = json!({"data": [{"temp": -3, "wind_speed": 0}]});
        let obs = WeatherObservation::from_response(&body).expect("valid shape");
        assert_eq!(obs.temperature, Some(-3.0));
        assert_eq!(obs.wind_speed, Some(0.0));
    }

    #[test]
    fn missing_and_mistyped_fields_are_none() {
        let body = json!({"data": [{"temp": 5.2, "humidity": "high", "clouds": 300}]});
        let obs = WeatherObservation::from_response(&body).expect("valid shape");

        assert_eq!(obs.temperature, Some(5.2));
        assert_eq!(obs.humidity, None);
        assert_eq!(obs.cloudiness, None);
        assert_eq!(obs.wind_speed, None);
    }

    #[test]
    fn only_first_observation_is_used() {
        let body = json!({"data": [{"temp": 1.0}, {"temp": 2.0}]});
        let obs = WeatherObservation::from_response(&body).expect("valid shape");
        assert_eq!(obs.temperature, Some(1.0));
    }

    #[test]
    fn shape_errors() {
        let cases = [
            (json!({}), "MissingObservations"),
            (json!({"data": {"temp": 1.0}}), "MissingObservations"),
            (json!({"data": []}), "EmptyObservations"),
            (json!({"data": [42]}), "MalformedObservation"),
        ];

        for (body, expected) in cases {
            let err = WeatherObservation::from_response(&body).unwrap_err();
            assert!(format!("{err:?}").starts_with(expected), "{body} -> {err:?}");
        }
    }

    #[test]
    fn fetched_line_contains_city_and_values() {
        let outcome = TaskOutcome::Fetched {
            city: "Kharkiv".into(),
            observation: WeatherObservation {
                temperature: Some(5.2),
                humidity: Some(80),
                cloudiness: Some(90),
                wind_speed: Some(3.1),
            },
        };

        assert_eq!(
            outcome.to_string(),
            "Weather for Kharkiv: Temperature: 5.2, Humidity: 80, Cloudiness: 90, Wind Speed: 3.1"
        );
    }

    #[test]
    fn whole_floats_keep_decimal_point() {
        let outcome = TaskOutcome::Fetched {
            city: "Kyiv".into(),
            observation: WeatherObservation {
                temperature: Some(5.0),
                humidity: Some(100),
                cloudiness: Some(0),
                wind_speed: Some(0.0),
            },
        };

        assert_eq!(
            outcome.to_string(),
            "Weather for Kyiv: Temperature: 5.0, Humidity: 100, Cloudiness: 0, Wind Speed: 0.0"
        );
    }

    #[test]
    fn missing_values_render_as_null() {
        let outcome = TaskOutcome::Fetched {
            city: "Odesa".into(),
            observation: WeatherObservation { temperature: Some(5.2), ..Default::default() },
        };

        assert_eq!(
            outcome.to_string(),
            "Weather for Odesa: Temperature: 5.2, Humidity: null, Cloudiness: null, Wind Speed: null"
        );
    }

    #[test]
    fn transport_failure_line_names_city() {
        let outcome = TaskOutcome::TransportFailed {
            city: "Lviv".into(),
            error: "connection refused".into(),
        };
        assert_eq!(outcome.city(), "Lviv");
        assert!(!outcome.is_fetched());
        assert_eq!(outcome.to_string(), "Error fetching weather data for Lviv: connection refused");
    }
}
