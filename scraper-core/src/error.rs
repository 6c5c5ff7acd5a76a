use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure of a single time machine lookup.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to set up HTTP client")]
    ClientSetup(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with status {status}: {body}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("response body is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("response has no `data` observation list")]
    MissingObservations,

    #[error("response `data` observation list is empty")]
    EmptyObservations,

    #[error("first observation in `data` is not an object")]
    MalformedObservation,
}

impl FetchError {
    /// Transport-level failures are logged and swallowed by the fetch task;
    /// anything wrong with the shape of a successful response is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. } | FetchError::HttpStatus { .. } | FetchError::InvalidJson(_)
        )
    }
}

/// Unrecovered failure of a per-city fetch task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid date '{date}', expected YYYY-MM-DD")]
    InvalidDate {
        date: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("midnight of {0} does not exist in the local timezone")]
    NonexistentMidnight(NaiveDate),

    #[error("variable '{0}' is not set")]
    MissingCredential(&'static str),

    #[error("bad weather response for {city}")]
    Response {
        city: String,
        #[source]
        source: FetchError,
    },
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine platform config directory")]
    DirResolution,

    #[error("Failed to read config file: {0}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to serialize configuration to TOML")]
    Serialize(#[source] toml::ser::Error),

    #[error("Failed to write config file: {0}")]
    Write(PathBuf, #[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_errors_are_not_recoverable() {
        assert!(!FetchError::MissingObservations.is_recoverable());
        assert!(!FetchError::EmptyObservations.is_recoverable());
        assert!(!FetchError::MalformedObservation.is_recoverable());
    }

    #[test]
    fn client_setup_is_not_recoverable() {
        let err = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .expect_err("newline is not a valid header value");
        assert!(!FetchError::ClientSetup(err).is_recoverable());
    }

    #[test]
    fn status_and_decode_errors_are_recoverable() {
        let status = FetchError::HttpStatus {
            url: "http://localhost/onecall/timemachine".into(),
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "Invalid API key".into(),
        };
        assert!(status.is_recoverable());
        assert!(status.to_string().contains("401"));

        let decode = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(FetchError::InvalidJson(decode).is_recoverable());
    }
}
