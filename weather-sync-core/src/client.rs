use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::{Coordinate, WeatherSnapshot};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Why a fetch did not produce a snapshot.
///
/// `Display` is the human-readable message surfaced in `ViewState::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid request: could not build weather URL.")]
    InvalidRequest,
    #[error("{0}")]
    ServerError(String),
}

/// Single-shot weather lookup. No retry and no caching.
#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_displays_its_description() {
        let err = FetchError::ServerError("Server responded with error.".into());
        assert_eq!(err.to_string(), "Server responded with error.");
    }

    #[test]
    fn invalid_request_has_readable_message() {
        assert!(FetchError::InvalidRequest.to_string().contains("Invalid request"));
    }
}
