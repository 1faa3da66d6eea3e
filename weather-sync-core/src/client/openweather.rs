use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::model::{Coordinate, WeatherSnapshot};

use super::{FetchError, WeatherClient};

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

/// `GET <endpoint>?lat=..&lon=..&appid=..` against an OpenWeather-shaped API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    endpoint: String,
    api_key: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            http: Client::new(),
        }
    }

    fn request_url(&self, coordinate: Coordinate) -> Result<Url, FetchError> {
        if !coordinate.is_finite() {
            return Err(FetchError::InvalidRequest);
        }

        Url::parse_with_params(
            &self.endpoint,
            &[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
            ],
        )
        .map_err(|_| FetchError::InvalidRequest)
    }
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherSnapshot, FetchError> {
        let url = self.request_url(coordinate)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::ServerError(e.to_string()))?;

        if res.status() != StatusCode::OK {
            tracing::debug!(status = %res.status(), "weather endpoint returned non-200");
            return Err(FetchError::ServerError("Server responded with error.".to_string()));
        }

        let body = res
            .bytes()
            .await
            .map_err(|e| FetchError::ServerError(e.to_string()))?;

        serde_json::from_slice::<WeatherSnapshot>(&body)
            .map_err(|e| FetchError::ServerError(format!("Decoding error: {e}")))
    }
}
