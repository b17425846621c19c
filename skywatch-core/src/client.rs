use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Base URL of the OpenWeather API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Error from one fetch attempt. There are no retries, so every variant
/// corresponds to exactly one failed request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to send {endpoint} request for '{city}'")]
    Transport {
        endpoint: &'static str,
        city: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request for '{city}' failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        city: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response for '{city}'")]
    Parse {
        endpoint: &'static str,
        city: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Client for the two OpenWeather endpoints the pipeline consumes.
///
/// Stateless between calls: one GET per call, no timeout, no retry. The
/// response body is passed through as opaque JSON; nothing beyond
/// well-formedness is validated here.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Client against a non-default base URL (tests, proxies).
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    /// Fetch the current conditions snapshot for a city.
    pub async fn fetch_current(&self, city: &str) -> Result<Value, FetchError> {
        self.fetch("weather", city).await
    }

    /// Fetch the 5-day/3-hour forecast series for a city.
    pub async fn fetch_forecast(&self, city: &str) -> Result<Value, FetchError> {
        self.fetch("forecast", city).await
    }

    async fn fetch(&self, endpoint: &'static str, city: &str) -> Result<Value, FetchError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "imperial"),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint,
                city: city.to_string(),
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| FetchError::Transport {
            endpoint,
            city: city.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                city: city.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Parse {
            endpoint,
            city: city.to_string(),
            source,
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        // Back up to a char boundary so the cut never lands inside a
        // multi-byte character.
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
