use std::env;

/// Environment variable holding the OpenWeather API key.
pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
/// Environment variable holding the destination bucket name.
pub const ENV_BUCKET: &str = "AWS_BUCKET_NAME";
/// Environment variable holding the storage region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Environment variable holding an optional S3 endpoint override
/// (MinIO-style deployments). Absent means the real AWS endpoints.
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";

/// Runtime configuration, constructed once at startup and passed to each
/// component. Components never read the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub bucket: String,
    pub region: String,
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Load a local `.env` file (if present) into the process environment,
    /// then read the configuration from it.
    ///
    /// The `.env` load is the one side-effecting step of configuration and
    /// must happen before any other component runs.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read configuration from the process environment.
    ///
    /// Missing variables become empty values. They are deliberately not
    /// rejected here: an empty key or bucket surfaces later as an
    /// authentication or request failure on first use.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_key: lookup(ENV_API_KEY).unwrap_or_default(),
            bucket: lookup(ENV_BUCKET).unwrap_or_default(),
            region: lookup(ENV_REGION).unwrap_or_default(),
            endpoint_url: lookup(ENV_ENDPOINT_URL).filter(|url| !url.is_empty()),
        }
    }
}
