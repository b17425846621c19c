//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - Configuration handling (environment plus optional `.env` file)
//! - The OpenWeather fetch client
//! - The S3 archive (bucket bootstrap and stamped uploads)
//! - Forecast charting
//! - The per-city batch pipeline tying those together
//!
//! It is used by `skywatch-cli`, but can also be reused by other binaries or services.

pub mod chart;
pub mod client;
pub mod config;
pub mod model;
pub mod pipeline;
pub mod store;

pub use chart::{BrowserVisualizer, ChartError, ForecastSeries, NullVisualizer, Visualizer};
pub use client::{FetchError, WeatherClient};
pub use config::Config;
pub use model::{DataKind, RecordError, StoredRecord};
pub use pipeline::{CityOutcome, CityReport, DEFAULT_CITIES, Dashboard};
pub use store::{BucketStatus, ObjectStore, StoreError};
