use serde_json::Value;
use tracing::{info, warn};

use crate::chart::{ChartError, Visualizer};
use crate::client::WeatherClient;
use crate::model::DataKind;
use crate::store::ObjectStore;

/// Cities processed when the caller does not name any.
pub const DEFAULT_CITIES: [&str; 3] = ["Philadelphia", "Seattle", "New York"];

/// What happened to one city during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityOutcome {
    /// Both fetches succeeded; the flags record which uploads did.
    Processed {
        current_saved: bool,
        forecast_saved: bool,
    },
    /// At least one fetch failed, so nothing was stored or charted.
    Skipped,
}

/// Per-city result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityReport {
    pub city: String,
    pub outcome: CityOutcome,
}

impl CityReport {
    pub fn processed(&self) -> bool {
        matches!(self.outcome, CityOutcome::Processed { .. })
    }
}

/// The batch pipeline: fetch, archive, chart, one city at a time.
///
/// Fetch and upload failures are logged and recorded in the city's report;
/// the run moves on. Chart extraction failures abort the run, since they
/// mean the forecast payload violates the shape the rest of the pipeline
/// just accepted.
pub struct Dashboard {
    client: WeatherClient,
    store: ObjectStore,
    visualizer: Box<dyn Visualizer>,
}

impl Dashboard {
    pub fn new(client: WeatherClient, store: ObjectStore, visualizer: Box<dyn Visualizer>) -> Self {
        Self {
            client,
            store,
            visualizer,
        }
    }

    /// Process the given cities in order, returning one report per city.
    pub async fn run<S: AsRef<str>>(&self, cities: &[S]) -> Result<Vec<CityReport>, ChartError> {
        let mut reports = Vec::with_capacity(cities.len());
        for city in cities {
            reports.push(self.process_city(city.as_ref()).await?);
        }
        Ok(reports)
    }

    async fn process_city(&self, city: &str) -> Result<CityReport, ChartError> {
        info!("fetching weather for {city}");

        // Both requests go out even if the first fails; a city is only
        // processed further once both payloads are in hand.
        let current = self
            .client
            .fetch_current(city)
            .await
            .inspect_err(|err| warn!("{err}"));
        let forecast = self
            .client
            .fetch_forecast(city)
            .await
            .inspect_err(|err| warn!("{err}"));

        let (Ok(current), Ok(forecast)) = (current, forecast) else {
            warn!("incomplete data for {city}, skipping");
            return Ok(CityReport {
                city: city.to_string(),
                outcome: CityOutcome::Skipped,
            });
        };

        let current_saved = self.save(city, DataKind::Current, &current).await;
        let forecast_saved = self.save(city, DataKind::Forecast, &forecast).await;

        self.visualizer.visualize(&forecast)?;

        Ok(CityReport {
            city: city.to_string(),
            outcome: CityOutcome::Processed {
                current_saved,
                forecast_saved,
            },
        })
    }

    async fn save(&self, city: &str, kind: DataKind, payload: &Value) -> bool {
        let name = kind.object_name(city);
        match self.store.save(payload, &name).await {
            Ok(()) => {
                info!("archived {name} to bucket {}", self.store.bucket());
                true
            }
            Err(err) => {
                warn!("{err}");
                false
            }
        }
    }
}
