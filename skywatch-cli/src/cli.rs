use anyhow::Context;
use clap::Parser;
use skywatch_core::{
    BrowserVisualizer, BucketStatus, Config, DEFAULT_CITIES, Dashboard, NullVisualizer,
    ObjectStore, Visualizer, WeatherClient,
};
use tracing::{info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "skywatch",
    version,
    about = "Fetch city weather, archive it to S3 and chart the forecast"
)]
pub struct Cli {
    /// Cities to process, in order. Defaults to the built-in list.
    #[arg(value_name = "CITY")]
    pub cities: Vec<String>,

    /// Skip opening the forecast charts in a browser.
    #[arg(long)]
    pub no_chart: bool,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load();
        if config.api_key.is_empty() {
            warn!("OPENWEATHER_API_KEY is not set, fetches will be rejected");
        }
        if config.bucket.is_empty() {
            warn!("AWS_BUCKET_NAME is not set, uploads will fail");
        }

        let cities = if self.cities.is_empty() {
            DEFAULT_CITIES.iter().map(|city| city.to_string()).collect()
        } else {
            self.cities
        };

        let client = WeatherClient::new(config.api_key.clone());
        let store = ObjectStore::connect(&config).await;

        // A failed bootstrap is worth a loud warning but not an abort: the
        // bucket may exist with permissions that deny probing it.
        match store.ensure_bucket().await {
            Ok(BucketStatus::Created) => info!("created bucket {}", store.bucket()),
            Ok(BucketStatus::AlreadyExists) => info!("bucket {} is ready", store.bucket()),
            Err(err) => warn!("bucket bootstrap failed, uploads may not succeed: {err}"),
        }

        let visualizer: Box<dyn Visualizer> = if self.no_chart {
            Box::new(NullVisualizer)
        } else {
            Box::new(BrowserVisualizer)
        };

        let dashboard = Dashboard::new(client, store, visualizer);
        let reports = dashboard
            .run(&cities)
            .await
            .context("forecast charting failed")?;

        for report in &reports {
            if !report.processed() {
                warn!("no data stored for {}", report.city);
            }
        }
        let processed = reports.iter().filter(|report| report.processed()).count();
        info!("processed {processed} of {} cities", reports.len());

        Ok(())
    }
}
