use plotly::common::{Marker, Mode, Title};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};
use serde_json::Value;
use thiserror::Error;

/// Error extracting plottable data from a forecast payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("forecast payload has no 'list' field")]
    MissingList,

    #[error("forecast 'list' field is not an array")]
    ListNotArray,

    #[error("forecast entry {index} is missing '{field}'")]
    MalformedEntry { index: usize, field: &'static str },
}

/// The plottable columns of a forecast payload: one time label and one
/// temperature per three-hour slot, in payload order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSeries {
    pub times: Vec<String>,
    pub temps: Vec<f64>,
}

/// Pull the `list[*].dt_txt` and `list[*].main.temp` columns out of a raw
/// forecast payload. An empty `list` is valid and yields an empty series.
pub fn forecast_series(forecast: &Value) -> Result<ForecastSeries, ChartError> {
    let entries = forecast
        .get("list")
        .ok_or(ChartError::MissingList)?
        .as_array()
        .ok_or(ChartError::ListNotArray)?;

    let mut series = ForecastSeries::default();
    for (index, entry) in entries.iter().enumerate() {
        let time = entry
            .get("dt_txt")
            .and_then(Value::as_str)
            .ok_or(ChartError::MalformedEntry {
                index,
                field: "dt_txt",
            })?;
        let temp = entry
            .get("main")
            .and_then(|main| main.get("temp"))
            .and_then(Value::as_f64)
            .ok_or(ChartError::MalformedEntry {
                index,
                field: "main.temp",
            })?;

        series.times.push(time.to_owned());
        series.temps.push(temp);
    }

    Ok(series)
}

/// Rendering seam for the forecast chart.
pub trait Visualizer: Send + Sync {
    /// Render the given raw forecast payload.
    fn visualize(&self, forecast: &Value) -> Result<(), ChartError>;
}

/// Renders the forecast as a line chart and opens it in the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserVisualizer;

impl Visualizer for BrowserVisualizer {
    fn visualize(&self, forecast: &Value) -> Result<(), ChartError> {
        let series = forecast_series(forecast)?;
        render(&series).show();
        Ok(())
    }
}

/// Validates the forecast shape but renders nothing. For headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn visualize(&self, forecast: &Value) -> Result<(), ChartError> {
        forecast_series(forecast).map(|_| ())
    }
}

fn render(series: &ForecastSeries) -> Plot {
    let trace = Scatter::new(series.times.clone(), series.temps.clone())
        .mode(Mode::LinesMarkers)
        .marker(Marker::new().size(8));

    let layout = Layout::new()
        .title(Title::with_text("Temperature Forecast Over Time"))
        .x_axis(
            Axis::new()
                .title(Title::with_text("Time"))
                .tick_angle(45.0)
                .show_grid(true),
        )
        .y_axis(
            Axis::new()
                .title(Title::with_text("Temperature (°F)"))
                .show_grid(true),
        )
        .width(1000)
        .height(500);

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    plot
}
