use std::fs;
use std::path::Path;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use tracing::{debug, info};
use uuid::Uuid;
use crate::db::TokenPriceStore;
use crate::models::{ChartRequest, PriceObservation, RenderedChart};
use crate::utils::errors::ChartError;
use crate::utils::{format_gold, singularize};

const BASE_WIDTH: u32 = 400;
const BASE_HEIGHT: u32 = 300;
/// Supersampling multiplier applied to the base canvas
const SCALE: u32 = 3;

const BACKGROUND: RGBColor = RGBColor(0x36, 0x39, 0x3f);
const LINE_COLOR: RGBColor = RGBColor(0xFF, 0xD7, 0x00);
const FONT: &str = "sans-serif";

/// Chart title, e.g. "WoW Token Price History - Last 48 hours"
pub fn chart_title(request: &ChartRequest) -> String {
    let unit = request.unit.as_str();
    let unit = if request.period == 1 { singularize(unit) } else { unit };
    format!("WoW Token Price History - Last {} {}", request.period, unit)
}

/// Simple moving average; the first points average over what is available
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.clamp(1, values.len().max(1));
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;

    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        let count = (i + 1).min(window);
        out.push(sum / count as f64);
    }

    out
}

/// Renders WoW token price history charts from the store
pub struct ChartService {
    store: Arc<dyn TokenPriceStore>,
}

impl ChartService {
    pub fn new(store: Arc<dyn TokenPriceStore>) -> Self {
        Self { store }
    }

    /// Validate a raw (unit, period) pair and render it
    pub async fn render_price_chart(&self, unit: &str, period: &str) -> Result<RenderedChart, ChartError> {
        let request = ChartRequest::parse(unit, period)?;
        self.render(request).await
    }

    /// Query the observations for a request, most recent first, along with
    /// the newest observation time
    pub async fn load_series(
        &self,
        request: &ChartRequest,
    ) -> Result<(Vec<PriceObservation>, DateTime<Utc>), ChartError> {
        let since = request.lower_bound(Utc::now());
        let series = self.store.price_observations_since(since).await?;
        debug!("Loaded {} price points since {}", series.len(), since);

        if series.len() < 2 {
            return Err(ChartError::InsufficientData(series.len()));
        }

        let last_updated = series
            .iter()
            .map(|p| p.observed_at)
            .max()
            .ok_or(ChartError::InsufficientData(0))?;

        Ok((series, last_updated))
    }

    pub async fn render(&self, request: ChartRequest) -> Result<RenderedChart, ChartError> {
        let (series, last_updated) = self.load_series(&request).await?;
        self.render_series(request, series, last_updated).await
    }

    /// Render an already loaded series
    pub async fn render_series(
        &self,
        request: ChartRequest,
        series: Vec<PriceObservation>,
        last_updated: DateTime<Utc>,
    ) -> Result<RenderedChart, ChartError> {
        let image = tokio::task::spawn_blocking(move || draw_chart(&series, &request))
            .await
            .map_err(|e| ChartError::Render(format!("Chart task failed: {}", e)))??;

        if image.is_empty() {
            return Err(ChartError::Render("produced empty image data".to_string()));
        }

        info!("Chart generated: {} bytes ({})", image.len(), chart_title(&request));
        Ok(RenderedChart { image, last_updated })
    }
}

/// Draw the series into a PNG and return its bytes
fn draw_chart(series: &[PriceObservation], request: &ChartRequest) -> Result<Vec<u8>, ChartError> {
    let temp_file = std::env::temp_dir().join(format!("tokenwatch_chart_{}.png", Uuid::new_v4()));

    let result = draw_to_file(&temp_file, series, request)
        .and_then(|_| fs::read(&temp_file).map_err(|e| ChartError::Render(format!("Failed to read chart file: {}", e))));

    let _ = fs::remove_file(&temp_file);

    result
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

fn draw_to_file(path: &Path, series: &[PriceObservation], request: &ChartRequest) -> Result<(), ChartError> {
    // Oldest first for drawing
    let mut points: Vec<&PriceObservation> = series.iter().collect();
    points.sort_by_key(|p| (p.observed_at, p.id));

    let prices: Vec<f64> = points.iter().map(|p| p.price as f64).collect();
    let smoothed = moving_average(&prices, request.unit.smoothing_window(request.period));

    let min_price = smoothed.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = smoothed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let padding = (max_price - min_price).max(1.0) * 0.1;
    let y_min = (min_price - padding).max(0.0);
    let y_max = max_price + padding;

    let x_min = points[0].observed_at;
    let mut x_max = points[points.len() - 1].observed_at;
    if x_max <= x_min {
        x_max = x_min + Duration::minutes(1);
    }

    let scale = SCALE as f64;
    let date_format = request.unit.date_format();

    let backend = BitMapBackend::new(path, (BASE_WIDTH * SCALE, BASE_HEIGHT * SCALE));
    let root = backend.into_drawing_area();
    root.fill(&BACKGROUND).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(request), (FONT, 12.0 * scale).into_font().color(&WHITE))
        .margin(10 * SCALE)
        .x_label_area_size(25 * SCALE)
        .y_label_area_size(45 * SCALE)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(6)
        .x_label_formatter(&|dt: &DateTime<Utc>| dt.format(date_format).to_string())
        .y_label_formatter(&|v: &f64| format_gold(v.round() as i64))
        .label_style((FONT, 8.0 * scale).into_font().color(&WHITE))
        .axis_style(WHITE.mix(0.4))
        .bold_line_style(WHITE.mix(0.08))
        .light_line_style(BACKGROUND)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            AreaSeries::new(
                points.iter().zip(smoothed.iter()).map(|(p, v)| (p.observed_at, *v)),
                y_min,
                LINE_COLOR.mix(0.1),
            )
            .border_style(LINE_COLOR.stroke_width(SCALE)),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::ChartUnit;

    fn service_with(points: &[(DateTime<Utc>, i64)]) -> ChartService {
        ChartService::new(Arc::new(MemoryStore::with_prices(points)))
    }

    #[test]
    fn test_chart_title_singularizes() {
        let one = ChartRequest::new(ChartUnit::Months, 1).unwrap();
        assert_eq!(chart_title(&one), "WoW Token Price History - Last 1 month");

        let many = ChartRequest::new(ChartUnit::Hours, 48).unwrap();
        assert_eq!(chart_title(&many), "WoW Token Price History - Last 48 hours");
    }

    #[test]
    fn test_moving_average() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&values, 1), values.to_vec());
        assert_eq!(moving_average(&values, 2), vec![1.0, 1.5, 2.5, 3.5, 4.5]);
        // Window larger than the series averages everything seen so far
        assert_eq!(moving_average(&values, 64), vec![1.0, 1.5, 2.0, 2.5, 3.0]);
        assert!(moving_average(&[], 32).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_unit_is_rejected() {
        let service = service_with(&[]);
        let err = service.render_price_chart("weeks", "2").await.unwrap_err();
        assert!(matches!(err, ChartError::InvalidUnit(_)));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_out_of_range_period_is_rejected() {
        let service = service_with(&[]);
        let err = service.render_price_chart("hours", "97").await.unwrap_err();
        assert!(matches!(err, ChartError::PeriodOutOfRange { period: 97, max: 96, .. }));
    }

    #[tokio::test]
    async fn test_insufficient_data() {
        let now = Utc::now();
        let service = service_with(&[(now - Duration::hours(100), 1), (now - Duration::minutes(10), 2)]);

        // Only one point falls inside the last 96 hours
        let err = service.render_price_chart("hours", "96").await.unwrap_err();
        assert!(matches!(err, ChartError::InsufficientData(1)));

        let empty = service_with(&[]);
        let request = ChartRequest::new(ChartUnit::Days, 3).unwrap();
        assert!(matches!(empty.load_series(&request).await, Err(ChartError::InsufficientData(0))));
    }

    #[tokio::test]
    async fn test_series_reports_most_recent_timestamp() {
        let now = Utc::now();
        let newest = now - Duration::minutes(3);
        let service = service_with(&[
            (now - Duration::hours(5), 250_000),
            (newest, 255_000),
            (now - Duration::hours(2), 252_000),
        ]);

        let request = ChartRequest::new(ChartUnit::Hours, 24).unwrap();
        let (series, last_updated) = service.load_series(&request).await.unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(last_updated, newest);
        assert_eq!(series[0].id, 3);
    }

    #[tokio::test]
    async fn test_render_produces_png() {
        let now = Utc::now();
        let newest = now - Duration::minutes(2);
        let service = service_with(&[
            (now - Duration::hours(3), 250_000),
            (now - Duration::hours(2), 248_500),
            (newest, 252_000),
        ]);

        let chart = service.render_price_chart("hours", "6").await.unwrap();
        assert!(chart.image.starts_with(b"\x89PNG"));
        assert_eq!(chart.last_updated, newest);
    }

    #[tokio::test]
    async fn test_store_failure_is_persistence_error() {
        let store = Arc::new(MemoryStore::new());
        store.fail_reads.store(true, std::sync::atomic::Ordering::SeqCst);
        let service = ChartService::new(store);

        let err = service.render_price_chart("days", "10").await.unwrap_err();
        assert!(matches!(err, ChartError::Persistence(_)));
    }
}
