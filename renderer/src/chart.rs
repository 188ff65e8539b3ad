use crate::config::RenderConfig;
use load_test_summary_model::{SummaryColumn, TrialTable};
use log::{debug, trace};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/DejaVuSans.ttf"
));

const PLOT_BACKGROUND: RGBColor = RGBColor(234, 234, 242);
const GRID_LINE: RGBColor = RGBColor(255, 255, 255);

const SERIES_BLUE: RGBColor = RGBColor(0, 0, 255);
const SERIES_GREEN: RGBColor = RGBColor(0, 128, 0);
const SERIES_RED: RGBColor = RGBColor(255, 0, 0);
const SERIES_PURPLE: RGBColor = RGBColor(128, 0, 128);

/// Share of the data span added on each side of an axis.
const AXIS_PADDING: f64 = 0.05;

/// Largest canvas the bitmap backend is asked to allocate.
pub const MAX_CANVAS_PIXELS: u64 = 60_000_000;

static FONT_REGISTERED: OnceLock<bool> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Failed to register the bundled chart font")]
    Font,
    #[error("Canvas of {width}x{height} px exceeds the limit of {MAX_CANVAS_PIXELS} pixels")]
    CanvasTooLarge { width: u32, height: u32 },
    #[error("Values of `{panel}` span a range too large to plot")]
    AxisRange { panel: &'static str },
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

fn draw_error<E>(error: DrawingAreaErrorKind<E>) -> ChartError
where
    E: std::error::Error + Send + Sync,
{
    ChartError::Draw(error.to_string())
}

/// One line of a chart, read from a single column.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Series {
    pub label: &'static str,
    pub column: SummaryColumn,
    pub color: RGBColor,
}

/// One of the four charts of the report.
#[derive(Debug, Clone)]
pub(crate) struct Panel {
    pub title: &'static str,
    pub y_label: &'static str,
    pub series: Vec<Series>,
}

impl Panel {
    fn single(title: &'static str, y_label: &'static str, series: Series) -> Self {
        Self {
            title,
            y_label,
            series: vec![series],
        }
    }

    fn has_legend(&self) -> bool {
        self.series.len() > 1
    }
}

/// The charts of the report, in row-major grid order.
pub(crate) fn report_panels() -> [Panel; 4] {
    [
        Panel::single(
            "Concurrent Users vs Success Rate",
            "Success Rate (%)",
            Series {
                label: "Success Rate",
                column: SummaryColumn::SuccessRate,
                color: SERIES_BLUE,
            },
        ),
        Panel {
            title: "Response Times",
            y_label: "Response Time (ms)",
            series: vec![
                Series {
                    label: "Avg",
                    column: SummaryColumn::AvgResponseTime,
                    color: SERIES_GREEN,
                },
                Series {
                    label: "P95",
                    column: SummaryColumn::P95ResponseTime,
                    color: SERIES_RED,
                },
            ],
        },
        Panel::single(
            "Concurrent Users vs RPS",
            "Requests Per Second",
            Series {
                label: "RPS",
                column: SummaryColumn::Rps,
                color: SERIES_PURPLE,
            },
        ),
        Panel::single(
            "Concurrent Users vs Errors",
            "Error Count",
            Series {
                label: "Errors",
                column: SummaryColumn::ErrorCount,
                color: SERIES_RED,
            },
        ),
    ]
}

/// Pixel sizes derived from the output resolution, given in points at 72 per inch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ChartStyle {
    pub title_px: f64,
    pub label_px: f64,
    pub tick_px: f64,
    pub line_px: u32,
    pub marker_px: u32,
    pub margin_px: u32,
    pub x_label_area_px: u32,
    pub y_label_area_px: u32,
}

impl ChartStyle {
    pub fn for_dpi(dpi: u32) -> Self {
        let pt = |points: f64| points * dpi as f64 / 72.0;
        let px = |points: f64| pt(points).round().max(1.0) as u32;
        Self {
            title_px: pt(12.0),
            label_px: pt(10.0),
            tick_px: pt(9.0),
            line_px: px(1.5),
            marker_px: px(3.0),
            margin_px: px(8.0),
            x_label_area_px: px(32.0),
            y_label_area_px: px(44.0),
        }
    }
}

/// Range covering `values` with some padding.
///
/// An empty input gives `0..1`. A single value, or equal values, gives one unit either side.
/// Returns `None` when the span between the smallest and largest value is not a finite number.
pub(crate) fn axis_range(values: impl IntoIterator<Item = f64>) -> Option<Range<f64>> {
    let bounds = values.into_iter().fold(None, |bounds, v| match bounds {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    });

    let Some((lo, hi)) = bounds else {
        return Some(0.0..1.0);
    };

    let span = hi - lo;
    if !span.is_finite() {
        return None;
    }
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        return Some((lo - 1.0)..(hi + 1.0));
    }

    let pad = span * AXIS_PADDING;
    let (padded_lo, padded_hi) = (lo - pad, hi + pad);
    if padded_lo.is_finite() && padded_hi.is_finite() && (padded_hi - padded_lo).is_finite() {
        Some(padded_lo..padded_hi)
    } else {
        // No room left near the ends of f64
        Some(lo..hi)
    }
}

fn ensure_font_registered() -> Result<(), ChartError> {
    let registered = *FONT_REGISTERED.get_or_init(|| {
        debug!("Registering bundled font as `{FONT_FAMILY}`");
        register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES).is_ok()
    });

    if registered {
        Ok(())
    } else {
        Err(ChartError::Font)
    }
}

/// Draw the four charts for `table` into a PNG at `output_path`.
///
/// An existing file at `output_path` is replaced.
pub fn draw_report(
    table: &TrialTable,
    output_path: &Path,
    config: &RenderConfig,
) -> Result<(), ChartError> {
    ensure_font_registered()?;

    let size = config.canvas_size();
    if size.0 as u64 * size.1 as u64 > MAX_CANVAS_PIXELS {
        return Err(ChartError::CanvasTooLarge {
            width: size.0,
            height: size.1,
        });
    }

    // Resolve every axis before the backend exists, so bad data never touches the output
    let panels = report_panels()
        .into_iter()
        .map(|panel| {
            let ranges = panel_ranges(&panel, table)?;
            Ok((panel, ranges))
        })
        .collect::<Result<Vec<_>, ChartError>>()?;

    let style = ChartStyle::for_dpi(config.dpi);
    debug!("Drawing {}x{} px canvas at {} dpi", size.0, size.1, config.dpi);

    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let areas = root.split_evenly((2, 2));
    for (area, (panel, (x_range, y_range))) in areas.iter().zip(panels) {
        draw_panel(area, &panel, x_range, y_range, table, &style)?;
    }

    root.present().map_err(draw_error)?;
    Ok(())
}

fn panel_ranges(
    panel: &Panel,
    table: &TrialTable,
) -> Result<(Range<f64>, Range<f64>), ChartError> {
    let x_range = axis_range(table.column(SummaryColumn::ConcurrentUsers))
        .ok_or(ChartError::AxisRange { panel: panel.title })?;
    let y_range = axis_range(panel.series.iter().flat_map(|s| table.column(s.column)))
        .ok_or(ChartError::AxisRange { panel: panel.title })?;
    Ok((x_range, y_range))
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    panel: &Panel,
    x_range: Range<f64>,
    y_range: Range<f64>,
    table: &TrialTable,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    trace!("Drawing panel `{}`", panel.title);
    debug!(
        "Panel `{}`: x in {:?}, y in {:?}",
        panel.title, x_range, y_range
    );

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title, (FONT_FAMILY, style.title_px))
        .margin(style.margin_px)
        .x_label_area_size(style.x_label_area_px)
        .y_label_area_size(style.y_label_area_px)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_error)?;

    chart
        .plotting_area()
        .fill(&PLOT_BACKGROUND)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .bold_line_style(GRID_LINE.stroke_width(1))
        .light_line_style(GRID_LINE.mix(0.5))
        .x_desc(SummaryColumn::ConcurrentUsers.header())
        .y_desc(panel.y_label)
        .label_style((FONT_FAMILY, style.tick_px))
        .axis_desc_style((FONT_FAMILY, style.label_px))
        .draw()
        .map_err(draw_error)?;

    for series in &panel.series {
        let color = series.color;
        let points = table.points(series.column);
        let line_px = style.line_px;

        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(line_px),
            ))
            .map_err(draw_error)?
            .label(series.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(line_px))
            });

        chart
            .draw_series(
                points
                    .iter()
                    .map(|point| Circle::new(*point, style.marker_px, color.filled())),
            )
            .map_err(draw_error)?;
    }

    if panel.has_legend() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .label_font((FONT_FAMILY, style.tick_px))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_error)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panels_cover_every_measured_column_once() {
        let mut columns = report_panels()
            .iter()
            .flat_map(|panel| panel.series.iter().map(|s| s.column))
            .collect::<Vec<_>>();
        columns.sort_by_key(|c| c.header());

        let mut expected = SummaryColumn::ALL
            .into_iter()
            .filter(|c| *c != SummaryColumn::ConcurrentUsers)
            .collect::<Vec<_>>();
        expected.sort_by_key(|c| c.header());

        assert_eq!(columns, expected);
    }

    #[test]
    fn test_only_response_times_have_a_legend() {
        let panels = report_panels();
        assert_eq!(
            panels.iter().map(Panel::has_legend).collect::<Vec<_>>(),
            vec![false, true, false, false]
        );
        assert_eq!(
            panels[1].series.iter().map(|s| s.label).collect::<Vec<_>>(),
            vec!["Avg", "P95"]
        );
    }

    #[test]
    fn test_axis_range_pads_span() {
        let range = axis_range([0.0, 100.0, 50.0]).unwrap();
        assert_eq!(range, -5.0..105.0);
    }

    #[test]
    fn test_axis_range_widens_single_value() {
        assert_eq!(axis_range([3.0]), Some(2.0..4.0));
        assert_eq!(axis_range([0.0, 0.0]), Some(-1.0..1.0));
    }

    #[test]
    fn test_axis_range_of_nothing() {
        assert_eq!(axis_range(std::iter::empty()), Some(0.0..1.0));
    }

    #[test]
    fn test_axis_range_rejects_overflowing_span() {
        assert_eq!(axis_range([-1e308, 1e308]), None);
        assert_eq!(axis_range([f64::MIN, f64::MAX]), None);
    }

    #[test]
    fn test_axis_range_drops_padding_near_f64_limits() {
        assert_eq!(axis_range([0.0, f64::MAX]), Some(0.0..f64::MAX));
        let range = axis_range([1e300, 1e307]).unwrap();
        assert!(range.start < 1e300 && range.end > 1e307);
    }

    #[test]
    fn test_should_refuse_overflowing_axis_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chart.png");
        let table = TrialTable::from_columns(
            vec![1.0, 10.0],
            vec![100.0, 95.0],
            vec![-1e308, 120.0],
            vec![1e308, 300.0],
            vec![20.0, 150.0],
            vec![0.0, 3.0],
        )
        .unwrap();

        let err = draw_report(&table, &output, &RenderConfig::default().dpi(30)).unwrap_err();

        assert!(
            matches!(err, ChartError::AxisRange { panel: "Response Times" }),
            "unexpected error: {err:?}"
        );
        assert!(!output.exists());
    }

    #[test]
    fn test_should_refuse_oversized_canvas_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chart.png");
        let config = RenderConfig::default().dpi(1_000_000);

        let err = draw_report(&TrialTable::default(), &output, &config).unwrap_err();

        assert!(
            matches!(err, ChartError::CanvasTooLarge { .. }),
            "unexpected error: {err:?}"
        );
        assert!(!output.exists());
    }

    #[test]
    fn test_chart_style_scales_with_dpi() {
        let low = ChartStyle::for_dpi(72);
        let high = ChartStyle::for_dpi(144);
        assert_eq!(low.title_px, 12.0);
        assert_eq!(high.title_px, 24.0);
        assert!(high.y_label_area_px > low.y_label_area_px);
        assert!(ChartStyle::for_dpi(1).line_px >= 1);
    }

    #[test]
    fn test_should_draw_report() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("chart.png");
        let table = TrialTable::from_columns(
            vec![1.0, 10.0, 5.0],
            vec![100.0, 95.0, 99.0],
            vec![50.0, 120.0, 80.0],
            vec![80.0, 300.0, 150.0],
            vec![20.0, 150.0, 90.0],
            vec![0.0, 3.0, 1.0],
        )
        .unwrap();

        draw_report(&table, &output, &RenderConfig::default().dpi(30)).unwrap();

        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn test_should_draw_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("empty.png");

        draw_report(&TrialTable::default(), &output, &RenderConfig::default().dpi(30)).unwrap();

        assert!(output.is_file());
    }
}
