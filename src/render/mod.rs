//! SVG charts over derived tables.
//!
//! Charts only read already aggregated numbers; they never aggregate again.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::processor::{AnalysisError, Value, derived::DerivedTable};

pub mod svg;

use self::svg::{Anchor, SvgWriter};

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;

const PALETTE: &[&str] = &[
    "steelblue",
    "orange",
    "green",
    "crimson",
    "mediumpurple",
    "sienna",
    "orchid",
    "gray",
    "olive",
    "darkturquoise",
];

/// Title, size and main color of a chart
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub color: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            title: String::new(),
            width: 800,
            height: 500,
            color: "steelblue".to_string(),
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        ChartOptions {
            title: title.into(),
            ..ChartOptions::default()
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// A rendered SVG document
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    svg: String,
}

impl Chart {
    /// One bar per row: `label_column` on x, `value_column` on y
    pub fn bar(
        table: &DerivedTable,
        label_column: &str,
        value_column: &str,
        options: &ChartOptions,
    ) -> Result<Chart, AnalysisError> {
        let (labels, values) = series(table, label_column, value_column)?;
        let values: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();

        let mut svg = frame(options)?;
        let plot = PlotArea::new(options);
        let (lo, hi) = value_range(&values);
        plot.y_axis(&mut svg, lo, hi, value_column)?;

        let slot = plot.width() / values.len() as f64;
        let bar_width = slot * 0.7;
        for (i, (label, &v)) in labels.iter().zip(&values).enumerate() {
            let x = plot.left + slot * i as f64 + (slot - bar_width) / 2.0;
            let y0 = plot.y(0.0_f64.clamp(lo, hi), lo, hi);
            let y1 = plot.y(v, lo, hi);
            svg.rect(x, y0.min(y1), bar_width, (y0 - y1).abs(), &options.color)?;
            svg.rotated_text(x + bar_width / 2.0, plot.bottom + 14.0, -35.0, label)?;
        }
        plot.x_label(&mut svg, label_column)?;

        Ok(Chart { svg: svg.finish()? })
    }

    /// Connected points in row order; missing values are skipped
    pub fn line(
        table: &DerivedTable,
        x_column: &str,
        value_column: &str,
        options: &ChartOptions,
    ) -> Result<Chart, AnalysisError> {
        let (labels, values) = series(table, x_column, value_column)?;
        let present: Vec<f64> = values.iter().flatten().copied().collect();

        let mut svg = frame(options)?;
        let plot = PlotArea::new(options);
        let (lo, hi) = value_range(&present);
        plot.y_axis(&mut svg, lo, hi, value_column)?;

        let step = if labels.len() > 1 {
            plot.width() / (labels.len() - 1) as f64
        } else {
            0.0
        };
        let x_at = |i: usize| {
            if labels.len() > 1 {
                plot.left + step * i as f64
            } else {
                plot.left + plot.width() / 2.0
            }
        };

        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (x_at(i), plot.y(v, lo, hi))))
            .collect();
        svg.polyline(&points, &options.color)?;
        for &(x, y) in &points {
            svg.circle(x, y, 3.0, &options.color)?;
        }
        for (i, label) in labels.iter().enumerate() {
            svg.rotated_text(x_at(i), plot.bottom + 14.0, -35.0, label)?;
        }
        plot.x_label(&mut svg, x_column)?;

        Ok(Chart { svg: svg.finish()? })
    }

    /// Share of `value_column` per row, labelled with percentages
    pub fn pie(
        table: &DerivedTable,
        label_column: &str,
        value_column: &str,
        options: &ChartOptions,
    ) -> Result<Chart, AnalysisError> {
        let (labels, values) = series(table, label_column, value_column)?;
        let values: Vec<f64> = values.into_iter().map(|v| v.unwrap_or(0.0)).collect();
        if values.iter().any(|&v| v < 0.0) {
            return Err(AnalysisError::InvalidArgument(format!(
                "pie chart of '{value_column}' cannot show negative values"
            )));
        }
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return Err(AnalysisError::InvalidArgument(format!(
                "pie chart of '{value_column}' needs a positive total"
            )));
        }

        let mut svg = frame(options)?;
        let width = options.width as f64;
        let height = options.height as f64;
        let cx = width * 0.4;
        let cy = (height + MARGIN_TOP) / 2.0;
        let r = (width * 0.35).min(height - MARGIN_TOP - 20.0) / 2.0;

        let mut start = -PI / 2.0;
        for (i, (label, &v)) in labels.iter().zip(&values).enumerate() {
            let share = v / total;
            let color = PALETTE[i % PALETTE.len()];
            if share >= 1.0 {
                svg.circle(cx, cy, r, color)?;
            } else if share > 0.0 {
                let end = start + share * 2.0 * PI;
                let large = if share > 0.5 { 1 } else { 0 };
                let d = format!(
                    "M {cx:.2} {cy:.2} L {:.2} {:.2} A {r:.2} {r:.2} 0 {large} 1 {:.2} {:.2} Z",
                    cx + r * start.cos(),
                    cy + r * start.sin(),
                    cx + r * end.cos(),
                    cy + r * end.sin(),
                );
                svg.path(&d, color)?;

                let mid = (start + end) / 2.0;
                svg.text(
                    cx + r * 0.65 * mid.cos(),
                    cy + r * 0.65 * mid.sin(),
                    11,
                    Anchor::Middle,
                    &format!("{:.1}%", share * 100.0),
                )?;
                start = end;
            }

            let ly = MARGIN_TOP + 10.0 + 18.0 * i as f64;
            svg.rect(width * 0.75, ly, 12.0, 12.0, color)?;
            svg.text(width * 0.75 + 18.0, ly + 10.0, 12, Anchor::Start, label)?;
        }

        Ok(Chart { svg: svg.finish()? })
    }

    /// Colored grid of a square matrix whose first column holds row labels
    /// and whose remaining columns hold values in `[-1, 1]`
    pub fn heatmap(table: &DerivedTable, options: &ChartOptions) -> Result<Chart, AnalysisError> {
        if table.is_empty() || table.columns().len() < 2 {
            return Err(AnalysisError::InvalidArgument(
                "heatmap needs at least one row and one value column".into(),
            ));
        }
        let col_labels = &table.columns()[1..];
        let rows = table.rows();

        let mut svg = frame(options)?;
        let plot = PlotArea::new(options);
        let cell_w = plot.width() / col_labels.len() as f64;
        let cell_h = (plot.bottom - plot.top) / rows.len() as f64;

        for (r, row) in rows.iter().enumerate() {
            let y = plot.top + cell_h * r as f64;
            let label = row[0].to_string();
            svg.text(plot.left - 6.0, y + cell_h / 2.0 + 4.0, 11, Anchor::End, &label)?;
            for (c, cell) in row[1..].iter().enumerate() {
                let x = plot.left + cell_w * c as f64;
                let value = numeric(cell, &table.columns()[c + 1])?;
                svg.rect(x, y, cell_w, cell_h, &diverging_color(value))?;
                if let Some(v) = value {
                    svg.text(
                        x + cell_w / 2.0,
                        y + cell_h / 2.0 + 4.0,
                        11,
                        Anchor::Middle,
                        &format!("{v:.2}"),
                    )?;
                }
            }
        }
        for (c, label) in col_labels.iter().enumerate() {
            let x = plot.left + cell_w * (c as f64 + 0.5);
            svg.rotated_text(x, plot.bottom + 14.0, -35.0, label)?;
        }

        Ok(Chart { svg: svg.finish()? })
    }

    pub fn as_svg(&self) -> &str {
        &self.svg
    }

    /// Writes the SVG document, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), AnalysisError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &self.svg)?;
        info!(path = %path.display(), "chart saved");
        Ok(())
    }
}

/// Row labels and optional numeric values of two columns
fn series(
    table: &DerivedTable,
    label_column: &str,
    value_column: &str,
) -> Result<(Vec<String>, Vec<Option<f64>>), AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::InvalidArgument(
            "cannot chart an empty table".into(),
        ));
    }
    let labels = table
        .column_values(label_column)?
        .into_iter()
        .map(|v| v.to_string())
        .collect();
    let values = table
        .column_values(value_column)?
        .into_iter()
        .map(|v| numeric(v, value_column))
        .collect::<Result<_, _>>()?;
    Ok((labels, values))
}

fn numeric(value: &Value, column: &str) -> Result<Option<f64>, AnalysisError> {
    match value {
        Value::Missing => Ok(None),
        v => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| AnalysisError::InvalidValue {
                column: column.to_string(),
                reason: format!("'{v}' is not numeric"),
            }),
    }
}

/// Value axis range, always including zero
fn value_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    if lo == hi { (lo, lo + 1.0) } else { (lo, hi) }
}

/// Blue for -1, light gray for 0, red for +1
fn diverging_color(value: Option<f64>) -> String {
    const NEG: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const POS: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let Some(v) = value else {
        return "#bbbbbb".to_string();
    };
    let v = v.clamp(-1.0, 1.0);
    let (to, t) = if v < 0.0 { (NEG, -v) } else { (POS, v) };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(MID.0, to.0),
        mix(MID.1, to.1),
        mix(MID.2, to.2)
    )
}

fn frame(options: &ChartOptions) -> Result<SvgWriter, quick_xml::Error> {
    let mut svg = SvgWriter::new(options.width, options.height)?;
    if !options.title.is_empty() {
        svg.text(
            options.width as f64 / 2.0,
            MARGIN_TOP / 2.0 + 6.0,
            16,
            Anchor::Middle,
            &options.title,
        )?;
    }
    Ok(svg)
}

#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl PlotArea {
    fn new(options: &ChartOptions) -> Self {
        PlotArea {
            left: MARGIN_LEFT,
            right: options.width as f64 - MARGIN_RIGHT,
            top: MARGIN_TOP,
            bottom: options.height as f64 - MARGIN_BOTTOM,
        }
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn y(&self, v: f64, lo: f64, hi: f64) -> f64 {
        self.bottom - (v - lo) / (hi - lo) * (self.bottom - self.top)
    }

    fn y_axis(
        &self,
        svg: &mut SvgWriter,
        lo: f64,
        hi: f64,
        label: &str,
    ) -> Result<(), quick_xml::Error> {
        svg.line(self.left, self.top, self.left, self.bottom, "black")?;
        svg.line(self.left, self.bottom, self.right, self.bottom, "black")?;
        for i in 0..=Y_TICKS {
            let v = lo + (hi - lo) * i as f64 / Y_TICKS as f64;
            let y = self.y(v, lo, hi);
            svg.line(self.left - 4.0, y, self.left, y, "black")?;
            svg.text(self.left - 6.0, y + 4.0, 10, Anchor::End, &format_tick(v))?;
        }
        svg.rotated_text(16.0, (self.top + self.bottom) / 2.0, -90.0, label)
    }

    fn x_label(&self, svg: &mut SvgWriter, label: &str) -> Result<(), quick_xml::Error> {
        svg.text(
            (self.left + self.right) / 2.0,
            self.bottom + MARGIN_BOTTOM - 8.0,
            12,
            Anchor::Middle,
            label,
        )
    }
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 100.0 || v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::derived::{Bin, Distribution, Interval};

    fn sums() -> DerivedTable {
        let mut table = DerivedTable::new(["category", "amount"]);
        table.push_row(vec![Value::from("A"), Value::Int(40)]);
        table.push_row(vec![Value::from("B"), Value::Int(60)]);
        table.push_row(vec![Value::from("C"), Value::Missing]);
        table
    }

    #[test]
    fn test_bar_chart_draws_one_bar_per_row() {
        let options = ChartOptions::titled("Spend");
        let chart = Chart::bar(&sums(), "category", "amount", &options).unwrap();
        let svg = chart.as_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(">Spend</text>"));
        // background + three bars
        assert_eq!(svg.matches("<rect").count(), 4);
    }

    #[test]
    fn test_distribution_bars_labelled_by_interval() {
        let dist = Distribution {
            column: "amount".into(),
            bins: vec![
                Bin {
                    interval: Interval {
                        lo: 0.0,
                        hi: 5.0,
                        closed_left: true,
                    },
                    count: 3,
                },
                Bin {
                    interval: Interval {
                        lo: 5.0,
                        hi: 10.0,
                        closed_left: false,
                    },
                    count: 0,
                },
            ],
        };
        let chart =
            Chart::bar(&dist.to_table(), "interval", "count", &ChartOptions::default()).unwrap();
        let svg = chart.as_svg();
        assert!(svg.contains(">[0, 5]</text>"));
        assert!(svg.contains(">(5, 10]</text>"));
    }

    #[test]
    fn test_line_chart_skips_missing_points() {
        let chart = Chart::line(&sums(), "category", "amount", &ChartOptions::default()).unwrap();
        assert_eq!(chart.as_svg().matches("<circle").count(), 2);
    }

    #[test]
    fn test_pie_chart_percentages() {
        let chart = Chart::pie(&sums(), "category", "amount", &ChartOptions::default()).unwrap();
        let svg = chart.as_svg();
        assert!(svg.contains("40.0%"));
        assert!(svg.contains("60.0%"));
    }

    #[test]
    fn test_non_numeric_values_rejected() {
        let err = Chart::bar(&sums(), "amount", "category", &ChartOptions::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_table_rejected() {
        let empty = DerivedTable::new(["category", "amount"]);
        assert!(matches!(
            Chart::bar(&empty, "category", "amount", &ChartOptions::default()),
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_heatmap_colors() {
        let mut matrix = DerivedTable::new(["column", "x", "y"]);
        matrix.push_row(vec![Value::from("x"), Value::Float(1.0), Value::Float(-1.0)]);
        matrix.push_row(vec![Value::from("y"), Value::Float(-1.0), Value::Missing]);
        let svg = Chart::heatmap(&matrix, &ChartOptions::default()).unwrap();
        assert!(svg.as_svg().contains("#b40426"));
        assert!(svg.as_svg().contains("#3b4cc0"));
        assert!(svg.as_svg().contains("#bbbbbb"));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("bar.svg");
        let chart = Chart::bar(&sums(), "category", "amount", &ChartOptions::default()).unwrap();
        chart.save(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), chart.as_svg());
    }
}
