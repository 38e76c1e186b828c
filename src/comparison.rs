//! Quality-vs-cost geometry and the comparison table.
//!
//! Geometry is computed in a fixed 760x320 viewport with y growing downward; renderers
//! scale it to whatever surface they draw on.

use crate::model::SummaryModel;

pub const VIEW_WIDTH: f64 = 760.0;
pub const VIEW_HEIGHT: f64 = 320.0;

/// Plotting rectangle inside the viewport.
pub const PLOT_LEFT: f64 = 80.0;
pub const PLOT_RIGHT: f64 = 720.0;
pub const PLOT_TOP: f64 = 40.0;
pub const PLOT_BOTTOM: f64 = 260.0;

pub const OUTER_RADIUS: f64 = 12.0;
pub const INNER_RADIUS: f64 = 6.0;

/// Floor for the cost axis maximum so an all-zero cost set still has a usable scale.
pub const MIN_COST_DOMAIN: f64 = 1e-6;

pub const EMPTY_SUMMARY: &str = "No run summary yet.";

/// Linear map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain_max(&self) -> f64 {
        self.domain.1
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Upper bound of the cost axis: the largest row cost, floored at [`MIN_COST_DOMAIN`].
pub fn cost_domain_max(rows: &[SummaryModel]) -> f64 {
    rows.iter()
        .map(|r| r.total_cost_usd)
        .fold(MIN_COST_DOMAIN, f64::max)
}

pub fn cost_scale(rows: &[SummaryModel]) -> LinearScale {
    LinearScale::new((0.0, cost_domain_max(rows)), (PLOT_LEFT, PLOT_RIGHT))
}

/// Quality is assumed bounded, so its axis never follows the data.
pub fn quality_scale() -> LinearScale {
    LinearScale::new((0.0, 1.0), (PLOT_BOTTOM, PLOT_TOP))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub model_arm_id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub label_x: f64,
    pub label_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartLayout {
    Placeholder(&'static str),
    Points(Vec<ChartPoint>),
}

pub fn layout_points(rows: &[SummaryModel]) -> ChartLayout {
    if rows.is_empty() {
        return ChartLayout::Placeholder(EMPTY_SUMMARY);
    }
    let xs = cost_scale(rows);
    let ys = quality_scale();
    let points = rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let x = xs.map(row.total_cost_usd);
            let y = ys.map(row.quality_avg);
            ChartPoint {
                model_arm_id: row.model_arm_id.clone(),
                label: row.display_name.clone(),
                x,
                y,
                label_x: x + 14.0,
                // Nudge labels apart when qualities are close.
                label_y: y - 14.0 + index as f64 * 2.0,
            }
        })
        .collect();
    ChartLayout::Points(points)
}

/// One formatted table row, in the order the backend delivered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub model: String,
    pub quality: String,
    pub pass_rate: String,
    pub latency: String,
    pub cost: String,
    pub errors: String,
}

pub const TABLE_HEADERS: [&str; 6] = [
    "Model",
    "Quality",
    "Pass Rate",
    "P50 / P95",
    "Total Cost",
    "Errors",
];

pub fn table_rows(rows: &[SummaryModel]) -> Vec<TableRow> {
    rows.iter()
        .map(|row| TableRow {
            model: row.display_name.clone(),
            quality: format!("{:.3}", row.quality_avg),
            pass_rate: format!("{:.1}%", row.pass_rate * 100.0),
            latency: format!(
                "{} / {} ms",
                row.latency_p50_ms.round(),
                row.latency_p95_ms.round()
            ),
            cost: format!("${:.6}", row.total_cost_usd),
            errors: row.error_count.to_string(),
        })
        .collect()
}
