//! Chart builders. Each one is a pure function of already aggregated data
//! and the current selection; none of them keep state between calls.

use crate::aggregate::ConditionFilter;
use crate::channel::Channel;
use crate::error::PipelineError;
use crate::plot::{
    palette_color, Axis, BandSeries, BarSeries, Bin, Color, ColorScale, Figure, HistogramSeries,
    LineSeries, Series, Style,
};
use crate::table::{AggregateRow, ChannelTimeSeries};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const TIME_AXIS: &str = "Time (hours)";
pub const LEGEND_TITLE: &str = "Treatment (Cell Type)";
pub const HEATMAP_ROW_AXIS: &str = "Treatment (CellType)";
pub const HISTOGRAM_BINS: usize = 200;
const BAND_OPACITY: f64 = 0.2;
const DIAGNOSTIC_COLOR: Color = Color(0x636EFA);

pub const NO_SELECTED_DATA: &str = "No data available for the selected treatments and cell types.";
pub const NO_TIMEPOINT_ZERO: &str = "No phase data available at timepoint 0.";

/// `"{treatment} ({cell_type})"`, the label shared by legends and heatmap rows.
pub fn combination_label(treatment: &str, cell_type: &str) -> String {
    format!("{} ({})", treatment, cell_type)
}

/// One mean line plus a mean ± std band per (treatment, cell type), coloured
/// by the order in which each combination first appears in `aggregates`.
pub fn time_series_figure(channel: Channel, aggregates: &[AggregateRow]) -> Figure {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut grouped: HashMap<(&str, &str), Vec<&AggregateRow>> = HashMap::new();
    for row in aggregates {
        let key = (row.treatment.as_str(), row.cell_type.as_str());
        if !grouped.contains_key(&key) {
            order.push(key);
        }
        grouped.entry(key).or_default().push(row);
    }

    let mut fig = Figure::new(Some(channel.graph_title().to_string()));
    fig.x = Axis::labeled(TIME_AXIS);
    fig.y = Axis::labeled(channel.y_axis_title());
    fig.legend_title = Some(LEGEND_TITLE.to_string());

    for (index, key) in order.iter().enumerate() {
        let mut rows = grouped.remove(key).unwrap_or_default();
        rows.sort_by(|a, b| a.time.total_cmp(&b.time));
        let color = palette_color(index);
        let name = combination_label(key.0, key.1);
        fig.add_series(Series::Line(LineSeries {
            name: name.clone(),
            points: rows.iter().map(|r| [r.time, r.mean]).collect(),
            style: Style {
                width: 2.0,
                color,
            },
        }));
        let spread: Vec<&&AggregateRow> = rows
            .iter()
            .filter(|r| r.mean.is_finite() && r.std.is_finite())
            .collect();
        if !spread.is_empty() {
            fig.add_series(Series::Band(BandSeries {
                name,
                upper: spread.iter().map(|r| [r.time, r.mean + r.std]).collect(),
                lower: spread.iter().map(|r| [r.time, r.mean - r.std]).collect(),
                color,
                opacity: BAND_OPACITY,
            }));
        }
    }
    fig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub label: String,
    /// One cell per entry of [`Heatmap::times`]; `None` where no mean exists.
    pub values: Vec<Option<f64>>,
}

/// Mean value pivoted to combinations × time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heatmap {
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub color_label: String,
    pub color_scale: ColorScale,
    pub times: Vec<f64>,
    pub rows: Vec<HeatmapRow>,
    /// Selected combinations that have no data; rendered as empty rows.
    pub missing_rows: Vec<String>,
    /// Wells of the channel sheet absent from either platemap.
    #[serde(default)]
    pub unmatched_wells: usize,
}

impl Heatmap {
    /// Finite value range across all cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flat_map(|row| row.values.iter().flatten().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Pivot `aggregates` into a heatmap. Rows follow the selection: every
/// selected cell type (outer) × every selected treatment (inner). Columns are
/// the distinct times in ascending order.
pub fn heatmap(
    channel: Channel,
    aggregates: &[AggregateRow],
    selection: &ConditionFilter,
) -> Result<Heatmap, PipelineError> {
    if aggregates.is_empty() {
        return Err(PipelineError::schema(NO_SELECTED_DATA));
    }
    let mut times: Vec<f64> = aggregates.iter().map(|r| r.time).collect();
    times.sort_by(|a, b| a.total_cmp(b));
    times.dedup();

    let mut cells: HashMap<String, Vec<Option<f64>>> = HashMap::new();
    for row in aggregates {
        let label = combination_label(&row.treatment, &row.cell_type);
        let values = cells
            .entry(label)
            .or_insert_with(|| vec![None; times.len()]);
        if let Some(t) = times.iter().position(|&t| t == row.time) {
            values[t] = Some(row.mean).filter(|m| !m.is_nan());
        }
    }

    let mut rows = Vec::new();
    let mut missing_rows = Vec::new();
    for cell_type in &selection.celltypes {
        for treatment in &selection.treatments {
            let label = combination_label(treatment, cell_type);
            let values = match cells.get(&label) {
                Some(values) => values.clone(),
                None => {
                    missing_rows.push(label.clone());
                    vec![None; times.len()]
                }
            };
            rows.push(HeatmapRow { label, values });
        }
    }

    let label = channel.heatmap_label().to_string();
    Ok(Heatmap {
        title: format!("{} Over Time", label),
        x: Axis::labeled(TIME_AXIS),
        y: Axis::labeled(HEATMAP_ROW_AXIS),
        color_label: label,
        color_scale: ColorScale::RdYlGn,
        times,
        rows,
        missing_rows,
        unmatched_wells: 0,
    })
}

/// Equal-width histogram over the finite values. A degenerate range gets a
/// single unit-wide bin centred on the value.
pub fn histogram_bins(values: &[f64], nbins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || nbins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![Bin {
            start: min - 0.5,
            end: max + 0.5,
            count: finite.len(),
        }];
    }
    let width = (max - min) / nbins as f64;
    let mut bins: Vec<Bin> = (0..nbins)
        .map(|i| Bin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in finite {
        let idx = (((v - min) / width).floor() as usize).min(nbins - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Seeding-uniformity check on the phase readings at time zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseCheck {
    Figures { histogram: Figure, wells: Figure },
    Unavailable { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    pub phase: PhaseCheck,
    pub sheets: Vec<String>,
}

/// Histogram and per-well bars of the phase row at `Time == 0`. Wells with a
/// missing reading are left out. No other timepoint is substituted when zero
/// is absent.
pub fn phase_check(phase: Option<&ChannelTimeSeries>) -> PhaseCheck {
    let Some(row) = phase.and_then(|p| p.row_at(0.0).map(|row| (p, row))) else {
        return PhaseCheck::Unavailable {
            message: NO_TIMEPOINT_ZERO.to_string(),
        };
    };
    let (phase, row) = row;
    let (wells, values): (Vec<String>, Vec<f64>) = phase
        .wells
        .iter()
        .zip(row)
        .filter(|(_, v)| !v.is_nan())
        .map(|(w, v)| (w.clone(), *v))
        .unzip();

    let mut histogram = Figure::new(Some(
        "Cell Seeding Check: Phase Data Distribution at Timepoint 0".to_string(),
    ));
    histogram.x = Axis::labeled("Phase Value");
    histogram.y = Axis::labeled("Count");
    histogram.add_series(Series::Histogram(HistogramSeries {
        name: "Phase Value".into(),
        bins: histogram_bins(&values, HISTOGRAM_BINS),
        color: DIAGNOSTIC_COLOR,
    }));

    let mut bars = Figure::new(Some("Phase Values Across Wells at Timepoint 0".to_string()));
    bars.x = Axis::labeled("Well");
    bars.y = Axis::labeled("Phase Value");
    bars.add_series(Series::Bar(BarSeries {
        name: "Phase Value".into(),
        categories: wells,
        values,
        color: DIAGNOSTIC_COLOR,
    }));

    PhaseCheck::Figures {
        histogram,
        wells: bars,
    }
}

/// Phase check plus the sheet list. A phase sheet that fails to parse keeps
/// the sheet list and reports the failing cell in place of the figures.
pub fn diagnostics(
    phase: Result<Option<&ChannelTimeSeries>, PipelineError>,
    sheets: Vec<String>,
) -> Diagnostics {
    let phase = match phase {
        Ok(series) => phase_check(series),
        Err(err) => {
            warn!("Phase diagnostics unavailable: {}", err);
            PhaseCheck::Unavailable {
                message: err.user_message(),
            }
        }
    };
    Diagnostics { phase, sheets }
}
