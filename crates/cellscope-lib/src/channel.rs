use crate::error::PipelineError;
use crate::table::{Cell, ChannelTimeSeries, RawSheet};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measured or derived microscopy signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Phase,
    Green,
    Red,
    Ratio,
}

impl Channel {
    /// Order of panels in the multi-plot view.
    pub const PANEL_ORDER: [Channel; 4] =
        [Channel::Phase, Channel::Ratio, Channel::Green, Channel::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Phase => "phase",
            Channel::Green => "green",
            Channel::Red => "red",
            Channel::Ratio => "ratio",
        }
    }

    /// Workbook sheet holding the raw readings; the ratio has none.
    pub fn sheet_name(&self) -> Option<&'static str> {
        match self {
            Channel::Ratio => None,
            other => Some(other.as_str()),
        }
    }

    pub fn y_axis_title(&self) -> &'static str {
        match self {
            Channel::Phase => "Confluence (%)",
            Channel::Green => "Green Fluorescence (AU)",
            Channel::Red => "Red Fluorescence (AU)",
            Channel::Ratio => "Green/Red Fluorescence Ratio",
        }
    }

    pub fn graph_title(&self) -> &'static str {
        match self {
            Channel::Phase => "Confluence Over Time",
            Channel::Green => "Green Fluorescence Over Time",
            Channel::Red => "Red Fluorescence Over Time",
            Channel::Ratio => "Green/Red Fluorescence Ratio Over Time",
        }
    }

    pub fn heatmap_label(&self) -> &'static str {
        match self {
            Channel::Phase => "Confluence",
            Channel::Green => "Green Fluorescence",
            Channel::Red => "Red Fluorescence",
            Channel::Ratio => "Green/Red Ratio",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phase" => Ok(Channel::Phase),
            "green" => Ok(Channel::Green),
            "red" => Ok(Channel::Red),
            "ratio" => Ok(Channel::Ratio),
            other => Err(format!(
                "unknown channel '{}' (expected phase, green, red or ratio)",
                other
            )),
        }
    }
}

/// Decode a locale-formatted number: `"12,5"` and `"12.5"` both give 12.5.
pub fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

fn cell_value(
    sheet: &RawSheet,
    cell: &Cell,
    row: usize,
    column: usize,
) -> Result<f64, PipelineError> {
    match cell {
        Cell::Number(n) => Ok(*n),
        Cell::Empty => Ok(f64::NAN),
        Cell::Text(text) => parse_decimal(text).ok_or_else(|| PipelineError::Parse {
            sheet: sheet.name.clone(),
            row,
            column,
            text: text.clone(),
        }),
    }
}

/// Convert a time × well sheet into numeric readings. The first failing
/// cell aborts the whole channel.
pub fn normalize_channel(sheet: &RawSheet) -> Result<ChannelTimeSeries, PipelineError> {
    let wells: Vec<String> = sheet.columns.iter().map(Cell::label).collect();
    let mut times = Vec::with_capacity(sheet.height());
    let mut values = Vec::with_capacity(sheet.height());
    for (r, (index, row)) in sheet.index.iter().zip(&sheet.rows).enumerate() {
        // Header occupies spreadsheet row 1 and the index column 1.
        let sheet_row = r + 2;
        times.push(cell_value(sheet, index, sheet_row, 1)?);
        let decoded = row
            .iter()
            .enumerate()
            .map(|(c, cell)| cell_value(sheet, cell, sheet_row, c + 2))
            .collect::<Result<Vec<f64>, PipelineError>>()?;
        values.push(decoded);
    }
    debug!(
        "Normalized '{}': {} timepoints x {} wells",
        sheet.name,
        times.len(),
        wells.len()
    );
    Ok(ChannelTimeSeries {
        times,
        wells,
        values,
    })
}

/// Green ÷ red on green's time index and well order. A red reading of
/// exactly zero, or one absent from the red table, yields `NaN`.
///
/// Returns `None` when either input channel is unavailable.
pub fn ratio_channel(
    green: Option<&ChannelTimeSeries>,
    red: Option<&ChannelTimeSeries>,
) -> Option<ChannelTimeSeries> {
    let (green, red) = (green?, red?);
    let red_cols: Vec<Option<usize>> = green
        .wells
        .iter()
        .map(|well| red.wells.iter().position(|w| w == well))
        .collect();
    let values = green
        .times
        .iter()
        .zip(&green.values)
        .map(|(time, green_row)| {
            let red_row = red
                .times
                .iter()
                .position(|t| t == time)
                .and_then(|t| red.values.get(t));
            green_row
                .iter()
                .zip(&red_cols)
                .map(|(g, col)| {
                    let r = match (red_row, col) {
                        (Some(row), Some(c)) => row.get(*c).copied().unwrap_or(f64::NAN),
                        _ => f64::NAN,
                    };
                    if r == 0.0 {
                        f64::NAN
                    } else {
                        g / r
                    }
                })
                .collect()
        })
        .collect();
    Some(ChannelTimeSeries {
        times: green.times.clone(),
        wells: green.wells.clone(),
        values,
    })
}
