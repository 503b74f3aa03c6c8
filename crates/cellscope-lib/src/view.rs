use crate::aggregate::{aggregate, ConditionFilter};
use crate::channel::Channel;
use crate::chart::{diagnostics, heatmap, time_series_figure, Diagnostics, Heatmap};
use crate::dataset::Dataset;
use crate::error::PipelineError;
use crate::plot::Figure;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Individual,
    #[serde(alias = "multi_plot")]
    Multi,
    #[serde(alias = "heatmaps")]
    Heatmap,
    Diagnostics,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(ViewMode::Individual),
            "multi" | "multi_plot" | "multi-plot" => Ok(ViewMode::Multi),
            "heatmap" | "heatmaps" => Ok(ViewMode::Heatmap),
            "diagnostics" => Ok(ViewMode::Diagnostics),
            other => Err(format!(
                "unknown view '{}' (expected individual, multi, heatmap or diagnostics)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Svg,
    Png,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("unknown export format '{}' (expected svg or png)", other)),
        }
    }
}

/// Rendering hint carried alongside every chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default = "default_scale")]
    pub scale: u32,
}

fn default_filename() -> String {
    "custom_image".to_string()
}

fn default_scale() -> u32 {
    2
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            filename: default_filename(),
            scale: default_scale(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub conditions: ConditionFilter,
    pub channel: Channel,
    pub view: ViewMode,
    pub export: ExportOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub header: String,
    pub figure: Figure,
    /// Wells of the channel sheet absent from either platemap.
    #[serde(default)]
    pub unmatched_wells: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ChartDescription {
    Individual {
        panel: Panel,
        export: ExportOptions,
    },
    Multi {
        panels: Vec<Panel>,
        export: ExportOptions,
    },
    Heatmap {
        heatmap: Heatmap,
        export: ExportOptions,
    },
    Diagnostics {
        diagnostics: Diagnostics,
        export: ExportOptions,
    },
}

impl ChartDescription {
    pub fn export(&self) -> &ExportOptions {
        match self {
            ChartDescription::Individual { export, .. }
            | ChartDescription::Multi { export, .. }
            | ChartDescription::Heatmap { export, .. }
            | ChartDescription::Diagnostics { export, .. } => export,
        }
    }
}

fn unavailable(channel: Channel) -> String {
    match channel {
        Channel::Ratio => "Green or Red data missing for Ratio calculation".to_string(),
        other => format!("No data available for {}", other),
    }
}

/// Mean ± std line chart for one channel. An absent channel yields a notice
/// figure; parse and schema failures propagate.
pub fn line_panel(
    dataset: &Dataset,
    channel: Channel,
    conditions: &ConditionFilter,
) -> Result<Panel, PipelineError> {
    let header = channel.graph_title().to_string();
    let Some(series) = dataset.channel(channel)? else {
        return Ok(Panel {
            header,
            figure: Figure::notice(unavailable(channel)),
            unmatched_wells: 0,
        });
    };
    let join = dataset.tidy(&series)?;
    let aggregates = aggregate(&join.rows, conditions);
    debug!(
        "{}: {} tidy row(s), {} group(s), {} unmatched well(s)",
        channel,
        join.rows.len(),
        aggregates.len(),
        join.join_gap()
    );
    Ok(Panel {
        header,
        figure: time_series_figure(channel, &aggregates),
        unmatched_wells: join.join_gap(),
    })
}

fn heatmap_view(
    dataset: &Dataset,
    channel: Channel,
    conditions: &ConditionFilter,
) -> Result<Heatmap, PipelineError> {
    let series = dataset
        .channel(channel)?
        .ok_or_else(|| PipelineError::schema(format!("No data available for {}.", channel)))?;
    let join = dataset.tidy(&series)?;
    let mut map = heatmap(channel, &aggregate(&join.rows, conditions), conditions)?;
    map.unmatched_wells = join.join_gap();
    Ok(map)
}

/// Everything the presentation layer needs for one view. Failures leave
/// `dataset` untouched and surface as [`PipelineError::user_message`].
pub fn build_chart_data(
    dataset: &Dataset,
    selection: &Selection,
) -> Result<ChartDescription, PipelineError> {
    let export = selection.export.clone();
    let conditions = &selection.conditions;
    match selection.view {
        ViewMode::Individual => Ok(ChartDescription::Individual {
            panel: line_panel(dataset, selection.channel, conditions)?,
            export,
        }),
        ViewMode::Multi => {
            let panels = dataset
                .available_channels()
                .into_iter()
                .map(|channel| {
                    line_panel(dataset, channel, conditions).unwrap_or_else(|err| Panel {
                        header: channel.graph_title().to_string(),
                        figure: Figure::notice(err.user_message()),
                        unmatched_wells: 0,
                    })
                })
                .collect();
            Ok(ChartDescription::Multi { panels, export })
        }
        ViewMode::Heatmap => Ok(ChartDescription::Heatmap {
            heatmap: heatmap_view(dataset, selection.channel, conditions)?,
            export,
        }),
        ViewMode::Diagnostics => {
            let sheets = dataset.sheets().names();
            let diag = match dataset.channel(Channel::Phase) {
                Ok(phase) => diagnostics(Ok(phase.as_ref()), sheets),
                Err(err) => diagnostics(Err(err), sheets),
            };
            Ok(ChartDescription::Diagnostics {
                diagnostics: diag,
                export,
            })
        }
    }
}
