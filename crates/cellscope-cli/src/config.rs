use anyhow::{Context, Result};
use cellscope_lib::{
    aggregate::ConditionFilter, channel::Channel, Dataset, ExportFormat, ExportOptions, Selection,
    ViewMode,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Selection file, e.g.
///
/// ```toml
/// treatments = ["Ctrl", "Drug"]
/// celltypes = ["HeLa"]
/// channel = "ratio"
/// view = "heatmap"
///
/// [export]
/// format = "png"
/// filename = "plate-07"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub treatments: Option<Vec<String>>,
    #[serde(default)]
    pub celltypes: Option<Vec<String>>,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub view: Option<ViewMode>,
    #[serde(default)]
    pub export: Option<ExportOptions>,
}

pub fn read_selection_config(path: &Path) -> Result<SelectionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read selection {}", path.display()))?;
    let config: SelectionConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing selection {}", path.display()))?;
    Ok(config)
}

/// Command-line values; each one that is set wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct SelectionOverrides {
    pub treatments: Vec<String>,
    pub celltypes: Vec<String>,
    pub channel: Option<Channel>,
    pub view: Option<ViewMode>,
    pub format: Option<ExportFormat>,
    pub filename: Option<String>,
}

impl SelectionConfig {
    /// Merge with `overrides`, falling back to the dataset's first treatment
    /// and cell type when neither source names any.
    pub fn resolve(self, overrides: SelectionOverrides, dataset: &Dataset) -> Selection {
        let defaults = dataset.default_selection();
        let pick = |flag: Vec<String>, file: Option<Vec<String>>, fallback: Vec<String>| {
            if !flag.is_empty() {
                flag
            } else {
                file.unwrap_or(fallback)
            }
        };
        let mut export = self.export.unwrap_or_default();
        if let Some(format) = overrides.format {
            export.format = format;
        }
        if let Some(filename) = overrides.filename {
            export.filename = filename;
        }
        Selection {
            conditions: ConditionFilter::new(
                pick(overrides.treatments, self.treatments, defaults.treatments),
                pick(overrides.celltypes, self.celltypes, defaults.celltypes),
            ),
            channel: overrides.channel.or(self.channel).unwrap_or(Channel::Phase),
            view: overrides.view.or(self.view).unwrap_or_default(),
            export,
        }
    }
}
