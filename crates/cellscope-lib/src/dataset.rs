use crate::aggregate::ConditionFilter;
use crate::channel::{normalize_channel, ratio_channel, Channel};
use crate::error::PipelineError;
use crate::io::workbook::load_workbook;
use crate::plate::{normalize_platemap, MetadataKind, PlateMetadata};
use crate::table::{ChannelTimeSeries, SheetMap};
use crate::tidy::{tidy_join, TidyJoin};
use log::info;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of one upload: the raw sheets plus the platemaps
/// derived from them. Channels are normalized on demand so a malformed
/// channel only affects the views that need it.
#[derive(Debug, Clone)]
pub struct Dataset {
    sheets: SheetMap,
    treatments: Option<PlateMetadata>,
    celltypes: Option<PlateMetadata>,
}

/// What the selectors show after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSummary {
    pub message: String,
    pub sheets: Vec<String>,
    pub treatments: Vec<String>,
    pub celltypes: Vec<String>,
    pub default_treatments: Vec<String>,
    pub default_celltypes: Vec<String>,
}

impl Dataset {
    pub fn from_sheets(sheets: SheetMap) -> Self {
        let platemap = |kind: MetadataKind| {
            sheets
                .get(kind.sheet_name())
                .map(|sheet| normalize_platemap(sheet, kind))
        };
        let treatments = platemap(MetadataKind::Treatment);
        let celltypes = platemap(MetadataKind::CellType);
        Self {
            sheets,
            treatments,
            celltypes,
        }
    }

    pub fn load(bytes: &[u8]) -> Result<Self, PipelineError> {
        Ok(Self::from_sheets(load_workbook(bytes)?))
    }

    pub fn sheets(&self) -> &SheetMap {
        &self.sheets
    }

    pub fn treatments(&self) -> Option<&PlateMetadata> {
        self.treatments.as_ref()
    }

    pub fn celltypes(&self) -> Option<&PlateMetadata> {
        self.celltypes.as_ref()
    }

    pub fn treatment_options(&self) -> Vec<String> {
        self.treatments
            .as_ref()
            .map(PlateMetadata::options)
            .unwrap_or_default()
    }

    pub fn celltype_options(&self) -> Vec<String> {
        self.celltypes
            .as_ref()
            .map(PlateMetadata::options)
            .unwrap_or_default()
    }

    /// First treatment and first cell type, or nothing when a list is empty.
    pub fn default_selection(&self) -> ConditionFilter {
        ConditionFilter::new(
            self.treatment_options().into_iter().take(1).collect(),
            self.celltype_options().into_iter().take(1).collect(),
        )
    }

    pub fn summary(&self, filename: &str) -> UploadSummary {
        let defaults = self.default_selection();
        let summary = UploadSummary {
            message: format!("File '{}' uploaded successfully!", filename),
            sheets: self.sheets.names(),
            treatments: self.treatment_options(),
            celltypes: self.celltype_options(),
            default_treatments: defaults.treatments,
            default_celltypes: defaults.celltypes,
        };
        info!(
            "Upload '{}': {} sheet(s), {} treatment(s), {} cell type(s)",
            filename,
            summary.sheets.len(),
            summary.treatments.len(),
            summary.celltypes.len()
        );
        summary
    }

    fn raw_channel(&self, channel: Channel) -> Result<Option<ChannelTimeSeries>, PipelineError> {
        match channel.sheet_name().and_then(|name| self.sheets.get(name)) {
            Some(sheet) => normalize_channel(sheet).map(Some),
            None => Ok(None),
        }
    }

    /// Normalized readings for `channel`, `Ok(None)` when its sheet (or, for
    /// the ratio, either source sheet) is absent.
    pub fn channel(&self, channel: Channel) -> Result<Option<ChannelTimeSeries>, PipelineError> {
        match channel {
            Channel::Ratio => {
                let green = self.raw_channel(Channel::Green)?;
                let red = self.raw_channel(Channel::Red)?;
                Ok(ratio_channel(green.as_ref(), red.as_ref()))
            }
            other => self.raw_channel(other),
        }
    }

    pub fn is_available(&self, channel: Channel) -> bool {
        match channel {
            Channel::Ratio => {
                self.is_available(Channel::Green) && self.is_available(Channel::Red)
            }
            other => other
                .sheet_name()
                .map(|name| self.sheets.contains(name))
                .unwrap_or(false),
        }
    }

    /// Channels with data, in multi-plot panel order.
    pub fn available_channels(&self) -> Vec<Channel> {
        Channel::PANEL_ORDER
            .into_iter()
            .filter(|c| self.is_available(*c))
            .collect()
    }

    pub fn tidy(&self, channel: &ChannelTimeSeries) -> Result<TidyJoin, PipelineError> {
        tidy_join(channel, self.treatments(), self.celltypes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, RawSheet};

    fn sheets(with_metadata: bool) -> SheetMap {
        let mut sheets = vec![
            RawSheet::from_grid(
                "green",
                vec![
                    vec!["Time".into(), "A1".into()],
                    vec![Cell::Number(0.0), "4,0".into()],
                ],
            ),
            RawSheet::from_grid(
                "red",
                vec![
                    vec!["Time".into(), "A1".into()],
                    vec![Cell::Number(0.0), "2,0".into()],
                ],
            ),
        ];
        if with_metadata {
            sheets.push(RawSheet::from_grid(
                "treatments",
                vec![
                    vec![Cell::Empty, Cell::Number(1.0), Cell::Number(2.0)],
                    vec!["A".into(), "Drug".into(), "Ctrl".into()],
                ],
            ));
            sheets.push(RawSheet::from_grid(
                "celltypes",
                vec![
                    vec![Cell::Empty, Cell::Number(1.0), Cell::Number(2.0)],
                    vec!["A".into(), "HeLa".into(), "HeLa".into()],
                ],
            ));
        }
        SheetMap::new(sheets)
    }

    #[test]
    fn missing_platemaps_degrade_to_empty_options() {
        let dataset = Dataset::from_sheets(sheets(false));
        assert!(dataset.treatment_options().is_empty());
        assert!(dataset.celltype_options().is_empty());
        assert_eq!(dataset.default_selection(), ConditionFilter::default());
        let green = dataset.channel(Channel::Green).unwrap().unwrap();
        assert!(matches!(
            dataset.tidy(&green),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn defaults_pick_first_sorted_option() {
        let dataset = Dataset::from_sheets(sheets(true));
        let summary = dataset.summary("plate.xlsx");
        assert_eq!(summary.message, "File 'plate.xlsx' uploaded successfully!");
        assert_eq!(summary.treatments, vec!["Ctrl", "Drug"]);
        assert_eq!(summary.default_treatments, vec!["Ctrl"]);
        assert_eq!(summary.default_celltypes, vec!["HeLa"]);
        assert_eq!(summary.sheets, vec!["green", "red", "treatments", "celltypes"]);
    }

    #[test]
    fn ratio_available_only_with_both_sources() {
        let dataset = Dataset::from_sheets(sheets(true));
        assert_eq!(
            dataset.available_channels(),
            vec![Channel::Ratio, Channel::Green, Channel::Red]
        );
        let ratio = dataset.channel(Channel::Ratio).unwrap().unwrap();
        assert_eq!(ratio.values, vec![vec![2.0]]);
        assert!(dataset.channel(Channel::Phase).unwrap().is_none());
    }
}
