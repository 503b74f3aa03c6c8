use crate::table::RawSheet;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Which experimental variable a platemap encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataKind {
    Treatment,
    CellType,
}

impl MetadataKind {
    /// Workbook sheet holding this platemap.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            MetadataKind::Treatment => "treatments",
            MetadataKind::CellType => "celltypes",
        }
    }

    pub fn value_name(&self) -> &'static str {
        match self {
            MetadataKind::Treatment => "Treatment",
            MetadataKind::CellType => "Cell type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateEntry {
    pub well: String,
    pub value: String,
}

/// Long-format platemap: one entry per populated plate coordinate, in
/// row-major order of the source grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateMetadata {
    pub kind: MetadataKind,
    pub entries: Vec<PlateEntry>,
}

impl PlateMetadata {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct values in first-seen order.
    pub fn distinct_values(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.value) {
                seen.push(entry.value.clone());
            }
        }
        seen
    }

    /// Sorted, de-duplicated, non-blank values offered for selection.
    pub fn options(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.value.clone())
            .filter(|value| !value.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Normalized well → value lookup. Later entries overwrite earlier ones
    /// for the same well.
    pub fn lookup(&self) -> HashMap<String, &str> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            map.insert(normalize_well(&entry.well), entry.value.as_str());
        }
        map
    }
}

/// Canonical well key: surrounding whitespace removed, upper-cased.
pub fn normalize_well(well: &str) -> String {
    well.trim().to_uppercase()
}

/// Flatten a plate grid (rows = plate-row labels, columns = plate-column
/// labels) into one entry per populated cell, with `well = row + column`.
pub fn normalize_platemap(sheet: &RawSheet, kind: MetadataKind) -> PlateMetadata {
    let column_labels: Vec<String> = sheet.columns.iter().map(|cell| cell.label()).collect();
    let mut entries = Vec::with_capacity(sheet.height() * sheet.width());
    for (row_label, row) in sheet.index.iter().zip(&sheet.rows) {
        let row_label = row_label.label();
        for (column_label, cell) in column_labels.iter().zip(row) {
            if cell.is_empty() {
                continue;
            }
            entries.push(PlateEntry {
                well: format!("{}{}", row_label, column_label),
                value: cell.label(),
            });
        }
    }
    let platemap = PlateMetadata { kind, entries };
    debug!(
        "Available {}s: {:?}",
        kind.value_name(),
        platemap.distinct_values()
    );
    platemap
}
