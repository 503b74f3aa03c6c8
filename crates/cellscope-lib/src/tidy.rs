use crate::error::PipelineError;
use crate::plate::{normalize_well, MetadataKind, PlateMetadata};
use crate::table::{ChannelTimeSeries, TidyRow};
use log::warn;
use serde::{Deserialize, Serialize};

/// Result of joining one channel against both platemaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TidyJoin {
    pub rows: Vec<TidyRow>,
    /// Normalized wells present in the channel but missing from at least one
    /// platemap, in channel column order. Their readings were dropped.
    pub unmatched_wells: Vec<String>,
}

impl TidyJoin {
    pub fn join_gap(&self) -> usize {
        self.unmatched_wells.len()
    }
}

/// Long-format (Time, Well, Value) triples, one well column at a time.
pub fn melt(channel: &ChannelTimeSeries) -> Vec<(f64, String, f64)> {
    let mut out = Vec::with_capacity(channel.times.len() * channel.wells.len());
    for (w, well) in channel.wells.iter().enumerate() {
        for (t, time) in channel.times.iter().enumerate() {
            let value = channel
                .values
                .get(t)
                .and_then(|row| row.get(w))
                .copied()
                .unwrap_or(f64::NAN);
            out.push((*time, well.clone(), value));
        }
    }
    out
}

fn require<'a>(
    platemap: Option<&'a PlateMetadata>,
    kind: MetadataKind,
) -> Result<&'a PlateMetadata, PipelineError> {
    match platemap {
        Some(p) if p.kind == kind => Ok(p),
        Some(p) => Err(PipelineError::schema(format!(
            "Missing column: expected {} platemap, got {}",
            kind.value_name(),
            p.kind.value_name()
        ))),
        None => Err(PipelineError::schema(format!(
            "Missing columns: {} (no '{}' sheet uploaded)",
            kind.value_name(),
            kind.sheet_name()
        ))),
    }
}

/// Melt `channel`, attach treatment and cell type by normalized well, and
/// drop readings whose well has no match in either platemap.
pub fn tidy_join(
    channel: &ChannelTimeSeries,
    treatments: Option<&PlateMetadata>,
    celltypes: Option<&PlateMetadata>,
) -> Result<TidyJoin, PipelineError> {
    let treatments = require(treatments, MetadataKind::Treatment)?.lookup();
    let celltypes = require(celltypes, MetadataKind::CellType)?.lookup();

    let mut join = TidyJoin::default();
    for (time, well, value) in melt(channel) {
        let well = normalize_well(&well);
        match (treatments.get(&well), celltypes.get(&well)) {
            (Some(treatment), Some(cell_type)) => join.rows.push(TidyRow {
                time,
                well,
                value,
                treatment: treatment.to_string(),
                cell_type: cell_type.to_string(),
            }),
            _ => {
                if !join.unmatched_wells.contains(&well) {
                    join.unmatched_wells.push(well);
                }
            }
        }
    }
    if join.join_gap() > 0 {
        warn!(
            "{} well(s) without platemap metadata dropped: {:?}",
            join.join_gap(),
            join.unmatched_wells
        );
    }
    Ok(join)
}
