use crate::table::{AggregateRow, TidyRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Selected treatments and cell types. A row passes when both of its labels
/// are selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFilter {
    #[serde(default)]
    pub treatments: Vec<String>,
    #[serde(default)]
    pub celltypes: Vec<String>,
}

impl ConditionFilter {
    pub fn new(treatments: Vec<String>, celltypes: Vec<String>) -> Self {
        Self {
            treatments,
            celltypes,
        }
    }

    pub fn filter<'a>(&self, rows: &'a [TidyRow]) -> Vec<&'a TidyRow> {
        let treatments: HashSet<&str> = self.treatments.iter().map(String::as_str).collect();
        let celltypes: HashSet<&str> = self.celltypes.iter().map(String::as_str).collect();
        rows.iter()
            .filter(|row| {
                treatments.contains(row.treatment.as_str())
                    && celltypes.contains(row.cell_type.as_str())
            })
            .collect()
    }
}

/// Time ordered by `f64::total_cmp`, with `-0.0` folded into `0.0`.
#[derive(Debug, Clone, Copy)]
struct TimeKey(f64);

impl TimeKey {
    fn new(t: f64) -> Self {
        TimeKey(if t == 0.0 { 0.0 } else { t })
    }
}

impl PartialEq for TimeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeKey {}

impl PartialOrd for TimeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Mean and sample standard deviation, skipping `NaN` readings. The mean of
/// no readings and the deviation of fewer than two are `NaN`.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = present.len();
    if n == 0 {
        return (f64::NAN, f64::NAN);
    }
    let mean = present.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        (present.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
    } else {
        f64::NAN
    };
    (mean, std)
}

/// Filter `rows` by `selection`, then reduce each (Time, Treatment, CellType)
/// group to its mean and standard deviation. Output is sorted by time, then
/// treatment, then cell type; groups without rows are not emitted.
pub fn aggregate(rows: &[TidyRow], selection: &ConditionFilter) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(TimeKey, &str, &str), Vec<f64>> = BTreeMap::new();
    for row in selection.filter(rows) {
        groups
            .entry((
                TimeKey::new(row.time),
                row.treatment.as_str(),
                row.cell_type.as_str(),
            ))
            .or_default()
            .push(row.value);
    }
    groups
        .into_iter()
        .map(|((time, treatment, cell_type), values)| {
            let (mean, std) = mean_std(&values);
            AggregateRow {
                time: time.0,
                treatment: treatment.to_string(),
                cell_type: cell_type.to_string(),
                mean,
                std,
            }
        })
        .collect()
}
