use crate::table::{AggregateRow, TidyRow};
use polars::prelude::*;

/// Tidy rows as a DataFrame with columns Time, Well, Value, Treatment, CellType.
pub fn tidy_frame(rows: &[TidyRow]) -> PolarsResult<DataFrame> {
    df!(
        "Time" => rows.iter().map(|r| r.time).collect::<Vec<f64>>(),
        "Well" => rows.iter().map(|r| r.well.as_str()).collect::<Vec<&str>>(),
        "Value" => rows.iter().map(|r| r.value).collect::<Vec<f64>>(),
        "Treatment" => rows.iter().map(|r| r.treatment.as_str()).collect::<Vec<&str>>(),
        "CellType" => rows.iter().map(|r| r.cell_type.as_str()).collect::<Vec<&str>>()
    )
}

/// Aggregates as a DataFrame with columns Time, Treatment, CellType,
/// MeanValue, StdValue.
pub fn aggregate_frame(rows: &[AggregateRow]) -> PolarsResult<DataFrame> {
    df!(
        "Time" => rows.iter().map(|r| r.time).collect::<Vec<f64>>(),
        "Treatment" => rows.iter().map(|r| r.treatment.as_str()).collect::<Vec<&str>>(),
        "CellType" => rows.iter().map(|r| r.cell_type.as_str()).collect::<Vec<&str>>(),
        "MeanValue" => rows.iter().map(|r| r.mean).collect::<Vec<f64>>(),
        "StdValue" => rows.iter().map(|r| r.std).collect::<Vec<f64>>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_frame_shape() {
        let rows = vec![TidyRow {
            time: 0.0,
            well: "A1".into(),
            value: 1.0,
            treatment: "Ctrl".into(),
            cell_type: "HeLa".into(),
        }];
        let df = tidy_frame(&rows).unwrap();
        assert_eq!(df.shape(), (1, 5));
        assert!(df.column("CellType").is_ok());
    }
}
