use crate::table::{AggregateRow, TidyRow};
use csv::WriterBuilder;
use serde::Serialize;
use std::io::Write;

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> csv::Result<()> {
    let mut out = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Tidy rows as CSV with header `Time,Well,Value,Treatment,CellType`.
pub fn write_tidy_csv<W: Write>(writer: W, rows: &[TidyRow]) -> csv::Result<()> {
    write_rows(writer, rows)
}

/// Aggregates as CSV with header `Time,Treatment,CellType,MeanValue,StdValue`.
pub fn write_aggregate_csv<W: Write>(writer: W, rows: &[AggregateRow]) -> csv::Result<()> {
    write_rows(writer, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tidy_csv_has_named_columns() {
        let rows = vec![TidyRow {
            time: 0.5,
            well: "A1".into(),
            value: 12.5,
            treatment: "Ctrl".into(),
            cell_type: "HeLa".into(),
        }];
        let mut buf = Vec::new();
        write_tidy_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Time,Well,Value,Treatment,CellType"));
        assert_eq!(lines.next(), Some("0.5,A1,12.5,Ctrl,HeLa"));
    }

    #[test]
    fn aggregate_csv_keeps_nan_std() {
        let rows = vec![AggregateRow {
            time: 1.0,
            treatment: "Drug".into(),
            cell_type: "U2OS".into(),
            mean: 3.0,
            std: f64::NAN,
        }];
        let mut buf = Vec::new();
        write_aggregate_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Time,Treatment,CellType,MeanValue,StdValue\n"));
        assert!(text.contains("Drug,U2OS,3.0,NaN"));
    }
}
