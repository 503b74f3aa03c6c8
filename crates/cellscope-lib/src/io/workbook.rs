use crate::error::PipelineError;
use crate::table::{Cell, RawSheet, SheetMap};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

fn range_to_sheet(name: &str, range: &Range<Data>) -> RawSheet {
    // Ranges start at the first used cell; pad so column A stays the index.
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));
    let mut grid: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(to_cell));
        grid.push(cells);
    }
    RawSheet::from_grid(name, grid)
}

/// Read every worksheet of an xlsx/xls/ods file held in memory.
pub fn load_workbook(bytes: &[u8]) -> Result<SheetMap, PipelineError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(PipelineError::load)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(PipelineError::load)?;
        let sheet = range_to_sheet(&name, &range);
        debug!(
            "Loaded sheet '{}': {} rows x {} columns",
            name,
            sheet.height(),
            sheet.width()
        );
        sheets.push(sheet);
    }
    info!("Workbook loaded with {} sheet(s)", sheets.len());
    Ok(SheetMap::new(sheets))
}

pub fn load_workbook_path(path: &Path) -> Result<SheetMap, PipelineError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PipelineError::load(format!("{}: {}", path.display(), e)))?;
    load_workbook(&bytes)
}

/// Decode upload contents, either a `data:<mime>;base64,<payload>` URL or a
/// bare base64 payload.
pub fn decode_upload(contents: &str) -> Result<Vec<u8>, PipelineError> {
    let payload = match contents.split_once(',') {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => contents,
    };
    STANDARD
        .decode(payload.trim())
        .map_err(|e| PipelineError::load(format!("invalid base64 upload: {}", e)))
}
