#![allow(dead_code)]

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};

pub const WELLS: [&str; 4] = ["A1", "A2", "B1", "B2"];

fn write_platemap(sheet: &mut Worksheet, rows: [[&str; 2]; 2]) -> Result<(), XlsxError> {
    sheet.write_number(0, 1, 1.0)?;
    sheet.write_number(0, 2, 2.0)?;
    for (r, (label, values)) in ["A", "B"].iter().zip(rows).enumerate() {
        let row = r as u32 + 1;
        sheet.write_string(row, 0, *label)?;
        sheet.write_string(row, 1, values[0])?;
        sheet.write_string(row, 2, values[1])?;
    }
    Ok(())
}

fn write_channel(sheet: &mut Worksheet, base: f64) -> Result<(), XlsxError> {
    sheet.write_string(0, 0, "Time")?;
    for (c, well) in WELLS.iter().enumerate() {
        sheet.write_string(0, c as u16 + 1, *well)?;
    }
    for (r, time) in [0.0, 1.0, 2.0].iter().enumerate() {
        let row = r as u32 + 1;
        sheet.write_number(row, 0, *time)?;
        for c in 0..WELLS.len() {
            let value = base + *time * 10.0 + c as f64;
            // Comma decimals, as exported by the instrument.
            sheet.write_string(row, c as u16 + 1, format!("{:.1}", value).replace('.', ","))?;
        }
    }
    Ok(())
}

/// 2x2 plate: row A is Ctrl, row B is Drug, every well HeLa.
pub fn plate_workbook() -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    for (name, base) in [("phase", 100.0), ("green", 40.0), ("red", 20.0)] {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        write_channel(sheet, base)?;
    }
    let treatments = workbook.add_worksheet();
    treatments.set_name("treatments")?;
    write_platemap(treatments, [["Ctrl", "Ctrl"], ["Drug", "Drug"]])?;
    let celltypes = workbook.add_worksheet();
    celltypes.set_name("celltypes")?;
    write_platemap(celltypes, [["HeLa", "HeLa"], ["HeLa", "HeLa"]])?;
    workbook.save_to_buffer()
}

pub fn write_plate(dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = dir.join("plate.xlsx");
    std::fs::write(&path, plate_workbook()?)?;
    Ok(path)
}

pub fn assert_close(a: f64, b: f64, tol: f64) {
    let diff = (a - b).abs();
    assert!(
        diff <= tol,
        "diff {} exceeded tol {} ({} vs {})",
        diff,
        tol,
        a,
        b
    );
}
