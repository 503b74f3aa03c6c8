use assert_cmd::cargo::cargo_bin_cmd;
use serde::Deserialize;
use std::error::Error;

mod common;

#[derive(Deserialize)]
struct Summary {
    message: String,
    sheets: Vec<String>,
    treatments: Vec<String>,
    celltypes: Vec<String>,
    default_treatments: Vec<String>,
    default_celltypes: Vec<String>,
}

#[test]
fn sheets_command_lists_options_and_defaults() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args(["sheets", "--input", plate.to_str().unwrap()]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;
    assert_eq!(summary.message, "File 'plate.xlsx' uploaded successfully!");
    assert_eq!(
        summary.sheets,
        vec!["phase", "green", "red", "treatments", "celltypes"]
    );
    assert_eq!(summary.treatments, vec!["Ctrl", "Drug"]);
    assert_eq!(summary.celltypes, vec!["HeLa"]);
    assert_eq!(summary.default_treatments, vec!["Ctrl"]);
    assert_eq!(summary.default_celltypes, vec!["HeLa"]);
    Ok(())
}

#[test]
fn base64_upload_is_decoded() -> Result<(), Box<dyn Error>> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    let dir = tempfile::tempdir()?;
    let encoded = format!(
        "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,{}",
        STANDARD.encode(common::plate_workbook()?)
    );
    let path = dir.path().join("plate.b64");
    std::fs::write(&path, encoded)?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args(["sheets", "--base64", "--input", path.to_str().unwrap()]);
    let out = cmd.assert().success().get_output().stdout.clone();
    let summary: Summary = serde_json::from_slice(&out)?;
    assert_eq!(summary.treatments, vec!["Ctrl", "Drug"]);
    Ok(())
}

#[test]
fn corrupt_workbook_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a workbook")?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args(["sheets", "--input", path.to_str().unwrap()]);
    cmd.assert().failure();
    Ok(())
}
