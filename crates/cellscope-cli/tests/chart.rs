use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::error::Error;
use std::path::Path;

mod common;

fn chart(plate: &Path, extra: &[&str]) -> Result<Value, Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args(["chart", "--input", plate.to_str().unwrap()]);
    cmd.args(extra);
    let out = cmd.assert().success().get_output().stdout.clone();
    Ok(serde_json::from_slice(&out)?)
}

#[test]
fn individual_view_has_one_line_per_combination() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let value = chart(
        &plate,
        &["--channel", "green", "--treatment", "Ctrl", "--treatment", "Drug"],
    )?;
    assert_eq!(value["view"], "individual");
    assert_eq!(value["panel"]["header"], "Green Fluorescence Over Time");
    let series = value["panel"]["figure"]["series"].as_array().unwrap();
    let lines: Vec<&Value> = series.iter().filter(|s| s.get("Line").is_some()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(value["export"]["format"], "svg");
    assert_eq!(value["panel"]["unmatched_wells"], 0);
    Ok(())
}

#[test]
fn unmatched_heatmap_selection_reports_message() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let value = chart(&plate, &["--view", "heatmap", "--treatment", "Nope"])?;
    assert_eq!(
        value["message"],
        "No data available for the selected treatments and cell types."
    );
    Ok(())
}

#[test]
fn config_file_selects_multi_view() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let config = dir.path().join("selection.toml");
    std::fs::write(
        &config,
        "treatments = [\"Drug\"]\nview = \"multi_plot\"\n\n[export]\nformat = \"png\"\n",
    )?;
    let value = chart(&plate, &["--config", config.to_str().unwrap()])?;
    assert_eq!(value["view"], "multi");
    let panels = value["panels"].as_array().unwrap();
    assert_eq!(panels.len(), 4);
    assert_eq!(value["export"]["format"], "png");
    Ok(())
}

#[test]
fn diagnostics_view_carries_export_options() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let value = chart(&plate, &["--view", "diagnostics", "--filename", "diag"])?;
    assert_eq!(value["view"], "diagnostics");
    assert_eq!(value["export"]["filename"], "diag");
    assert_eq!(value["diagnostics"]["phase"]["status"], "figures");
    assert_eq!(value["diagnostics"]["sheets"].as_array().unwrap().len(), 5);
    Ok(())
}
