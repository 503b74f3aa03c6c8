use assert_cmd::cargo::cargo_bin_cmd;
use std::error::Error;

mod common;

#[test]
fn renders_individual_svg() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let out_dir = dir.path().join("figures");
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args([
        "render",
        "--input",
        plate.to_str().unwrap(),
        "--channel",
        "ratio",
        "--filename",
        "ratio",
        "--out-dir",
        out_dir.to_str().unwrap(),
    ]);
    cmd.assert().success();
    let svg = std::fs::read_to_string(out_dir.join("ratio.svg"))?;
    assert!(svg.contains("<svg"));
    Ok(())
}

#[test]
fn renders_heatmap_png() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args([
        "render",
        "--input",
        plate.to_str().unwrap(),
        "--view",
        "heatmap",
        "--treatment",
        "Ctrl",
        "--treatment",
        "Drug",
        "--format",
        "png",
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    cmd.assert().success();
    let png = std::fs::read(dir.path().join("custom_image.png"))?;
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    Ok(())
}

#[test]
fn render_fails_when_selection_is_empty() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args([
        "render",
        "--input",
        plate.to_str().unwrap(),
        "--view",
        "heatmap",
        "--treatment",
        "Nope",
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    cmd.assert().failure();
    Ok(())
}

#[test]
fn renders_diagnostics_with_export_options() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let plate = common::write_plate(dir.path())?;
    let mut cmd = cargo_bin_cmd!("cellscope");
    cmd.args([
        "render",
        "--input",
        plate.to_str().unwrap(),
        "--view",
        "diagnostics",
        "--format",
        "png",
        "--filename",
        "diag",
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    cmd.assert().success();
    let png = std::fs::read(dir.path().join("diag.png"))?;
    assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
    assert!(!dir.path().join("custom_image.svg").exists());
    Ok(())
}
