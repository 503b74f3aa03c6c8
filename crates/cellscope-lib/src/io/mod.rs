pub mod export;
pub mod workbook;

#[cfg(feature = "polars")]
pub mod polars_io;

pub use workbook::{decode_upload, load_workbook, load_workbook_path};
