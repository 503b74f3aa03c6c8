pub mod aggregate;
pub mod channel;
pub mod chart;
pub mod dataset;
pub mod error;
pub mod io;
pub mod plate;
pub mod plot;
pub mod table;
pub mod tidy;
pub mod view;

pub use dataset::{Dataset, UploadSummary};
pub use error::PipelineError;
pub use table::*;
pub use view::{build_chart_data, ChartDescription, ExportFormat, ExportOptions, Selection, ViewMode};
