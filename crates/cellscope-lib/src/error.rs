use thiserror::Error;

/// Failures surfaced by the spreadsheet → chart pipeline.
///
/// None of these are fatal to a session: the caller keeps the previously
/// loaded workbook and shows [`PipelineError::user_message`] in place of the
/// chart that could not be built.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The uploaded bytes are not a readable spreadsheet container.
    #[error("failed to load workbook: {cause}")]
    Load { cause: String },

    /// A channel cell could not be coerced to a number. `row` and `column`
    /// are 1-based spreadsheet coordinates (row 1 is the header row, column 1
    /// the time index).
    #[error("sheet '{sheet}' cell (row {row}, column {column}) is not numeric: {text:?}")]
    Parse {
        sheet: String,
        row: usize,
        column: usize,
        text: String,
    },

    /// A sheet or metadata table required by the requested view is absent.
    #[error("{0}")]
    Schema(String),
}

impl PipelineError {
    pub fn load(cause: impl std::fmt::Display) -> Self {
        PipelineError::Load {
            cause: cause.to_string(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        PipelineError::Schema(message.into())
    }

    /// Text rendered inline where the chart would have been.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Load { cause } => format!("Error processing file: {}", cause),
            PipelineError::Parse { .. } => format!("Error processing data: {}", self),
            PipelineError::Schema(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_cell() {
        let err = PipelineError::Parse {
            sheet: "phase".into(),
            row: 3,
            column: 2,
            text: "12,5x".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("phase"));
        assert!(msg.contains("row 3"));
        assert!(msg.contains("column 2"));
        assert!(msg.contains("12,5x"));
    }

    #[test]
    fn schema_message_is_shown_verbatim() {
        let err = PipelineError::schema("No data available for red.");
        assert_eq!(err.user_message(), "No data available for red.");
    }
}
