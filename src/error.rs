use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetColError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Format { message: String },

    #[error("Column '{column}' not found")]
    ColumnNotFound { column: String },

    #[error("CSV validation failed for {path}: unbalanced quotes on line {line}")]
    Validation { path: PathBuf, line: usize },

    #[error("{path} is not a valid directory")]
    InvalidFolder { path: String },

    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl SheetColError {
    pub fn format<S: Into<String>>(message: S) -> Self {
        SheetColError::Format {
            message: message.into(),
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for SheetColError {
    fn user_message(&self) -> String {
        match self {
            SheetColError::Io(e) => format!("File operation failed: {}", e),
            SheetColError::Format { message } => {
                format!("Unreadable spreadsheet: {}", message)
            }
            SheetColError::InvalidFolder { path } => {
                format!("Error: {} is not a valid directory", path)
            }
            SheetColError::OutputDirectory { path, source } => {
                format!("Cannot create output directory {}: {}", path, source)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            SheetColError::InvalidFolder { .. } => Some(
                "Pass the path of an existing folder that contains .xlsx, .xls or .xml files.".to_string()
            ),
            SheetColError::OutputDirectory { .. } => Some(
                "Ensure you have write permission for the input folder.".to_string()
            ),
            SheetColError::ColumnNotFound { .. } => Some(
                "Column names are matched case-insensitively against the first row of the first sheet.".to_string()
            ),
            SheetColError::Config { .. } => Some(
                "Check your configuration file syntax and the --delimiter/--encoding names.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<calamine::XlsxError> for SheetColError {
    fn from(error: calamine::XlsxError) -> Self {
        match error {
            calamine::XlsxError::Io(e) => SheetColError::Io(e),
            other => SheetColError::format(other.to_string()),
        }
    }
}

impl From<calamine::XlsError> for SheetColError {
    fn from(error: calamine::XlsError) -> Self {
        match error {
            calamine::XlsError::Io(e) => SheetColError::Io(e),
            other => SheetColError::format(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for SheetColError {
    fn from(error: quick_xml::Error) -> Self {
        SheetColError::format(format!("XML parsing error: {}", error))
    }
}

impl From<toml::de::Error> for SheetColError {
    fn from(error: toml::de::Error) -> Self {
        SheetColError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SheetColError>;
