pub mod file_filter;
pub mod spreadsheet_scanner;

pub use file_filter::FileFilter;
pub use spreadsheet_scanner::{SpreadsheetFile, SpreadsheetScanner};
