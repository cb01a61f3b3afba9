pub mod column_locator;
pub mod file_extractor;
pub mod output_manager;

pub use column_locator::{extract, extract_column, locate, ColumnLocation};
pub use file_extractor::{csv_path_for, ExtractionResult, FileExtractor};
pub use output_manager::{BatchReport, OutputManager};
