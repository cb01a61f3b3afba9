use crate::error::Result;
use crate::extractor::column_locator::extract_column;
use crate::reader::read_sheet;
use crate::writer::CsvWriter;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Outcome of processing one input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExtractionResult {
    Success {
        source_file: PathBuf,
        /// `None` when output is deferred to the merged file
        csv_file: Option<PathBuf>,
        row_count: usize,
        values: Vec<String>,
    },
    Failure {
        source_file: PathBuf,
        error_message: String,
    },
}

impl ExtractionResult {
    pub fn success(source_file: PathBuf, csv_file: Option<PathBuf>, values: Vec<String>) -> Self {
        ExtractionResult::Success {
            source_file,
            csv_file,
            row_count: values.len(),
            values,
        }
    }

    pub fn failure<S: Into<String>>(source_file: PathBuf, error_message: S) -> Self {
        ExtractionResult::Failure {
            source_file,
            error_message: error_message.into(),
        }
    }

    pub fn source_file(&self) -> &Path {
        match self {
            ExtractionResult::Success { source_file, .. }
            | ExtractionResult::Failure { source_file, .. } => source_file,
        }
    }

    pub fn source_name(&self) -> String {
        file_name(self.source_file())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }
}

/// Runs the read → locate → extract → write pipeline for single files.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    column_name: String,
    writer: CsvWriter,
    output_dir: PathBuf,
    defer_output: bool,
}

impl FileExtractor {
    pub fn new<S: Into<String>, P: Into<PathBuf>>(column_name: S, writer: CsvWriter, output_dir: P) -> Self {
        Self {
            column_name: column_name.into(),
            writer,
            output_dir: output_dir.into(),
            defer_output: false,
        }
    }

    /// Skip per-file CSVs; the values are only carried in the result.
    pub fn with_deferred_output(mut self, defer: bool) -> Self {
        self.defer_output = defer;
        self
    }

    /// Never fails: any error becomes a `Failure` carrying its message.
    pub fn extract(&self, source: &Path) -> ExtractionResult {
        debug!(file = %source.display(), column = %self.column_name, "extraction started");

        match self.try_extract(source) {
            Ok((csv_file, values)) => {
                info!(file = %source.display(), rows = values.len(), "extraction succeeded");
                ExtractionResult::success(source.to_path_buf(), csv_file, values)
            }
            Err(e) => {
                info!(file = %source.display(), error = %e, "extraction failed");
                ExtractionResult::failure(source.to_path_buf(), e.to_string())
            }
        }
    }

    fn try_extract(&self, source: &Path) -> Result<(Option<PathBuf>, Vec<String>)> {
        let sheet = read_sheet(source)?;
        let (location, values) = extract_column(&sheet, &self.column_name)?;
        debug!(
            file = %source.display(),
            index = location.index,
            header = %location.matched_header,
            "column located"
        );

        if self.defer_output {
            return Ok((None, values));
        }

        let csv_path = csv_path_for(&self.output_dir, source);
        self.writer.write(&values, &csv_path)?;
        Ok((Some(csv_path), values))
    }
}

/// `<output_dir>/<source name with its extension replaced by .csv>`
pub fn csv_path_for(output_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}.csv", stem))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}


#[cfg(test)]
mod tests {
    use super::fixtures::{write_flat_xml, write_xls, write_xlsx};
    use super::*;
    use crate::writer::{CsvDelimiter, CsvEncoding};
    use std::fs;
    use tempfile::TempDir;

    fn extractor(output_dir: &Path) -> FileExtractor {
        FileExtractor::new(
            "Email",
            CsvWriter::new(CsvDelimiter::Semicolon, CsvEncoding::Utf8),
            output_dir,
        )
    }

    #[test]
    fn test_csv_path_for() {
        let out = Path::new("/data/CSV");
        assert_eq!(csv_path_for(out, Path::new("/data/book.xlsx")), out.join("book.csv"));
        assert_eq!(csv_path_for(out, Path::new("/data/report.v2.XLS")), out.join("report.v2.csv"));
    }

    #[test]
    fn test_xlsx_extraction_writes_csv() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("emails.xlsx");
        write_xlsx(
            &source,
            &[
                &["Name", "EMAIL"],
                &["John", "john@example.com"],
                &["Jane", "jane@example.com"],
                &["Bob", "bob@example.com"],
            ],
        );

        let result = extractor(dir.path()).extract(&source);

        let ExtractionResult::Success { csv_file, row_count, values, .. } = result else {
            panic!("expected success, got {:?}", result);
        };
        assert_eq!(row_count, 3);
        assert_eq!(values, vec!["john@example.com", "jane@example.com", "bob@example.com"]);

        let csv_file = csv_file.unwrap();
        assert_eq!(csv_file, dir.path().join("emails.csv"));
        assert_eq!(
            fs::read_to_string(csv_file).unwrap(),
            "john@example.com;\njane@example.com;\nbob@example.com;\n"
        );
    }

    #[test]
    fn test_xlsx_short_rows_yield_empty_values() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("gaps.xlsx");
        write_xlsx(&source, &[&["Name", "Email"], &["John", ""], &["Jane", "jane@x.com"]]);

        let result = extractor(dir.path()).with_deferred_output(true).extract(&source);

        let ExtractionResult::Success { csv_file, values, .. } = result else {
            panic!("expected success");
        };
        assert!(csv_file.is_none());
        assert_eq!(values, vec!["", "jane@x.com"]);
        assert!(!dir.path().join("gaps.csv").exists());
    }

    #[test]
    fn test_flat_xml_extraction() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("legacy.xls");
        write_flat_xml(&source, &[&["email"], &["a@x.com"], &["b;c@x.com"]]);

        let result = extractor(dir.path()).extract(&source);
        assert!(result.is_success());
        assert_eq!(
            fs::read_to_string(dir.path().join("legacy.csv")).unwrap(),
            "a@x.com;\n\"b;c@x.com\";\n"
        );
    }

    #[test]
    fn test_missing_column_is_failure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("names.xlsx");
        write_xlsx(&source, &[&["Name"], &["John Doe"]]);

        let result = extractor(dir.path()).extract(&source);
        assert_eq!(
            result,
            ExtractionResult::failure(source.clone(), "Column 'Email' not found")
        );
        assert_eq!(result.source_name(), "names.xlsx");
        assert!(!dir.path().join("names.csv").exists());
    }

    #[test]
    fn test_xls_extraction_writes_csv() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("contacts.xls");
        write_xls(
            &source,
            &[
                &["Name", "E-mail", "Email", "Age"],
                &["Ann", "", "ann@example.com", "30"],
                &[],
                &["Bob", "", "", "41"],
                &["Zoë", "", "zoe@example.com", "27.5"],
            ],
        );

        let result = extractor(dir.path()).extract(&source);

        let ExtractionResult::Success { row_count, values, .. } = result else {
            panic!("expected success, got {:?}", result);
        };
        assert_eq!(row_count, 3);
        assert_eq!(values, vec!["ann@example.com", "", "zoe@example.com"]);
        assert_eq!(
            fs::read_to_string(dir.path().join("contacts.csv")).unwrap(),
            "ann@example.com;\nzoe@example.com;\n"
        );

        let ages = FileExtractor::new(
            "age",
            CsvWriter::new(CsvDelimiter::Comma, CsvEncoding::Utf8),
            dir.path(),
        )
        .with_deferred_output(true)
        .extract(&source);
        let ExtractionResult::Success { values, .. } = ages else {
            panic!("expected success");
        };
        assert_eq!(values, vec!["30", "41", "27.5"]);
    }

    #[test]
    fn test_corrupt_file_is_failure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.xlsx");
        fs::write(&source, b"PK\x03\x04 definitely not a zip").unwrap();

        let result = extractor(dir.path()).extract(&source);
        assert!(!result.is_success());
    }
}
