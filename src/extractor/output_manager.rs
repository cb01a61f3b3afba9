use crate::error::{Result, SheetColError};
use crate::extractor::file_extractor::ExtractionResult;
use crate::writer::CsvWriter;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const LOGS_DIR: &str = "logs";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Aggregated outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<ExtractionResult>,
    pub merged_csv: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn new(results: Vec<ExtractionResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;

        Self {
            results,
            succeeded,
            failed,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Owns the output folder inside the input folder and the batch-level
/// artifacts written there.
pub struct OutputManager {
    output_directory: PathBuf,
}

impl OutputManager {
    pub fn new<P: Into<PathBuf>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }

    /// Creates the output folder. Safe to call when it already exists.
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.output_directory).map_err(|source| {
            SheetColError::OutputDirectory {
                path: self.output_directory.display().to_string(),
                source,
            }
        })?;
        debug!(path = %self.output_directory.display(), "output directory ready");

        Ok(())
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn get_logs_dir(&self) -> PathBuf {
        self.output_directory.join(LOGS_DIR)
    }

    /// Writes the values of every success, in result order, to one
    /// `merged_<timestamp>.csv`. Returns `None` when nothing succeeded.
    pub fn write_merged(
        &self,
        results: &[ExtractionResult],
        writer: &CsvWriter,
        timestamp: DateTime<Local>,
    ) -> Result<Option<PathBuf>> {
        let mut any_success = false;
        let mut merged: Vec<&str> = Vec::new();

        for result in results {
            if let ExtractionResult::Success { values, .. } = result {
                any_success = true;
                merged.extend(values.iter().map(String::as_str));
            }
        }

        if !any_success {
            return Ok(None);
        }

        let path = self
            .output_directory
            .join(format!("merged_{}.csv", timestamp.format(TIMESTAMP_FORMAT)));
        writer.write(&merged, &path)?;
        info!(path = %path.display(), rows = merged.len(), "merged csv written");

        Ok(Some(path))
    }

    /// Writes `logs/error_log_<timestamp>.txt` with one line per failure.
    /// Returns `None` without touching the disk when there are no failures.
    pub fn write_error_log(
        &self,
        results: &[ExtractionResult],
        timestamp: DateTime<Local>,
    ) -> Result<Option<PathBuf>> {
        let failures: Vec<&ExtractionResult> = results.iter().filter(|r| !r.is_success()).collect();
        if failures.is_empty() {
            return Ok(None);
        }

        let logs_dir = self.get_logs_dir();
        fs::create_dir_all(&logs_dir).map_err(|source| SheetColError::OutputDirectory {
            path: logs_dir.display().to_string(),
            source,
        })?;

        let path = logs_dir.join(format!("error_log_{}.txt", timestamp.format(TIMESTAMP_FORMAT)));
        let mut file = fs::File::create(&path)?;

        writeln!(file, "Column Extraction Error Log")?;
        writeln!(file, "Generated: {}", timestamp.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "{}", "-".repeat(50))?;

        for failure in failures {
            if let ExtractionResult::Failure { error_message, .. } = failure {
                writeln!(file, "{}: {}", failure.source_name(), error_message)?;
            }
        }

        info!(path = %path.display(), "error log written");
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{CsvDelimiter, CsvEncoding};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    fn success(name: &str, values: &[&str]) -> ExtractionResult {
        ExtractionResult::success(
            PathBuf::from(name),
            None,
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    fn failure(name: &str, message: &str) -> ExtractionResult {
        ExtractionResult::failure(PathBuf::from("/data").join(name), message)
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path().join("CSV"));

        manager.initialize().unwrap();
        manager.initialize().unwrap();

        assert!(manager.get_output_directory().is_dir());
        assert!(!manager.get_logs_dir().exists());
    }

    #[test]
    fn test_initialize_fails_when_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("CSV"), "not a folder").unwrap();
        let manager = OutputManager::new(temp_dir.path().join("CSV"));

        let err = manager.initialize().unwrap_err();
        assert!(matches!(err, SheetColError::OutputDirectory { .. }));
    }

    #[test]
    fn test_merged_csv_keeps_result_order() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path());
        let writer = CsvWriter::new(CsvDelimiter::Comma, CsvEncoding::Utf8);

        let results = vec![
            success("a.xlsx", &["a1", "a2"]),
            failure("b.xlsx", "Column 'Email' not found"),
            success("c.xml", &["c1"]),
        ];

        let path = manager
            .write_merged(&results, &writer, timestamp())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp_dir.path().join("merged_20240309_140507.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "a1,\na2,\nc1,\n");
    }

    #[test]
    fn test_merged_csv_skipped_without_successes() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path());
        let writer = CsvWriter::new(CsvDelimiter::Semicolon, CsvEncoding::Utf8);

        let results = vec![failure("b.xlsx", "boom")];
        assert!(manager.write_merged(&results, &writer, timestamp()).unwrap().is_none());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_error_log_contents() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path().join("CSV"));
        manager.initialize().unwrap();

        let results = vec![
            success("a.xlsx", &["a1"]),
            failure("b.xlsx", "Column 'Email' not found"),
            failure("c.xls", "Unsupported file format"),
        ];

        let path = manager.write_error_log(&results, timestamp()).unwrap().unwrap();
        assert_eq!(
            path,
            temp_dir.path().join("CSV").join("logs").join("error_log_20240309_140507.txt")
        );

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Column Extraction Error Log");
        assert_eq!(lines[1], "Generated: 2024-03-09 14:05:07");
        assert!(lines[2].starts_with("---"));
        assert_eq!(&lines[3..], ["b.xlsx: Column 'Email' not found", "c.xls: Unsupported file format"]);
    }

    #[test]
    fn test_error_log_skipped_without_failures() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path());

        let results = vec![success("a.xlsx", &["a1"])];
        assert!(manager.write_error_log(&results, timestamp()).unwrap().is_none());
        assert!(!manager.get_logs_dir().exists());
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport::new(vec![
            success("a.xlsx", &["a1"]),
            failure("b.xlsx", "boom"),
            success("c.xml", &[]),
        ]);

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.is_empty());
        assert!(BatchReport::default().is_empty());
    }
}
