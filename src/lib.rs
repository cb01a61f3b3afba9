pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod reader;
pub mod scanner;
pub mod ui;
pub mod writer;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{AppConfig, CliOverrides, Config};
pub use error::{Result, SheetColError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{BatchReport, ExtractionResult, FileExtractor, OutputManager};
pub use reader::{read_sheet, Sheet, SpreadsheetFormat};
pub use scanner::{FileFilter, SpreadsheetFile, SpreadsheetScanner};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};
pub use writer::{CsvDelimiter, CsvEncoding, CsvWriter};

use crate::extractor::csv_path_for;
use chrono::Local;
use std::collections::hash_map::{Entry, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{self, JoinHandle};
use tracing::{info, warn};

/// A submitted file: either running on the blocking pool or already settled.
enum PendingExtraction {
    Running(PathBuf, JoinHandle<ExtractionResult>),
    Settled(ExtractionResult),
}

/// Batch driver: one extraction task per spreadsheet in the folder.
pub struct SheetCol {
    config: AppConfig,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl SheetCol {
    pub fn new(config: AppConfig, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
        }
    }

    /// Create a SheetCol instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.to_app_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(config, output_mode, cli_args.verbose, cli_args.quiet))
    }

    /// Processes every spreadsheet in the folder.
    ///
    /// Per-file problems are part of the report, not errors. `Err` is only
    /// returned when the folder cannot be listed or the output folder cannot
    /// be created.
    pub async fn run(&self) -> Result<BatchReport> {
        let start_time = Instant::now();
        let folder = &self.config.folder_path;

        let scanner = SpreadsheetScanner::new(FileFilter::new(&self.config.exclude_patterns));
        let files = scanner.scan_folder(folder)?;

        if files.is_empty() {
            info!(folder = %folder.display(), "no spreadsheet files found");
            self.output_formatter.no_files_found(folder);
            return Ok(BatchReport::default());
        }

        self.output_formatter
            .info(&format!("Found {} spreadsheet files", files.len()));

        let output_manager = OutputManager::new(self.config.output_directory());
        output_manager.initialize()?;

        let writer = CsvWriter::new(self.config.delimiter, self.config.encoding)
            .with_scramble(self.config.scramble);
        let extractor = FileExtractor::new(
            self.config.column_name.clone(),
            writer,
            output_manager.get_output_directory(),
        )
        .with_deferred_output(self.config.merge_output);

        let results = self.extract_all(&files, Arc::new(extractor)).await;
        let mut report = BatchReport::new(results);

        for result in &report.results {
            self.output_formatter
                .file_outcome(result, self.config.merge_output);
        }

        // Batch-level write failures are reported without discarding the results
        let timestamp = Local::now();
        if self.config.merge_output {
            match output_manager.write_merged(&report.results, &writer, timestamp) {
                Ok(path) => report.merged_csv = path,
                Err(e) => self.output_formatter.print_user_friendly_error(&e),
            }
        }

        match output_manager.write_error_log(&report.results, timestamp) {
            Ok(path) => report.error_log = path,
            Err(e) => self.output_formatter.print_user_friendly_error(&e),
        }

        report.elapsed = start_time.elapsed();
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "batch finished"
        );
        self.output_formatter.print_batch_summary(&report);

        Ok(report)
    }

    /// Runs one blocking task per file and collects the results in
    /// submission order, whatever order they finish in.
    ///
    /// Outside merge mode two sources can map to the same CSV name
    /// (`book.xlsx` and `book.xml`). The first in discovery order keeps the
    /// name; later ones fail without being read. Names are compared without
    /// case so the outcome does not depend on the file system.
    async fn extract_all(
        &self,
        files: &[SpreadsheetFile],
        extractor: Arc<FileExtractor>,
    ) -> Vec<ExtractionResult> {
        let start_time = Instant::now();
        let file_progress = self
            .progress_manager
            .create_file_progress(files.len() as u64);

        let output_dir = self.config.output_directory();
        let mut claimed_outputs: HashMap<String, String> = HashMap::new();

        let mut pending = Vec::with_capacity(files.len());
        for file in files {
            self.progress_manager
                .suspend(|| self.output_formatter.file_started(&file.filename));

            if !self.config.merge_output {
                let csv_path = csv_path_for(&output_dir, &file.source_path);
                let csv_name = crate::extractor::file_extractor::file_name(&csv_path);
                match claimed_outputs.entry(csv_name.to_lowercase()) {
                    Entry::Occupied(first) => {
                        warn!(
                            file = %file.source_path.display(),
                            csv = %csv_name,
                            "output name already taken"
                        );
                        file_progress.inc(1);
                        pending.push(PendingExtraction::Settled(ExtractionResult::failure(
                            file.source_path.clone(),
                            format!("Output file {} already produced by {}", csv_name, first.get()),
                        )));
                        continue;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(file.filename.clone());
                    }
                }
            }

            let extractor = Arc::clone(&extractor);
            let pb = file_progress.clone();
            let path = file.source_path.clone();
            let handle = task::spawn_blocking(move || {
                let result = extractor.extract(&path);
                pb.inc(1);
                result
            });
            pending.push(PendingExtraction::Running(file.source_path.clone(), handle));
        }

        let mut results = Vec::with_capacity(pending.len());
        for entry in pending {
            let result = match entry {
                PendingExtraction::Settled(result) => result,
                PendingExtraction::Running(path, handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "extraction task aborted");
                        ExtractionResult::failure(path, format!("Extraction task failed: {}", e))
                    }
                },
            };
            results.push(result);
        }

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Processed {} files", results.len()),
            start_time.elapsed(),
        );

        results
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_directory(&self) -> PathBuf {
        self.config.output_directory()
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &SheetColError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
