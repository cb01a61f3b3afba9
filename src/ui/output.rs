use crate::error::{SheetColError, UserFriendlyError};
use crate::extractor::{BatchReport, ExtractionResult};
use console::{style, Emoji, Term};
use serde_json;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "");
static CROSS: Emoji = Emoji("❌ ", "");
static INFO: Emoji = Emoji("ℹ️  ", "");
static WARNING: Emoji = Emoji("⚠️  ", "");
static GEAR: Emoji = Emoji("⚙️  ", "");

pub struct OutputFormatter {
    #[allow(dead_code)]
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Success, message),
                OutputMode::Json => self.print_json_message("success", message),
                OutputMode::Plain => println!("{}", message),
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("{}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("{}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("{}", message),
            }
        }
    }

    /// `Processing: <file>`
    pub fn file_started(&self, file_name: &str) {
        if !self.should_show_message(0) {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}Processing: {}", GEAR, style(file_name).bold());
                } else {
                    println!("Processing: {}", file_name);
                }
            }
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "file_started",
                "file": file_name,
            })),
            OutputMode::Plain => println!("Processing: {}", file_name),
        }
    }

    /// One line per finished file. Failures always print, to stderr.
    pub fn file_outcome(&self, result: &ExtractionResult, merge_mode: bool) {
        let file_name = result.source_name();

        if self.mode == OutputMode::Json {
            let event = match result {
                ExtractionResult::Success { csv_file, row_count, .. } => serde_json::json!({
                    "type": "file_result",
                    "status": "success",
                    "file": file_name,
                    "rows": row_count,
                    "csv_file": csv_file,
                }),
                ExtractionResult::Failure { error_message, .. } => serde_json::json!({
                    "type": "file_result",
                    "status": "failure",
                    "file": file_name,
                    "error": error_message,
                }),
            };
            if result.is_success() && self.quiet {
                return;
            }
            self.print_json_object(&event);
            return;
        }

        match result {
            ExtractionResult::Success { row_count, .. } => {
                let message = if merge_mode {
                    format!("Extracted {} rows from: {}", row_count, file_name)
                } else {
                    format!("Created CSV for: {} ({} rows)", file_name, row_count)
                };
                self.success(&message);
            }
            ExtractionResult::Failure { error_message, .. } => {
                self.error(&format!("{}: {}", file_name, error_message));
            }
        }
    }

    pub fn no_files_found(&self, folder: &Path) {
        let message = format!("No spreadsheet files found in {}", folder.display());
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "no_files",
                "folder": folder.display().to_string(),
                "message": message,
            })),
            _ => self.warning(&message),
        }
    }

    // User-friendly error handling
    pub fn print_user_friendly_error(&self, error: &SheetColError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("Suggestion: {}", suggestion);
                }
            }
        }
    }

    // Summary and reporting
    pub fn print_batch_summary(&self, report: &BatchReport) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(report),
            OutputMode::Json => self.print_json_summary(report),
            OutputMode::Plain => self.print_plain_summary(report),
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if !self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}", message),
                _ => println!("{}", message),
            }
            return;
        }

        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        match msg_type {
            MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
            _ => println!("{}{}", emoji, color_fn(message)),
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Local::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, report: &BatchReport) {
        println!();
        if self.use_colors {
            let failed = if report.failed > 0 {
                style(report.failed).red().bold().to_string()
            } else {
                style(report.failed).dim().to_string()
            };
            println!(
                "Done: {} succeeded, {} failed",
                style(report.succeeded).green().bold(),
                failed
            );
        } else {
            println!("Done: {} succeeded, {} failed", report.succeeded, report.failed);
        }

        if let Some(ref merged) = report.merged_csv {
            println!("  Merged CSV: {}", merged.display());
        }
        if let Some(ref log) = report.error_log {
            println!("  Error log:  {}", log.display());
        }
        if self.should_show_message(1) {
            println!("  Time taken: {}", format_duration(report.elapsed));
        }
    }

    fn print_json_summary(&self, report: &BatchReport) {
        let summary = serde_json::json!({
            "type": "summary",
            "succeeded": report.succeeded,
            "failed": report.failed,
            "merged_csv": report.merged_csv,
            "error_log": report.error_log,
            "duration_ms": report.elapsed.as_millis() as u64,
            "timestamp": chrono::Local::now().to_rfc3339()
        });

        self.print_json_object(&summary);
    }

    fn print_plain_summary(&self, report: &BatchReport) {
        println!("Done: {} succeeded, {} failed", report.succeeded, report.failed);
        if let Some(ref merged) = report.merged_csv {
            println!("Merged CSV: {}", merged.display());
        }
        if let Some(ref log) = report.error_log {
            println!("Error log: {}", log.display());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
