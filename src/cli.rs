use crate::config::{AppConfig, CliOverrides, Config};
use crate::error::{Result, SheetColError};
use crate::writer::{CsvDelimiter, CsvEncoding};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sheetcol")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract one column from a folder of spreadsheets into CSV files")]
#[command(
    long_about = "sheetcol reads every .xlsx, .xls and .xml spreadsheet directly inside a folder, \
                  finds the named column in the header row of the first sheet and writes its \
                  values to one-column CSV files in a CSV subfolder."
)]
#[command(after_help = "EXAMPLES:\n  \
    sheetcol Email ./exports\n  \
    sheetcol \"Customer ID\" ./exports --merge --delimiter comma\n  \
    sheetcol Email ./exports -e windows1252 --scramble\n  \
    sheetcol --generate-config --config sheetcol.toml")]
pub struct Cli {
    /// Header of the column to extract (matched case-insensitively)
    #[arg(required_unless_present = "generate_config")]
    pub column_name: Option<String>,

    /// Folder containing the spreadsheets
    #[arg(required_unless_present = "generate_config")]
    pub folder_path: Option<PathBuf>,

    /// Write one merged CSV instead of one CSV per file
    #[arg(short, long)]
    pub merge: bool,

    /// Field delimiter written after every value
    #[arg(short, long, value_enum)]
    pub delimiter: Option<CsvDelimiter>,

    /// Character encoding of the CSV files
    #[arg(short, long, value_enum)]
    pub encoding: Option<CsvEncoding>,

    /// Shuffle letters inside each word of every value (deterministic)
    #[arg(short, long)]
    pub scramble: bool,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Name of the output folder created inside the input folder
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only failures are printed)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_delimiter(self.delimiter)
            .with_encoding(self.encoding)
            .with_merge(self.merge)
            .with_scramble(self.scramble)
            .with_output_dir(self.output_dir.clone())
    }

    /// Resolves file defaults, flags and positionals into the settings of one run.
    pub fn to_app_config(&self) -> Result<AppConfig> {
        let (Some(column_name), Some(folder_path)) = (&self.column_name, &self.folder_path) else {
            return Err(SheetColError::Config {
                message: "Both <COLUMN_NAME> and <FOLDER_PATH> are required".to_string(),
            });
        };

        self.load_config()?
            .into_app_config(column_name.clone(), folder_path.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Filter directive for the diagnostic log when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity_level() {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("sheetcol").chain(args.iter().copied()))
    }

    #[test]
    fn test_positionals_and_defaults() {
        let cli = parse(&["Email", "/data"]).unwrap();
        assert_eq!(cli.column_name.as_deref(), Some("Email"));
        assert_eq!(cli.folder_path, Some(PathBuf::from("/data")));
        assert!(!cli.merge);
        assert!(cli.delimiter.is_none());
        assert!(cli.encoding.is_none());
        assert_eq!(cli.output_format, OutputFormat::Human);
    }

    #[test]
    fn test_short_flags() {
        let cli = parse(&["Email", "/data", "-m", "-d", "pipe", "-e", "utf8bom", "-s", "-vv"]).unwrap();
        assert!(cli.merge);
        assert!(cli.scramble);
        assert_eq!(cli.delimiter, Some(CsvDelimiter::Pipe));
        assert_eq!(cli.encoding, Some(CsvEncoding::Utf8Bom));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_directive(), "debug");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(parse(&["Email", "/data", "-d", "slash"]).is_err());
        assert!(parse(&["Email", "/data", "-e", "ebcdic"]).is_err());
        assert!(parse(&["Email"]).is_err());
        assert!(parse(&["Email", "/data", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_generate_config_needs_no_positionals() {
        let cli = parse(&["--generate-config"]).unwrap();
        assert!(cli.generate_config);
        assert!(cli.column_name.is_none());
    }

    #[test]
    fn test_to_app_config() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().to_str().unwrap();
        let missing = dir.path().join("sheetcol.toml");

        let cli = parse(&[
            "Email",
            folder,
            "--merge",
            "-d",
            "tab",
            "-o",
            "Out",
            "-c",
            missing.to_str().unwrap(),
        ])
        .unwrap();
        // Named config file must exist
        assert!(matches!(cli.to_app_config(), Err(SheetColError::Config { .. })));

        std::fs::write(&missing, "[csv]\nencoding = \"latin1\"\n").unwrap();
        let app = cli.to_app_config().unwrap();
        assert_eq!(app.column_name, "Email");
        assert!(app.merge_output);
        assert_eq!(app.delimiter, CsvDelimiter::Tab);
        assert_eq!(app.encoding, CsvEncoding::Latin1);
        assert_eq!(app.output_directory(), dir.path().join("Out"));
    }

    #[test]
    fn test_log_directive_levels() {
        assert_eq!(parse(&["a", "b"]).unwrap().log_directive(), "warn");
        assert_eq!(parse(&["a", "b", "-v"]).unwrap().log_directive(), "info");
        assert_eq!(parse(&["a", "b", "-q"]).unwrap().log_directive(), "warn");
    }
}
