use crate::error::{Result, SheetColError};
use crate::writer::{CsvDelimiter, CsvEncoding};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Settings that can live in a TOML file and be overridden on the command line.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub csv: CsvConfig,
    pub output: OutputConfig,
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: CsvDelimiter,
    pub encoding: CsvEncoding,
    pub merge: bool,
    pub scramble: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the folder created inside the input folder
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Regexes matched against file names; matching files are skipped
    pub exclude_patterns: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "CSV".to_string(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: Vec::new(),
        }
    }
}

/// Everything one run needs. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub column_name: String,
    pub folder_path: PathBuf,
    pub merge_output: bool,
    pub scramble: bool,
    pub delimiter: CsvDelimiter,
    pub encoding: CsvEncoding,
    pub output_dir_name: String,
    pub exclude_patterns: Vec<String>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SheetColError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SheetColError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| SheetColError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["sheetcol.toml", ".sheetcol.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(delimiter) = cli_args.delimiter {
            self.csv.delimiter = delimiter;
        }

        if let Some(encoding) = cli_args.encoding {
            self.csv.encoding = encoding;
        }

        // Flags can only switch these on
        if cli_args.merge {
            self.csv.merge = true;
        }

        if cli_args.scramble {
            self.csv.scramble = true;
        }

        if let Some(ref directory) = cli_args.output_dir {
            self.output.directory = directory.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| SheetColError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| SheetColError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let directory = self.output.directory.trim();
        let mut components = Path::new(directory).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if directory.is_empty() || !single_normal {
            return Err(SheetColError::Config {
                message: format!(
                    "Output directory must be a single folder name, got '{}'",
                    self.output.directory
                ),
            });
        }

        for pattern in &self.filters.exclude_patterns {
            Regex::new(pattern).map_err(|e| SheetColError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    /// Combines these settings with the two positional inputs of a run.
    pub fn into_app_config<S: Into<String>, P: Into<PathBuf>>(
        self,
        column_name: S,
        folder_path: P,
    ) -> Result<AppConfig> {
        self.validate()?;

        let app_config = AppConfig {
            column_name: column_name.into(),
            folder_path: folder_path.into(),
            merge_output: self.csv.merge,
            scramble: self.csv.scramble,
            delimiter: self.csv.delimiter,
            encoding: self.csv.encoding,
            output_dir_name: self.output.directory.trim().to_string(),
            exclude_patterns: self.filters.exclude_patterns,
        };
        app_config.validate()?;

        Ok(app_config)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.column_name.trim().is_empty() {
            return Err(SheetColError::Config {
                message: "Column name must not be empty".to_string(),
            });
        }

        if !self.folder_path.is_dir() {
            return Err(SheetColError::InvalidFolder {
                path: self.folder_path.display().to_string(),
            });
        }

        Ok(())
    }

    pub fn output_directory(&self) -> PathBuf {
        self.folder_path.join(&self.output_dir_name)
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub delimiter: Option<CsvDelimiter>,
    pub encoding: Option<CsvEncoding>,
    pub merge: bool,
    pub scramble: bool,
    pub output_dir: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: Option<CsvDelimiter>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: Option<CsvEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_scramble(mut self, scramble: bool) -> Self {
        self.scramble = scramble;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<String>) -> Self {
        self.output_dir = output_dir;
        self
    }
}
