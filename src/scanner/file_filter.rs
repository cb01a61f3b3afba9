use crate::reader::SUPPORTED_EXTENSIONS;
use regex::Regex;
use std::path::Path;

pub struct FileFilter {
    extensions: Vec<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    /// Invalid patterns are ignored here; `Config::validate` reports them.
    pub fn new(exclude_patterns: &[String]) -> Self {
        let exclude_patterns = exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            extensions: SUPPORTED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude_patterns,
        }
    }

    pub fn is_spreadsheet_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        let filename_lower = filename.to_lowercase();
        let supported = self
            .extensions
            .iter()
            .any(|ext| filename_lower.ends_with(&format!(".{}", ext)));

        supported && !self.matches_any_pattern(filename)
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }

    pub fn get_extensions(&self) -> &Vec<String> {
        &self.extensions
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        let config = crate::config::FilterConfig::default();
        Self::new(&config.exclude_patterns)
    }
}
