use crate::error::{Result, SheetColError};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadsheetFile {
    pub source_path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size: u64,
}

impl SpreadsheetFile {
    pub fn new(source_path: PathBuf, size: u64) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let extension = source_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        Self {
            source_path,
            filename,
            extension,
            size,
        }
    }
}

/// Lists the spreadsheets directly inside a folder. Subfolders are not
/// descended into.
pub struct SpreadsheetScanner {
    filter: FileFilter,
}

impl SpreadsheetScanner {
    pub fn new(filter: FileFilter) -> Self {
        Self { filter }
    }

    /// Returns the candidate files sorted by name. This order is the
    /// discovery order used for processing and merging.
    pub fn scan_folder<P: AsRef<Path>>(&self, folder: P) -> Result<Vec<SpreadsheetFile>> {
        let folder = folder.as_ref();

        if !folder.is_dir() {
            return Err(SheetColError::InvalidFolder {
                path: folder.display().to_string(),
            });
        }

        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut files = Vec::new();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    // The folder itself cannot be listed
                    if err.depth() == 0 {
                        return Err(match err.into_io_error() {
                            Some(io) => SheetColError::Io(io),
                            None => SheetColError::InvalidFolder {
                                path: folder.display().to_string(),
                            },
                        });
                    }
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.filter.is_spreadsheet_file(entry.path()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(SpreadsheetFile::new(entry.into_path(), size));
        }

        Ok(files)
    }
}

impl Default for SpreadsheetScanner {
    fn default() -> Self {
        Self::new(FileFilter::default())
    }
}
