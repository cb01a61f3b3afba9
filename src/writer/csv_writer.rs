use crate::error::{Result, SheetColError};
use crate::writer::options::{CsvDelimiter, CsvEncoding};
use crate::writer::scramble::scramble;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::debug;

const LINE_TERMINATOR: &str = "\n";

/// Writes one-column CSV files.
///
/// Every line carries a trailing delimiter (`value;`), including the last.
/// Downstream consumers rely on that shape.
#[derive(Debug, Clone, Copy)]
pub struct CsvWriter {
    delimiter: CsvDelimiter,
    encoding: CsvEncoding,
    scramble: bool,
}

impl CsvWriter {
    pub fn new(delimiter: CsvDelimiter, encoding: CsvEncoding) -> Self {
        Self {
            delimiter,
            encoding,
            scramble: false,
        }
    }

    pub fn with_scramble(mut self, scramble: bool) -> Self {
        self.scramble = scramble;
        self
    }

    pub fn delimiter(&self) -> CsvDelimiter {
        self.delimiter
    }

    pub fn encoding(&self) -> CsvEncoding {
        self.encoding
    }

    /// Renders `values` as CSV text. Blank values are dropped.
    pub fn render<S: AsRef<str>>(&self, values: &[S]) -> String {
        let separator = self.delimiter.as_char();
        let mut out = String::new();

        for value in values.iter().map(AsRef::as_ref) {
            if value.trim().is_empty() {
                continue;
            }

            let value: Cow<'_, str> = if self.scramble {
                Cow::Owned(scramble(value))
            } else {
                Cow::Borrowed(value)
            };

            out.push_str(&escape_value(&value, separator));
            out.push(separator);
            out.push_str(LINE_TERMINATOR);
        }

        out
    }

    /// Writes `values` to `path` and re-reads the file to check it.
    pub fn write<S: AsRef<str>>(&self, values: &[S], path: &Path) -> Result<()> {
        let text = self.render(values);
        fs::write(path, self.encoding.encode(&text))?;
        debug!(
            path = %path.display(),
            delimiter = %self.delimiter,
            encoding = %self.encoding,
            "wrote csv"
        );

        self.validate(path)
    }

    pub fn validate(&self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)?;
        let text = self.encoding.decode(&bytes);

        match find_unbalanced_line(&text) {
            Some(line) => Err(SheetColError::Validation {
                path: path.to_path_buf(),
                line,
            }),
            None => Ok(()),
        }
    }
}

/// Quotes `value` when it contains the delimiter, a double quote or a line break.
pub fn escape_value(value: &str, delimiter: char) -> Cow<'_, str> {
    let needs_quotes = value
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\n' || c == '\r');

    if needs_quotes {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Returns the 1-based line on which an unterminated quoted field starts.
///
/// A quoted field may legitimately span physical lines, so the quote state
/// carries over line breaks; only a file that ends inside quotes is invalid.
pub fn find_unbalanced_line(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut opened_on = 0;

    for (index, line) in text.lines().enumerate() {
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '"' {
                continue;
            }
            if in_quotes && chars.peek() == Some(&'"') {
                chars.next();
                continue;
            }
            in_quotes = !in_quotes;
            if in_quotes {
                opened_on = index + 1;
            }
        }
    }

    in_quotes.then_some(opened_on)
}
