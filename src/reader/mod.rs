//! Spreadsheet reading.
//!
//! Three on-disk formats are supported: zip-packaged OOXML workbooks
//! (`.xlsx`), legacy BIFF workbooks (`.xls`) and flat SpreadsheetML 2003
//! markup (`.xml`). Only the first worksheet is read, and every cell is
//! coerced to text on the way in.

pub mod flat_xml;
pub mod workbook;

use crate::error::{Result, SheetColError};
use std::fs;
use std::path::Path;
use tracing::debug;

const ZIP_MAGIC: &[u8] = b"PK";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Extensions that are picked up from the input folder.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Zip package with XML parts
    Xlsx,
    /// BIFF records inside an OLE compound file
    Xls,
    /// SpreadsheetML 2003 single XML document
    FlatXml,
}

impl SpreadsheetFormat {
    pub fn name(self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Xls => "xls",
            SpreadsheetFormat::FlatXml => "xml",
        }
    }
}

/// Picks the parser for a file from its extension and leading bytes.
///
/// `.xml` is always flat markup. A `.xlsx`/`.xls` file whose content is
/// markup rather than a binary container is routed to the flat parser, and a
/// binary container wearing the other binary extension is routed by its magic.
pub fn classify(path: &Path, head: &[u8]) -> Option<SpreadsheetFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let by_extension = match extension.as_str() {
        "xml" => return Some(SpreadsheetFormat::FlatXml),
        "xlsx" => SpreadsheetFormat::Xlsx,
        "xls" => SpreadsheetFormat::Xls,
        _ => return None,
    };

    if head.starts_with(ZIP_MAGIC) {
        return Some(SpreadsheetFormat::Xlsx);
    }
    if head.starts_with(OLE_MAGIC) {
        return Some(SpreadsheetFormat::Xls);
    }
    if looks_like_markup(head) {
        return Some(SpreadsheetFormat::FlatXml);
    }

    Some(by_extension)
}

fn looks_like_markup(head: &[u8]) -> bool {
    let body = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'<')
}

/// One row of cell text. Cells past the last populated one are absent.
pub type Row = Vec<String>;

/// The first worksheet of a workbook.
///
/// `rows[i]` is `None` when the file has no row object at index `i`; the
/// binary formats leave such gaps, the flat format never does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub rows: Vec<Option<Row>>,
}

impl Sheet {
    pub fn new(rows: Vec<Option<Row>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.first().and_then(Option::as_ref)
    }

    pub fn data_rows(&self) -> impl Iterator<Item = Option<&Row>> {
        self.rows.iter().skip(1).map(Option::as_ref)
    }
}

/// Reads the first worksheet of the spreadsheet at `path`.
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let bytes = fs::read(path)?;
    let format = classify(path, &bytes).ok_or_else(|| {
        SheetColError::format(format!("Unsupported file type: {}", path.display()))
    })?;

    debug!(path = %path.display(), format = format.name(), "reading spreadsheet");

    match format {
        SpreadsheetFormat::Xlsx => workbook::read_xlsx(bytes),
        SpreadsheetFormat::Xls => workbook::read_xls(bytes),
        SpreadsheetFormat::FlatXml => flat_xml::read_flat_xml(&bytes),
    }
}

/// Renders a numeric cell: whole numbers without a fraction, everything else
/// in shortest round-trip decimal form. Never uses exponent notation.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}
