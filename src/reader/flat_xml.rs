use crate::error::{Result, SheetColError};
use crate::reader::{format_number, Row, Sheet};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Worksheet limits of the spreadsheet format; positions past them are rejected.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Cell currently being read, positioned and typed from its attributes.
#[derive(Debug, Default)]
struct PendingCell {
    data_type: Option<String>,
    formula: Option<String>,
    merge_across: usize,
    text: String,
    has_data: bool,
}

impl PendingCell {
    fn into_text(self) -> String {
        if !self.has_data {
            return self.formula.unwrap_or_default();
        }
        match self.data_type.as_deref() {
            Some("Number") => match self.text.trim().parse::<f64>() {
                Ok(number) => format_number(number),
                Err(_) => self.text,
            },
            Some("Boolean") => match self.text.trim() {
                "1" | "true" | "TRUE" => "true".to_string(),
                "0" | "false" | "FALSE" => "false".to_string(),
                _ => self.text,
            },
            _ => self.text,
        }
    }
}

#[derive(Debug, Default)]
struct SheetBuilder {
    rows: Vec<Option<Row>>,
    row: Option<Row>,
    cell: Option<PendingCell>,
    data_depth: usize,
    in_comment: bool,
}

impl SheetBuilder {
    fn start_row(&mut self, e: &BytesStart) -> Result<()> {
        if let Some(index) = index_attribute(e, b"Index")? {
            if index > MAX_ROWS {
                return Err(SheetColError::format(format!(
                    "Row index {} exceeds the worksheet limit of {} rows",
                    index, MAX_ROWS
                )));
            }
            while self.rows.len() + 1 < index {
                self.rows.push(Some(Row::new()));
            }
        }
        self.row = Some(Row::new());
        Ok(())
    }

    fn end_row(&mut self) {
        if let Some(row) = self.row.take() {
            self.rows.push(Some(row));
        }
    }

    fn start_cell(&mut self, e: &BytesStart) -> Result<()> {
        let Some(row) = self.row.as_mut() else {
            return Ok(());
        };

        if let Some(index) = index_attribute(e, b"Index")? {
            check_column(index)?;
            while row.len() + 1 < index {
                row.push(String::new());
            }
        }

        let mut cell = PendingCell::default();
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.local_name().as_ref() {
                b"Formula" => cell.formula = Some(attr.unescape_value()?.into_owned()),
                b"MergeAcross" => {
                    cell.merge_across = attr.unescape_value()?.trim().parse().unwrap_or(0);
                }
                _ => {}
            }
        }
        check_column(row.len().saturating_add(1).saturating_add(cell.merge_across))?;
        self.cell = Some(cell);
        Ok(())
    }

    fn end_cell(&mut self) {
        let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) else {
            return;
        };
        let span = cell.merge_across;
        row.push(cell.into_text());
        row.extend(std::iter::repeat(String::new()).take(span));
    }

    fn start_data(&mut self, e: &BytesStart) -> Result<()> {
        if self.in_comment {
            return Ok(());
        }
        if let Some(cell) = self.cell.as_mut() {
            cell.has_data = true;
            cell.text.clear();
            for attr in e.attributes() {
                let attr = attr.map_err(quick_xml::Error::from)?;
                if attr.key.local_name().as_ref() == b"Type" {
                    cell.data_type = Some(attr.unescape_value()?.into_owned());
                }
            }
            self.data_depth = 1;
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if self.data_depth == 0 {
            return;
        }
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push_str(text);
        }
    }

    fn finish(mut self) -> Sheet {
        self.end_row();
        Sheet::new(self.rows)
    }
}

fn check_column(position: usize) -> Result<()> {
    if position > MAX_COLUMNS {
        return Err(SheetColError::format(format!(
            "Column position {} exceeds the worksheet limit of {} columns",
            position, MAX_COLUMNS
        )));
    }
    Ok(())
}

fn index_attribute(e: &BytesStart, name: &[u8]) -> Result<Option<usize>> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(attr.unescape_value()?.trim().parse().ok());
        }
    }
    Ok(None)
}

/// Reads the first `Worksheet` of a SpreadsheetML 2003 document.
///
/// Explicit `ss:Index` positions on rows and cells are honored by padding
/// the skipped slots with empty cells. Positions beyond 1,048,576 rows or
/// 16,384 columns are a format error.
pub fn read_flat_xml(bytes: &[u8]) -> Result<Sheet> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut builder = SheetBuilder::default();
    let mut in_worksheet = false;
    let mut in_table = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Worksheet" => in_worksheet = true,
                b"Table" if in_worksheet => in_table = true,
                b"Row" if in_table => builder.start_row(e)?,
                b"Cell" if in_table => builder.start_cell(e)?,
                b"Comment" => builder.in_comment = true,
                b"Data" if builder.data_depth == 0 => builder.start_data(e)?,
                _ if builder.data_depth > 0 => builder.data_depth += 1,
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"Row" if in_table => {
                    builder.start_row(e)?;
                    builder.end_row();
                }
                b"Cell" if in_table => {
                    builder.start_cell(e)?;
                    builder.end_cell();
                }
                b"Data" if builder.data_depth == 0 => {
                    builder.start_data(e)?;
                    builder.data_depth = 0;
                }
                _ => {}
            },
            Event::Text(ref t) => {
                let text = t.unescape()?;
                builder.push_text(&text);
            }
            Event::CData(ref c) => {
                let text = String::from_utf8_lossy(c).into_owned();
                builder.push_text(&text);
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                _ if builder.data_depth > 0 => builder.data_depth -= 1,
                b"Comment" => builder.in_comment = false,
                b"Cell" if in_table => builder.end_cell(),
                b"Row" if in_table => builder.end_row(),
                b"Table" if in_table => in_table = false,
                // Only the first worksheet is read
                b"Worksheet" => break,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.finish())
}
