use crate::error::{Result, SheetColError};
use crate::reader::{format_number, Row, Sheet};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::io::Cursor;
use tracing::debug;

type Source = Cursor<Vec<u8>>;

pub fn read_xlsx(bytes: Vec<u8>) -> Result<Sheet> {
    let workbook: Xlsx<Source> = Xlsx::new(Cursor::new(bytes))?;
    read_first_sheet(workbook)
}

pub fn read_xls(bytes: Vec<u8>) -> Result<Sheet> {
    let workbook: Xls<Source> = Xls::new(Cursor::new(bytes))?;
    read_first_sheet(workbook)
}

fn read_first_sheet<R>(mut workbook: R) -> Result<Sheet>
where
    R: Reader<Source>,
    SheetColError: From<R::Error>,
{
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| SheetColError::format("Workbook contains no sheets"))?;

    let values = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetColError::format("Workbook contains no sheets"))??;

    // Formula text is only a fallback for cells without a cached result
    let formulas = match workbook.worksheet_formula(&name) {
        Ok(formulas) => Some(formulas),
        Err(e) => {
            debug!(sheet = %name, error = ?e, "formulas unavailable");
            None
        }
    };

    Ok(build_sheet(&values, formulas.as_ref()))
}

/// Lays the used range out at absolute positions.
///
/// Rows without a single populated cell are treated as missing row objects.
/// calamine's range keeps no record of which rows the file defined, so a
/// stored row of blank cells and an absent row look the same here. Both are
/// skipped and neither counts towards the extracted values.
fn build_sheet(values: &Range<Data>, formulas: Option<&Range<String>>) -> Sheet {
    let Some((first_row, first_col)) = values.start() else {
        return Sheet::default();
    };

    let mut rows: Vec<Option<Row>> = vec![None; first_row as usize];

    for (offset, cells) in values.rows().enumerate() {
        let row_index = first_row + offset as u32;
        let mut row: Row = vec![String::new(); first_col as usize];
        let mut populated = false;

        for (col_offset, cell) in cells.iter().enumerate() {
            let col_index = first_col + col_offset as u32;
            let text = match cell {
                Data::Empty => formula_text(formulas, row_index, col_index),
                other => Some(cell_text(other)),
            };
            match text {
                Some(text) => {
                    populated = true;
                    row.push(text);
                }
                None => row.push(String::new()),
            }
        }

        if populated {
            while row.last().is_some_and(|cell| cell.is_empty()) {
                row.pop();
            }
            rows.push(Some(row));
        } else {
            rows.push(None);
        }
    }

    Sheet::new(rows)
}

fn formula_text(formulas: Option<&Range<String>>, row: u32, col: u32) -> Option<String> {
    formulas
        .and_then(|f| f.get_value((row, col)))
        .filter(|f| !f.is_empty())
        .map(|f| format!("={}", f))
}

pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
        Data::Empty => String::new(),
    }
}
