use crate::error::{Result, SheetColError};
use crate::reader::{Row, Sheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLocation {
    pub index: usize,
    pub matched_header: String,
}

/// Finds the leftmost header cell equal to `target`, ignoring case.
///
/// Whitespace around a header cell is ignored; `target` is compared as given.
pub fn locate(header: &Row, target: &str) -> Result<ColumnLocation> {
    let wanted = target.to_lowercase();

    header
        .iter()
        .enumerate()
        .find(|(_, cell)| cell.trim().to_lowercase() == wanted)
        .map(|(index, cell)| ColumnLocation {
            index,
            matched_header: cell.trim().to_string(),
        })
        .ok_or_else(|| SheetColError::ColumnNotFound {
            column: target.to_string(),
        })
}

/// Collects the located column from every data row, in sheet order.
///
/// Missing row objects are skipped; a present row that is too short for
/// the column contributes an empty string.
pub fn extract(sheet: &Sheet, location: &ColumnLocation) -> Vec<String> {
    sheet
        .data_rows()
        .flatten()
        .map(|row| row.get(location.index).cloned().unwrap_or_default())
        .collect()
}

/// Locates `column` in the header row of `sheet` and extracts its values.
pub fn extract_column(sheet: &Sheet, column: &str) -> Result<(ColumnLocation, Vec<String>)> {
    if sheet.is_empty() {
        return Err(SheetColError::format("No rows found"));
    }
    let header = sheet
        .header()
        .ok_or_else(|| SheetColError::format("No header row"))?;

    let location = locate(header, column)?;
    let values = extract(sheet, &location);
    Ok((location, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_locate_is_case_insensitive() {
        for header in ["email", "EMAIL", "Email", "  eMaIl  "] {
            let location = locate(&row(&["Name", header]), "Email").unwrap();
            assert_eq!(location.index, 1);
            assert_eq!(location.matched_header, header.trim());
        }
        assert!(locate(&row(&["Email"]), "EMAIL").is_ok());
        assert!(locate(&row(&["Ärger"]), "ärger").is_ok());
    }

    #[test]
    fn test_locate_keeps_target_whitespace() {
        assert!(locate(&row(&["Email"]), " Email").is_err());
        assert!(locate(&row(&["Email"]), "Email ").is_err());
        assert!(locate(&row(&[" Email "]), "Email").is_ok());
    }

    #[test]
    fn test_locate_returns_leftmost_match() {
        let location = locate(&row(&["id", "EMAIL", "email"]), "email").unwrap();
        assert_eq!(location.index, 1);
    }

    #[test]
    fn test_locate_not_found() {
        let err = locate(&row(&["Name", "Phone"]), "Email").unwrap_err();
        assert_eq!(err.to_string(), "Column 'Email' not found");
    }

    #[test]
    fn test_extract_skips_missing_rows_and_pads_short_rows() {
        let sheet = Sheet::new(vec![
            Some(row(&["Name", "Email"])),
            Some(row(&["a", "a@x.com"])),
            None,
            Some(row(&["b"])),
            Some(row(&["c", "c@x.com"])),
        ]);
        let (location, values) = extract_column(&sheet, "email").unwrap();
        assert_eq!(location.index, 1);
        assert_eq!(values, vec!["a@x.com", "", "c@x.com"]);
    }

    #[test]
    fn test_extract_column_format_errors() {
        let err = extract_column(&Sheet::default(), "Email").unwrap_err();
        assert_eq!(err.to_string(), "No rows found");

        let sheet = Sheet::new(vec![None, Some(row(&["Email"]))]);
        let err = extract_column(&sheet, "Email").unwrap_err();
        assert_eq!(err.to_string(), "No header row");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(128))]

            #[test]
            fn prop_locate_ignores_case(
                name in "[A-Za-z][A-Za-z0-9_]{0,12}",
                others in prop::collection::vec("[0-9]{1,4}", 0..5),
                padding in " {0,2}",
            ) {
                let mut cells: Vec<String> = others.clone();
                cells.push(format!("{}{}{}", padding, name.to_uppercase(), padding));
                let header: Row = cells;

                for target in [name.clone(), name.to_lowercase(), name.to_uppercase()] {
                    let location = locate(&header, &target).unwrap();
                    prop_assert_eq!(location.index, others.len());
                    prop_assert_eq!(location.matched_header, name.to_uppercase());
                }
            }
        }
    }
}
