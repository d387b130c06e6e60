//! Cell reference codec ("C7" <-> column/row indexes).

use crate::error::XlsxError;

/// Last column index of a worksheet (`XFD`).
const MAX_COLUMN: usize = 16_383;

/// Converts column letters ("A", "Z", "AA") to a zero-based column index.
///
/// Letters are case-insensitive. Returns `None` for an empty or non-alphabetic
/// input, or past the last worksheet column (`XFD`).
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut column: i64 = -1;
    for letter in letters.bytes() {
        if !letter.is_ascii_alphabetic() {
            return None;
        }
        let offset = (letter.to_ascii_uppercase() - b'A') as i64;
        column = (column + 1) * 26 + offset;
        if column > MAX_COLUMN as i64 {
            return None;
        }
    }
    usize::try_from(column).ok()
}

/// Returns the zero-based column index of a cell reference such as "AB12".
///
/// Absolute markers (`$AB$12`) are ignored.
pub(crate) fn reference_to_column(reference: &str) -> Result<usize, XlsxError> {
    let reference = reference.trim_start_matches('$');
    let letters_end = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, row) = reference.split_at(letters_end);
    let row = row.trim_start_matches('$');
    if !row.is_empty() && !row.bytes().all(|b| b.is_ascii_digit()) {
        return Err(XlsxError::InvalidCellReference(reference.to_owned()));
    }
    col_to_index(letters).ok_or_else(|| XlsxError::InvalidCellReference(reference.to_owned()))
}

/// Formats zero-based indexes as an Excel-style reference ("A1").
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut column = col + 1;
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(col_to_index("A"), Some(0));
        assert_eq!(col_to_index("Z"), Some(25));
        assert_eq!(col_to_index("AA"), Some(26));
        assert_eq!(col_to_index("AZ"), Some(51));
        assert_eq!(col_to_index("BA"), Some(52));
        assert_eq!(col_to_index("XFD"), Some(16_383));
        assert_eq!(col_to_index("c"), Some(2));
    }

    #[test]
    fn column_letters_malformed() {
        assert_eq!(col_to_index(""), None);
        assert_eq!(col_to_index("A1"), None);
        assert_eq!(col_to_index("ÄB"), None);
        assert_eq!(col_to_index("XFE"), None);
        assert_eq!(col_to_index("ZZZZZZZ"), None);
    }

    #[test]
    fn cell_references() {
        assert_eq!(reference_to_column("A1").unwrap(), 0);
        assert_eq!(reference_to_column("C7").unwrap(), 2);
        assert_eq!(reference_to_column("AB1048576").unwrap(), 27);
        assert_eq!(reference_to_column("$D$4").unwrap(), 3);
        assert_eq!(reference_to_column("E").unwrap(), 4);
        assert!(reference_to_column("12").is_err());
        assert!(reference_to_column("A1B").is_err());
        assert_eq!(reference_to_column("XFD1").unwrap(), 16_383);
        assert!(matches!(reference_to_column("XFE1"), Err(XlsxError::InvalidCellReference(_))));
    }

    #[test]
    fn references_round_trip_through_index() {
        assert_eq!(index_to_reference(0, 0), "A1");
        assert_eq!(index_to_reference(6, 2), "C7");
        assert_eq!(index_to_reference(9, 26), "AA10");
        for col in [0, 25, 26, 701, 702, 16_383] {
            let reference = index_to_reference(0, col);
            assert_eq!(reference_to_column(&reference).unwrap(), col);
        }
    }
}
