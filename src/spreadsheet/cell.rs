use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Declared type of a worksheet cell (the `t` attribute of `<c>`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellKind {
    /// Boolean values (`t="b"`)
    Boolean,
    /// Error values such as `#DIV/0!` (`t="e"`)
    Error,
    /// Inline rich text (`t="inlineStr"`)
    InlineString,
    /// Shared string table references (`t="s"`)
    SharedString,
    /// Cached string result of a formula (`t="str"`)
    FormulaString,
    /// ISO 8601 date/time text (`t="d"`)
    IsoDateTime,
    /// Numeric values, the default when `t` is absent
    #[default]
    Number,
}

impl CellKind {
    /// Maps the `t` attribute value; unknown values are read as numbers.
    pub(crate) fn from_type_attribute(value: Option<&str>) -> Self {
        match value {
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            Some("inlineStr") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("str") => Self::FormulaString,
            Some("d") => Self::IsoDateTime,
            _ => Self::Number,
        }
    }
}

/// Decoded content of one worksheet cell.
///
/// `text` is always populated with the display form. `number` is present for
/// numeric cells only, and `date` only when the cell's number format is a
/// date or time pattern (or the cell is an ISO 8601 date).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellValue {
    text: String,
    number: Option<f64>,
    date: Option<NaiveDateTime>,
}

/// One decoded row, indexed by column.
pub type Row = Vec<CellValue>;

impl CellValue {
    pub(crate) fn new(text: String, number: Option<f64>, date: Option<NaiveDateTime>) -> Self {
        Self { text, number, date }
    }

    pub(crate) fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            number: None,
            date: None,
        }
    }

    /// ISO 8601 cell: text kept verbatim, date parsed when well formed.
    pub(crate) fn from_iso_datetime(text: &str) -> Self {
        let date = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            });
        Self {
            text: text.to_owned(),
            number: None,
            date,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn number(&self) -> Option<f64> {
        self.number
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    /// Returns true for placeholders of cells absent from the sheet.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.number.is_none() && self.date.is_none()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_attribute() {
        assert_eq!(CellKind::from_type_attribute(Some("b")), CellKind::Boolean);
        assert_eq!(CellKind::from_type_attribute(Some("e")), CellKind::Error);
        assert_eq!(CellKind::from_type_attribute(Some("inlineStr")), CellKind::InlineString);
        assert_eq!(CellKind::from_type_attribute(Some("s")), CellKind::SharedString);
        assert_eq!(CellKind::from_type_attribute(Some("str")), CellKind::FormulaString);
        assert_eq!(CellKind::from_type_attribute(Some("d")), CellKind::IsoDateTime);
        assert_eq!(CellKind::from_type_attribute(Some("n")), CellKind::Number);
        assert_eq!(CellKind::from_type_attribute(None), CellKind::Number);
    }

    #[test]
    fn placeholder_is_empty() {
        let empty = CellValue::default();
        assert!(empty.is_empty());
        assert_eq!(empty.text(), "");
        assert_eq!(empty.number(), None);
        assert_eq!(empty.date(), None);
        assert!(!CellValue::from_text("x").is_empty());
    }

    #[test]
    fn iso_datetime_cells() {
        let cell = CellValue::from_iso_datetime("2009-03-01T12:30:00");
        assert_eq!(cell.text(), "2009-03-01T12:30:00");
        assert_eq!(cell.date().unwrap().to_string(), "2009-03-01 12:30:00");

        let cell = CellValue::from_iso_datetime("2009-03-01");
        assert_eq!(cell.date().unwrap().to_string(), "2009-03-01 00:00:00");

        let cell = CellValue::from_iso_datetime("yesterday");
        assert_eq!(cell.text(), "yesterday");
        assert_eq!(cell.date(), None);
    }

    #[test]
    fn displays_text() {
        let cell = CellValue::new("1.50".to_owned(), Some(1.5), None);
        assert_eq!(cell.to_string(), "1.50");
        assert_eq!(cell.number(), Some(1.5));
        assert_eq!(cell.into_text(), "1.50");
    }
}
