//! Row assembly: a cell state machine over sheet events.

use crate::spreadsheet::cell::CellKind;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::cell::Row;
use crate::spreadsheet::events::SheetEvent;
use crate::spreadsheet::number;
use crate::spreadsheet::number::DateSystem;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::shared_strings::SharedStrings;
use crate::spreadsheet::styles::NumberFormat;
use crate::spreadsheet::styles::Styles;
use std::iter;
use std::mem;
use std::sync::Arc;

/// Metadata of the cell being decoded.
#[derive(Debug)]
struct PendingCell {
    column: usize,
    kind: CellKind,
    format: Option<Arc<NumberFormat>>,
}

#[derive(Debug, Default)]
enum CellState {
    #[default]
    Idle,
    /// Cell start seen, value not started yet.
    HaveCell(PendingCell),
    /// Inside `<v>` or `<is>`, accumulating characters.
    AwaitingValue(PendingCell),
}

/// Builds rows out of sheet events.
///
/// The first completed row is the header and fixes the width of every row
/// that follows: shorter rows are padded with empty values, cells past the
/// last header column are dropped.
#[derive(Debug)]
pub(crate) struct RowAssembler {
    shared_strings: SharedStrings,
    styles: Styles,
    date_system: DateSystem,
    state: CellState,
    value: String,
    cells: Row,
    last_column: Option<usize>,
    in_row: bool,
    row_index: usize,
    width: Option<usize>,
}

impl RowAssembler {
    pub(crate) fn new(shared_strings: SharedStrings, styles: Styles, date_system: DateSystem) -> Self {
        Self {
            shared_strings,
            styles,
            date_system,
            state: CellState::Idle,
            value: String::new(),
            cells: Vec::new(),
            last_column: None,
            in_row: false,
            row_index: 0,
            width: None,
        }
    }

    /// Index of the row being assembled; the header is row 0.
    pub(crate) fn row_index(&self) -> usize {
        self.row_index
    }

    /// Returns true between a row start and its end.
    pub(crate) fn is_mid_row(&self) -> bool {
        self.in_row
    }

    /// Feeds one event; returns the finished row on a row end.
    pub(crate) fn step(&mut self, event: SheetEvent<'_>) -> Option<Row> {
        self.state = match (mem::take(&mut self.state), event) {
            (_, SheetEvent::RowStart) => {
                self.in_row = true;
                CellState::Idle
            }
            (_, SheetEvent::CellStart { column, kind, style }) => {
                let column = self.resolve_column(column);
                let format = match kind {
                    CellKind::Number => style.and_then(|style| self.resolve_format(style)),
                    _ => None,
                };
                CellState::HaveCell(PendingCell { column, kind, format })
            }
            (CellState::HaveCell(cell) | CellState::AwaitingValue(cell), SheetEvent::ValueStart) => {
                self.value.clear();
                CellState::AwaitingValue(cell)
            }
            (CellState::AwaitingValue(cell), SheetEvent::Characters(text)) => {
                self.value.push_str(&text);
                CellState::AwaitingValue(cell)
            }
            (CellState::AwaitingValue(cell), SheetEvent::ValueEnd) => {
                self.push_cell(cell);
                CellState::Idle
            }
            (_, SheetEvent::CellEnd) => CellState::Idle,
            (_, SheetEvent::RowEnd) => return Some(self.end_row()),
            (state, _) => state,
        };
        None
    }

    fn resolve_column(&self, column: Option<usize>) -> usize {
        let next = self.last_column.map_or(0, |last| last + 1);
        match column {
            Some(column) if self.last_column.map_or(true, |last| column > last) => column,
            Some(column) => {
                log::trace!(
                    "Cell {} is out of order, placing it at column {next}",
                    index_to_reference(self.row_index, column)
                );
                next
            }
            None => next,
        }
    }

    fn resolve_format(&self, style: usize) -> Option<Arc<NumberFormat>> {
        let format = self.styles.format(style);
        if format.is_none() && style >= self.styles.len() {
            log::trace!("Style index {style} is outside the {} known styles", self.styles.len());
        }
        format
    }

    fn push_cell(&mut self, cell: PendingCell) {
        self.last_column = Some(cell.column);
        if self.width.is_some_and(|width| cell.column >= width) {
            log::trace!(
                "Dropping cell {} beyond the header width",
                index_to_reference(self.row_index, cell.column)
            );
            return;
        }
        let value = self.decode(&cell);
        let missing = cell.column.saturating_sub(self.cells.len());
        self.cells.extend(iter::repeat_with(CellValue::default).take(missing));
        self.cells.push(value);
    }

    fn decode(&self, cell: &PendingCell) -> CellValue {
        let raw = self.value.as_str();
        if raw.trim().is_empty() {
            return CellValue::default();
        }
        match cell.kind {
            CellKind::Boolean => CellValue::from_text(if raw.starts_with('0') { "FALSE" } else { "TRUE" }),
            CellKind::Error => CellValue::from_text(format!("\"ERROR:{raw}\"")),
            CellKind::InlineString | CellKind::FormulaString => CellValue::from_text(raw),
            CellKind::IsoDateTime => CellValue::from_iso_datetime(raw.trim()),
            CellKind::SharedString => self.shared_string(raw, cell.column),
            CellKind::Number => number::interpret(raw, cell.format.as_deref(), self.date_system),
        }
    }

    fn shared_string(&self, raw: &str, column: usize) -> CellValue {
        let reference = index_to_reference(self.row_index, column);
        match raw.trim().parse::<usize>() {
            Ok(index) => match self.shared_strings.get(index) {
                Some(text) => CellValue::from_text(text),
                None => {
                    log::warn!(
                        "Shared string {index} of cell {reference} is outside the table of {} strings",
                        self.shared_strings.len()
                    );
                    CellValue::from_text(format!("Failed to find shared string {index}"))
                }
            },
            Err(_) => {
                log::warn!("Cell {reference} has an invalid shared string index '{raw}'");
                CellValue::from_text(format!("Failed to parse shared string index '{raw}'"))
            }
        }
    }

    fn end_row(&mut self) -> Row {
        let width = *self.width.get_or_insert(self.cells.len());
        let missing = width.saturating_sub(self.cells.len());
        self.cells.extend(iter::repeat_with(CellValue::default).take(missing));
        self.last_column = None;
        self.in_row = false;
        self.row_index += 1;
        mem::replace(&mut self.cells, Vec::with_capacity(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::xml::XmlReader;
    use std::borrow::Cow;

    fn assembler() -> RowAssembler {
        let shared_strings = SharedStrings::read(&mut XmlReader::new(
            "<sst><si><t>Name</t></si><si><t>Date</t></si><si><t>Total</t></si></sst>".as_bytes(),
        ))
        .unwrap();
        let styles = Styles::read(&mut XmlReader::new(
            r#"<styleSheet><cellXfs><xf numFmtId="0"/><xf numFmtId="14"/><xf numFmtId="4"/></cellXfs></styleSheet>"#.as_bytes(),
        ))
        .unwrap();
        RowAssembler::new(shared_strings, styles, DateSystem::V1900)
    }

    fn cell(assembler: &mut RowAssembler, column: usize, kind: CellKind, style: Option<usize>, value: &str) {
        assembler.step(SheetEvent::CellStart {
            column: Some(column),
            kind,
            style,
        });
        assembler.step(SheetEvent::ValueStart);
        assembler.step(SheetEvent::Characters(Cow::Borrowed(value)));
        assembler.step(SheetEvent::ValueEnd);
        assembler.step(SheetEvent::CellEnd);
    }

    fn texts(row: &Row) -> Vec<&str> {
        row.iter().map(CellValue::text).collect()
    }

    fn header(assembler: &mut RowAssembler) -> Row {
        assembler.step(SheetEvent::RowStart);
        cell(assembler, 0, CellKind::SharedString, None, "0");
        cell(assembler, 1, CellKind::SharedString, None, "1");
        cell(assembler, 2, CellKind::SharedString, None, "2");
        assembler.step(SheetEvent::RowEnd).unwrap()
    }

    #[test]
    fn header_defines_width() {
        let mut assembler = assembler();
        let header = header(&mut assembler);
        assert_eq!(texts(&header), vec!["Name", "Date", "Total"]);
        assert_eq!(assembler.row_index(), 1);
        assert!(!assembler.is_mid_row());
    }

    #[test]
    fn typed_values() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        assert!(assembler.is_mid_row());
        cell(&mut assembler, 0, CellKind::InlineString, None, "widget");
        cell(&mut assembler, 1, CellKind::Number, Some(1), "39873");
        cell(&mut assembler, 2, CellKind::Number, Some(2), "1234.5");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();

        assert_eq!(texts(&row), vec!["widget", "3/1/09", "1,234.50"]);
        assert_eq!(row[1].number(), Some(39_873.0));
        assert_eq!(row[1].date().unwrap().to_string(), "2009-03-01 00:00:00");
        assert_eq!(row[2].number(), Some(1234.5));
        assert_eq!(row[2].date(), None);
    }

    #[test]
    fn booleans_errors_and_formula_strings() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::Boolean, None, "0");
        cell(&mut assembler, 1, CellKind::Error, None, "#DIV/0!");
        cell(&mut assembler, 2, CellKind::FormulaString, None, "A2+B2");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&row), vec!["FALSE", "\"ERROR:#DIV/0!\"", "A2+B2"]);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::Boolean, None, "1");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&row), vec!["TRUE", "", ""]);
    }

    #[test]
    fn sparse_rows_are_filled() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 1, CellKind::Number, None, "5");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&row), vec!["", "5", ""]);
        assert!(row[0].is_empty());
        assert!(row[2].is_empty());

        assembler.step(SheetEvent::RowStart);
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(row.len(), 3);
        assert!(row.iter().all(CellValue::is_empty));
    }

    #[test]
    fn header_placeholders_extend_columns() {
        let mut assembler = assembler();
        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::InlineString, None, "a");
        cell(&mut assembler, 3, CellKind::InlineString, None, "d");
        let header = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&header), vec!["a", "", "", "d"]);
    }

    #[test]
    fn cells_beyond_header_are_dropped() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::Number, None, "1");
        cell(&mut assembler, 5, CellKind::Number, None, "6");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&row), vec!["1", "", ""]);
    }

    #[test]
    fn lookup_misses_degrade() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::SharedString, None, "99");
        cell(&mut assembler, 1, CellKind::SharedString, None, "x");
        cell(&mut assembler, 2, CellKind::Number, None, "12a");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(
            texts(&row),
            vec![
                "Failed to find shared string 99",
                "Failed to parse shared string index 'x'",
                "Failed to parse number '12a'",
            ]
        );
    }

    #[test]
    fn fragments_are_concatenated() {
        let mut assembler = assembler();
        assembler.step(SheetEvent::RowStart);
        assembler.step(SheetEvent::CellStart {
            column: None,
            kind: CellKind::InlineString,
            style: None,
        });
        assembler.step(SheetEvent::ValueStart);
        for fragment in ["R", "&", "D"] {
            assembler.step(SheetEvent::Characters(Cow::Borrowed(fragment)));
        }
        assembler.step(SheetEvent::ValueEnd);
        let header = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&header), vec!["R&D"]);
    }

    #[test]
    fn missing_and_out_of_order_references() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 1, CellKind::Number, None, "2");
        cell(&mut assembler, 0, CellKind::Number, None, "3");
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert_eq!(texts(&row), vec!["", "2", "3"]);
    }

    #[test]
    fn empty_values_are_placeholders() {
        let mut assembler = assembler();
        header(&mut assembler);

        assembler.step(SheetEvent::RowStart);
        cell(&mut assembler, 0, CellKind::Number, Some(1), "  ");
        assembler.step(SheetEvent::CellStart {
            column: Some(1),
            kind: CellKind::Number,
            style: Some(1),
        });
        assembler.step(SheetEvent::CellEnd);
        let row = assembler.step(SheetEvent::RowEnd).unwrap();
        assert!(row.iter().all(CellValue::is_empty));
    }

    #[test]
    fn characters_outside_values_are_ignored() {
        let mut assembler = assembler();
        assembler.step(SheetEvent::RowStart);
        assembler.step(SheetEvent::Characters(Cow::Borrowed("stray")));
        let header = assembler.step(SheetEvent::RowEnd).unwrap();
        assert!(header.is_empty());
    }
}
