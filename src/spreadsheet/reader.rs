//! Streaming sheet reader with one row of lookahead.

use crate::error::SheetDecodeError;
use crate::error::XlsxError;
use crate::helpers::xml::XmlReader;
use crate::spreadsheet::assembler::RowAssembler;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::cell::Row;
use crate::spreadsheet::events::EventTranslator;
use crate::spreadsheet::options::ReadOptions;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::iter::FusedIterator;
use zip::read::ZipFile;

/// The open worksheet part and its event translation state.
struct SheetSource<'a, RS: Read + Seek> {
    xml: XmlReader<BufReader<ZipFile<'a, RS>>>,
    translator: EventTranslator,
}

impl<RS: Read + Seek> SheetSource<'_, RS> {
    /// Pumps XML events until the assembler completes a row.
    fn next_row(&mut self, assembler: &mut RowAssembler) -> Result<Option<Row>, XlsxError> {
        while let Some(event) = self.xml.next()? {
            if let Some(event) = self.translator.translate(&event)? {
                if let Some(row) = assembler.step(event) {
                    return Ok(Some(row));
                }
            }
        }
        if assembler.is_mid_row() {
            Err(XlsxError::UnterminatedRow)
        } else {
            Ok(None)
        }
    }
}

/// Forward-only reader over the rows of one worksheet.
///
/// The first row is read as the header when the reader is created, and the
/// next row is decoded ahead of time so [`SheetReader::has_next`] can answer
/// without consuming anything. Rows are yielded as
/// `Result<Row, SheetDecodeError>`; after the last row, or after the first
/// error, the iterator only returns `None`.
///
/// The worksheet part is released when the reader is exhausted, fails, is
/// closed or is dropped.
pub struct SheetReader<'a, RS: Read + Seek> {
    sheet: String,
    source: Option<SheetSource<'a, RS>>,
    assembler: RowAssembler,
    columns: Row,
    lookahead: Option<Result<Row, SheetDecodeError>>,
    options: ReadOptions,
    emitted: usize,
}

impl<'a, RS: Read + Seek> SheetReader<'a, RS> {
    pub(crate) fn new(
        sheet: &str,
        xml: XmlReader<BufReader<ZipFile<'a, RS>>>,
        assembler: RowAssembler,
        options: &ReadOptions,
    ) -> Result<Self, SheetDecodeError> {
        let mut reader = SheetReader {
            sheet: sheet.to_owned(),
            source: Some(SheetSource {
                xml,
                translator: EventTranslator::default(),
            }),
            assembler,
            columns: Vec::new(),
            lookahead: None,
            options: options.clone(),
            emitted: 0,
        };
        if let Some(header) = reader.pump_row()? {
            reader.columns = header;
            reader.fill();
        }
        Ok(reader)
    }

    /// Declared name of the sheet.
    pub fn name(&self) -> &str {
        &self.sheet
    }

    /// The header row; its length is the width of every data row.
    pub fn columns(&self) -> &[CellValue] {
        &self.columns
    }

    /// Returns true if another row (or a decode error) is buffered.
    pub fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    /// Row index of the last row returned; 0 while only the header was read.
    pub fn row_index(&self) -> usize {
        self.emitted
    }

    /// Releases the worksheet part, discarding any buffered row.
    pub fn close(self) {
        drop(self);
    }

    fn fill(&mut self) {
        if self.options.reached_limit(self.emitted) {
            self.source = None;
            return;
        }
        self.lookahead = self.pump_row().transpose();
    }

    fn pump_row(&mut self) -> Result<Option<Row>, SheetDecodeError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        let row = source
            .next_row(&mut self.assembler)
            .map_err(|error| SheetDecodeError::new(&self.sheet, self.assembler.row_index(), error));
        if !matches!(row, Ok(Some(_))) {
            self.source = None;
        }
        row
    }
}

impl<RS: Read + Seek> Iterator for SheetReader<'_, RS> {
    type Item = Result<Row, SheetDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.lookahead.take()?;
        if item.is_ok() {
            self.emitted += 1;
            self.fill();
        }
        Some(item)
    }
}

impl<RS: Read + Seek> FusedIterator for SheetReader<'_, RS> {}
