use crate::error::ResultContext;
use crate::error::SheetDecodeError;
use crate::error::XlsxError;
use crate::helpers::reader::open_location;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::assembler::RowAssembler;
use crate::spreadsheet::options::ReadOptions;
use crate::spreadsheet::reader::SheetReader;
use crate::spreadsheet::shared_strings::SharedStrings;
use crate::spreadsheet::styles::Styles;
use crate::spreadsheet::workbook::SheetEntry;
use crate::spreadsheet::workbook::Workbook;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use zip::ZipArchive;

/// An opened xlsx package.
///
/// Worksheet declarations are read when the package is opened. The shared
/// string and style tables are loaded each time a sheet is opened, and live
/// only as long as that sheet's reader.
pub struct XlsxPackage<RS: Read + Seek> {
    name: String,
    zip: ZipArchive<RS>,
    workbook: Workbook,
}

impl XlsxPackage<BufReader<File>> {
    /// Opens a package from a local file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, XlsxError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(XlsxError::from)
            .with_context(&format!("Open '{}'", path.display()))?;
        Self::from_reader(&path.display().to_string(), BufReader::new(file))
    }

    /// Opens a package from a local path or a `file:` URL.
    pub fn open_location(location: &str) -> Result<Self, XlsxError> {
        let reader = open_location(location).with_context(&format!("Open '{location}'"))?;
        Self::from_reader(location, reader)
    }
}

impl<RS: Read + Seek> XlsxPackage<RS> {
    /// Opens a package from any seekable byte source; `name` is used in
    /// diagnostics only.
    pub fn from_reader(name: &str, reader: RS) -> Result<Self, XlsxError> {
        let mut zip = ZipArchive::new(reader)
            .map_err(XlsxError::from)
            .with_context(&format!("Read package '{name}'"))?;
        let workbook = Workbook::load(&mut zip).with_context(&format!("Load workbook of '{name}'"))?;
        Ok(XlsxPackage {
            name: name.to_owned(),
            zip,
            workbook,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared sheet names in stored order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.workbook.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Opens the named sheet with default options.
    pub fn open_sheet(&mut self, name: &str) -> Result<SheetReader<'_, RS>, SheetDecodeError> {
        self.open_sheet_with(name, &ReadOptions::default())
    }

    /// Opens the named sheet, reading its header row and buffering the first
    /// data row.
    ///
    /// The name matches case-insensitively, either bare or wrapped in double
    /// quotes (`"2009"` selects the sheet `2009`). The first declared match
    /// wins. A name matching no sheet fails with [`XlsxError::SheetNotFound`].
    pub fn open_sheet_with(
        &mut self,
        name: &str,
        options: &ReadOptions,
    ) -> Result<SheetReader<'_, RS>, SheetDecodeError> {
        let fail = |source: XlsxError| SheetDecodeError::new(name, 0, source);
        let SheetEntry { name: sheet, path } = self
            .find_sheet(name)
            .cloned()
            .ok_or_else(|| fail(XlsxError::SheetNotFound(name.to_owned())))?;

        let shared_strings = SharedStrings::load(&mut self.zip)
            .with_context("Load shared strings")
            .map_err(fail)?;
        let styles = Styles::load(&mut self.zip).with_context("Load styles").map_err(fail)?;
        let date_system = options.date_system_or(self.workbook.date_system);
        log::debug!(
            "Reading sheet '{sheet}' of '{}' from {path} ({} shared strings, {} styles, {date_system:?} dates)",
            self.name,
            shared_strings.len(),
            styles.len(),
        );

        let xml = self
            .zip
            .xml_reader(&path)
            .map_err(fail)?
            .ok_or_else(|| fail(XlsxError::MissingPart(path.clone())))?;
        let assembler = RowAssembler::new(shared_strings, styles, date_system);
        SheetReader::new(&sheet, xml, assembler, options)
    }

    /// Finds the first sheet whose name equals `name`, bare or quoted.
    fn find_sheet(&self, name: &str) -> Option<&SheetEntry> {
        let target = name.to_lowercase();
        self.workbook.sheets.iter().find(|sheet| {
            let declared = sheet.name.to_lowercase();
            target == declared || target == format!("\"{declared}\"")
        })
    }
}
