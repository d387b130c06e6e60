//! In-memory xlsx packages for integration tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::io::Write;
use xlsx_stream::XlsxPackage;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Builds a minimal SpreadsheetML package part by part.
pub struct PackageBuilder {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    styles: Option<String>,
    date1904: bool,
    compression: CompressionMethod,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            shared_strings: Vec::new(),
            styles: None,
            date1904: false,
            compression: CompressionMethod::Deflated,
        }
    }
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a worksheet whose `sheetData` holds `rows`.
    pub fn sheet(self, name: &str, rows: &str) -> Self {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1"/><sheetData>{rows}</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
        );
        self.raw_sheet(name, &xml)
    }

    /// Adds a worksheet part with the given content as is.
    pub fn raw_sheet(mut self, name: &str, xml: &str) -> Self {
        self.sheets.push((name.to_owned(), xml.to_owned()));
        self
    }

    pub fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|text| text.to_string()).collect();
        self
    }

    /// Sets the `cellXfs` number format ids, one per style index, plus custom formats.
    pub fn styles(mut self, custom: &[(u32, &str)], format_ids: &[u32]) -> Self {
        let custom_formats: String = custom
            .iter()
            .map(|(id, code)| format!(r#"<numFmt numFmtId="{id}" formatCode="{code}"/>"#))
            .collect();
        let cell_formats: String = format_ids
            .iter()
            .map(|id| format!(r#"<xf numFmtId="{id}" fontId="0" fillId="0" borderId="0" xfId="0"/>"#))
            .collect();
        self.styles = Some(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="{}">{custom_formats}</numFmts><cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs><cellXfs count="{}">{cell_formats}</cellXfs></styleSheet>"#,
            custom.len(),
            format_ids.len(),
        ));
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Stores parts uncompressed, which keeps large fixtures fast to build.
    pub fn stored(mut self) -> Self {
        self.compression = CompressionMethod::Stored;
        self
    }

    pub fn build(&self) -> anyhow::Result<Vec<u8>> {
        let options = || SimpleFileOptions::default().compression_method(self.compression);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        zip.start_file("[Content_Types].xml", options())?;
        zip.write_all(self.content_types().as_bytes())?;
        zip.start_file("xl/workbook.xml", options())?;
        zip.write_all(self.workbook().as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options())?;
        zip.write_all(self.relationships().as_bytes())?;
        for (index, (_, xml)) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options())?;
            zip.write_all(xml.as_bytes())?;
        }
        if !self.shared_strings.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options())?;
            zip.write_all(self.shared_strings_part().as_bytes())?;
        }
        if let Some(styles) = &self.styles {
            zip.start_file("xl/styles.xml", options())?;
            zip.write_all(styles.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    pub fn open(&self) -> anyhow::Result<XlsxPackage<Cursor<Vec<u8>>>> {
        Ok(XlsxPackage::from_reader("fixture.xlsx", Cursor::new(self.build()?))?)
    }

    fn content_types(&self) -> String {
        let sheets: String = (1..=self.sheets.len())
            .map(|index| {
                format!(
                    r#"<Override PartName="/xl/worksheets/sheet{index}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{sheets}</Types>"#
        )
    }

    fn workbook(&self) -> String {
        let sheets: String = self
            .sheets
            .iter()
            .enumerate()
            .map(|(index, (name, _))| {
                format!(r#"<sheet name="{name}" sheetId="{}" r:id="rId{}"/>"#, index + 1, index + 1)
            })
            .collect();
        let date1904 = if self.date1904 { r#" date1904="1""# } else { "" };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr{date1904} defaultThemeVersion="124226"/><sheets>{sheets}</sheets></workbook>"#
        )
    }

    fn relationships(&self) -> String {
        let mut relationships: String = (1..=self.sheets.len())
            .map(|index| {
                format!(
                    r#"<Relationship Id="rId{index}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{index}.xml"/>"#
                )
            })
            .collect();
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            self.sheets.len() + 1
        ));
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
        )
    }

    fn shared_strings_part(&self) -> String {
        let items: String = self
            .shared_strings
            .iter()
            .map(|text| format!(r#"<si><t xml:space="preserve">{text}</t></si>"#))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{items}</sst>"#,
            self.shared_strings.len()
        )
    }
}

/// Display texts of a row.
pub fn texts(row: &[xlsx_stream::CellValue]) -> Vec<&str> {
    row.iter().map(|cell| cell.text()).collect()
}
