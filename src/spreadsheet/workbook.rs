use crate::error::ResultContext;
use crate::error::XlsxError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::number::DateSystem;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const RELATIONSHIPS_PART: &str = "xl/_rels/workbook.xml.rels";

const TAG_WORKBOOK_PROPERTIES: &[u8] = b"workbookPr"; // Workbook properties
const TAG_SHEET: &[u8] = b"sheet"; // Worksheet declaration
const TAG_RELATIONSHIP: &[u8] = b"Relationship"; // Package relationship

/// A worksheet declared by the workbook, in stored order.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SheetEntry {
    pub(crate) name: String,
    pub(crate) path: String,
}

/// Worksheet declarations and the date system of a workbook.
#[derive(Debug)]
pub(crate) struct Workbook {
    pub(crate) sheets: Vec<SheetEntry>,
    pub(crate) date_system: DateSystem,
}

impl Workbook {
    /// Loads worksheet names and part paths from `xl/workbook.xml`, resolved
    /// through the workbook relationships.
    pub(crate) fn load<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Workbook, XlsxError> {
        let relationships = {
            let mut reader = zip
                .xml_reader(RELATIONSHIPS_PART)?
                .ok_or_else(|| XlsxError::MissingPart(RELATIONSHIPS_PART.to_owned()))?;
            read_relationships(&mut reader).with_context("Read workbook relationships")?
        };
        let mut reader = zip
            .xml_reader(WORKBOOK_PART)?
            .ok_or_else(|| XlsxError::MissingPart(WORKBOOK_PART.to_owned()))?;
        Self::read(&mut reader, &relationships)
    }

    pub(crate) fn read<R: BufRead>(
        reader: &mut XmlReader<R>,
        relationships: &HashMap<String, String>,
    ) -> Result<Workbook, XlsxError> {
        let mut sheets = Vec::<SheetEntry>::new();
        let mut date_system = DateSystem::V1900;
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_SHEET => {
                let mut name = None::<Cow<str>>;
                let mut id = None::<Cow<str>>;
                for result in event.attributes() {
                    let attribute = result?;
                    let key = attribute.key.local_name();
                    if key.as_ref() == b"name" {
                        name = Some(attribute.get_value()?);
                    } else if key.as_ref() == b"id" {
                        id = Some(attribute.get_value()?);
                    }
                }
                if let Some((name, id)) = name.zip(id) {
                    match relationships.get(&*id) {
                        Some(path) => sheets.push(SheetEntry {
                            name: name.into_owned(),
                            path: path.to_owned(),
                        }),
                        None => log::trace!("Sheet '{name}' has no worksheet relationship '{id}'"),
                    }
                }
            }
            Event::Start(event) if event.local_name().as_ref() == TAG_WORKBOOK_PROPERTIES => {
                let is_1904 = event.get_attribute_value("date1904")?
                    .map(|value| value.eq("1") || value.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                if is_1904 {
                    date_system = DateSystem::V1904;
                }
            }
        });
        Ok(Workbook { sheets, date_system })
    }
}

/// Reads worksheet relationships as id -> part path.
fn read_relationships<R: BufRead>(reader: &mut XmlReader<R>) -> Result<HashMap<String, String>, XlsxError> {
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.into_owned(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target against the `xl/` folder.
pub(crate) fn to_zip_path(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_owned()
    } else if target.starts_with("xl/") {
        target.to_owned()
    } else {
        format!("xl/{target}")
    }
}
