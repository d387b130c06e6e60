use crate::error::XlsxError;
use crate::helpers::xml::resolve_reference;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use quick_xml::events::Event;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

const TAG_SHARED_STRING_ITEM: &[u8] = b"si"; // Shared string item
const TAG_PHONETIC_TEXT: &[u8] = b"rPh"; // Phonetic reading run, not part of the value
const TAG_TEXT: &[u8] = b"t"; // Text content element

/// The workbook's shared string table, indexed from 0 in document order.
#[derive(Debug, Default)]
pub(crate) struct SharedStrings(Vec<String>);

impl SharedStrings {
    /// Loads `xl/sharedStrings.xml`; a package without one has an empty table.
    pub(crate) fn load<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<SharedStrings, XlsxError> {
        match zip.xml_reader(SHARED_STRINGS_PART)? {
            Some(mut reader) => Self::read(&mut reader),
            None => Ok(SharedStrings::default()),
        }
    }

    pub(crate) fn read<R: BufRead>(reader: &mut XmlReader<R>) -> Result<SharedStrings, XlsxError> {
        let mut strings = Vec::<String>::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_SHARED_STRING_ITEM => {
                strings.push(read_string_item(reader)?);
            }
        });
        Ok(SharedStrings(strings))
    }

    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Concatenates the `<t>` runs of one `<si>`, skipping phonetic runs.
fn read_string_item<R: BufRead>(reader: &mut XmlReader<R>) -> Result<String, XlsxError> {
    let mut is_phonetic_text = false;
    let mut is_text = false;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.local_name().as_ref() == TAG_SHARED_STRING_ITEM => break,
        Event::Start(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.local_name().as_ref() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.local_name().as_ref() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_str(&resolve_reference(&event)?),
    });
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(xml: &str) -> SharedStrings {
        SharedStrings::read(&mut XmlReader::new(xml.as_bytes())).unwrap()
    }

    #[test]
    fn reads_plain_and_rich_items() {
        let strings = read(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
                <si><t>Date</t></si>
                <si><r><rPr><b/></rPr><t>Bold </t></r><r><t xml:space="preserve">and plain</t></r></si>
                <si><t/></si>
            </sst>"#,
        );
        assert_eq!(strings.len(), 3);
        assert_eq!(strings.get(0), Some("Date"));
        assert_eq!(strings.get(1), Some("Bold and plain"));
        assert_eq!(strings.get(2), Some(""));
        assert_eq!(strings.get(3), None);
    }

    #[test]
    fn skips_phonetic_runs() {
        let strings = read(
            r#"<sst><si><t>東京</t><rPh sb="0" eb="2"><t>トウキョウ</t></rPh><phoneticPr fontId="1"/></si></sst>"#,
        );
        assert_eq!(strings.get(0), Some("東京"));
    }

    #[test]
    fn resolves_entities_and_cdata() {
        let strings = read("<sst><si><t>R&amp;D &#x263A; <![CDATA[<raw>]]></t></si></sst>");
        assert_eq!(strings.get(0), Some("R&D \u{263A} <raw>"));
    }

    #[test]
    fn prefixed_elements() {
        let strings = read(r#"<x:sst xmlns:x="urn:x"><x:si><x:t>prefixed</x:t></x:si></x:sst>"#);
        assert_eq!(strings.get(0), Some("prefixed"));
    }
}
