//! Translation of raw worksheet XML events into sheet-level events.
//!
//! Only the elements the row assembler cares about survive: rows, cells,
//! value containers and the characters inside them. Formulas, phonetic runs
//! and everything outside `sheetData` are dropped here.

use crate::error::XlsxError;
use crate::helpers::xml::resolve_reference;
use crate::helpers::xml::XmlNodeHelper;
use crate::spreadsheet::cell::CellKind;
use crate::spreadsheet::reference::reference_to_column;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use std::borrow::Cow;

const TAG_ROW: &[u8] = b"row"; // Row in worksheet
const TAG_CELL: &[u8] = b"c"; // Cell in worksheet
const TAG_VALUE: &[u8] = b"v"; // Cell value content
const TAG_INLINE_STRING: &[u8] = b"is"; // Inline string value
const TAG_TEXT: &[u8] = b"t"; // Text run within an inline string
const TAG_PHONETIC_TEXT: &[u8] = b"rPh"; // Phonetic run within an inline string

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SheetEvent<'a> {
    RowStart,
    CellStart {
        column: Option<usize>,
        kind: CellKind,
        style: Option<usize>,
    },
    ValueStart,
    Characters(Cow<'a, str>),
    ValueEnd,
    CellEnd,
    RowEnd,
}

/// Tracks which value container the reader is inside.
#[derive(Debug, Default)]
pub(crate) struct EventTranslator {
    value: bool,
    inline: bool,
    text: bool,
    phonetic: bool,
}

impl EventTranslator {
    pub(crate) fn translate<'e>(&mut self, event: &'e Event<'_>) -> Result<Option<SheetEvent<'e>>, XlsxError> {
        let translated = match event {
            Event::Start(element) => match element.local_name().as_ref() {
                TAG_ROW => Some(SheetEvent::RowStart),
                TAG_CELL => Some(cell_start(element)?),
                TAG_VALUE => {
                    self.value = true;
                    self.inline = false;
                    Some(SheetEvent::ValueStart)
                }
                TAG_INLINE_STRING => {
                    self.value = true;
                    self.inline = true;
                    Some(SheetEvent::ValueStart)
                }
                TAG_PHONETIC_TEXT if self.inline => {
                    self.phonetic = true;
                    None
                }
                TAG_TEXT if self.inline && !self.phonetic => {
                    self.text = true;
                    None
                }
                _ => None,
            },
            Event::End(element) => match element.local_name().as_ref() {
                TAG_ROW => Some(SheetEvent::RowEnd),
                TAG_CELL => Some(SheetEvent::CellEnd),
                TAG_VALUE | TAG_INLINE_STRING if self.value => {
                    *self = EventTranslator::default();
                    Some(SheetEvent::ValueEnd)
                }
                TAG_PHONETIC_TEXT => {
                    self.phonetic = false;
                    None
                }
                TAG_TEXT => {
                    self.text = false;
                    None
                }
                _ => None,
            },
            Event::Text(text) if self.capturing() => Some(SheetEvent::Characters(text.xml_content()?)),
            Event::CData(data) if self.capturing() => Some(SheetEvent::Characters(data.xml_content()?)),
            Event::GeneralRef(reference) if self.capturing() => {
                Some(SheetEvent::Characters(resolve_reference(reference)?))
            }
            _ => None,
        };
        Ok(translated)
    }

    /// Characters count inside `<v>`, or inside a non-phonetic `<t>` of `<is>`.
    fn capturing(&self) -> bool {
        self.value && (!self.inline || self.text)
    }
}

fn cell_start(element: &BytesStart<'_>) -> Result<SheetEvent<'static>, XlsxError> {
    let column = element
        .get_attribute_value("r")?
        .map(|reference| reference_to_column(&reference))
        .transpose()?;
    let kind = CellKind::from_type_attribute(element.get_attribute_value("t")?.as_deref());
    let style = element.get_attribute_value("s")?.and_then(|style| {
        let index = style.trim().parse::<usize>().ok();
        if index.is_none() {
            log::trace!("Ignoring malformed style index '{style}'");
        }
        index
    });
    Ok(SheetEvent::CellStart { column, kind, style })
}
