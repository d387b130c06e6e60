//! Cell style table: style index -> number format.

use crate::error::XlsxError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::format::is_date_time_pattern;
use crate::spreadsheet::format::FormatPattern;
use crate::spreadsheet::number::DateSystem;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use std::sync::Arc;
use zip::ZipArchive;

const STYLES_PART: &str = "xl/styles.xml";

const TAG_CUSTOM_FORMATS: &[u8] = b"numFmts"; // Custom number formats container
const TAG_CUSTOM_FORMAT: &[u8] = b"numFmt"; // Individual custom number format
const TAG_FORMAT_INDEXES: &[u8] = b"cellXfs"; // Cell format indexes container
const TAG_FORMAT_INDEX: &[u8] = b"xf"; // Individual cell format index

/// Built-in number formats by id. Ids missing here have no implicit pattern.
pub(crate) fn builtin_format(id: u32) -> Option<&'static str> {
    let pattern = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => "\"$\"#,##0_);(\"$\"#,##0)",
        6 => "\"$\"#,##0_);[Red](\"$\"#,##0)",
        7 => "\"$\"#,##0.00_);(\"$\"#,##0.00)",
        8 => "\"$\"#,##0.00_);[Red](\"$\"#,##0.00)",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        41 => "_(* #,##0_);_(* (#,##0);_(* \"-\"_);_(@_)",
        42 => "_(\"$\"* #,##0_);_(\"$\"* (#,##0);_(\"$\"* \"-\"_);_(@_)",
        43 => "_(* #,##0.00_);_(* (#,##0.00);_(* \"-\"??_);_(@_)",
        44 => "_(\"$\"* #,##0.00_);_(\"$\"* (#,##0.00);_(\"$\"* \"-\"??_);_(@_)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(pattern)
}

/// Built-in ids that are dates regardless of their pattern text.
fn is_builtin_date_time(id: u32) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

/// Resolved number format of a cell style.
#[derive(Debug)]
pub(crate) struct NumberFormat {
    compiled: FormatPattern,
    date_time: bool,
}

impl NumberFormat {
    pub(crate) fn new(id: u32, pattern: &str) -> Self {
        Self {
            compiled: FormatPattern::parse(pattern),
            date_time: is_builtin_date_time(id) || is_date_time_pattern(pattern),
        }
    }

    /// Whether numbers in this format denote dates or times.
    pub(crate) fn is_date_time(&self) -> bool {
        self.date_time
    }

    /// Display text of `value` in this format.
    pub(crate) fn render(&self, value: f64, date_system: DateSystem) -> String {
        self.compiled.format(value, date_system)
    }
}

/// Number formats indexed by cell style (`<xf>` position in `cellXfs`).
#[derive(Debug, Default)]
pub(crate) struct Styles {
    formats: Vec<Option<Arc<NumberFormat>>>,
}

impl Styles {
    /// Loads `xl/styles.xml`; a package without one has no styles.
    pub(crate) fn load<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Styles, XlsxError> {
        match zip.xml_reader(STYLES_PART)? {
            Some(mut reader) => Self::read(&mut reader),
            None => Ok(Styles::default()),
        }
    }

    pub(crate) fn read<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Styles, XlsxError> {
        let mut custom_formats_context = false;
        let mut custom_formats = HashMap::<u32, String>::new();

        let mut format_indexes_context = false;
        let mut format_indexes = Vec::<Option<u32>>::new();

        match_xml_events!(reader => {
            Event::Start(event) if event.local_name().as_ref() == TAG_CUSTOM_FORMATS => {
                custom_formats_context = true;
            }
            Event::End(event) if event.local_name().as_ref() == TAG_CUSTOM_FORMATS => {
                custom_formats_context = false;
            }
            Event::Start(event) if custom_formats_context && event.local_name().as_ref() == TAG_CUSTOM_FORMAT => {
                let id = event.parse_attribute_value::<u32>("numFmtId")?;
                let format = event.get_attribute_value("formatCode")?;
                if let Some((id, format)) = id.zip(format) {
                    custom_formats.insert(id, format.into_owned());
                }
            }

            Event::Start(event) if event.local_name().as_ref() == TAG_FORMAT_INDEXES => {
                format_indexes_context = true;
            }
            Event::End(event) if event.local_name().as_ref() == TAG_FORMAT_INDEXES => {
                format_indexes_context = false;
            }
            Event::Start(event) if format_indexes_context && event.local_name().as_ref() == TAG_FORMAT_INDEX => {
                format_indexes.push(event.parse_attribute_value::<u32>("numFmtId")?);
            }
        });

        Ok(Self::resolve(format_indexes, custom_formats))
    }

    /// Maps each style's format id to its custom or built-in pattern.
    fn resolve(format_indexes: Vec<Option<u32>>, custom_formats: HashMap<u32, String>) -> Styles {
        let mut resolved = HashMap::<u32, Arc<NumberFormat>>::new();
        let formats = format_indexes
            .into_iter()
            .map(|id| {
                let id = id.unwrap_or(0);
                if let Some(format) = resolved.get(&id) {
                    return Some(Arc::clone(format));
                }
                let pattern = custom_formats
                    .get(&id)
                    .map(String::as_str)
                    .or_else(|| builtin_format(id))?;
                let format = Arc::new(NumberFormat::new(id, pattern));
                resolved.insert(id, Arc::clone(&format));
                Some(format)
            })
            .collect();
        Styles { formats }
    }

    /// Number format of a style index, if the style exists and has a pattern.
    pub(crate) fn format(&self, style: usize) -> Option<Arc<NumberFormat>> {
        self.formats.get(style).and_then(Clone::clone)
    }

    pub(crate) fn len(&self) -> usize {
        self.formats.len()
    }
}
