//! # xlsx_stream
//!
//! A forward-only row reader for xlsx worksheets that keeps memory bounded by
//! the width of a row rather than the size of the sheet.
//!
//! ## Features
//!
//! - **Streaming**: worksheet XML is pulled one event at a time, and only the
//!   current row plus one row of lookahead are ever materialized
//! - **Header driven width**: the first row names the columns, and every later
//!   row is padded or cut to that width
//! - **Display text**: each cell carries the text a spreadsheet application
//!   would show, alongside the parsed number and date where they apply
//! - **Shared strings and styles**: string tables, custom number formats and
//!   the 1904 date system are resolved from the package
//!
//! ## Example
//!
//! ```no_run
//! use xlsx_stream::XlsxPackage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut package = XlsxPackage::open("report.xlsx")?;
//! let mut sheet = package.open_sheet("2009")?;
//! let header: Vec<String> = sheet.columns().iter().map(|cell| cell.to_string()).collect();
//! println!("{}", header.join(", "));
//! for row in sheet {
//!     let row = row?;
//!     println!("{}", row.iter().map(|cell| cell.text()).collect::<Vec<_>>().join(", "));
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod helpers;
mod spreadsheet;

pub use error::SheetDecodeError;
pub use error::XlsxError;
pub use helpers::xml::XmlError;
pub use spreadsheet::CellValue;
pub use spreadsheet::DateSystem;
pub use spreadsheet::ReadOptions;
pub use spreadsheet::Row;
pub use spreadsheet::SheetReader;
pub use spreadsheet::XlsxPackage;
