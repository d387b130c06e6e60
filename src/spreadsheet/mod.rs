//! # Worksheet Decoding
//!
//! Reading an xlsx worksheet happens in layers:
//!
//! - [`package`] opens the zip package and locates a worksheet by name
//! - [`workbook`], [`shared_strings`] and [`styles`] load the package-level
//!   tables a worksheet refers to
//! - [`events`] turns raw XML events into a small sheet event vocabulary
//! - [`assembler`] folds those events into fixed-width rows of [`CellValue`]s
//! - [`reader`] drives the pipeline one row at a time, with one row of lookahead
//!
//! Number cells are rendered through [`format`], a compiled subset of the
//! spreadsheet number format language, with date serials converted by
//! [`number`].

pub(crate) mod assembler;
pub(crate) mod cell;
pub(crate) mod decimal;
pub(crate) mod events;
pub(crate) mod format;
pub(crate) mod number;
pub(crate) mod options;
pub(crate) mod package;
pub(crate) mod reader;
pub(crate) mod reference;
pub(crate) mod shared_strings;
pub(crate) mod styles;
pub(crate) mod workbook;

pub use cell::CellValue;
pub use cell::Row;
pub use number::DateSystem;
pub use options::ReadOptions;
pub use package::XlsxPackage;
pub use reader::SheetReader;
