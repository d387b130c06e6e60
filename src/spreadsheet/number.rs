//! Numeric cell interpretation: serial numbers, display text and dates.

use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::decimal::Decimal;
use crate::spreadsheet::decimal::Rounding;
use crate::spreadsheet::styles::NumberFormat;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;

/// Significant digits kept from the serialized cell value.
const SIGNIFICANT_DIGITS: usize = 15;

/// Milliseconds per day.
const DAY_MILLIS: i64 = 86_400_000;

/// Largest serial number with a representable date (9999-12-31).
const MAX_SERIAL: f64 = 2_958_466.0;

/// Epoch of a workbook's serial dates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DateSystem {
    /// Serial 1 is 1900-01-01; serial 60 is the phantom 1900-02-29 inherited
    /// from Lotus 1-2-3.
    #[default]
    V1900,
    /// Serial 0 is 1904-01-01.
    V1904,
}

impl DateSystem {
    /// Converts a serial number to a date-time, rounded to the millisecond.
    ///
    /// Returns `None` for negative or out-of-range serials. The phantom
    /// 1900-02-29 (serial 60) reads as 1900-03-01.
    pub fn to_datetime(self, serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 || serial >= MAX_SERIAL {
            return None;
        }
        let mut days = serial.floor() as i64;
        let mut millis = ((serial - serial.floor()) * DAY_MILLIS as f64).round() as i64;
        if millis >= DAY_MILLIS {
            days += 1;
            millis -= DAY_MILLIS;
        }
        let (epoch, offset) = match self {
            DateSystem::V1900 if days < 61 => (NaiveDate::from_ymd_opt(1899, 12, 31)?, days),
            DateSystem::V1900 => (NaiveDate::from_ymd_opt(1899, 12, 31)?, days - 1),
            DateSystem::V1904 => (NaiveDate::from_ymd_opt(1904, 1, 1)?, days),
        };
        let date = epoch.checked_add_signed(Duration::try_days(offset)?)?;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(
            (millis / 1_000) as u32,
            (millis % 1_000) as u32 * 1_000_000,
        )?;
        Some(date.and_time(time))
    }
}

/// Parses a raw numeric token to 15 significant digits, half to even.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let mut decimal = Decimal::parse(raw)?;
    decimal.round_significant(SIGNIFICANT_DIGITS, Rounding::HalfEven);
    decimal.to_f64()
}

/// Builds the cell value of a numeric cell.
///
/// Without a format the raw token is the display text. A token that is not a
/// number degrades to a descriptive text value.
pub(crate) fn interpret(raw: &str, format: Option<&NumberFormat>, date_system: DateSystem) -> CellValue {
    let Some(number) = parse_number(raw) else {
        log::warn!("Unparsable numeric cell value '{raw}'");
        return CellValue::from_text(format!("Failed to parse number '{raw}'"));
    };
    let text = match format {
        Some(format) => format.render(number, date_system),
        None => raw.to_owned(),
    };
    let date = format
        .filter(|format| format.is_date_time())
        .and_then(|_| date_system.to_datetime(number));
    CellValue::new(text, Some(number), date)
}
