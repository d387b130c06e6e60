//! Decimal digit strings with explicit rounding.
//!
//! Cell values are stored as text-rendered floating point. Rounding them on
//! their decimal digits, rather than on the binary `f64`, keeps half-way cases
//! exact: `0.125` rounded to two places is always a tie.

/// Rounding rule applied when dropping digits.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Rounding {
    /// Ties go to the even neighbour (value parsing).
    HalfEven,
    /// Ties go away from zero (display formatting).
    HalfUp,
}

/// Signed decimal `±0.d1 d2 d3 ... x 10^point`.
///
/// `digits` never has leading or trailing zeros; zero is the empty sequence.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    point: i32,
}

impl Decimal {
    /// Parses a plain or scientific decimal token ("-12.5", "1.5E-3", ".5").
    pub(crate) fn parse(token: &str) -> Option<Decimal> {
        let token = token.trim();
        let (negative, body) = match token.as_bytes().first() {
            Some(b'-') => (true, &token[1..]),
            Some(b'+') => (false, &token[1..]),
            _ => (false, token),
        };
        let (mantissa, exponent) = match body.find(['e', 'E']) {
            Some(index) => (&body[..index], body[index + 1..].parse::<i32>().ok()?),
            None => (body, 0),
        };
        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if integer.is_empty() && fraction.is_empty() {
            return None;
        }
        if !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }

        let digits = integer.bytes().chain(fraction.bytes()).map(|b| b - b'0').collect();
        let point = i32::try_from(integer.len()).ok()?.checked_add(exponent)?;
        let mut decimal = Decimal { negative, digits, point };
        decimal.normalize();
        Some(decimal)
    }

    /// Converts a finite `f64` through its shortest round-trip representation.
    pub(crate) fn from_f64(value: f64) -> Decimal {
        let rendered = format!("{:e}", value.abs());
        let (mantissa, exponent) = rendered.split_once('e').unwrap_or((rendered.as_str(), "0"));
        let digits = mantissa.bytes().filter(u8::is_ascii_digit).map(|b| b - b'0').collect();
        let point = exponent.parse::<i32>().unwrap_or(0) + 1;
        let mut decimal = Decimal {
            negative: value.is_sign_negative(),
            digits,
            point,
        };
        decimal.normalize();
        decimal
    }

    pub(crate) fn to_f64(&self) -> Option<f64> {
        if self.digits.is_empty() {
            return Some(0.0);
        }
        let digits: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();
        let value = format!("0.{digits}e{}", self.point).parse::<f64>().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(if self.negative { -value } else { value })
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Base-10 exponent of the leading digit (`floor(log10(|x|))`), zero for zero.
    pub(crate) fn magnitude(&self) -> i32 {
        if self.is_zero() {
            0
        } else {
            self.point - 1
        }
    }

    /// Multiplies by `10^exponent`.
    pub(crate) fn shift(&mut self, exponent: i32) {
        if !self.is_zero() {
            self.point += exponent;
        }
    }

    /// Keeps at most `count` significant digits.
    pub(crate) fn round_significant(&mut self, count: usize, rounding: Rounding) {
        self.round_at(i64::try_from(count).unwrap_or(i64::MAX), rounding);
    }

    /// Keeps at most `places` digits after the decimal point.
    pub(crate) fn round_fraction(&mut self, places: usize, rounding: Rounding) {
        let places = i64::try_from(places).unwrap_or(i64::MAX);
        self.round_at(i64::from(self.point).saturating_add(places), rounding);
    }

    /// Digits left of the decimal point, without leading zeros ("" for zero).
    pub(crate) fn integer_digits(&self) -> String {
        (0..self.point.max(0) as usize)
            .map(|index| char::from(b'0' + self.digits.get(index).copied().unwrap_or(0)))
            .collect()
    }

    /// The first `places` digits after the decimal point, zero padded.
    pub(crate) fn fraction_digits(&self, places: usize) -> String {
        (0..places as i64)
            .map(|offset| {
                let index = i64::from(self.point) + offset;
                let digit = usize::try_from(index)
                    .ok()
                    .and_then(|index| self.digits.get(index).copied())
                    .unwrap_or(0);
                char::from(b'0' + digit)
            })
            .collect()
    }

    /// Integer and fraction value of `|self|` when it fits in `u64`.
    pub(crate) fn split(&self) -> Option<(u64, f64)> {
        let integer = self.integer_digits();
        let whole = if integer.is_empty() { 0 } else { integer.parse::<u64>().ok()? };
        let mut fraction = Decimal {
            negative: false,
            digits: self.digits.iter().skip(self.point.max(0) as usize).copied().collect(),
            point: self.point.min(0),
        };
        fraction.normalize();
        Some((whole, fraction.to_f64()?))
    }

    fn round_at(&mut self, keep: i64, rounding: Rounding) {
        if keep < 0 {
            self.digits.clear();
            return;
        }
        let keep = keep as usize;
        if self.digits.len() <= keep {
            return;
        }
        let next = self.digits[keep];
        let up = match rounding {
            Rounding::HalfUp => next >= 5,
            Rounding::HalfEven => {
                let rest_nonzero = self.digits[keep + 1..].iter().any(|&d| d != 0);
                let previous_odd = keep > 0 && self.digits[keep - 1] % 2 == 1;
                next > 5 || (next == 5 && (rest_nonzero || previous_odd))
            }
        };
        self.digits.truncate(keep);
        if up {
            let mut carried = true;
            for digit in self.digits.iter_mut().rev() {
                if *digit == 9 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    carried = false;
                    break;
                }
            }
            if carried {
                self.digits.insert(0, 1);
                self.point += 1;
            }
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let leading = self.digits.iter().take_while(|&&d| d == 0).count();
        if leading > 0 {
            self.digits.drain(..leading);
            self.point -= leading as i32;
        }
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        if self.digits.is_empty() {
            self.point = 0;
        }
    }
}
