//! Number format patterns such as `#,##0.00`, `m/d/yy h:mm` or
//! `0.00%;[Red]-0.00%`.
//!
//! A pattern holds up to four `;`-separated sections. A number picks its
//! section by sign, or by explicit `[>=100]` conditions, and is rendered
//! through that section's tokens. Colors, fill characters and locale tags are
//! parsed and dropped.

use crate::spreadsheet::decimal::Decimal;
use crate::spreadsheet::decimal::Rounding;
use crate::spreadsheet::number::DateSystem;
use chrono::Datelike;
use chrono::NaiveDate;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const SECONDS_PER_DAY: i64 = 86_400;

/// Significant digits shown by the General format.
const GENERAL_DIGITS: usize = 11;

#[derive(Copy, Clone, Debug, PartialEq)]
enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Literal(String),
    General,
    /// `@`
    Text,
    /// `0`: digit or zero
    Zero,
    /// `#`: digit or nothing
    Hash,
    /// `?`: digit or space
    Question,
    Point,
    Comma,
    Percent,
    Exponent { plus: bool },
    Slash,
    Year(usize),
    Month(usize),
    Day(usize),
    Hour(usize),
    Minute(usize),
    Second(usize),
    SubSecond(usize),
    Meridiem { am: String, pm: String },
    /// `[h]`, `[mm]`, `[ss]`: durations not wrapped at day/hour/minute
    Elapsed(TimeUnit, usize),
}

impl Token {
    fn is_placeholder(&self) -> bool {
        matches!(self, Token::Zero | Token::Hash | Token::Question)
    }

    fn is_date_time(&self) -> bool {
        matches!(
            self,
            Token::Year(_)
                | Token::Month(_)
                | Token::Day(_)
                | Token::Hour(_)
                | Token::Minute(_)
                | Token::Second(_)
                | Token::SubSecond(_)
                | Token::Meridiem { .. }
                | Token::Elapsed(..)
        )
    }

    /// Date or time fields used to tell minutes from months.
    fn is_field(&self) -> bool {
        self.is_date_time() && !matches!(self, Token::SubSecond(_) | Token::Meridiem { .. })
    }

    fn is_hour(&self) -> bool {
        matches!(self, Token::Hour(_) | Token::Elapsed(TimeUnit::Hours, _))
    }

    fn is_second(&self) -> bool {
        matches!(self, Token::Second(_) | Token::Elapsed(TimeUnit::Seconds, _))
    }
}

/// Verbatim text of a token outside its usual role, e.g. `/` in a date.
fn push_token_text(out: &mut String, token: &Token) {
    match token {
        Token::Literal(text) => out.push_str(text),
        Token::Zero => out.push('0'),
        Token::Hash => out.push('#'),
        Token::Question => out.push('?'),
        Token::Point => out.push('.'),
        Token::Comma => out.push(','),
        Token::Percent => out.push('%'),
        Token::Slash => out.push('/'),
        _ => (),
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Comparison {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Condition {
    comparison: Comparison,
    threshold: f64,
}

impl Condition {
    fn parse(text: &str) -> Option<Condition> {
        let operators = [
            ("<=", Comparison::LessEqual),
            (">=", Comparison::GreaterEqual),
            ("<>", Comparison::NotEqual),
            ("<", Comparison::Less),
            (">", Comparison::Greater),
            ("=", Comparison::Equal),
        ];
        let (rest, comparison) = operators
            .iter()
            .find_map(|(operator, comparison)| Some((text.strip_prefix(operator)?, *comparison)))?;
        let threshold = rest.trim().parse::<f64>().ok()?;
        Some(Condition { comparison, threshold })
    }

    fn matches(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Less => value < self.threshold,
            Comparison::LessEqual => value <= self.threshold,
            Comparison::Greater => value > self.threshold,
            Comparison::GreaterEqual => value >= self.threshold,
            Comparison::Equal => value == self.threshold,
            Comparison::NotEqual => value != self.threshold,
        }
    }
}

/// Returns the unit of an elapsed-time bracket (`h`, `mm`, `sss`).
fn elapsed_unit(content: &str) -> Option<TimeUnit> {
    let first = content.chars().next()?;
    if !content.chars().all(|c| c.eq_ignore_ascii_case(&first)) {
        return None;
    }
    match first.to_ascii_lowercase() {
        'h' => Some(TimeUnit::Hours),
        'm' => Some(TimeUnit::Minutes),
        's' => Some(TimeUnit::Seconds),
        _ => None,
    }
}

/// Returns true if the pattern renders dates or times.
///
/// Quoted text, escaped characters and bracketed colors, conditions and
/// locales are skipped; any remaining year, month, day, hour or second letter
/// (or an elapsed-time bracket) marks a date pattern.
pub(crate) fn is_date_time_pattern(pattern: &str) -> bool {
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut bracket: Option<usize> = None;
    for (index, character) in pattern.char_indices() {
        match character {
            _ if is_escaped => is_escaped = false,
            '"' if bracket.is_none() => is_literal = !is_literal,
            _ if is_literal => (),

            ']' if bracket.is_some() => {
                let start = bracket.take().unwrap_or(index);
                if elapsed_unit(&pattern[start..index]).is_some() {
                    return true;
                }
            }
            _ if bracket.is_some() => (),
            '[' => bracket = Some(index + 1),

            '_' | '\\' | '*' => is_escaped = true,
            'Y' | 'y' | 'M' | 'm' | 'D' | 'd' | 'H' | 'h' | 'S' | 's' => return true,
            _ => (),
        }
    }
    false
}

/// Splits a pattern on `;` outside quotes, brackets and escapes.
fn split_sections(pattern: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_bracket = false;
    for (index, character) in pattern.char_indices() {
        match character {
            _ if is_escaped => is_escaped = false,
            '"' => is_literal = !is_literal,
            _ if is_literal => (),
            '\\' | '_' | '*' => is_escaped = true,
            '[' => is_bracket = true,
            ']' => is_bracket = false,
            ';' if !is_bracket => {
                sections.push(&pattern[start..index]);
                start = index + 1;
            }
            _ => (),
        }
    }
    sections.push(&pattern[start..]);
    sections
}

fn starts_with_ignore_case(chars: &[char], prefix: &str) -> bool {
    let prefix: Vec<char> = prefix.chars().collect();
    chars.len() >= prefix.len()
        && chars
            .iter()
            .zip(&prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

fn push_literal(tokens: &mut Vec<Token>, text: &str) {
    if text.is_empty() {
        return;
    }
    match tokens.last_mut() {
        Some(Token::Literal(literal)) => literal.push_str(text),
        _ => tokens.push(Token::Literal(text.to_owned())),
    }
}

fn tokenize(section: &str) -> (Vec<Token>, Option<Condition>) {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut condition = None;
    let mut index = 0;

    while index < chars.len() {
        let character = chars[index];
        let rest = &chars[index..];
        index += 1;
        let run = 1 + chars[index..]
            .iter()
            .take_while(|c| c.eq_ignore_ascii_case(&character))
            .count();

        let token = match character {
            '"' => {
                let end = chars[index..]
                    .iter()
                    .position(|&c| c == '"')
                    .map_or(chars.len(), |offset| index + offset);
                push_literal(&mut tokens, &chars[index..end].iter().collect::<String>());
                index = end + 1;
                continue;
            }
            '\\' => {
                if let Some(escaped) = chars.get(index) {
                    push_literal(&mut tokens, &escaped.to_string());
                    index += 1;
                }
                continue;
            }
            '_' => {
                if index < chars.len() {
                    push_literal(&mut tokens, " ");
                    index += 1;
                }
                continue;
            }
            '*' => {
                index += 1;
                continue;
            }
            '[' => {
                let end = chars[index..]
                    .iter()
                    .position(|&c| c == ']')
                    .map_or(chars.len(), |offset| index + offset);
                let content: String = chars[index..end].iter().collect();
                index = end + 1;
                if let Some(locale) = content.strip_prefix('$') {
                    let symbol = locale.split('-').next().unwrap_or_default();
                    push_literal(&mut tokens, symbol);
                } else if let Some(unit) = elapsed_unit(&content) {
                    tokens.push(Token::Elapsed(unit, content.chars().count()));
                } else if content.starts_with(['<', '>', '=']) {
                    condition = Condition::parse(&content);
                }
                continue;
            }
            '0' => Token::Zero,
            '#' => Token::Hash,
            '?' => Token::Question,
            ',' => Token::Comma,
            '%' => Token::Percent,
            '/' => Token::Slash,
            '@' => Token::Text,
            '.' => {
                let after_second = tokens
                    .iter()
                    .rev()
                    .find(|token| !matches!(token, Token::Literal(_)))
                    .is_some_and(Token::is_second);
                let zeros = chars[index..].iter().take_while(|&&c| c == '0').count();
                if after_second && zeros > 0 {
                    index += zeros;
                    Token::SubSecond(zeros)
                } else {
                    Token::Point
                }
            }
            'E' | 'e' if matches!(chars.get(index), Some('+' | '-')) => {
                let plus = chars[index] == '+';
                index += 1;
                Token::Exponent { plus }
            }
            'G' | 'g' if starts_with_ignore_case(rest, "general") => {
                index += 6;
                Token::General
            }
            'A' | 'a' if starts_with_ignore_case(rest, "am/pm") => {
                index += 4;
                Token::Meridiem {
                    am: rest[..2].iter().collect(),
                    pm: rest[3..5].iter().collect(),
                }
            }
            'A' | 'a' if starts_with_ignore_case(rest, "a/p") => {
                index += 2;
                Token::Meridiem {
                    am: rest[0].to_string(),
                    pm: rest[2].to_string(),
                }
            }
            'Y' | 'y' | 'M' | 'm' | 'D' | 'd' | 'H' | 'h' | 'S' | 's' => {
                index += run - 1;
                match character.to_ascii_lowercase() {
                    'y' => Token::Year(run),
                    'm' => Token::Month(run),
                    'd' => Token::Day(run),
                    'h' => Token::Hour(run),
                    _ => Token::Second(run),
                }
            }
            other => {
                push_literal(&mut tokens, &other.to_string());
                continue;
            }
        };
        tokens.push(token);
    }

    resolve_minutes(&mut tokens);
    (tokens, condition)
}

/// `m` means minutes right after an hour or right before a second.
fn resolve_minutes(tokens: &mut [Token]) {
    for index in 0..tokens.len() {
        let Token::Month(count) = &tokens[index] else {
            continue;
        };
        let count = *count;
        let after_hour = tokens[..index]
            .iter()
            .rev()
            .find(|token| token.is_field())
            .is_some_and(Token::is_hour);
        let before_second = tokens[index + 1..]
            .iter()
            .find(|token| token.is_field())
            .is_some_and(Token::is_second);
        if after_hour || before_second {
            tokens[index] = Token::Minute(count);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum SectionKind {
    General,
    Text,
    Number,
    Scientific,
    Fraction,
    DateTime,
    Literal,
}

#[derive(Debug)]
struct Section {
    tokens: Vec<Token>,
    condition: Option<Condition>,
    kind: SectionKind,
    /// Thousands separators between integer digits.
    grouping: bool,
    /// Power of ten applied before rendering (`%` and trailing commas).
    scale: i32,
}

impl Section {
    fn parse(text: &str) -> Section {
        let (mut tokens, condition) = tokenize(text);
        let has = |predicate: fn(&Token) -> bool| tokens.iter().any(predicate);

        let kind = if has(Token::is_date_time) {
            SectionKind::DateTime
        } else if has(|token| *token == Token::General) {
            SectionKind::General
        } else if has(|token| matches!(token, Token::Exponent { .. })) && has(Token::is_placeholder) {
            SectionKind::Scientific
        } else if has(|token| *token == Token::Slash) && has(Token::is_placeholder) {
            SectionKind::Fraction
        } else if has(Token::is_placeholder) {
            SectionKind::Number
        } else if has(|token| *token == Token::Text) {
            SectionKind::Text
        } else {
            SectionKind::Literal
        };

        let mut grouping = false;
        let mut thousands = 0;
        if matches!(kind, SectionKind::Number | SectionKind::Scientific | SectionKind::Fraction) {
            (grouping, thousands) = resolve_commas(&mut tokens);
        }
        let percents = tokens.iter().filter(|token| **token == Token::Percent).count() as i32;

        Section {
            tokens,
            condition,
            kind,
            grouping,
            scale: 2 * percents - 3 * thousands,
        }
    }

    fn render(&self, value: f64, date_system: DateSystem) -> String {
        match self.kind {
            SectionKind::General | SectionKind::Text => {
                let mut out = String::new();
                for token in &self.tokens {
                    match token {
                        Token::General | Token::Text => out.push_str(&general(value)),
                        other => push_token_text(&mut out, other),
                    }
                }
                out
            }
            SectionKind::Literal => {
                let mut out = String::new();
                self.tokens.iter().for_each(|token| push_token_text(&mut out, token));
                out
            }
            SectionKind::Number => self.render_number(value),
            SectionKind::Scientific => self.render_scientific(value),
            SectionKind::Fraction => self.render_fraction(value),
            SectionKind::DateTime => self
                .render_date_time(value, date_system)
                .unwrap_or_else(|| general(value)),
        }
    }

    fn render_number(&self, value: f64) -> String {
        let places = placeholders_after_point(&self.tokens);
        let mut decimal = Decimal::from_f64(value);
        decimal.shift(self.scale);
        decimal.round_fraction(places, Rounding::HalfUp);

        let mut out = String::new();
        if value < 0.0 {
            out.push('-');
        }
        write_fixed(
            &mut out,
            &self.tokens,
            &decimal.integer_digits(),
            &decimal.fraction_digits(places),
            self.grouping,
        );
        out
    }

    fn render_scientific(&self, value: f64) -> String {
        let split = self
            .tokens
            .iter()
            .position(|token| matches!(token, Token::Exponent { .. }))
            .unwrap_or(self.tokens.len());
        let (mantissa_tokens, exponent_tokens) = self.tokens.split_at(split);
        let plus = matches!(exponent_tokens.first(), Some(Token::Exponent { plus: true }));

        let point = mantissa_tokens
            .iter()
            .position(|token| *token == Token::Point)
            .unwrap_or(mantissa_tokens.len());
        let integer_slots = mantissa_tokens[..point].iter().filter(|t| t.is_placeholder()).count() as i32;
        let places = placeholders_after_point(mantissa_tokens);
        let engineering = integer_slots > 1 && mantissa_tokens[..point].contains(&Token::Hash);
        let (step, limit) = if engineering {
            (integer_slots, integer_slots)
        } else {
            (1, integer_slots.max(1))
        };

        let mut decimal = Decimal::from_f64(value);
        decimal.shift(self.scale);
        let mut exponent = 0;
        if !decimal.is_zero() {
            let magnitude = decimal.magnitude();
            exponent = if engineering {
                magnitude.div_euclid(step) * step
            } else {
                magnitude - (limit - 1)
            };
            let mut mantissa = decimal.clone();
            mantissa.shift(-exponent);
            mantissa.round_fraction(places, Rounding::HalfUp);
            if mantissa.magnitude() >= limit {
                exponent += step;
                mantissa = decimal.clone();
                mantissa.shift(-exponent);
                mantissa.round_fraction(places, Rounding::HalfUp);
            }
            decimal = mantissa;
        }

        let mut out = String::new();
        if value < 0.0 {
            out.push('-');
        }
        write_fixed(
            &mut out,
            mantissa_tokens,
            &decimal.integer_digits(),
            &decimal.fraction_digits(places),
            self.grouping,
        );
        out.push('E');
        if exponent < 0 {
            out.push('-');
        } else if plus {
            out.push('+');
        }
        let width = exponent_tokens.iter().filter(|token| **token == Token::Zero).count();
        let mut written = false;
        for token in exponent_tokens.iter().skip(1) {
            if token.is_placeholder() {
                if !written {
                    out.push_str(&format!("{:0width$}", exponent.unsigned_abs()));
                    written = true;
                }
            } else {
                push_token_text(&mut out, token);
            }
        }
        out
    }

    fn render_fraction(&self, value: f64) -> String {
        let tokens = &self.tokens;
        let slash = tokens
            .iter()
            .position(|token| *token == Token::Slash)
            .unwrap_or(tokens.len());
        let numerator_start = tokens[..slash]
            .iter()
            .rposition(|token| !token.is_placeholder())
            .map_or(0, |index| index + 1);
        let numerator_tokens = &tokens[numerator_start..slash];
        let first_placeholder = tokens
            .iter()
            .position(Token::is_placeholder)
            .unwrap_or(numerator_start);
        let has_integer = first_placeholder < numerator_start;

        // Denominator: `?`/`#`/`0` digits, or a fixed number like `/100`.
        let after_slash = tokens.get(slash + 1..).unwrap_or_default();
        let mut fixed_text = String::new();
        let mut denominator_len = 0;
        for token in after_slash {
            match token {
                Token::Literal(text) if text.bytes().all(|b| b.is_ascii_digit()) => fixed_text.push_str(text),
                Token::Zero if !fixed_text.is_empty() => fixed_text.push('0'),
                token if token.is_placeholder() && fixed_text.is_empty() => (),
                _ => break,
            }
            denominator_len += 1;
        }
        let denominator_tokens = &after_slash[..denominator_len];
        let fixed = fixed_text.parse::<u64>().ok().filter(|&denominator| denominator > 0);

        let magnitude = value.abs();
        let (mut whole, fraction) = match Decimal::from_f64(magnitude).split() {
            Some(parts) if has_integer => parts,
            None if has_integer => (magnitude.trunc() as u64, magnitude.fract()),
            _ => (0, magnitude),
        };
        let (mut numerator, denominator) = match fixed {
            Some(denominator) => ((fraction * denominator as f64).round() as u64, denominator),
            None => best_fraction(fraction, denominator_tokens.len()),
        };
        if has_integer && numerator == denominator {
            whole += 1;
            numerator = 0;
        }

        let mut out = String::new();
        if value < 0.0 {
            out.push('-');
        }
        tokens[..first_placeholder]
            .iter()
            .for_each(|token| push_token_text(&mut out, token));
        let suffix = &after_slash[denominator_len..];

        if has_integer {
            let integer_tokens = &tokens[first_placeholder..numerator_start];
            if whole > 0 || numerator == 0 || integer_tokens.contains(&Token::Zero) {
                out.push_str(&whole.to_string());
            }
            if numerator == 0 {
                suffix.iter().for_each(|token| push_token_text(&mut out, token));
                return out;
            }
            integer_tokens
                .iter()
                .filter(|token| !token.is_placeholder())
                .for_each(|token| push_token_text(&mut out, token));
        }

        let padded = |tokens: &[Token]| tokens.contains(&Token::Question);
        let width = numerator_tokens.len();
        if padded(numerator_tokens) {
            out.push_str(&format!("{numerator:>width$}"));
        } else {
            out.push_str(&numerator.to_string());
        }
        out.push('/');
        let width = denominator_tokens.len();
        if fixed.is_none() && padded(denominator_tokens) {
            out.push_str(&format!("{denominator:<width$}"));
        } else {
            out.push_str(&denominator.to_string());
        }
        suffix.iter().for_each(|token| push_token_text(&mut out, token));
        out
    }

    fn render_date_time(&self, value: f64, date_system: DateSystem) -> Option<String> {
        if value < 0.0 {
            return None;
        }
        let precision = self
            .tokens
            .iter()
            .filter_map(|token| match token {
                Token::SubSecond(count) => Some(*count),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            .min(3);
        let units_per_second = 10_i64.pow(precision as u32);
        let total = (value * (SECONDS_PER_DAY * units_per_second) as f64).round();
        if total >= i64::MAX as f64 {
            return None;
        }
        let total = total as i64;
        let seconds = total / units_per_second;
        let sub_second = total % units_per_second;

        let needs_date = self
            .tokens
            .iter()
            .any(|token| matches!(token, Token::Year(_) | Token::Month(_) | Token::Day(_)));
        let date: Option<NaiveDate> = if needs_date {
            Some(date_system.to_datetime((seconds / SECONDS_PER_DAY) as f64)?.date())
        } else {
            None
        };

        let time_of_day = seconds % SECONDS_PER_DAY;
        let hour = time_of_day / 3_600;
        let minute = time_of_day % 3_600 / 60;
        let second = time_of_day % 60;
        let twelve_hour = self
            .tokens
            .iter()
            .any(|token| matches!(token, Token::Meridiem { .. }));

        let mut out = String::new();
        for token in &self.tokens {
            match (token, date) {
                (Token::Year(count), Some(date)) if *count <= 2 => {
                    out.push_str(&format!("{:02}", date.year().rem_euclid(100)));
                }
                (Token::Year(_), Some(date)) => out.push_str(&format!("{:04}", date.year())),
                (Token::Month(count), Some(date)) => {
                    let name = MONTH_NAMES[date.month0() as usize];
                    match count {
                        1 => out.push_str(&date.month().to_string()),
                        2 => out.push_str(&format!("{:02}", date.month())),
                        3 => out.push_str(&name[..3]),
                        4 => out.push_str(name),
                        _ => out.push_str(&name[..1]),
                    }
                }
                (Token::Day(count), Some(date)) => {
                    let name = DAY_NAMES[date.weekday().num_days_from_monday() as usize];
                    match count {
                        1 => out.push_str(&date.day().to_string()),
                        2 => out.push_str(&format!("{:02}", date.day())),
                        3 => out.push_str(&name[..3]),
                        _ => out.push_str(name),
                    }
                }
                (Token::Hour(count), _) => {
                    let hour = if twelve_hour { (hour + 11) % 12 + 1 } else { hour };
                    out.push_str(&pad(hour, *count));
                }
                (Token::Minute(count), _) => out.push_str(&pad(minute, *count)),
                (Token::Second(count), _) => out.push_str(&pad(second, *count)),
                (Token::SubSecond(count), _) => {
                    let digits = format!("{sub_second:0precision$}");
                    out.push('.');
                    out.push_str(&digits[..(*count).min(precision)]);
                }
                (Token::Meridiem { am, pm }, _) => out.push_str(if hour < 12 { am } else { pm }),
                (Token::Elapsed(unit, count), _) => {
                    let elapsed = match unit {
                        TimeUnit::Hours => seconds / 3_600,
                        TimeUnit::Minutes => seconds / 60,
                        TimeUnit::Seconds => seconds,
                    };
                    let width = *count;
                    out.push_str(&format!("{elapsed:0width$}"));
                }
                (other, _) => push_token_text(&mut out, other),
            }
        }
        Some(out)
    }
}

/// Replaces commas: between digits they group thousands, after the last
/// integer digit each one divides by a thousand, elsewhere they are literal.
fn resolve_commas(tokens: &mut Vec<Token>) -> (bool, i32) {
    let mut grouping = false;
    let mut thousands = 0;
    let mut seen_placeholder = false;
    let mut resolved = Vec::with_capacity(tokens.len());
    for (index, token) in tokens.iter().enumerate() {
        if token.is_placeholder() {
            seen_placeholder = true;
        }
        if *token != Token::Comma {
            resolved.push(token.clone());
            continue;
        }
        let rest = &tokens[index + 1..];
        let before_digit = rest.first().is_some_and(Token::is_placeholder);
        let trailing = !rest
            .iter()
            .take_while(|token| !matches!(token, Token::Point | Token::Exponent { .. }))
            .any(Token::is_placeholder);
        if seen_placeholder && before_digit {
            grouping = true;
        } else if seen_placeholder && trailing {
            thousands += 1;
        } else {
            push_literal(&mut resolved, ",");
        }
    }
    *tokens = resolved;
    (grouping, thousands)
}

fn placeholders_after_point(tokens: &[Token]) -> usize {
    tokens
        .iter()
        .skip_while(|token| **token != Token::Point)
        .filter(|token| token.is_placeholder())
        .count()
}

fn pad(value: i64, count: usize) -> String {
    if count >= 2 {
        format!("{value:02}")
    } else {
        value.to_string()
    }
}

/// Writes integer and fraction digits into the placeholders of `tokens`.
///
/// The leftmost integer placeholder takes every digit that does not fit.
/// Missing digits print as `0` for `0`, a space for `?` and nothing for `#`.
fn write_fixed(out: &mut String, tokens: &[Token], integer: &str, fraction: &str, grouping: bool) {
    let point = tokens
        .iter()
        .position(|token| *token == Token::Point)
        .unwrap_or(tokens.len());
    let integer_slots = tokens[..point].iter().filter(|t| t.is_placeholder()).count();
    let digits: Vec<char> = integer.chars().collect();
    let fraction: Vec<char> = fraction.chars().collect();
    let significant = fraction.iter().rposition(|&d| d != '0').map_or(0, |index| index + 1);
    let digit_at = |position: usize| digits.len().checked_sub(position + 1).map(|index| digits[index]);

    let write_integer = |out: &mut String, token: &Token, lowest: usize, highest: usize| {
        for position in (lowest..=highest).rev() {
            let character = match (digit_at(position), token) {
                (Some(digit), _) => digit,
                (None, Token::Zero) => '0',
                (None, Token::Question) => ' ',
                _ => continue,
            };
            out.push(character);
            if grouping && character != ' ' && position > 0 && position % 3 == 0 {
                out.push(',');
            }
        }
    };

    let mut slot = 0;
    let mut fraction_slot = 0;
    for (index, token) in tokens.iter().enumerate() {
        if index < point && token.is_placeholder() {
            let position = integer_slots - 1 - slot;
            let highest = if slot == 0 {
                digits.len().max(position + 1) - 1
            } else {
                position
            };
            write_integer(out, token, position, highest);
            slot += 1;
        } else if index == point {
            if integer_slots == 0 && !digits.is_empty() {
                write_integer(out, &Token::Hash, 0, digits.len() - 1);
            }
            out.push('.');
        } else if index > point && token.is_placeholder() {
            match (fraction.get(fraction_slot), token) {
                (Some(&digit), _) if fraction_slot < significant => out.push(digit),
                (_, Token::Zero) => out.push('0'),
                (_, Token::Question) => out.push(' '),
                _ => (),
            }
            fraction_slot += 1;
        } else {
            push_token_text(out, token);
        }
    }
}

/// Closest fraction to `value` (in `[0, 1)`) with up to `digits` denominator
/// digits; ties keep the smaller denominator.
fn best_fraction(value: f64, digits: usize) -> (u64, u64) {
    let max_denominator = 10_u64.pow(digits.clamp(1, 4) as u32) - 1;
    let mut best = (value.round() as u64, 1);
    let mut best_error = (value - value.round()).abs();
    for denominator in 2..=max_denominator {
        let numerator = (value * denominator as f64).round();
        let error = (value - numerator / denominator as f64).abs();
        if error < best_error - f64::EPSILON {
            best = (numerator as u64, denominator);
            best_error = error;
        }
    }
    best
}

fn join_digits(integer: String, fraction: &str) -> String {
    let integer = if integer.is_empty() { "0".to_owned() } else { integer };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    }
}

/// General format: up to 11 significant digits, scientific notation for very
/// large or small magnitudes.
pub(crate) fn general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let mut decimal = Decimal::from_f64(value);
    let magnitude = value.abs();
    if (1e-9..1e11).contains(&magnitude) {
        decimal.round_significant(GENERAL_DIGITS, Rounding::HalfUp);
        let digits = join_digits(decimal.integer_digits(), &decimal.fraction_digits(24));
        return format!("{sign}{digits}");
    }

    let mut exponent = decimal.magnitude();
    decimal.shift(-exponent);
    decimal.round_fraction(5, Rounding::HalfUp);
    if decimal.magnitude() > 0 {
        exponent += 1;
        decimal.shift(-1);
    }
    let mantissa = join_digits(decimal.integer_digits(), &decimal.fraction_digits(5));
    let exponent_sign = if exponent < 0 { '-' } else { '+' };
    format!("{sign}{mantissa}E{exponent_sign}{:02}", exponent.unsigned_abs())
}

/// Compiled number format pattern.
#[derive(Debug)]
pub(crate) struct FormatPattern {
    sections: Vec<Section>,
}

impl FormatPattern {
    pub(crate) fn parse(pattern: &str) -> FormatPattern {
        if pattern.trim().is_empty() {
            return FormatPattern {
                sections: vec![Section::parse("General")],
            };
        }
        let sections = split_sections(pattern).into_iter().map(Section::parse).collect();
        FormatPattern { sections }
    }

    /// Renders `value`; falls back to the General format if no section applies.
    pub(crate) fn format(&self, value: f64, date_system: DateSystem) -> String {
        match self.select(value) {
            Some((section, value)) => section.render(value, date_system),
            None => general(value),
        }
    }

    /// Picks the section for `value` and the value it renders. Negative and
    /// zero sections render the magnitude; the sign is theirs to show.
    fn select(&self, value: f64) -> Option<(&Section, f64)> {
        let sections = &self.sections[..self.sections.len().min(3)];
        if sections.iter().any(|section| section.condition.is_some()) {
            return sections
                .iter()
                .find(|section| section.condition.is_some_and(|condition| condition.matches(value)))
                .or_else(|| sections.iter().find(|section| section.condition.is_none()))
                .map(|section| (section, value));
        }
        match sections {
            [] => None,
            [only] => Some((only, value)),
            [_, negative] if value < 0.0 => Some((negative, -value)),
            [positive, _] => Some((positive, value)),
            [_, negative, _] if value < 0.0 => Some((negative, -value)),
            [_, _, zero] if value == 0.0 => Some((zero, value)),
            [positive, ..] => Some((positive, value)),
        }
    }
}
