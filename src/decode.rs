//! Pure conversions from raw sentence fields to derived values.
//!
//! Every function returns `None` instead of failing when its input cannot be
//! converted.

use chrono::{NaiveDate, NaiveDateTime};
use std::str::FromStr;

const MINUTES_PER_DEGREE: f64 = 60.0;
const COORD_DECIMALS: i32 = 6;
const CENTURY_PREFIX: &str = "20";
const MAX_YEAR: i32 = 9999;

/// The cardinal directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardDir {
    North,
    South,
    East,
    West,
}

impl CardDir {
    /// Any indicator containing an `s` (any case) is south, everything else
    /// north.
    pub fn latitude(indicator: &str) -> Self {
        if indicator.to_ascii_lowercase().contains('s') {
            CardDir::South
        } else {
            CardDir::North
        }
    }

    /// Any indicator containing a `w` (any case) is west, everything else
    /// east.
    pub fn longitude(indicator: &str) -> Self {
        if indicator.to_ascii_lowercase().contains('w') {
            CardDir::West
        } else {
            CardDir::East
        }
    }

    #[inline]
    pub fn get_sign(&self) -> f64 {
        match self {
            CardDir::North | CardDir::East => 1.0,
            CardDir::South | CardDir::West => -1.0,
        }
    }
}

/// Left-pad `raw` with zeros to two characters. Longer values are kept as is.
#[inline]
pub fn zero_pad(raw: &str) -> String {
    format!("{:0>2}", raw)
}

/// Zero-pad every part and join them with `sep`.
pub fn join_padded(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| zero_pad(p))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Parse a decimal number, accepting `,` as the decimal mark.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    f64::from_str(&raw.replace(',', ".")).ok()
}

/// `degrees + minutes / 60`, rounded to six decimal places and signed by
/// `dir`.
pub fn decimal_degrees(degrees: &str, minutes: &str, dir: CardDir) -> Option<f64> {
    let degrees = parse_decimal(degrees)?;
    let minutes = parse_decimal(minutes)?;
    let value = round_to(degrees + minutes / MINUTES_PER_DEGREE, COORD_DECIMALS);
    Some(value * dir.get_sign())
}

/// Round half away from zero to `decimals` places.
#[inline]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// `whole + decimal / 100`.
///
/// The decimal part is always divided by 100, whatever its digit count:
/// `12` and `34` give 12.34, `12` and `5` give 12.05 and `12` and `345` give
/// 15.45. Existing campaign files were recorded with this divisor. Both parts
/// must be plain digit runs of any length.
pub fn hundredths(whole: &str, decimal: &str) -> Option<f64> {
    Some(digits(whole)? + digits(decimal)? / 100.0)
}

fn digits(raw: &str) -> Option<f64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    f64::from_str(raw).ok()
}

/// Render a number the way campaign files store them, which is Python's
/// float `repr`: shortest round-trip digits, integral values keeping one
/// decimal (`12.0`, `-0.0`), and scientific notation with a signed two-digit
/// exponent below `1e-4` or from `1e16` on (`5e-06`, `1e+16`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{:e}", value);
    let (mantissa, exponent) = match sci.find('e') {
        Some(at) => (&sci[..at], i32::from_str(&sci[at + 1..]).unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if value != 0.0 && (exponent < -4 || exponent >= 16) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Calendar timestamp from sentence fields whose year carries only the
/// last digits of a year in the 2000s.
pub fn date_time_2000s(
    year: &str,
    month: &str,
    day: &str,
    hour: &str,
    minute: &str,
    second: &str,
) -> Option<NaiveDateTime> {
    let year = i32::from_str(&format!("{}{}", CENTURY_PREFIX, year)).ok()?;
    if year < 1 || year > MAX_YEAR {
        return None;
    }
    NaiveDate::from_ymd_opt(year, u32::from_str(month).ok()?, u32::from_str(day).ok()?)?.and_hms_opt(
        u32::from_str(hour).ok()?,
        u32::from_str(minute).ok()?,
        u32::from_str(second).ok()?,
    )
}
