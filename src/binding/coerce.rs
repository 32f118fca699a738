//! Best-effort conversion from a raw cell value to a field's declared type.
//!
//! Rules follow the usual numeric/string conversion semantics: numbers widen and narrow
//! with range checks, text parses after trimming, floats and decimal text round
//! half-to-even into integers, and anything that cannot be represented yields `None`.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::types::{RowValues, parse_timestamp};

/// Conversion from a [`RowValues`] cell into a concrete field type.
pub trait Coerce: Sized {
    /// `None` means the value cannot be represented as `Self`.
    fn coerce(value: &RowValues) -> Option<Self>;
}

fn float_to_i64(f: f64) -> Option<i64> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round_ties_even();
    // i64::MAX is not exactly representable; 2^63 is the first float past the range.
    if rounded >= -9_223_372_036_854_775_808.0 && rounded < 9_223_372_036_854_775_808.0 {
        #[allow(clippy::cast_possible_truncation)]
        Some(rounded as i64)
    } else {
        None
    }
}

fn float_to_u64(f: f64) -> Option<u64> {
    if !f.is_finite() {
        return None;
    }
    let rounded = f.round_ties_even();
    if rounded >= 0.0 && rounded < 18_446_744_073_709_551_616.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(rounded as u64)
    } else {
        None
    }
}

/// Parse plain decimal text (`-12.50`, `+3`, `7.`) exactly, rounding any fraction to the
/// nearest integer with ties to even. No exponents, no grouping separators.
fn parse_decimal_rounded(text: &str) -> Option<i128> {
    let text = text.trim();
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return None;
    }

    let mut magnitude: i128 = 0;
    for digit in int_part.bytes() {
        magnitude = magnitude
            .checked_mul(10)?
            .checked_add(i128::from(digit - b'0'))?;
    }

    let mut frac = frac_part.bytes();
    if let Some(first) = frac.next() {
        let rest_nonzero = frac.any(|b| b != b'0');
        let round_up = first > b'5' || (first == b'5' && (rest_nonzero || magnitude % 2 == 1));
        if round_up {
            magnitude = magnitude.checked_add(1)?;
        }
    }
    Some(if negative { -magnitude } else { magnitude })
}

fn to_i128(value: &RowValues) -> Option<i128> {
    match value {
        RowValues::Int(i) => Some(i128::from(*i)),
        RowValues::Float(f) => float_to_i64(*f).map(i128::from),
        RowValues::Bool(b) => Some(i128::from(*b)),
        RowValues::Text(s) => parse_decimal_rounded(s),
        RowValues::Null | RowValues::Timestamp(_) | RowValues::JSON(_) | RowValues::Blob(_) => {
            None
        }
    }
}

macro_rules! coerce_signed {
    ($($t:ty),*) => {
        $(
            impl Coerce for $t {
                fn coerce(value: &RowValues) -> Option<Self> {
                    to_i128(value).and_then(|i| <$t>::try_from(i).ok())
                }
            }
        )*
    };
}

coerce_signed!(i8, i16, i32, i64, isize, u8, u16, u32, usize);

impl Coerce for u64 {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Float(f) => float_to_u64(*f),
            other => to_i128(other).and_then(|i| u64::try_from(i).ok()),
        }
    }
}

impl Coerce for f64 {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(i) => Some(*i as f64),
            RowValues::Float(f) => Some(*f),
            RowValues::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            RowValues::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl Coerce for f32 {
    fn coerce(value: &RowValues) -> Option<Self> {
        let f = f64::coerce(value)?;
        if f.is_finite() && f.abs() > f64::from(f32::MAX) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(f as f32)
    }
}

impl Coerce for bool {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Bool(b) => Some(*b),
            RowValues::Int(i) => Some(*i != 0),
            RowValues::Float(f) => Some(*f != 0.0),
            RowValues::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

impl Coerce for String {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Text(s) => Some(s.clone()),
            RowValues::Int(i) => Some(i.to_string()),
            RowValues::Float(f) => Some(f.to_string()),
            RowValues::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
            RowValues::Timestamp(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            RowValues::JSON(v) => Some(v.to_string()),
            RowValues::Null | RowValues::Blob(_) => None,
        }
    }
}

impl Coerce for NaiveDateTime {
    fn coerce(value: &RowValues) -> Option<Self> {
        value.as_timestamp()
    }
}

impl Coerce for NaiveDate {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::Timestamp(dt) => Some(dt.date()),
            RowValues::Text(s) => parse_timestamp(s).map(|dt| dt.date()),
            _ => None,
        }
    }
}

impl Coerce for Vec<u8> {
    fn coerce(value: &RowValues) -> Option<Self> {
        value.as_blob().map(<[u8]>::to_vec)
    }
}

impl Coerce for JsonValue {
    fn coerce(value: &RowValues) -> Option<Self> {
        match value {
            RowValues::JSON(v) => Some(v.clone()),
            RowValues::Text(s) => serde_json::from_str(s).ok(),
            _ => None,
        }
    }
}

impl Coerce for RowValues {
    fn coerce(value: &RowValues) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: Coerce> Coerce for Option<T> {
    fn coerce(value: &RowValues) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::coerce(value).map(Some)
        }
    }
}
