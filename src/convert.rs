//! Conversion of cell text to typed values.
//!
//! Numeric conversions are exact: the whole text must be consumed, surrounding
//! whitespace and a leading `+` are rejected, and only `.` is accepted as decimal
//! separator.

use std::any::type_name;
use std::borrow::Cow;
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use crate::error::*;

/// Types a [`Cell`](crate::Cell) can be converted to with [`Cell::to`](crate::Cell::to).
///
/// `'t` is the lifetime of the cell's text, which lets borrowed targets such as `&str`
/// point straight into the table.
pub trait FromCell<'t>: Sized {
    fn from_cell(text: &'t str) -> Result<Self>;
}

impl<'t> FromCell<'t> for &'t str {
    fn from_cell(text: &'t str) -> Result<&'t str> {
        Ok(text)
    }
}

impl<'t> FromCell<'t> for Cow<'t, str> {
    fn from_cell(text: &'t str) -> Result<Cow<'t, str>> {
        Ok(Cow::Borrowed(text))
    }
}

impl FromCell<'_> for String {
    fn from_cell(text: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

impl FromCell<'_> for bool {
    fn from_cell(text: &str) -> Result<bool> {
        text.parse().map_err(|_| invalid_format::<bool>(text))
    }
}

fn invalid_format<T>(text: &str) -> Error {
    Error::InvalidFormat { text: text.to_string(), target: type_name::<T>() }
}

fn out_of_range<T>(text: &str) -> Error {
    Error::OutOfRange { text: text.to_string(), target: type_name::<T>() }
}

fn parse_int<T>(text: &str) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    if text.starts_with('+') {
        return Err(invalid_format::<T>(text));
    }
    text.parse().map_err(|err: ParseIntError| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => out_of_range::<T>(text),
        _ => invalid_format::<T>(text),
    })
}

// `inf`/`infinity` spelled out, as opposed to a finite literal too large for the type
fn names_infinity(text: &str) -> bool {
    let magnitude = text.strip_prefix('-').unwrap_or(text);
    magnitude.eq_ignore_ascii_case("inf") || magnitude.eq_ignore_ascii_case("infinity")
}

// a non-zero digit before the exponent, i.e. a literal that must not parse to zero
fn has_nonzero_mantissa(text: &str) -> bool {
    text.bytes()
        .take_while(|&byte| byte != b'e' && byte != b'E')
        .any(|byte| (b'1'..=b'9').contains(&byte))
}

macro_rules! from_cell_int {
    ($($ty:ty),*) => {$(
        impl FromCell<'_> for $ty {
            fn from_cell(text: &str) -> Result<$ty> {
                parse_int(text)
            }
        }
    )*};
}

from_cell_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! from_cell_float {
    ($($ty:ty),*) => {$(
        impl FromCell<'_> for $ty {
            fn from_cell(text: &str) -> Result<$ty> {
                if text.starts_with('+') {
                    return Err(invalid_format::<$ty>(text));
                }
                let value: $ty = text.parse().map_err(|_| invalid_format::<$ty>(text))?;
                if value.is_infinite() && !names_infinity(text) {
                    return Err(out_of_range::<$ty>(text));
                }
                if value == 0.0 && has_nonzero_mantissa(text) {
                    return Err(out_of_range::<$ty>(text));
                }
                Ok(value)
            }
        }
    )*};
}

from_cell_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    fn kind<T: for<'a> FromCell<'a> + std::fmt::Debug>(text: &str) -> &'static str {
        match T::from_cell(text) {
            Ok(_) => "ok",
            Err(Error::InvalidFormat { .. }) => "invalid",
            Err(Error::OutOfRange { .. }) => "range",
            Err(err) => panic!("unexpected error: {:?}", err),
        }
    }

    #[test]
    fn integers() {
        assert_eq!(i32::from_cell("42").unwrap(), 42);
        assert_eq!(i32::from_cell("-17").unwrap(), -17);
        assert_eq!(u64::from_cell("18446744073709551615").unwrap(), u64::MAX);
        assert_eq!(kind::<i32>("abc"), "invalid");
        assert_eq!(kind::<i32>(""), "invalid");
        assert_eq!(kind::<i32>("12abc"), "invalid");
        assert_eq!(kind::<i32>(" 12"), "invalid");
        assert_eq!(kind::<i32>("+12"), "invalid");
        assert_eq!(kind::<i32>("1.0"), "invalid");
        assert_eq!(kind::<u8>("-1"), "invalid");
        assert_eq!(kind::<u8>("256"), "range");
        assert_eq!(kind::<i8>("-129"), "range");
        assert_eq!(kind::<i32>("99999999999"), "range");
    }

    #[test]
    fn error_carries_text_and_target() {
        match i32::from_cell("abc").unwrap_err() {
            Error::InvalidFormat { text, target } => {
                assert_eq!(text, "abc");
                assert_eq!(target, "i32");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn floats() {
        assert_eq!(f64::from_cell("2.5").unwrap(), 2.5);
        assert_eq!(f64::from_cell("-1e3").unwrap(), -1000.0);
        assert_eq!(f64::from_cell("-inf").unwrap(), f64::NEG_INFINITY);
        assert!(f64::from_cell("NaN").unwrap().is_nan());
        assert_eq!(kind::<f64>("2,5"), "invalid");
        assert_eq!(kind::<f64>("1.5x"), "invalid");
        assert_eq!(kind::<f64>("+1.5"), "invalid");
        assert_eq!(kind::<f64>("1e400"), "range");
        assert_eq!(kind::<f32>("1e39"), "range");
        assert_eq!(kind::<f32>("-1e39"), "range");
        assert_eq!(kind::<f64>("1e-400"), "range");
        assert_eq!(kind::<f64>("-1e-400"), "range");
        assert_eq!(kind::<f32>("1e-50"), "range");
        assert_eq!(f64::from_cell("0.0e-400").unwrap(), 0.0);
        assert_eq!(f64::from_cell("-0").unwrap(), 0.0);
    }

    #[test]
    fn booleans() {
        assert!(bool::from_cell("true").unwrap());
        assert!(!bool::from_cell("false").unwrap());
        assert_eq!(kind::<bool>("TRUE"), "invalid");
        assert_eq!(kind::<bool>("1"), "invalid");
    }

    #[test]
    fn text_targets() {
        let text = String::from("hello");
        let borrowed: &str = FromCell::from_cell(text.as_str()).unwrap();
        assert_eq!(borrowed.as_ptr(), text.as_ptr());
        assert!(matches!(<Cow<str>>::from_cell(&text).unwrap(), Cow::Borrowed("hello")));
        assert_eq!(String::from_cell("hello").unwrap(), "hello");
    }
}
