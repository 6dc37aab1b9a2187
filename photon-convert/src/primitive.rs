//! Range-checked conversions between primitive kinds.
//!
//! [`Primitive`] is the common currency of the primitive strategy: the source
//! value is lifted into a `Primitive` and the target type pulls its own kind out
//! of it. Every narrowing step is range-checked and reports
//! [`Error::Overflow`]; pairs with no sensible meaning (a date as an integer, a
//! character as a float) report [`Error::InvalidCast`].

use std::fmt;

use photon_result::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use crate::datetime::DateTime;
use crate::descriptor::PrimitiveKind;

// i128 covers every integral kind; floats beyond this are out of range anyway.
const I128_FLOAT_LIMIT: f64 = 1.7e38;

/// A value of one of the primitive kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Bool(bool),
    Char(char),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    DateTime(DateTime),
    String(String),
}

macro_rules! integral_target {
    ($($method:ident => $ty:ty, $kind:ident;)*) => {
        $(
            #[doc = concat!("Convert to `", stringify!($ty), "`, range-checked.")]
            pub fn $method(&self) -> Result<$ty> {
                let wide = self.to_i128(PrimitiveKind::$kind)?;
                <$ty>::try_from(wide).map_err(|_| Error::overflow(wide, PrimitiveKind::$kind.name()))
            }
        )*
    };
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Bool(_) => PrimitiveKind::Bool,
            Primitive::Char(_) => PrimitiveKind::Char,
            Primitive::I8(_) => PrimitiveKind::I8,
            Primitive::U8(_) => PrimitiveKind::U8,
            Primitive::I16(_) => PrimitiveKind::I16,
            Primitive::U16(_) => PrimitiveKind::U16,
            Primitive::I32(_) => PrimitiveKind::I32,
            Primitive::U32(_) => PrimitiveKind::U32,
            Primitive::I64(_) => PrimitiveKind::I64,
            Primitive::U64(_) => PrimitiveKind::U64,
            Primitive::F32(_) => PrimitiveKind::F32,
            Primitive::F64(_) => PrimitiveKind::F64,
            Primitive::Decimal(_) => PrimitiveKind::Decimal,
            Primitive::DateTime(_) => PrimitiveKind::DateTime,
            Primitive::String(_) => PrimitiveKind::String,
        }
    }

    #[inline]
    fn incompatible(&self, target: PrimitiveKind) -> Error {
        Error::invalid_cast(self.kind().name(), target.name())
    }

    /// Exact integral value for integer-like sources.
    fn integral(&self) -> Option<i128> {
        match *self {
            Primitive::Bool(v) => Some(i128::from(v)),
            Primitive::Char(v) => Some(i128::from(u32::from(v))),
            Primitive::I8(v) => Some(i128::from(v)),
            Primitive::U8(v) => Some(i128::from(v)),
            Primitive::I16(v) => Some(i128::from(v)),
            Primitive::U16(v) => Some(i128::from(v)),
            Primitive::I32(v) => Some(i128::from(v)),
            Primitive::U32(v) => Some(i128::from(v)),
            Primitive::I64(v) => Some(i128::from(v)),
            Primitive::U64(v) => Some(i128::from(v)),
            _ => None,
        }
    }

    fn to_i128(&self, target: PrimitiveKind) -> Result<i128> {
        if let Some(wide) = self.integral() {
            return Ok(wide);
        }
        match self {
            Primitive::F32(v) => float_to_i128(f64::from(*v), target),
            Primitive::F64(v) => float_to_i128(*v, target),
            Primitive::Decimal(v) => v
                .round()
                .to_i128()
                .ok_or_else(|| Error::overflow(v, target.name())),
            Primitive::String(text) => text
                .trim()
                .parse::<i128>()
                .map_err(|_| Error::parse_failed(text, target.name())),
            _ => Err(self.incompatible(target)),
        }
    }

    integral_target! {
        to_i8 => i8, I8;
        to_u8 => u8, U8;
        to_i16 => i16, I16;
        to_u16 => u16, U16;
        to_i32 => i32, I32;
        to_u32 => u32, U32;
        to_i64 => i64, I64;
        to_u64 => u64, U64;
    }

    pub fn to_bool(&self) -> Result<bool> {
        match self {
            Primitive::Bool(v) => Ok(*v),
            Primitive::F32(v) => Ok(*v != 0.0),
            Primitive::F64(v) => Ok(*v != 0.0),
            Primitive::Decimal(v) => Ok(!v.is_zero()),
            Primitive::String(text) => parse_bool(text)
                .ok_or_else(|| Error::parse_failed(text, PrimitiveKind::Bool.name())),
            Primitive::Char(_) | Primitive::DateTime(_) => {
                Err(self.incompatible(PrimitiveKind::Bool))
            }
            _ => Ok(self.integral().is_some_and(|wide| wide != 0)),
        }
    }

    pub fn to_char(&self) -> Result<char> {
        match self {
            Primitive::Char(v) => Ok(*v),
            Primitive::String(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(Error::parse_failed(text, PrimitiveKind::Char.name())),
                }
            }
            Primitive::Bool(_)
            | Primitive::F32(_)
            | Primitive::F64(_)
            | Primitive::Decimal(_)
            | Primitive::DateTime(_) => Err(self.incompatible(PrimitiveKind::Char)),
            _ => {
                let wide = self.to_i128(PrimitiveKind::Char)?;
                u32::try_from(wide)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::overflow(wide, PrimitiveKind::Char.name()))
            }
        }
    }

    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Primitive::F64(v) => Ok(*v),
            Primitive::F32(v) => Ok(f64::from(*v)),
            Primitive::Decimal(v) => v
                .to_f64()
                .ok_or_else(|| Error::overflow(v, PrimitiveKind::F64.name())),
            Primitive::String(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| Error::parse_failed(text, PrimitiveKind::F64.name())),
            Primitive::Char(_) | Primitive::DateTime(_) => {
                Err(self.incompatible(PrimitiveKind::F64))
            }
            _ => self
                .integral()
                .map(|wide| wide as f64)
                .ok_or_else(|| self.incompatible(PrimitiveKind::F64)),
        }
    }

    pub fn to_f32(&self) -> Result<f32> {
        match self {
            Primitive::F32(v) => Ok(*v),
            Primitive::String(text) => text
                .trim()
                .parse::<f32>()
                .map_err(|_| Error::parse_failed(text, PrimitiveKind::F32.name())),
            _ => {
                let wide = self
                    .to_f64()
                    .map_err(|_| self.incompatible(PrimitiveKind::F32))?;
                if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
                    return Err(Error::overflow(wide, PrimitiveKind::F32.name()));
                }
                Ok(wide as f32)
            }
        }
    }

    pub fn to_decimal(&self) -> Result<Decimal> {
        let target = PrimitiveKind::Decimal.name();
        match self {
            Primitive::Decimal(v) => Ok(*v),
            Primitive::F32(v) => Decimal::from_f32(*v).ok_or_else(|| Error::overflow(v, target)),
            Primitive::F64(v) => Decimal::from_f64(*v).ok_or_else(|| Error::overflow(v, target)),
            Primitive::String(text) => text
                .trim()
                .parse::<Decimal>()
                .map_err(|_| Error::parse_failed(text, target)),
            Primitive::Char(_) | Primitive::DateTime(_) => {
                Err(self.incompatible(PrimitiveKind::Decimal))
            }
            _ => {
                let wide = self.to_i128(PrimitiveKind::Decimal)?;
                Decimal::from_i128(wide).ok_or_else(|| Error::overflow(wide, target))
            }
        }
    }

    pub fn to_datetime(&self) -> Result<DateTime> {
        match self {
            Primitive::DateTime(v) => Ok(*v),
            Primitive::String(text) => text.parse(),
            _ => Err(self.incompatible(PrimitiveKind::DateTime)),
        }
    }

    /// Render the value in its string form. Never fails.
    pub fn into_string(self) -> String {
        match self {
            Primitive::String(text) => text,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool(v) => v.fmt(f),
            Primitive::Char(v) => v.fmt(f),
            Primitive::I8(v) => v.fmt(f),
            Primitive::U8(v) => v.fmt(f),
            Primitive::I16(v) => v.fmt(f),
            Primitive::U16(v) => v.fmt(f),
            Primitive::I32(v) => v.fmt(f),
            Primitive::U32(v) => v.fmt(f),
            Primitive::I64(v) => v.fmt(f),
            Primitive::U64(v) => v.fmt(f),
            Primitive::F32(v) => v.fmt(f),
            Primitive::F64(v) => v.fmt(f),
            Primitive::Decimal(v) => v.fmt(f),
            Primitive::DateTime(v) => v.fmt(f),
            Primitive::String(v) => f.write_str(v),
        }
    }
}

/// Case-insensitive `true`/`false`.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Round half-to-even and widen; non-finite or huge values overflow.
fn float_to_i128(value: f64, target: PrimitiveKind) -> Result<i128> {
    if !value.is_finite() {
        return Err(Error::overflow(value, target.name()));
    }
    let rounded = value.round_ties_even();
    if rounded.abs() > I128_FLOAT_LIMIT {
        return Err(Error::overflow(value, target.name()));
    }
    Ok(rounded as i128)
}
