//! Strategy-driven value conversion for the Photon record store.
//!
//! This crate converts values between pairs of Rust types without per-call
//! dispatch on the types involved. The first conversion of a `(source, target)`
//! pair synthesizes a [`Converter`] from the pair's [`TypeDescriptor`]s; every
//! later conversion is a cache lookup plus one call.
//!
//! # Key Types
//!
//! - [`ConversionEngine`]: converter synthesis, caches and the cast table
//! - [`Convertible`]: hooks a type exposes to the strategies
//! - [`TypeDescriptor`] / [`TypeKind`]: runtime classification of a type
//! - [`Primitive`]: range-checked conversions between primitive kinds
//! - [`ErasedValue`] / [`AnyValue`]: borrowed and owned type-erased values
//! - [`DateTime`]: the date/time primitive
//!
//! Enumerations join the primitive path through [`convertible_enum!`].
//!
//! # Example
//!
//! ```
//! use photon_convert::{Error, convert};
//!
//! assert_eq!(convert::<i32, String>(1).unwrap(), "1");
//! assert_eq!(convert::<String, i32>("1".into()).unwrap(), 1);
//! assert_eq!(convert::<i32, Option<i64>>(5).unwrap(), Some(5));
//! assert!(matches!(convert::<i64, i16>(i64::MAX), Err(Error::Overflow(_))));
//! assert!(matches!(
//!     convert::<Option<i32>, i32>(None),
//!     Err(Error::InvalidOperation(_))
//! ));
//! ```

pub mod convertible;
pub mod datetime;
pub mod descriptor;
pub mod engine;
mod enums;
pub mod primitive;
pub mod value;

pub use convertible::{Convertible, Integral, Parser};
pub use datetime::DateTime;
pub use descriptor::{PrimitiveKind, TypeDescriptor, TypeKind};
pub use engine::{ConversionEngine, Converter, Strategy, convert, is_null};
pub use photon_result::{Error, Result};
pub use primitive::Primitive;
pub use rust_decimal::Decimal;
pub use value::{AnyValue, ErasedValue};
