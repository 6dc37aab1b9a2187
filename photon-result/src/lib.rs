//! Error types and result definitions for the Photon record store.
//!
//! Every crate in the workspace reports failures through the single
//! [`Error`] enum and the [`Result<T>`] alias defined here.
//!
//! # Error Categories
//!
//! - **Invalid operations** ([`Error::InvalidOperation`]): detached records,
//!   unwrapping a null into a non-nullable target, shrinking below the row count
//! - **Conversion failures** ([`Error::Overflow`], [`Error::InvalidCast`])
//! - **Argument errors** ([`Error::InvalidArgumentError`]): duplicate or foreign columns
//! - **Lookup failures** ([`Error::KeyNotFound`]): unknown column names
//! - **Iteration** ([`Error::ConcurrentModification`]): structural change under a cursor
//! - **Internal errors** ([`Error::Internal`]): poisoned locks or broken invariants
//!
//! All of these are contract violations raised at the violation point. None of
//! them is transient and nothing in the workspace retries them.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
