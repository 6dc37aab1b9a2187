use crate::error::Error;

/// Result type alias used throughout Photon.
///
/// Every fallible operation in the record store returns this type so that
/// contract violations propagate with `?` instead of panicking.
pub type Result<T> = std::result::Result<T, Error>;
