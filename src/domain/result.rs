//! Result type alias for PHDC
//!
//! This module provides a convenient Result type alias that uses PhdcError
//! as the error type.

use super::errors::PhdcError;

/// Result type alias for PHDC operations
///
/// # Examples
///
/// ```
/// use phdc::domain::result::Result;
/// use phdc::domain::errors::PhdcError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(PhdcError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PhdcError>;
