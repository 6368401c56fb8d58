//! Result type alias for Octograph

use super::errors::OctographError;

/// Result type alias for Octograph operations
///
/// # Examples
///
/// ```
/// use octograph::domain::result::Result;
/// use octograph::domain::errors::OctographError;
///
/// fn failing_function() -> Result<()> {
///     Err(OctographError::InvalidReading("negative interval".to_string()))
/// }
/// assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, OctographError>;
