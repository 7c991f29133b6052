//! Result type alias for scribe

use super::errors::ScribeError;

/// Result type alias using [`ScribeError`] as the error type
///
/// # Examples
///
/// ```
/// use scribe::domain::result::Result;
/// use scribe::domain::errors::ScribeError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ScribeError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ScribeError;

    #[test]
    fn test_result_ok() {
        let result: Result<i32> = Ok(42);
        assert!(result.is_ok());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(ScribeError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
