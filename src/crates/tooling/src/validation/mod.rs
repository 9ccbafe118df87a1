//! Request validation helpers
//!
//! Field-level checks shared by the API layer and the coordinator input path.

use crate::{Result, ToolingError};

/// Validate that a required string field is non-empty after trimming.
///
/// Returns the trimmed value on success.
pub fn validate_non_empty_trimmed(value: &str, field_name: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolingError::validation(
            field_name,
            "cannot be empty or whitespace",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validate that a declared file size is within the allowed limit.
pub fn validate_file_size(size: usize, max_size: usize, filename: &str) -> Result<()> {
    if size > max_size {
        let size_mb = size as f64 / (1024.0 * 1024.0);
        let max_mb = max_size as f64 / (1024.0 * 1024.0);
        return Err(ToolingError::validation(
            filename,
            format!(
                "file size {:.2}MB exceeds maximum allowed size of {:.2}MB",
                size_mb, max_mb
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty_trimmed_valid() {
        let result = validate_non_empty_trimmed("  hello  ", "field").unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn test_validate_non_empty_trimmed_whitespace() {
        assert!(validate_non_empty_trimmed("   ", "field").is_err());
    }

    #[test]
    fn test_validate_non_empty_trimmed_empty() {
        assert!(validate_non_empty_trimmed("", "field").is_err());
    }

    #[test]
    fn test_validate_file_size_within_limit() {
        assert!(validate_file_size(1024, 2048, "data.csv").is_ok());
    }

    #[test]
    fn test_validate_file_size_at_limit() {
        assert!(validate_file_size(2048, 2048, "data.csv").is_ok());
    }

    #[test]
    fn test_validate_file_size_over_limit() {
        let err = validate_file_size(3 * 1024 * 1024, 2 * 1024 * 1024, "data.csv");
        assert!(err.is_err());
        assert!(err.unwrap_err().to_string().contains("data.csv"));
    }
}
