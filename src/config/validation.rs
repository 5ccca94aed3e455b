use crate::config::models::AppConfig;

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Application configuration validator
pub struct AppConfigValidator;

impl AppConfigValidator {
    /// Validate the entire application configuration
    pub fn validate(config: &AppConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_content_type(&config.content_type) {
            errors.push(e);
        }

        if config.charset.trim().is_empty() {
            errors.push(ValidationError::InvalidField {
                field: "charset".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if config.max_body_bytes == Some(0) {
            errors.push(ValidationError::InvalidField {
                field: "max_body_bytes".to_string(),
                message: "must be greater than zero (omit the field for unbounded)".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// A default content type must at least look like `type/subtype`.
    fn validate_content_type(content_type: &str) -> ValidationResult<()> {
        let mut parts = content_type.splitn(2, '/');
        let kind = parts.next().unwrap_or_default();
        let subtype = parts.next().unwrap_or_default();
        if kind.is_empty() || subtype.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "content_type".to_string(),
                message: format!("'{content_type}' is not a type/subtype media type"),
            });
        }
        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}
