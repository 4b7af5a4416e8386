use thiserror::Error;
use validator::ValidationErrors;

/// Errors raised while interpreting domain values and form input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{} ({})", field, codes.join(", "))
            })
            .collect();
        fields.sort();
        Self::Validation(fields.join("; "))
    }
}

pub type DomainResult<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(email)]
        email: String,
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_validation_errors_are_flattened_and_sorted() {
        let sample = Sample {
            email: "nope".to_string(),
            name: String::new(),
        };
        let err: DomainError = sample.validate().unwrap_err().into();
        assert_eq!(
            err,
            DomainError::Validation("email (email); name (length)".to_string())
        );
    }

    #[test]
    fn test_invalid_value_message() {
        let err = DomainError::invalid("status", "gone");
        assert_eq!(err.to_string(), "Invalid status: gone");
    }
}
