//! Error types and handling for Elektra
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Elektra operations
pub type Result<T> = std::result::Result<T, ElektraError>;

/// Main error type for Elektra
#[derive(Debug, Error)]
pub enum ElektraError {
    /// Device reported an unrepresentable state; carries the raw register
    /// values for diagnostics
    #[error("Protocol fault: state code {state_code} (set current raw {set_current})")]
    Protocol { set_current: u16, state_code: u16 },

    /// Modbus or HTTP I/O errors, recoverable by the next poll cycle
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Malformed price series handed to the optimizer; caller bug
    #[error("Invalid price series: {message}")]
    InvalidPriceSeries { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl ElektraError {
    /// Create a new protocol fault from the raw register values
    pub fn protocol(set_current: u16, state_code: u16) -> Self {
        ElektraError::Protocol {
            set_current,
            state_code,
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        ElektraError::Transport {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        ElektraError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new invalid price series error
    pub fn invalid_price_series<S: Into<String>>(message: S) -> Self {
        ElektraError::InvalidPriceSeries {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ElektraError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ElektraError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        ElektraError::Io {
            message: message.into(),
        }
    }

    /// Whether the error is expected to clear on a later poll cycle
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ElektraError::Transport { .. } | ElektraError::Timeout { .. }
        )
    }
}

impl From<std::io::Error> for ElektraError {
    fn from(err: std::io::Error) -> Self {
        ElektraError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for ElektraError {
    fn from(err: serde_yaml::Error) -> Self {
        ElektraError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ElektraError {
    fn from(err: serde_json::Error) -> Self {
        ElektraError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ElektraError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ElektraError::timeout(err.to_string())
        } else {
            ElektraError::transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ElektraError::config("test config error");
        assert!(matches!(err, ElektraError::Config { .. }));

        let err = ElektraError::protocol(640, 5);
        assert!(matches!(err, ElektraError::Protocol { .. }));

        let err = ElektraError::validation("field", "test validation error");
        assert!(matches!(err, ElektraError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = ElektraError::protocol(640, 5);
        let error_string = format!("{}", err);
        assert_eq!(
            error_string,
            "Protocol fault: state code 5 (set current raw 640)"
        );

        let err = ElektraError::validation("test_field", "invalid value");
        let error_string = format!("{}", err);
        assert_eq!(error_string, "Validation error: test_field - invalid value");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(ElektraError::transport("link down").is_recoverable());
        assert!(ElektraError::timeout("read").is_recoverable());
        assert!(!ElektraError::protocol(0, 5).is_recoverable());
        assert!(!ElektraError::invalid_price_series("bad key").is_recoverable());
    }
}
