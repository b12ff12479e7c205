// Copyright 2025 Cowboy AI, LLC.

//! Error types for mapping operations
//!
//! Every failure raised while mapping is surfaced as a single [`MappingError`]:
//! a [`MappingErrorKind`] describing what went wrong plus a breadcrumb of
//! `(type, field)` frames leading from the top-level call to the failure.

use std::fmt;
use thiserror::Error;

/// Boxed plugin failure kept as the error source
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Categories of mapping failures
#[derive(Debug, Error)]
pub enum MappingErrorKind {
    /// Missing, ambiguous or inconsistent mapping configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No applicable conversion or the conversion itself failed
    #[error("Conversion error: cannot convert {source_type} to {destination_type}: {message}")]
    Conversion {
        /// Type of the value being converted
        source_type: String,
        /// Requested destination type
        destination_type: String,
        /// Human readable reason
        message: String,
        /// Underlying converter failure, if any
        #[source]
        cause: Option<BoxedCause>,
    },

    /// A property could not be read or written
    #[error("Access error: {class}.{path}: {message}")]
    Access {
        /// Class the property was resolved against
        class: String,
        /// Property path
        path: String,
        /// Human readable reason
        message: String,
    },

    /// A destination object or container could not be constructed
    #[error("Instantiation error: cannot create {type_name}: {message}")]
    Instantiation {
        /// Type that failed to instantiate
        type_name: String,
        /// Human readable reason
        message: String,
    },

    /// An event listener failed and listener failures are configured as fatal
    #[error("Notification error: listener {listener} failed: {message}")]
    Notification {
        /// Listener name
        listener: String,
        /// Failure message
        message: String,
    },
}

/// One step of the path from the top-level call down to a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Source class, or the container type for element frames
    pub type_name: String,
    /// Source field path, or `[index]` for element frames
    pub field: String,
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field)
    }
}

/// Error returned by every mapping operation
#[derive(Debug)]
pub struct MappingError {
    kind: MappingErrorKind,
    breadcrumb: Vec<Breadcrumb>,
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.breadcrumb.is_empty() {
            return write!(f, "{}", self.kind);
        }
        let path: Vec<String> = self.breadcrumb.iter().map(ToString::to_string).collect();
        write!(f, "{} (at {})", self.kind, path.join(" -> "))
    }
}

impl std::error::Error for MappingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// Result type for mapping operations
pub type MappingResult<T> = Result<T, MappingError>;

impl From<MappingErrorKind> for MappingError {
    fn from(kind: MappingErrorKind) -> Self {
        Self {
            kind,
            breadcrumb: Vec::new(),
        }
    }
}

impl MappingError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        MappingErrorKind::Configuration(msg.into()).into()
    }

    /// Create a conversion error without an underlying cause
    pub fn conversion(
        source_type: impl fmt::Display,
        destination_type: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        MappingErrorKind::Conversion {
            source_type: source_type.to_string(),
            destination_type: destination_type.to_string(),
            message: message.into(),
            cause: None,
        }
        .into()
    }

    /// Create a conversion error wrapping a converter failure
    pub fn converter_failed(
        source_type: impl fmt::Display,
        destination_type: impl fmt::Display,
        cause: anyhow::Error,
    ) -> Self {
        MappingErrorKind::Conversion {
            source_type: source_type.to_string(),
            destination_type: destination_type.to_string(),
            message: cause.to_string(),
            cause: Some(cause.into()),
        }
        .into()
    }

    /// Create an access error
    pub fn access(
        class: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MappingErrorKind::Access {
            class: class.into(),
            path: path.into(),
            message: message.into(),
        }
        .into()
    }

    /// Create an instantiation error
    pub fn instantiation(type_name: impl fmt::Display, message: impl Into<String>) -> Self {
        MappingErrorKind::Instantiation {
            type_name: type_name.to_string(),
            message: message.into(),
        }
        .into()
    }

    /// Create a notification error
    pub fn notification(listener: impl Into<String>, message: impl Into<String>) -> Self {
        MappingErrorKind::Notification {
            listener: listener.into(),
            message: message.into(),
        }
        .into()
    }

    /// Prepend a breadcrumb frame while the error bubbles up
    pub fn at(mut self, type_name: impl Into<String>, field: impl Into<String>) -> Self {
        self.breadcrumb.insert(
            0,
            Breadcrumb {
                type_name: type_name.into(),
                field: field.into(),
            },
        );
        self
    }

    /// The failure category
    pub fn kind(&self) -> &MappingErrorKind {
        &self.kind
    }

    /// Ordered `(type, field)` frames from the top-level call to the failure
    pub fn breadcrumb(&self) -> &[Breadcrumb] {
        &self.breadcrumb
    }

    /// Breadcrumb rendered as `Type.field -> Type.field`
    pub fn field_path(&self) -> String {
        self.breadcrumb
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, MappingErrorKind::Configuration(_))
    }

    /// Check if this is a conversion error
    pub fn is_conversion(&self) -> bool {
        matches!(self.kind, MappingErrorKind::Conversion { .. })
    }

    /// Check if this is an access error
    pub fn is_access(&self) -> bool {
        matches!(self.kind, MappingErrorKind::Access { .. })
    }

    /// Check if this is an instantiation error
    pub fn is_instantiation(&self) -> bool {
        matches!(self.kind, MappingErrorKind::Instantiation { .. })
    }

    /// Check if this is a notification error
    pub fn is_notification(&self) -> bool {
        matches!(self.kind, MappingErrorKind::Notification { .. })
    }
}
