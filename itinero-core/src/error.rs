//! Unified error handling system
//!
//! Provides structured error types with context and proper error chaining.
//! Every authorization or validation failure is reported through this
//! taxonomy before any mutating storage call is made.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

pub type ItineroResult<T> = Result<T, ItineroError>;

/// Error context providing additional information for debugging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for the Itinero system
#[derive(Error, Debug)]
pub enum ItineroError {
    #[error("Authentication required: {message}")]
    Unauthenticated {
        message: String,
        context: ErrorContext,
    },

    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    #[error("Conflict: {resource} already exists")]
    Conflict {
        resource: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ItineroError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            ItineroError::Unauthenticated { context, .. } => Some(context),
            ItineroError::Forbidden { context, .. } => Some(context),
            ItineroError::NotFound { context, .. } => Some(context),
            ItineroError::Conflict { context, .. } => Some(context),
            ItineroError::Validation { context, .. } => Some(context),
            ItineroError::Storage { context, .. } => Some(context),
            ItineroError::Config { context, .. } => Some(context),
            ItineroError::Internal { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True when the failure is the caller's fault (4xx-class)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ItineroError::Unauthenticated { .. }
                | ItineroError::Forbidden { .. }
                | ItineroError::NotFound { .. }
                | ItineroError::Conflict { .. }
                | ItineroError::Validation { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        if self.is_client_error() {
            warn!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Request rejected"
            );
        } else {
            error!(
                error_id = ?self.context().map(|c| &c.error_id),
                error = %self,
                "Error occurred"
            );
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! unauthenticated_error {
    ($msg:expr, $component:expr) => {
        $crate::ItineroError::Unauthenticated {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Provide a valid bearer token"),
        }
    };
}

#[macro_export]
macro_rules! forbidden_error {
    ($msg:expr, $component:expr) => {
        $crate::ItineroError::Forbidden {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::ItineroError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Verify the identifier and try again"),
        }
    };
}

#[macro_export]
macro_rules! conflict_error {
    ($resource:expr, $component:expr) => {
        $crate::ItineroError::Conflict {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::ItineroError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
    ($msg:expr, $component:expr) => {
        $crate::ItineroError::Validation {
            message: $msg.to_string(),
            field: None,
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::ItineroError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::ItineroError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component),
        }
    };
}
