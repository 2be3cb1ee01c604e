use std::fmt;

use sea_orm::DbErr;
use serde::Serialize;

pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Failures a release operation can surface to its caller. Every
/// variant carries enough structure for an API layer to render a
/// payload without interpreting message strings.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    /// Field-level problems: missing/invalid version, failed
    /// uniqueness check.
    #[error("validation failed: {}", format_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// Per-dependency problems collected by the requirement batch
    /// resolver; the surrounding transaction has been rolled back.
    #[error("requirements failed: {}", format_dependency_errors(.0))]
    Requirements(Vec<DependencyError>),

    /// Mutation attempted outside the one-hour window.
    #[error("{field} {message}")]
    EditWindowExpired {
        field: &'static str,
        message: &'static str,
    },

    #[error("release not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ReleaseError {
    pub(crate) fn edit_window_expired(message: &'static str) -> Self {
        ReleaseError::EditWindowExpired {
            field: "created_at",
            message,
        }
    }
}

/// One `{field, message}` entry of a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// One failed entry of a requirement batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum DependencyError {
    /// The requirement string did not parse as a version requirement.
    InvalidRequirement {
        dependency: String,
        requirement: String,
    },
    /// The declared dependency names no known package.
    UnknownPackage { dependency: String },
}

impl DependencyError {
    pub fn dependency(&self) -> &str {
        match self {
            DependencyError::InvalidRequirement { dependency, .. } => dependency,
            DependencyError::UnknownPackage { dependency } => dependency,
        }
    }
}

impl fmt::Display for DependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyError::InvalidRequirement {
                dependency,
                requirement,
            } => write!(f, "{dependency}: invalid requirement {requirement:?}"),
            DependencyError::UnknownPackage { dependency } => {
                write!(f, "{dependency}: unknown package")
            }
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_dependency_errors(errors: &[DependencyError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
