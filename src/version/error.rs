use thiserror::Error;

/// Raised when a version string has no leading digit-and-dot run and
/// therefore cannot be brought into canonical form. Carries the raw input so
/// callers can report which upstream token was not a version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version format: {0:?}")]
pub struct InvalidVersionFormat(pub String);
