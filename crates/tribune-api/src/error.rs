use thiserror::Error;

/// Failures a handler reports back to the client on the same connection.
/// The display text becomes the `msg` field of the error response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Missing or ill-formed input.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Invalid, expired or non-admin token, or a guarded target.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The username is already registered.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl ApiError {
    pub fn missing(field: &str) -> Self {
        Self::Malformed(format!("missing field `{field}`"))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Extracts a required field, treating an empty string as absent.
pub fn required<'a>(value: &'a Option<String>, field: &str) -> ApiResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::missing(field)),
    }
}

/// An optional field; empty strings count as "not supplied".
pub fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
