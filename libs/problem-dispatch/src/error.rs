//! Errors produced by the request validation layer

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Sub-code the validation layer uses for a required value that is absent.
pub const REQUIRED_CODE: u16 = 602;

/// Sub-code the validation layer uses for a value of the wrong type.
pub const INVALID_TYPE_CODE: u16 = 601;

/// Where a failing value was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Body,
    Query,
    Path,
    Header,
    /// Any other tag, including an absent one (empty string).
    Other(String),
}

impl Location {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for Location {
    fn from(tag: &str) -> Self {
        match tag {
            "body" => Self::Body,
            "query" => Self::Query,
            "path" => Self::Path,
            "header" => Self::Header,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failing field, shared by validation and parse leaves.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FieldError {
    pub name: String,
    pub location: Location,
    pub code: u16,
    pub message: String,
}

impl FieldError {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<Location>,
        code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            code,
            message: message.into(),
        }
    }

    /// Required value is absent.
    pub fn required(name: impl Into<String>, location: impl Into<Location>) -> Self {
        let name = name.into();
        let location = location.into();
        let message = format!("{name} in {location} is required");
        Self::new(name, location, REQUIRED_CODE, message)
    }

    /// Value does not have the expected type.
    pub fn invalid_type(
        name: impl Into<String>,
        location: impl Into<Location>,
        expected: &str,
    ) -> Self {
        let name = name.into();
        let location = location.into();
        let message = format!("{name} in {location} must be of type {expected}");
        Self::new(name, location, INVALID_TYPE_CODE, message)
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.code == REQUIRED_CODE
    }

    /// The payload as a whole failed, not a named field inside it.
    #[must_use]
    pub fn is_body_structural(&self) -> bool {
        self.location == Location::Body && self.name == "body"
    }
}

/// Request used a method the route does not serve.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("method {method} is not allowed, but [{}] are", .allowed.join(","))]
pub struct MethodNotAllowed {
    pub method: String,
    pub allowed: Vec<String>,
}

impl MethodNotAllowed {
    pub fn new<I, S>(method: impl Into<String>, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: method.into(),
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Value of the `Allow` header: methods joined by commas, no spaces.
    #[must_use]
    pub fn allow_header(&self) -> String {
        self.allowed.join(",")
    }
}

/// Unstructured error carrying only a status code and a message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct CodedError {
    pub code: u16,
    pub message: String,
}

impl CodedError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Compact `{"code":..,"message":..}` rendering.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Any error value handed to the dispatcher.
#[derive(thiserror::Error, Debug, Clone)]
pub enum RequestError {
    /// Container of sub-errors, possibly nested.
    #[error("validation failure list:\n{}", join_lines(.0))]
    Composite(Vec<RequestError>),
    #[error(transparent)]
    Validation(FieldError),
    #[error(transparent)]
    Parse(FieldError),
    #[error(transparent)]
    MethodNotAllowed(#[from] MethodNotAllowed),
    #[error(transparent)]
    Coded(#[from] CodedError),
    #[error(transparent)]
    Opaque(Arc<dyn StdError + Send + Sync>),
}

fn join_lines(errors: &[RequestError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl RequestError {
    pub fn composite(errors: impl IntoIterator<Item = RequestError>) -> Self {
        Self::Composite(errors.into_iter().collect())
    }

    pub fn opaque<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Opaque(Arc::new(err))
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Leaves of this error in pre-order; see [`flatten`].
    #[must_use]
    pub fn leaves(&self) -> Vec<&RequestError> {
        flatten(self)
    }

    /// Owned single-level composite holding the leaves of this error.
    #[must_use]
    pub fn flattened(&self) -> RequestError {
        Self::Composite(flatten(self).into_iter().cloned().collect())
    }
}

impl PartialEq for RequestError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Composite(a), Self::Composite(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) | (Self::Parse(a), Self::Parse(b)) => a == b,
            (Self::MethodNotAllowed(a), Self::MethodNotAllowed(b)) => a == b,
            (Self::Coded(a), Self::Coded(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Expand nested composites in place, left to right.
///
/// Empty composites contribute nothing; a non-composite error yields itself.
#[must_use]
pub fn flatten(err: &RequestError) -> Vec<&RequestError> {
    let mut leaves = Vec::new();
    collect_leaves(err, &mut leaves);
    leaves
}

fn collect_leaves<'a>(err: &'a RequestError, out: &mut Vec<&'a RequestError>) {
    match err {
        RequestError::Composite(children) => {
            for child in children {
                collect_leaves(child, out);
            }
        }
        leaf => out.push(leaf),
    }
}
