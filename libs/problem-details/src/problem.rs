//! RFC 7807 problem details document (pure data model, no HTTP framework dependencies)

use std::fmt;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::catalog::{Instance, ProblemCode};

/// Content type used for problem documents by default.
pub const APPLICATION_JSON: &str = "application/json";

/// Content type for problem documents as per RFC 7807.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Placeholder for contextual values in catalog detail texts.
pub const DETAIL_PLACEHOLDER: &str = "%v";

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

/// One outgoing problem document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[cfg_attr(
    feature = "utoipa",
    schema(title = "ProblemDetails", description = "RFC 7807 problem details")
)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct ProblemDetails {
    /// Identifier of the failing resource, normally the request URI.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_url: String,
    /// Short name of the condition.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// The HTTP status code, serialized as u16.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    #[cfg_attr(feature = "utoipa", schema(value_type = u16))]
    pub status: StatusCode,
    /// Stable machine-readable reason.
    pub code: ProblemCode,
    /// Human-readable explanation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Subsystem that raised the problem.
    pub instance: Instance,
    /// Offending parameters; only present for validation failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_params: Vec<InvalidParam>,
}

/// One invalid-field report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[cfg_attr(feature = "utoipa", schema(title = "InvalidParam"))]
pub struct InvalidParam {
    /// Field name; `None` denotes a body-level failure.
    pub param: Option<String>,
    /// Human-readable message describing the failure
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

/// Structural violation found by [`ProblemDetails::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("param in body is required")]
    MissingParam,
    #[error("invalidParams.{index}: {source}")]
    InvalidParam {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ProblemDetails {
    /// Create a document with the given code, title and detail.
    ///
    /// The status follows from `code`, `type` is the `"/"` placeholder.
    pub fn new(
        code: ProblemCode,
        instance: Instance,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            type_url: "/".to_owned(),
            title: title.into(),
            status: code.status(),
            code,
            detail: detail.into(),
            instance,
            invalid_params: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Substitute the first `%v` placeholder of the detail text.
    ///
    /// Details without a placeholder are left unchanged.
    pub fn with_detail_param(mut self, value: impl fmt::Display) -> Self {
        if self.detail.contains(DETAIL_PLACEHOLDER) {
            self.detail = self
                .detail
                .replacen(DETAIL_PLACEHOLDER, &value.to_string(), 1);
        }
        self
    }

    /// Append a message to the detail text, separated by a single space.
    pub fn append_detail(mut self, message: &str) -> Self {
        self.detail.push(' ');
        self.detail.push_str(message);
        self
    }

    pub fn with_invalid_params(mut self, params: Vec<InvalidParam>) -> Self {
        self.invalid_params = params;
        self
    }

    pub fn push_invalid_param(&mut self, param: InvalidParam) {
        self.invalid_params.push(param);
    }

    /// Check the structure of every reported parameter.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found, wrapped with its index.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (index, param) in self.invalid_params.iter().enumerate() {
            param
                .validate()
                .map_err(|source| ValidationError::InvalidParam {
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}

impl InvalidParam {
    pub fn new(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            param: Some(param.into()),
            reason: reason.into(),
        }
    }

    /// Body-level failure with no field name.
    pub fn unnamed(reason: impl Into<String>) -> Self {
        Self {
            param: None,
            reason: reason.into(),
        }
    }

    pub fn missing(param: impl Into<String>) -> Self {
        Self::new(param, "Param missing")
    }

    pub fn incorrect_type(param: impl Into<String>) -> Self {
        Self::new(param, "Param has incorrect type")
    }

    /// Uploaded file exceeds `max_mb` megabytes.
    pub fn image_size(max_mb: u64) -> Self {
        Self::new("size", format!("Maximum file size is {max_mb}MB"))
    }

    /// Image dimension `name` (width, height) exceeds `max_px` pixels.
    pub fn image_dimension(name: impl Into<String>, max_px: u32) -> Self {
        let name = name.into();
        let reason = format!("Maximum {name} is {max_px}px");
        Self::new(name, reason)
    }

    /// # Errors
    /// Returns [`ValidationError::MissingParam`] when the param name is absent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.param.is_none() {
            return Err(ValidationError::MissingParam);
        }
        Ok(())
    }
}

/// Axum integration: make `ProblemDetails` directly usable as a response
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ProblemDetails {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;

        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_JSON),
        );
        resp
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn sample() -> ProblemDetails {
        ProblemDetails::new(
            ProblemCode::BadRequest,
            Instance::Client,
            "Inactive Listing!",
            "Listing %v is not in the active state!",
        )
    }

    #[test]
    fn new_derives_status_from_code() {
        let p = sample();
        assert_eq!(p.status, StatusCode::BAD_REQUEST);
        assert_eq!(p.type_url, "/");
        assert!(p.invalid_params.is_empty());
    }

    #[test]
    fn detail_param_replaces_first_placeholder() {
        let p = sample().with_detail_param(42);
        assert_eq!(p.detail, "Listing 42 is not in the active state!");

        let untouched = sample().with_detail("no placeholder").with_detail_param(7);
        assert_eq!(untouched.detail, "no placeholder");
    }

    #[test]
    fn append_detail_joins_with_space() {
        let p = sample().with_detail("Requested resource does not exist!");
        assert_eq!(
            p.append_detail("listing 7").detail,
            "Requested resource does not exist! listing 7"
        );
    }

    #[test]
    fn serializes_fields_in_document_order() {
        let p = sample()
            .with_type("/listings/3")
            .with_detail("bad")
            .with_invalid_params(vec![InvalidParam::missing("email")]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"type":"/listings/3","title":"Inactive Listing!","status":400,"code":"Bad Request","detail":"bad","instance":"client","invalidParams":[{"param":"email","reason":"Param missing"}]}"#
        );
    }

    #[test]
    fn omits_empty_fields() {
        let p = ProblemDetails::new(ProblemCode::NotFound, Instance::Api, "", "").with_type("");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"status":404,"code":"Not Found","instance":"api"}"#);
    }

    #[test]
    fn deserializes_round_trip_document() {
        let json = r#"{"type":"/x","title":"t","status":429,"code":"Too Many Requests","detail":"d","instance":"client"}"#;
        let p: ProblemDetails = serde_json::from_str(json).unwrap();
        assert_eq!(p.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(p.code, ProblemCode::TooManyRequests);
        assert!(p.invalid_params.is_empty());
    }

    #[test]
    fn invalid_param_serialization_keeps_null_param() {
        let empty = InvalidParam::unnamed("");
        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"{"param":null}"#);

        let named = InvalidParam::new("email", "invalid email");
        assert_eq!(
            serde_json::to_string(&named).unwrap(),
            r#"{"param":"email","reason":"invalid email"}"#
        );
    }

    #[test]
    fn invalid_param_constructors() {
        assert_eq!(InvalidParam::missing("email").reason, "Param missing");
        assert_eq!(
            InvalidParam::incorrect_type("email").reason,
            "Param has incorrect type"
        );

        let size = InvalidParam::image_size(5);
        assert_eq!(size.param.as_deref(), Some("size"));
        assert_eq!(size.reason, "Maximum file size is 5MB");

        let width = InvalidParam::image_dimension("width", 1920);
        assert_eq!(width.param.as_deref(), Some("width"));
        assert_eq!(width.reason, "Maximum width is 1920px");
    }

    #[test]
    fn validate_rejects_unnamed_params() {
        assert_eq!(
            InvalidParam::unnamed("empty").validate(),
            Err(ValidationError::MissingParam)
        );
        assert!(InvalidParam::missing("email").validate().is_ok());

        let mut p = sample();
        assert!(p.validate().is_ok());
        p.push_invalid_param(InvalidParam::missing("email"));
        p.push_invalid_param(InvalidParam::unnamed("empty"));
        let err = p.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalidParams.1: param in body is required");
    }
}
