//! Response side of dispatch: where headers, status and the problem body go

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use problem_details::ProblemDetails;

/// Write capability for one response; owned by a single request.
pub trait ProblemSink {
    fn set_header(&mut self, name: HeaderName, value: &str);

    fn set_status(&mut self, status: StatusCode);

    /// Set the status from `problem` and write its serialized body.
    fn write_problem(&mut self, problem: &ProblemDetails);
}

/// In-memory response produced by dispatch.
#[derive(Debug, Clone, Default)]
pub struct ProblemResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ProblemResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Serialized problem document; `None` when no body was written.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Vec<u8>>) {
        (self.status, self.headers, self.body)
    }
}

impl ProblemSink for ProblemResponse {
    fn set_header(&mut self, name: HeaderName, value: &str) {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => {
                tracing::warn!(header = %name, error = %err, "Dropping invalid response header");
            }
        }
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write_problem(&mut self, problem: &ProblemDetails) {
        self.status = problem.status;
        let body = match serde_json::to_vec(problem) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize problem details");
                Vec::new()
            }
        };
        self.body = Some(body);
    }
}

/// Axum integration: send the collected response as-is
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ProblemResponse {
    fn into_response(self) -> axum::response::Response {
        let (status, headers, body) = self.into_parts();
        let body = axum::body::Body::from(body.unwrap_or_default());
        let mut resp = axum::response::Response::new(body);
        *resp.status_mut() = status;
        *resp.headers_mut() = headers;
        resp
    }
}
