//! Classification of request errors into a single problem response
//!
//! Every error value, including none at all, ends in exactly one written response.
//! Anything that cannot be classified degrades to the generic system failure
//! document and is logged once through the [`FailureLogger`].

use http::header::{ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode, Uri};
use problem_details::{ErrorCondition, ProblemDetails, for_request};

use crate::bucket::{Bucket, Buckets};
use crate::config::DispatchConfig;
use crate::error::{CodedError, FieldError, Location, MethodNotAllowed, RequestError, flatten};
use crate::sink::{ProblemResponse, ProblemSink};

/// The parts of the triggering request dispatch needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: Method,
    /// Request URI as received (path and query); becomes the problem `type`.
    pub uri: String,
}

impl RequestInfo {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
        }
    }

    #[must_use]
    pub fn from_parts(method: &Method, uri: &Uri) -> Self {
        let uri = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_owned(), |pq| pq.as_str().to_owned());
        Self::new(method.clone(), uri)
    }

    #[must_use]
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

/// Log capability for errors that fall through to the generic failure.
pub trait FailureLogger: Send + Sync {
    fn unknown_error(&self, error: Option<&RequestError>, request: &RequestInfo);
}

/// Default logger emitting through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl FailureLogger for TracingLogger {
    fn unknown_error(&self, error: Option<&RequestError>, request: &RequestInfo) {
        match error {
            Some(err) => {
                tracing::error!(util = "errors", uri = %request.uri, error = %err, "Unknown error");
            }
            None => {
                tracing::error!(util = "errors", uri = %request.uri, "Unknown error: no error value");
            }
        }
    }
}

/// Turns request errors into problem responses.
#[derive(Debug, Clone)]
pub struct Dispatcher<L = TracingLogger> {
    config: DispatchConfig,
    logger: L,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            logger: TracingLogger,
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}

impl<L: FailureLogger> Dispatcher<L> {
    #[must_use]
    pub fn with_logger<M: FailureLogger>(self, logger: M) -> Dispatcher<M> {
        Dispatcher {
            config: self.config,
            logger,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Write exactly one problem response for `error` into `sink`.
    pub fn dispatch<S>(&self, error: Option<&RequestError>, request: &RequestInfo, sink: &mut S)
    where
        S: ProblemSink + ?Sized,
    {
        sink.set_header(CONTENT_TYPE, &self.config.content_type);
        self.serve(error, request, sink);
    }

    /// Dispatch into a fresh [`ProblemResponse`].
    #[must_use]
    pub fn respond(&self, error: Option<&RequestError>, request: &RequestInfo) -> ProblemResponse {
        let mut response = ProblemResponse::default();
        self.dispatch(error, request, &mut response);
        response
    }

    fn serve<S>(&self, error: Option<&RequestError>, request: &RequestInfo, sink: &mut S)
    where
        S: ProblemSink + ?Sized,
    {
        let Some(err) = error else {
            self.serve_unknown(None, request, sink);
            return;
        };

        match err {
            RequestError::Composite(_) | RequestError::Validation(_) => {
                self.serve_validation(err, request, sink);
            }
            RequestError::Parse(field) => {
                if field.location == Location::Body {
                    self.serve_validation(err, request, sink);
                } else {
                    Self::serve_parse(field, request, sink);
                }
            }
            RequestError::MethodNotAllowed(e) => Self::serve_method_not_allowed(e, request, sink),
            RequestError::Coded(e) => self.serve_coded(err, e, request, sink),
            RequestError::Opaque(_) => self.serve_unknown(Some(err), request, sink),
        }
    }

    /// Bucket the leaves of `err` and write the winning bucket's document.
    fn serve_validation<S>(&self, err: &RequestError, request: &RequestInfo, sink: &mut S)
    where
        S: ProblemSink + ?Sized,
    {
        let mut buckets = Buckets::default();
        for leaf in flatten(err) {
            let Some((bucket, field)) = Bucket::route(leaf) else {
                // A leaf that cannot be bucketed replaces the whole composite.
                self.serve(Some(leaf), request, sink);
                return;
            };
            buckets.push_leaf(bucket, field);
        }

        let Some(selection) = buckets.select() else {
            self.serve_unknown(Some(err), request, sink);
            return;
        };

        tracing::debug!(
            bucket = %selection.bucket,
            params = selection.params.len(),
            uri = %request.uri,
            "Reporting validation failure"
        );
        sink.write_problem(&selection.into_problem(&request.uri));
    }

    /// Non-body parse failures are reported as a plain bad request.
    fn serve_parse<S>(field: &FieldError, request: &RequestInfo, sink: &mut S)
    where
        S: ProblemSink + ?Sized,
    {
        sink.write_problem(&Self::bad_request(&field.message, request));
    }

    fn serve_method_not_allowed<S>(
        err: &MethodNotAllowed,
        request: &RequestInfo,
        sink: &mut S,
    ) where
        S: ProblemSink + ?Sized,
    {
        sink.set_header(ALLOW, &err.allow_header());

        if request.is_head() {
            sink.set_status(StatusCode::METHOD_NOT_ALLOWED);
            return;
        }
        sink.write_problem(&for_request(ErrorCondition::MethodNotAllowed, &request.uri));
    }

    fn serve_coded<S>(
        &self,
        err: &RequestError,
        coded: &CodedError,
        request: &RequestInfo,
        sink: &mut S,
    ) where
        S: ProblemSink + ?Sized,
    {
        let problem = match coded.code {
            400 => Self::bad_request(&coded.message, request),
            401 => for_request(ErrorCondition::UnauthorizedAccess, &request.uri),
            404 => for_request(ErrorCondition::ResourceNotFound, &request.uri)
                .append_detail(&coded.message),
            _ => {
                self.serve_unknown(Some(err), request, sink);
                return;
            }
        };
        sink.write_problem(&problem);
    }

    fn serve_unknown<S>(&self, error: Option<&RequestError>, request: &RequestInfo, sink: &mut S)
    where
        S: ProblemSink + ?Sized,
    {
        self.logger.unknown_error(error, request);
        let problem = self.config.fallback_problem().with_type(&request.uri);
        sink.write_problem(&problem);
    }

    fn bad_request(message: &str, request: &RequestInfo) -> ProblemDetails {
        for_request(ErrorCondition::BadRequest, &request.uri).append_detail(message)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn request_info_keeps_path_and_query() {
        let uri: Uri = "https://api.example.com/listings/7?expand=owner".parse().unwrap();
        let info = RequestInfo::from_parts(&Method::GET, &uri);
        assert_eq!(info.uri, "/listings/7?expand=owner");
        assert!(!info.is_head());
        assert!(RequestInfo::new(Method::HEAD, "/").is_head());
    }

    #[test]
    fn content_type_is_set_even_without_body() {
        let dispatcher = Dispatcher::default();
        let err = RequestError::from(MethodNotAllowed::new("HEAD", ["GET"]));
        let resp = dispatcher.respond(Some(&err), &RequestInfo::new(Method::HEAD, "/x"));
        assert_eq!(resp.header(&CONTENT_TYPE), Some("application/json"));
        assert!(resp.body().is_none());
    }

    #[test]
    fn bad_request_appends_message() {
        let problem = Dispatcher::<TracingLogger>::bad_request(
            "missing semicolon",
            &RequestInfo::new(Method::POST, "/a"),
        );
        assert_eq!(
            problem.detail,
            "There was a problem with the request! missing semicolon"
        );
        assert_eq!(problem.type_url, "/a");
    }
}
