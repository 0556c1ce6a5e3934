//! Problem details documents and the static problem registry
//!
//! This crate provides pure data types with no dependency on an HTTP framework:
//! - RFC 7807 problem documents (`ProblemDetails`, `InvalidParam`)
//! - The closed set of error conditions (`ErrorCondition`) and their catalog entries
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod problem;

pub use catalog::{
    ErrDef, ErrorCondition, Instance, ProblemCode, SUPPORT_TEXT, UnknownCondition, resolve,
    resolve_named,
};
pub use problem::{
    APPLICATION_JSON, APPLICATION_PROBLEM_JSON, DETAIL_PLACEHOLDER, InvalidParam, ProblemDetails,
    ValidationError,
};

/// Resolve `condition` and point its `type` at the triggering request.
pub fn for_request(condition: ErrorCondition, request_uri: &str) -> ProblemDetails {
    condition.problem().with_type(request_uri)
}
