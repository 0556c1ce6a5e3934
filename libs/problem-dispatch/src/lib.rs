//! Request error classification and problem response selection
//!
//! Walks the errors produced by the request validation layer, buckets validation
//! leaves by origin and writes the single most relevant problem document:
//! - Inbound error model and flattening (`RequestError`, `flatten`)
//! - Buckets and their reporting priority (`Bucket`, `BUCKET_PRIORITY`)
//! - The dispatcher with injected response sink and failure logger
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod bucket;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod sink;

pub use bucket::{BUCKET_PRIORITY, Bucket, Buckets, Selection};
pub use config::{ConfigError, DispatchConfig};
pub use dispatch::{Dispatcher, FailureLogger, RequestInfo, TracingLogger};
pub use error::{
    CodedError, FieldError, INVALID_TYPE_CODE, Location, MethodNotAllowed, REQUIRED_CODE,
    RequestError, flatten,
};
pub use sink::{ProblemResponse, ProblemSink};
