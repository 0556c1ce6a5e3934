//! Grouping of validation leaves by origin and selection of the reported group

use std::fmt;

use problem_details::{ErrorCondition, InvalidParam, ProblemDetails, for_request};

use crate::error::{FieldError, Location, RequestError};

/// Origin class of a failed validation leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    BodyInvalid,
    BodyMissing,
    QueryInvalid,
    QueryMissing,
    PathInvalid,
    HeaderInvalid,
    Unclassified,
}

/// Order in which non-empty buckets are reported; the first one wins.
///
/// Body failures come first. Path and header leaves have no missing/invalid split.
pub const BUCKET_PRIORITY: [Bucket; 7] = [
    Bucket::BodyInvalid,
    Bucket::BodyMissing,
    Bucket::QueryInvalid,
    Bucket::QueryMissing,
    Bucket::PathInvalid,
    Bucket::HeaderInvalid,
    Bucket::Unclassified,
];

impl Bucket {
    /// Condition used to build the document for this bucket.
    #[must_use]
    pub const fn condition(self) -> ErrorCondition {
        match self {
            Self::BodyInvalid => ErrorCondition::InvalidBodyParam,
            Self::BodyMissing | Self::QueryMissing => ErrorCondition::MandatoryParamMissing,
            Self::QueryInvalid => ErrorCondition::InvalidQueryParam,
            Self::PathInvalid => ErrorCondition::InvalidPathParam,
            Self::HeaderInvalid => ErrorCondition::InvalidHeaderParam,
            Self::Unclassified => ErrorCondition::InvalidMsgFormat,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BodyInvalid => "body-invalid",
            Self::BodyMissing => "body-missing",
            Self::QueryInvalid => "query-invalid",
            Self::QueryMissing => "query-missing",
            Self::PathInvalid => "path-invalid",
            Self::HeaderInvalid => "header-invalid",
            Self::Unclassified => "unclassified",
        }
    }

    /// Bucket for a field-validation leaf.
    #[must_use]
    pub fn for_validation(leaf: &FieldError) -> Self {
        match leaf.location {
            Location::Body => Self::for_body(leaf),
            Location::Query if leaf.is_required() => Self::QueryMissing,
            Location::Query => Self::QueryInvalid,
            Location::Path => Self::PathInvalid,
            Location::Header => Self::HeaderInvalid,
            Location::Other(_) => Self::Unclassified,
        }
    }

    /// Bucket for a parse leaf; only body parse failures are bucketed.
    #[must_use]
    pub fn for_parse(leaf: &FieldError) -> Option<Self> {
        (leaf.location == Location::Body).then(|| Self::for_body(leaf))
    }

    fn for_body(leaf: &FieldError) -> Self {
        if leaf.is_body_structural() {
            Self::Unclassified
        } else if leaf.is_required() {
            Self::BodyMissing
        } else {
            Self::BodyInvalid
        }
    }

    /// Route a flattened leaf.
    ///
    /// `None` means the leaf cannot be bucketed and must be served on its own.
    #[must_use]
    pub fn route(leaf: &RequestError) -> Option<(Self, &FieldError)> {
        match leaf {
            RequestError::Validation(field) => Some((Self::for_validation(field), field)),
            RequestError::Parse(field) => Self::for_parse(field).map(|bucket| (bucket, field)),
            RequestError::Composite(_)
            | RequestError::MethodNotAllowed(_)
            | RequestError::Coded(_)
            | RequestError::Opaque(_) => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Invalid parameters collected during one dispatch, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    entries: Vec<(Bucket, InvalidParam)>,
}

/// The bucket chosen for the response and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub bucket: Bucket,
    pub params: Vec<InvalidParam>,
}

impl Buckets {
    pub fn push(&mut self, bucket: Bucket, param: InvalidParam) {
        self.entries.push((bucket, param));
    }

    /// Append the report for `leaf` to `bucket`.
    pub fn push_leaf(&mut self, bucket: Bucket, leaf: &FieldError) {
        self.push(
            bucket,
            InvalidParam::new(leaf.name.clone(), leaf.message.clone()),
        );
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameters held by `bucket`, in arrival order.
    pub fn params(&self, bucket: Bucket) -> impl Iterator<Item = &InvalidParam> {
        self.entries
            .iter()
            .filter(move |(b, _)| *b == bucket)
            .map(|(_, param)| param)
    }

    /// First non-empty bucket in [`BUCKET_PRIORITY`] order.
    #[must_use]
    pub fn select(self) -> Option<Selection> {
        let bucket = BUCKET_PRIORITY
            .into_iter()
            .find(|bucket| self.entries.iter().any(|(b, _)| b == bucket))?;
        let params = self
            .entries
            .into_iter()
            .filter(|(b, _)| *b == bucket)
            .map(|(_, param)| param)
            .collect();
        Some(Selection { bucket, params })
    }
}

impl Selection {
    /// Problem document for this selection, typed with the request URI.
    pub fn into_problem(self, request_uri: &str) -> ProblemDetails {
        for_request(self.bucket.condition(), request_uri).with_invalid_params(self.params)
    }
}
