//! Problem registry: the closed set of named error conditions and their catalog entries.

use std::fmt;
use std::str::FromStr;

use http::StatusCode;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

use crate::problem::ProblemDetails;

macro_rules! support_text {
    () => {
        " Please try again later or contact support at info@kviky.com!"
    };
}

/// Suffix appended to the detail of the generic fallback document.
pub const SUPPORT_TEXT: &str = support_text!();

const SYSTEM_FAILURE_DETAIL: &str = concat!(
    "We are sorry, but there is an internal problem with the application!",
    support_text!()
);

/// Stable machine-readable reason carried in `code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum ProblemCode {
    #[serde(rename = "Bad Request")]
    BadRequest,
    #[serde(rename = "Unauthorized")]
    Unauthorized,
    #[serde(rename = "Forbidden")]
    Forbidden,
    #[serde(rename = "Not Found")]
    NotFound,
    #[serde(rename = "Method Not Allowed")]
    MethodNotAllowed,
    #[serde(rename = "Too Many Requests")]
    TooManyRequests,
    #[serde(rename = "Internal Server Error")]
    InternalServerError,
    #[serde(rename = "Service Unavailable")]
    ServiceUnavailable,
    #[serde(rename = "Gateway Timeout")]
    GatewayTimeout,
}

impl ProblemCode {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::TooManyRequests => "Too Many Requests",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
            Self::GatewayTimeout => "Gateway Timeout",
        }
    }
}

impl fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsystem that raised a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Instance {
    App,
    Export,
    Image,
    Api,
    Identity,
    Client,
    Database,
}

impl Instance {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Export => "export",
            Self::Image => "image",
            Self::Api => "api",
            Self::Identity => "identity",
            Self::Client => "client",
            Self::Database => "database",
        }
    }
}

/// Static catalog entry for one [`ErrorCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub title: &'static str,
    pub code: ProblemCode,
    pub instance: Instance,
    pub detail: &'static str,
}

impl ErrDef {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Build the problem document for this entry with the `"/"` type placeholder.
    #[inline]
    pub fn as_problem(&self) -> ProblemDetails {
        ProblemDetails::new(self.code, self.instance, self.title, self.detail)
    }
}

/// Named business and protocol failures known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCondition {
    // 400 Bad Request
    AlreadyExists,
    BadRequest,
    CharterHasListings,
    CharterNotCreated,
    FileExistsAlready,
    FileNotCreated,
    InvalidBodyParam,
    InvalidDates,
    InvalidHeaderParam,
    InvalidMsgFormat,
    ImageInvalid,
    ImageNotDeleted,
    ImageNotUploaded,
    InactiveListing,
    InvalidOwnerListing,
    InvalidQueryParam,
    InvalidPathParam,
    ListingNotCreated,
    LocationNotCreated,
    MandatoryParamIncorrect,
    MandatoryParamMissing,
    NameAlreadyTaken,
    OffersEnded,
    OffersMaxListings,
    PortAlreadyExists,
    ReservationNotCreated,

    // 401 Unauthorized
    InvalidAuthToken,
    MissingAuthToken,
    UnauthorizedAccess,

    // 403 Forbidden
    ForbiddenAction,
    ForbiddenResource,
    ForbiddenUpload,

    // 404 Not Found
    CharterNotFound,
    ListingNotFound,
    LocationNotFound,
    ReservationNotFound,
    ResourceNotFound,
    UserNotFound,
    UsersNotFound,

    // 405 Method Not Allowed
    MethodNotAllowed,

    // 429 Too Many Requests
    CongestionRisk,

    // 500 Internal Server Error
    SystemFailure,
    UnspecifiedFailure,

    // 503 Service Unavailable
    ServiceUnavailable,

    // 504 Gateway Timeout
    GatewayTimeout,
}

impl ErrorCondition {
    /// Every condition, grouped by status class.
    pub const ALL: &'static [Self] = &[
        Self::AlreadyExists,
        Self::BadRequest,
        Self::CharterHasListings,
        Self::CharterNotCreated,
        Self::FileExistsAlready,
        Self::FileNotCreated,
        Self::InvalidBodyParam,
        Self::InvalidDates,
        Self::InvalidHeaderParam,
        Self::InvalidMsgFormat,
        Self::ImageInvalid,
        Self::ImageNotDeleted,
        Self::ImageNotUploaded,
        Self::InactiveListing,
        Self::InvalidOwnerListing,
        Self::InvalidQueryParam,
        Self::InvalidPathParam,
        Self::ListingNotCreated,
        Self::LocationNotCreated,
        Self::MandatoryParamIncorrect,
        Self::MandatoryParamMissing,
        Self::NameAlreadyTaken,
        Self::OffersEnded,
        Self::OffersMaxListings,
        Self::PortAlreadyExists,
        Self::ReservationNotCreated,
        Self::InvalidAuthToken,
        Self::MissingAuthToken,
        Self::UnauthorizedAccess,
        Self::ForbiddenAction,
        Self::ForbiddenResource,
        Self::ForbiddenUpload,
        Self::CharterNotFound,
        Self::ListingNotFound,
        Self::LocationNotFound,
        Self::ReservationNotFound,
        Self::ResourceNotFound,
        Self::UserNotFound,
        Self::UsersNotFound,
        Self::MethodNotAllowed,
        Self::CongestionRisk,
        Self::SystemFailure,
        Self::UnspecifiedFailure,
        Self::ServiceUnavailable,
        Self::GatewayTimeout,
    ];

    /// Catalog entry for this condition.
    #[must_use]
    #[allow(clippy::too_many_lines)] // one arm per catalog entry
    pub const fn def(self) -> ErrDef {
        match self {
            Self::AlreadyExists => ErrDef {
                title: "Already exists!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The requested resource already exists!",
            },
            Self::BadRequest => ErrDef {
                title: "Bad request!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "There was a problem with the request!",
            },
            Self::CharterHasListings => ErrDef {
                title: "Charter cannot be deleted!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Charter cannot be deleted, because it still has some active listings!",
            },
            Self::CharterNotCreated => ErrDef {
                title: "Charter not created!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "There was a problem to create charter profile!",
            },
            Self::FileExistsAlready => ErrDef {
                title: "File exists already!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "File with same name exists already! Please, specify another name.",
            },
            Self::FileNotCreated => ErrDef {
                title: "File not created!",
                code: ProblemCode::BadRequest,
                instance: Instance::Export,
                detail: "There was a problem to create file!",
            },
            Self::InvalidBodyParam => ErrDef {
                title: "Invalid body parameter!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The HTTP request contains an unsupported body parameter!",
            },
            Self::InvalidDates => ErrDef {
                title: "Invalid dates!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The requested dates are invalid!",
            },
            Self::InvalidHeaderParam => ErrDef {
                title: "Invalid header parameter!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The HTTP request contains an unsupported header parameter!",
            },
            Self::InvalidMsgFormat => ErrDef {
                title: "Invalid message format!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The HTTP request has an invalid format!",
            },
            Self::ImageInvalid => ErrDef {
                title: "File is not a valid image!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "File must be a valid image - image/jpeg, image/jpg, image/png!",
            },
            Self::ImageNotDeleted => ErrDef {
                title: "Image cannot be deleted!",
                code: ProblemCode::BadRequest,
                instance: Instance::Image,
                detail: "There was a problem to delete image!",
            },
            Self::ImageNotUploaded => ErrDef {
                title: "Image cannot be uploaded!",
                code: ProblemCode::BadRequest,
                instance: Instance::Image,
                detail: "There was a problem to upload image!",
            },
            Self::InactiveListing => ErrDef {
                title: "Inactive Listing!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Listing %v is not in the active state!",
            },
            Self::InvalidOwnerListing => ErrDef {
                title: "Invalid owner listing!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Charter doesn't own the listing %v!",
            },
            Self::InvalidQueryParam => ErrDef {
                title: "Invalid query parameter!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The HTTP request contains an unsupported query parameter in the URI!",
            },
            Self::InvalidPathParam => ErrDef {
                title: "Invalid path parameter!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "The HTTP request contains an unsupported path parameter in the URI!",
            },
            Self::ListingNotCreated => ErrDef {
                title: "Listing not created!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "There was a problem to create listing!",
            },
            Self::LocationNotCreated => ErrDef {
                title: "Location not created!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "There was a problem to create location!",
            },
            Self::MandatoryParamIncorrect => ErrDef {
                title: "Mandatory parameter incorrect!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Mandatory parameter has semantically incorrect value!",
            },
            Self::MandatoryParamMissing => ErrDef {
                title: "Mandatory parameter missing!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Parameter which is defined as mandatory is missing!",
            },
            Self::NameAlreadyTaken => ErrDef {
                title: "Name is already taken!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Requested name is already taken! Please, specify another name.",
            },
            Self::OffersEnded => ErrDef {
                title: "Offers ended today!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Available number of the offers ended for today!",
            },
            Self::OffersMaxListings => ErrDef {
                title: "Maximum listings reached!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Maximum limit of %v listings is reached. Please, reduce number of listings in offer!",
            },
            Self::PortAlreadyExists => ErrDef {
                title: "Port name exists already!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "Requested port/marina name already exists for this country and city!",
            },
            Self::ReservationNotCreated => ErrDef {
                title: "Reservation not created!",
                code: ProblemCode::BadRequest,
                instance: Instance::Client,
                detail: "There was a problem to create reservation!",
            },
            Self::InvalidAuthToken => ErrDef {
                title: "Invalid authorization token!",
                code: ProblemCode::Unauthorized,
                instance: Instance::Client,
                detail: "Authorization token is invalid!",
            },
            Self::MissingAuthToken => ErrDef {
                title: "Missing authorization token!",
                code: ProblemCode::Unauthorized,
                instance: Instance::Client,
                detail: "Authorization token is missing!",
            },
            Self::UnauthorizedAccess => ErrDef {
                title: "Unauthorized access!",
                code: ProblemCode::Unauthorized,
                instance: Instance::Api,
                detail: "The request doesn't have permissions to access resources!",
            },
            Self::ForbiddenAction => ErrDef {
                title: "Forbidden action!",
                code: ProblemCode::Forbidden,
                instance: Instance::Client,
                detail: "You don't have a permission to make this action!",
            },
            Self::ForbiddenResource => ErrDef {
                title: "Forbidden resource!",
                code: ProblemCode::Forbidden,
                instance: Instance::Client,
                detail: "You don't have a permission to access this resource!",
            },
            Self::ForbiddenUpload => ErrDef {
                title: "Forbidden upload!",
                code: ProblemCode::Forbidden,
                instance: Instance::Client,
                detail: "This accound doesn't have permission to upload images!",
            },
            Self::CharterNotFound => ErrDef {
                title: "Charter not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "The charter indicated in the request does not exist!",
            },
            Self::ListingNotFound => ErrDef {
                title: "Listing not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "The listing indicated in the request does not exist!",
            },
            Self::LocationNotFound => ErrDef {
                title: "Location not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "The location indicated in the request does not exist!",
            },
            Self::ReservationNotFound => ErrDef {
                title: "Reservation not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "Requested reservation does not exist!",
            },
            Self::ResourceNotFound => ErrDef {
                title: "Resource not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "Requested resource does not exist!",
            },
            Self::UserNotFound => ErrDef {
                title: "User not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "The user indicated in the request does not exist!",
            },
            Self::UsersNotFound => ErrDef {
                title: "Users not found!",
                code: ProblemCode::NotFound,
                instance: Instance::Client,
                detail: "Requested users does not exist!",
            },
            Self::MethodNotAllowed => ErrDef {
                title: "Method not allowed!",
                code: ProblemCode::MethodNotAllowed,
                instance: Instance::Client,
                detail: "Requested method is not allowed. Check the response header `Allow` for allowed methods!",
            },
            Self::CongestionRisk => ErrDef {
                title: "Too many requests!",
                code: ProblemCode::TooManyRequests,
                instance: Instance::Client,
                detail: "The request is rejected due to excessive traffic. If continued over time, may lead to an overload situation.",
            },
            Self::SystemFailure => ErrDef {
                title: "System failure!",
                code: ProblemCode::InternalServerError,
                instance: Instance::Api,
                detail: SYSTEM_FAILURE_DETAIL,
            },
            Self::UnspecifiedFailure => ErrDef {
                title: "Unspecified failure!",
                code: ProblemCode::InternalServerError,
                instance: Instance::Api,
                detail: "The request is rejected due to unspecified reason at the system!",
            },
            Self::ServiceUnavailable => ErrDef {
                title: "Service Unavailable!",
                code: ProblemCode::ServiceUnavailable,
                instance: Instance::Api,
                detail: "The service experiences congestion and performs overload control. It does not allow the request to be processed.",
            },
            Self::GatewayTimeout => ErrDef {
                title: "Gateway Timeout!",
                code: ProblemCode::GatewayTimeout,
                instance: Instance::Api,
                detail: "The request is rejected due a request that has timed out at the HTTP client.",
            },
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        self.def().title
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        self.def().status()
    }

    /// Problem document for this condition; `type` is left as `"/"`.
    pub fn problem(self) -> ProblemDetails {
        self.def().as_problem()
    }

    /// Look a condition up by its title.
    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.title() == title)
    }
}

impl fmt::Display for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Title that matches no registry entry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown error condition: '{0}'")]
pub struct UnknownCondition(pub String);

impl FromStr for ErrorCondition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_title(s).ok_or_else(|| UnknownCondition(s.to_owned()))
    }
}

/// Resolve a condition into its problem document.
pub fn resolve(condition: ErrorCondition) -> ProblemDetails {
    condition.problem()
}

/// Resolve a condition by title.
///
/// Empty or unknown titles yield the generic system failure document.
pub fn resolve_named(title: &str) -> ProblemDetails {
    ErrorCondition::from_title(title)
        .unwrap_or(ErrorCondition::SystemFailure)
        .problem()
}
