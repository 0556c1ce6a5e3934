//! Dispatcher configuration.
//!
//! Loading is lenient: a missing section, or one that is not an object, yields
//! [`DispatchConfig::default`]. A present but malformed section is an error.

use http::HeaderValue;
use problem_details::{APPLICATION_JSON, ErrorCondition, ProblemDetails, SUPPORT_TEXT};
use serde::{Deserialize, Serialize};

/// Configuration error for the dispatcher
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid dispatch config: {source}")]
    Invalid {
        #[source]
        source: serde_json::Error,
    },
    #[error("content type '{value}' is not a valid header value")]
    InvalidContentType { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    /// `Content-Type` of every problem response.
    pub content_type: String,
    /// Replacement for the support-contact suffix of the fallback document.
    pub support_text: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            content_type: APPLICATION_JSON.to_owned(),
            support_text: None,
        }
    }
}

impl DispatchConfig {
    /// Load from an optional raw JSON section.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the section is an object that cannot be
    /// deserialized or carries an invalid content type.
    pub fn from_section(section: Option<&serde_json::Value>) -> Result<Self, ConfigError> {
        let Some(section) = section.filter(|s| s.is_object()) else {
            return Ok(Self::default());
        };

        let config: Self = serde_json::from_value(section.clone())
            .map_err(|source| ConfigError::Invalid { source })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError`] if `raw` is not valid JSON or fails validation.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|source| ConfigError::Invalid { source })?;
        Self::from_section(Some(&value))
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidContentType`] if the content type cannot be
    /// sent as a header value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        HeaderValue::from_str(&self.content_type).map_err(|_| {
            ConfigError::InvalidContentType {
                value: self.content_type.clone(),
            }
        })?;
        Ok(())
    }

    /// Generic system failure document, honoring `support_text`.
    pub fn fallback_problem(&self) -> ProblemDetails {
        let problem = ErrorCondition::SystemFailure.problem();
        let Some(support_text) = &self.support_text else {
            return problem;
        };

        let base = problem
            .detail
            .strip_suffix(SUPPORT_TEXT)
            .unwrap_or(&problem.detail)
            .to_owned();
        problem.with_detail(base + support_text)
    }
}
