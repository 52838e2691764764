//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants
//! cover fatal region configuration problems (duplicate templates, exclusion groups spanning object
//! types), invalid limits, lookups that the caller asked to be strict, and failures reported by
//! external asset collaborators.
use thiserror::Error;

use crate::template::{ObjectType, TemplateName};

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate template '{name}'")]
    DuplicateTemplate { name: TemplateName },

    #[error(
        "exclusion group '{group}' holds '{expected}' templates, but '{template}' is '{found}'"
    )]
    ExclusionTypeMismatch {
        group: String,
        template: TemplateName,
        expected: ObjectType,
        found: ObjectType,
    },

    #[error("invalid limits: min {min} > max {max}")]
    InvalidLimits { min: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown template '{name}'")]
    UnknownTemplate { name: TemplateName },

    #[error("unknown base '{name}'")]
    UnknownBase { name: String },

    #[error("region '{region}' has already been generated")]
    AlreadyGenerated { region: String },

    #[error("asset error: {0}")]
    Asset(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns `true` for errors that abort region setup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateTemplate { .. }
                | Error::ExclusionTypeMismatch { .. }
                | Error::InvalidLimits { .. }
                | Error::InvalidConfig(_)
        )
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
