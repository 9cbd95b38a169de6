use thiserror::Error;

use crate::rfc::ical::expand::{ExpansionError, VTimezoneError};
use crate::rfc::ical::parse::ParseError;
use crate::rfc::ical::query::QueryError;
use crate::rfc::ical::validate::ValidationError;

/// RFC parsing, validation, expansion and query errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Expansion error: {0}")]
    ExpansionError(#[from] ExpansionError),

    #[error("Timezone error: {0}")]
    VTimezoneError(#[from] VTimezoneError),

    #[error("Query error: {0}")]
    QueryError(#[from] QueryError),

    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
