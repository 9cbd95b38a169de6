use thiserror::Error;

/// Application-level errors (command-line layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Unknown floating timezone: {0}")]
    UnknownZone(String),

    #[error("{0} diagnostics in strict mode")]
    Strict(usize),

    #[error("No VCALENDAR in input")]
    NoCalendar,

    #[error(transparent)]
    RfcError(#[from] kalends_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] kalends_core::error::CoreError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
