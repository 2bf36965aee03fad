use thiserror::Error;

/// Errors produced by the parsing core.
///
/// `Structure` means the page (or JSON payload) no longer matches the shape
/// the parser was written against: a required field is missing or malformed.
/// It always carries the parser and field names so markup drift can be
/// located without re-running the scrape under a debugger.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("{parser}: required field `{field}` is missing or malformed")]
    Structure {
        parser: &'static str,
        field: String,
    },

    /// The stream endpoint answered with a "sign in first" message instead of
    /// a manifest. Callers should prompt for authentication, not retry.
    #[error("the requested stream needs an authenticated session")]
    AuthRequired,

    #[error("failed to decrypt stream payload: {0}")]
    Decrypt(String),
}

impl ScrapeError {
    pub fn structure(parser: &'static str, field: impl Into<String>) -> Self {
        ScrapeError::Structure {
            parser,
            field: field.into(),
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
