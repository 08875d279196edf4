use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

/// Why an exchange produced no response.
#[derive(Debug, thiserror::Error, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("expected an http:// or https:// url: {0}")]
    UnsupportedScheme(String),

    /// Method, header or body rejected while assembling the request.
    #[error("malformed request: {0}")]
    InvalidRequest(#[from] http::Error),

    #[error("connection failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("response body interrupted: {0}")]
    Body(#[from] hyper::Error),
}

impl Error {
    /// Snake-case label of the failure class, for log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}
