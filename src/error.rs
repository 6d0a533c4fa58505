pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ConfigLoadError: {0}")]
    ConfigLoadError(#[from] envy::Error),
    #[error("PgPoolCreateError: {0}")]
    PgPoolCreateError(#[from] crate::db::pool::PgPoolCreateError),
    #[error("PgPoolRuntimeError: {0}")]
    PgPoolRuntimeError(#[from] crate::db::pool::PgPoolRuntimeError),
    #[error("PgPoolSyncCallError: {0}")]
    PgPoolSyncCallError(#[from] crate::db::pool::PgPoolSyncCallError),
    #[error("DbError: {0}")]
    DbError(#[from] diesel::result::Error),
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("ReqwestError: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("UrlParseError: {0}")]
    UrlParseError(#[from] url::ParseError),
    #[error("HttpStatusError: {0} returned {1}")]
    HttpStatusError(String, u16),
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("InvalidResponse: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Short type tag stored in the `error_type` column of missed items.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigLoadError(_) => "ConfigLoadError",
            Error::PgPoolCreateError(_) => "PgPoolCreateError",
            Error::PgPoolRuntimeError(_) => "PgPoolRuntimeError",
            Error::PgPoolSyncCallError(_) => "PgPoolSyncCallError",
            Error::DbError(_) => "DbError",
            Error::SerdeJsonError(_) => "SerdeJsonError",
            Error::ReqwestError(_) => "ReqwestError",
            Error::UrlParseError(_) => "UrlParseError",
            Error::HttpStatusError(..) => "HttpStatusError",
            Error::NotFound(_) => "NotFound",
            Error::InvalidResponse(_) => "InvalidResponse",
        }
    }
}
