use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("pdf is encrypted and the empty password does not open it")]
    PdfEncrypted,

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed source record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown jurisdiction code: {0}")]
    UnknownJurisdiction(String),

    #[error("unknown collection code: {0}")]
    UnknownCollection(String),

    #[error("record is missing {field}: {record}")]
    MissingField { field: &'static str, record: String },

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document already exists: {0}")]
    UniqueViolation(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source error: {0}")]
    Source(#[from] NormalizeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("oracle request failed: {0}")]
    Oracle(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("govinfo search for {collection} returned {count} results, the cap is {cap}")]
    TooManyResults {
        collection: String,
        count: u64,
        cap: u64,
    },

    #[error("govinfo request failed: {0}")]
    Request(String),

    #[error("content list error: {0}")]
    ContentList(#[from] NormalizeError),
}

pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;
