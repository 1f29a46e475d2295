use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed service response: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("service response had no usable record")]
    EmptyRecord,

    #[error("invalid service url {url}: {reason}")]
    Url { url: String, reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("input has no column named {0:?}")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LookupError>;
