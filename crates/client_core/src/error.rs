use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid api base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("client storage failure: {0}")]
    Storage(#[source] anyhow::Error),
    #[error("stored profile is unreadable: {0}")]
    CorruptProfile(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidInput(String),
    #[error("voice input is not supported on this system")]
    RecognitionUnavailable,
    #[error("speech backend failure: {0}")]
    Speech(String),
    #[error("failed to read syllabus file: {0}")]
    SyllabusFile(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
