use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}
