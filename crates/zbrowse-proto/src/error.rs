use thiserror::Error;

/// Every way a master or server exchange can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("failed to resolve master host: {0}")]
    ResolveFailed(String),

    #[error("huffman encode would exceed size bound: {0}")]
    EncodeOverflow(String),

    #[error("huffman decode truncated: {0}")]
    DecodeTruncated(String),

    #[error("banned: {0}")]
    Banned(String),

    #[error("wrong protocol version")]
    WrongVersion,

    #[error("timed out waiting for response")]
    Timeout,

    #[error("transport error: {0}")]
    TransportFailed(String),

    #[error("short read while parsing: {0}")]
    ParseShortRead(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("partial success: {0}")]
    PartialSuccess(String),
}

pub type Result<T> = std::result::Result<T, BrowserError>;
