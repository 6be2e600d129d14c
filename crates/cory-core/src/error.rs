#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{what} not opened for writing")]
    WriteProtected { what: &'static str },

    #[error("{field} must be {expected}")]
    WrongKind {
        field: String,
        expected: &'static str,
    },

    #[error("length of {field} value should be {expected}, got {got}")]
    ValueRange {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("data integrity: {0}")]
    DataIntegrity(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(format!("base64: {}", e))
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Decode(format!("hex: {}", e))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Io(std::io::Error::other(e.to_string()))
    }
}

impl Error {
    pub(crate) fn wrong_kind(field: impl Into<String>, expected: &'static str) -> Self {
        Error::WrongKind {
            field: field.into(),
            expected,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
