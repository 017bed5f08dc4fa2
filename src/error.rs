//! Error management.

use derive_more::Display;

#[derive(Debug, Display)]
pub enum Error {
    /// Malformed or unexpected input while parsing a file.
    #[display(fmt = "format error at byte {}: {}", offset, message)]
    Format { offset: usize, message: String },
    #[display(fmt = "I/O error: {}", _0)]
    Io(std::io::Error),
    /// A caller violated a precondition.
    #[display(fmt = "domain error: {}", _0)]
    Domain(String),
    /// Ranks entered different collective operations.
    #[display(fmt = "collective mismatch: {}", _0)]
    CollectiveMismatch(String),
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn format_error<T, S: Into<String>>(offset: usize, message: S) -> Result<T> {
    Err(Error::Format {
        offset,
        message: message.into(),
    })
}

pub(crate) fn domain_error<T, S: Into<String>>(message: S) -> Result<T> {
    Err(Error::Domain(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Format {
            offset: 12,
            message: "expected integer".to_string(),
        };
        assert_eq!(err.to_string(), "format error at byte 12: expected integer");
        assert_eq!(
            Error::Domain("bad width".to_string()).to_string(),
            "domain error: bad width"
        );
    }

    #[test]
    fn test_from_io() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
