use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic, ReadExecutor};

/// Error kinds for docsnap operations.
///
/// Each kind describes one category of failure so callers can branch on it,
/// e.g. "create the document if it does not exist yet":
///
/// ```rust,ignore
/// use docsnap::errors::ErrorKind;
///
/// match Snapshot::<User>::get(&store, &path) {
///     Ok(user) => user,
///     Err(e) if e.kind() == &ErrorKind::NotExists => create_default(&store, &path)?,
///     Err(e) => return Err(e),
/// };
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The read succeeded but no document is stored at the location.
    NotExists,
    /// The backend reported that the target of a write does not exist.
    NotFound,
    /// The backend refused to create a document that already exists.
    AlreadyExists,

    /// A payload could not be converted to the wire format.
    EncodingError,
    /// A stored record could not be converted back to the payload type.
    DecodingError,

    /// A document or collection path is malformed.
    InvalidPath,
    /// The operation is not valid in the current context.
    InvalidOperation,

    /// A transaction gave up after exhausting its retries.
    TransactionAborted,

    /// Any error reported by the backend itself. The string is the backend's
    /// own error code, passed through verbatim.
    Backend(String),

    /// Listener registration or delivery failed.
    EventError,

    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotExists => write!(f, "Document does not exist"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::AlreadyExists => write!(f, "Already exists"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::DecodingError => write!(f, "Decoding error"),
            ErrorKind::InvalidPath => write!(f, "Invalid path"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::TransactionAborted => write!(f, "Transaction aborted"),
            ErrorKind::Backend(code) => write!(f, "Backend error ({})", code),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type for every fallible docsnap operation.
///
/// `SnapshotError` carries a message, a kind, an optional cause and the
/// backtrace captured at construction.
///
/// # Examples
///
/// ```rust,ignore
/// use docsnap::errors::{SnapshotError, ErrorKind};
///
/// let err = SnapshotError::new("mocks/ is not a document path", ErrorKind::InvalidPath);
///
/// let cause = SnapshotError::new("field 'count' is not an integer", ErrorKind::DecodingError);
/// let err = SnapshotError::new_with_cause("failed to read mocks/a", ErrorKind::DecodingError, cause);
/// ```
#[derive(Clone)]
pub struct SnapshotError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<SnapshotError>>,
    backtrace: Atomic<Backtrace>,
}

impl SnapshotError {
    /// Creates a new error with the given message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        SnapshotError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new error that wraps `cause`.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: SnapshotError) -> Self {
        SnapshotError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a backend error carrying the backend's own error code.
    pub fn backend(code: &str, message: &str) -> Self {
        SnapshotError::new(message, ErrorKind::Backend(code.to_string()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&SnapshotError> {
        self.cause.as_deref()
    }
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{} ({})\nCaused by: {:?}", self.message, self.error_kind, cause),
            None => {
                let backtrace = self.backtrace.read_with(|bt| format!("{:?}", bt));
                write!(f, "{} ({})\n{}", self.message, self.error_kind, backtrace)
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// Shorthand for `Result<T, SnapshotError>`.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[cfg(feature = "serde")]
impl serde::de::Error for SnapshotError {
    fn custom<T: Display>(msg: T) -> Self {
        SnapshotError::new(&msg.to_string(), ErrorKind::DecodingError)
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for SnapshotError {
    fn custom<T: Display>(msg: T) -> Self {
        SnapshotError::new(&msg.to_string(), ErrorKind::EncodingError)
    }
}

impl From<std::num::ParseIntError> for SnapshotError {
    fn from(err: std::num::ParseIntError) -> Self {
        SnapshotError::new(
            &format!("Integer parsing error: {}", err),
            ErrorKind::DecodingError,
        )
    }
}

impl From<std::num::TryFromIntError> for SnapshotError {
    fn from(err: std::num::TryFromIntError) -> Self {
        SnapshotError::new(
            &format!("Integer out of range: {}", err),
            ErrorKind::DecodingError,
        )
    }
}

impl From<String> for SnapshotError {
    fn from(msg: String) -> Self {
        SnapshotError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for SnapshotError {
    fn from(msg: &str) -> Self {
        SnapshotError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_error_new_creates_error() {
        let error = SnapshotError::new("no document", ErrorKind::NotExists);
        assert_eq!(error.message(), "no document");
        assert_eq!(error.kind(), &ErrorKind::NotExists);
        assert!(error.cause().is_none());
    }

    #[test]
    fn snapshot_error_with_cause_exposes_source() {
        let cause = SnapshotError::new("not an integer", ErrorKind::DecodingError);
        let error = SnapshotError::new_with_cause("read failed", ErrorKind::DecodingError, cause);
        assert!(error.cause().is_some());
        assert!(error.source().is_some());
        assert_eq!(error.cause().map(|c| c.message()), Some("not an integer"));
    }

    #[test]
    fn snapshot_error_display_is_message_only() {
        let error = SnapshotError::new("bad path", ErrorKind::InvalidPath);
        assert_eq!(format!("{}", error), "bad path");
    }

    #[test]
    fn snapshot_error_debug_contains_cause_chain() {
        let cause = SnapshotError::new("inner", ErrorKind::EncodingError);
        let error = SnapshotError::new_with_cause("outer", ErrorKind::EncodingError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
        assert!(formatted.contains("inner"));
    }

    #[test]
    fn backend_error_keeps_code_verbatim() {
        let error = SnapshotError::backend("permission-denied", "Missing or insufficient permissions");
        assert_eq!(error.kind(), &ErrorKind::Backend("permission-denied".to_string()));
        assert_eq!(error.kind().to_string(), "Backend error (permission-denied)");
    }

    #[test]
    fn try_from_int_error_maps_to_decoding_error() {
        let err: SnapshotError = u8::try_from(300i64).unwrap_err().into();
        assert_eq!(err.kind(), &ErrorKind::DecodingError);
    }

    #[test]
    fn string_conversion_is_internal_error() {
        let err: SnapshotError = "boom".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        let err: SnapshotError = String::from("boom").into();
        assert_eq!(err.message(), "boom");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_custom_errors_map_to_codec_kinds() {
        let de = <SnapshotError as serde::de::Error>::custom("bad input");
        assert_eq!(de.kind(), &ErrorKind::DecodingError);
        let ser = <SnapshotError as serde::ser::Error>::custom("bad output");
        assert_eq!(ser.kind(), &ErrorKind::EncodingError);
    }
}
