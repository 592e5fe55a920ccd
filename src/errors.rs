use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;

use crate::common::{atomic, Atomic};

/// Error kinds for Docket operations.
///
/// Each kind describes a category of failure, enabling callers to branch on
/// the failure class without parsing the message.
///
/// # Examples
///
/// ```rust,ignore
/// use docket::errors::{DocketError, ErrorKind, DocketResult};
///
/// fn example() -> DocketResult<()> {
///     Err(DocketError::new("unknown operator $foo", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The backing medium is unreadable, unwritable, or corrupted.
    /// Never substituted with an empty result.
    StorageError,
    /// Invalid input: unrecognized filter operator key, malformed regex
    /// pattern or flags, non-array `$in` operand, non-`$set` update.
    ValidationError,
    /// Reserved for lock-contention enforcement.
    ConcurrencyError,
    /// The provided document identifier is invalid.
    InvalidId,
    /// A document or value could not be encoded for persistence.
    EncodingError,
    /// The operation is not valid in the current context,
    /// e.g. against a closed database handle.
    InvalidOperation,
    /// Internal error (usually indicates a bug).
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::StorageError => write!(f, "Storage error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::ConcurrencyError => write!(f, "Concurrency error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom Docket error type.
///
/// `DocketError` carries the error message, kind, and an optional cause,
/// supporting error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use docket::errors::{DocketError, ErrorKind};
///
/// let cause = DocketError::new("read failed", ErrorKind::StorageError);
/// let err = DocketError::new_with_cause(
///     "collection 'designs' could not be loaded",
///     ErrorKind::StorageError,
///     cause,
/// );
/// ```
#[derive(Clone)]
pub struct DocketError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocketError>>,
    backtrace: Atomic<Backtrace>,
}

impl DocketError {
    /// Creates a new `DocketError` with the specified message and error kind.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocketError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: atomic(Backtrace::new()),
        }
    }

    /// Creates a new `DocketError` with a cause error.
    ///
    /// The cause is preserved in the error chain for debugging.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error
    /// * `error_kind` - The category of error
    /// * `cause` - The underlying error that caused this error
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocketError) -> Self {
        DocketError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: atomic(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocketError> {
        self.cause.as_deref()
    }
}

impl Display for DocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocketError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for DocketError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for Docket operations.
///
/// `DocketResult<T>` is shorthand for `Result<T, DocketError>`.
/// All fallible Docket operations return this type.
pub type DocketResult<T> = Result<T, DocketError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for DocketError {
    fn from(err: std::io::Error) -> Self {
        DocketError::new(&format!("IO error: {}", err), ErrorKind::StorageError)
    }
}

impl From<serde_json::Error> for DocketError {
    fn from(err: serde_json::Error) -> Self {
        DocketError::new(
            &format!("JSON serialization error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<std::string::FromUtf8Error> for DocketError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DocketError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for DocketError {
    fn from(msg: String) -> Self {
        DocketError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for DocketError {
    fn from(msg: &str) -> Self {
        DocketError::new(msg, ErrorKind::InternalError)
    }
}
