use std::error::Error as StdError;
use std::fmt;
use std::io;

/// Why a quoted field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteFault {
    /// The closing quote was followed by this byte instead of a delimiter or row end.
    UnexpectedByte(u8),
    /// The row (or the buffer) ended before the closing quote.
    Unterminated,
}

impl fmt::Display for QuoteFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QuoteFault::UnexpectedByte(byte) if byte.is_ascii_graphic() || byte == b' ' => {
                write!(f, "expected ',' after closing quote, found '{}'", char::from(byte))
            }
            QuoteFault::UnexpectedByte(byte) => {
                write!(f, "expected ',' after closing quote, found byte 0x{:02x}", byte)
            }
            QuoteFault::Unterminated => write!(f, "missing closing quote"),
        }
    }
}

/// An error that occurs while loading, parsing or converting CSV data.
#[derive(Debug)]
pub enum Error {
    /// The source could not be opened, read, or was not valid UTF-8.
    Io {
        /// Path or label of the source.
        label: String,
        err: io::Error,
    },
    /// A quoted field was not closed properly. Fatal to table construction.
    MalformedQuotedField {
        /// Path or label of the source.
        label: String,
        /// 1-based line number.
        line: usize,
        fault: QuoteFault,
        /// Text of the offending line, possibly truncated.
        context: String,
    },
    /// A cell's text is not a valid value of the requested type.
    InvalidFormat { text: String, target: &'static str },
    /// A cell's text is well-formed but does not fit the requested type.
    OutOfRange { text: String, target: &'static str },
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io<L: Into<String>>(label: L, err: io::Error) -> Error {
        Error::Io { label: label.into(), err }
    }

    /// Returns `true` for errors raised while building a table (as opposed to cell
    /// conversion errors, which leave the table untouched).
    pub fn is_construction_error(&self) -> bool {
        matches!(*self, Error::Io { .. } | Error::MalformedQuotedField { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io { ref label, ref err } => write!(f, "{}: {}", label, err),
            Error::MalformedQuotedField { ref label, line, fault, ref context } => write!(
                f,
                "{}:{}: malformed quoted field ({}) in `{}`",
                label, line, fault, context
            ),
            Error::InvalidFormat { ref text, target } => {
                write!(f, "cannot convert \"{}\" to {}: invalid format", text, target)
            }
            Error::OutOfRange { ref text, target } => {
                write!(f, "cannot convert \"{}\" to {}: out of range", text, target)
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io { ref err, .. } => Some(err),
            _ => None,
        }
    }
}
