use thiserror::Error;

use crate::edit::HamType;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
}

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Parse error: {detail}")]
    ParseError { detail: String },
    #[error("Error interpreting UTF-8 string: {err}")]
    Utf8Error {
        #[from]
        err: std::str::Utf8Error,
    },
    #[error("Error interpreting UTF-8 string: {err}")]
    FromUtf8Error {
        #[from]
        err: std::string::FromUtf8Error,
    },
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Base file codec failure: {0}")]
    BaseFile(String),
    #[error("Operation is not supported for {0:?} elements")]
    UnsupportedElement(HamType),
    #[error("No {element_type:?} element at index {index} (have {count})")]
    ElementOutOfRange {
        element_type: HamType,
        index: usize,
        count: usize,
    },
    #[error("{table} value {value} does not fit its on-disk field")]
    TableOverflow { table: &'static str, value: usize },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<winnow::error::ErrMode<winnow::error::ContextError>> for Error {
    fn from(e: winnow::error::ErrMode<winnow::error::ContextError>) -> Self {
        Self {
            kind: ErrorKind::ParseError {
                detail: format!("{e}"),
            },
        }
    }
}

impl From<winnow::error::ErrMode<winnow::error::ContextError>> for ErrorKind {
    fn from(e: winnow::error::ErrMode<winnow::error::ContextError>) -> Self {
        ErrorKind::ParseError {
            detail: format!("{e}"),
        }
    }
}

impl std::convert::From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error { kind }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(x: std::io::Error) -> Error {
        Error { kind: x.into() }
    }
}

impl std::convert::From<std::str::Utf8Error> for Error {
    fn from(x: std::str::Utf8Error) -> Error {
        Error { kind: x.into() }
    }
}

impl std::convert::From<std::string::FromUtf8Error> for Error {
    fn from(x: std::string::FromUtf8Error) -> Error {
        Error { kind: x.into() }
    }
}

pub type IResult<T> = Result<T, Error>;

/// Convert an index or count to the width of the field that stores it.
pub(crate) fn narrow<T: TryFrom<usize>>(table: &'static str, value: usize) -> Result<T, ErrorKind> {
    T::try_from(value).map_err(|_| ErrorKind::TableOverflow { table, value })
}
