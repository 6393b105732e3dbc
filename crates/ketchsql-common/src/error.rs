
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
pub enum Error {
    /// An argument declared always-constant was not a constant column.
    IllegalColumn(String),
    /// Arity mismatch, or a constants-default recursion that would not
    /// terminate.
    ArgumentCountMismatch(String),
    TypeMismatch { expected: String, actual: String },
    FunctionNotFound(String),
    Internal(String),
}

impl Error {
    pub fn illegal_column(msg: impl Into<String>) -> Self {
        Error::IllegalColumn(msg.into())
    }

    pub fn argument_count_mismatch(msg: impl Into<String>) -> Self {
        Error::ArgumentCountMismatch(msg.into())
    }

    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn function_not_found(name: impl Into<String>) -> Self {
        Error::FunctionNotFound(name.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::IllegalColumn(msg) => write!(f, "Illegal column: {}", msg),
            Error::ArgumentCountMismatch(msg) => {
                write!(f, "Number of arguments doesn't match: {}", msg)
            }
            Error::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            Error::FunctionNotFound(name) => write!(f, "Function not found: {}", name),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
