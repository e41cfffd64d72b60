use crate::types::{BinaryOp, QValue, UnaryOp};
use quill_bytecode::SourcePos;
use std::{error, fmt, path::PathBuf};
use thiserror::Error;

/// The different error kinds that can be produced by the Quill runtime
#[derive(Error, Clone, Debug)]
#[allow(missing_docs)]
pub enum ErrorKind {
    #[error("{0}")]
    StringError(String),
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid operation: {lhs_type} {op} {rhs_type}")]
    InvalidBinaryOp {
        lhs_type: &'static str,
        op: BinaryOp,
        rhs_type: &'static str,
    },
    #[error("invalid operation: {op}{operand_type}")]
    InvalidUnaryOp {
        op: UnaryOp,
        operand_type: &'static str,
    },
    #[error("division by zero")]
    DivideByZero,
    #[error("negative shift count: {count}")]
    NegativeShiftCount { count: i64 },
    #[error("not indexable: {type_name}")]
    NotIndexable { type_name: &'static str },
    #[error("not index-assignable: {type_name}")]
    NotIndexAssignable { type_name: &'static str },
    #[error("invalid index type: {type_name}")]
    InvalidIndexType { type_name: &'static str },
    #[error("invalid index value type: {type_name}")]
    InvalidIndexValueType { type_name: &'static str },
    #[error("index out of bounds: {index}")]
    IndexOutOfBounds { index: i64 },
    #[error("cannot assign to immutable value: {type_name}")]
    ImmutableAssignment { type_name: &'static str },
    #[error("invalid slice index type: {type_name}")]
    InvalidSliceIndexType { type_name: &'static str },
    #[error("invalid slice index: {low} > {high}")]
    InvalidSliceIndex { low: i64, high: i64 },
    #[error("invalid index on error")]
    InvalidErrorIndex,
    #[error("not iterable: {type_name}")]
    NotIterable { type_name: &'static str },
    #[error("not callable: {type_name}")]
    NotCallable { type_name: &'static str },
    #[error("not a function: {type_name}")]
    NotAFunction { type_name: &'static str },
    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongNumberOfArguments { want: usize, got: usize },
    #[error("invalid type for argument '{name}': expected {expected}, found {found}")]
    UnexpectedArgumentType {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("module '{name}' not found")]
    ModuleNotFound { name: String },
}

/// An error produced by the Quill runtime
///
/// Errors raised while a program is running carry the source position of the
/// instruction that failed, and render as `file:line:col: message`.
#[derive(Clone, Debug)]
pub struct Error {
    pub(crate) kind: ErrorKind,
    position: Option<ErrorPosition>,
}

#[derive(Clone, Debug)]
struct ErrorPosition {
    path: Option<PathBuf>,
    pos: SourcePos,
}

impl Error {
    /// Initializes an error with the given internal error kind
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            position: None,
        }
    }

    /// The error's kind
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Attaches a source position to the error
    ///
    /// The first position wins; errors that cross several frames keep the
    /// position of the instruction that originally failed.
    #[must_use]
    pub(crate) fn with_position(mut self, path: Option<PathBuf>, pos: SourcePos) -> Self {
        if self.position.is_none() {
            self.position = Some(ErrorPosition { path, pos });
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(position) => {
                match &position.path {
                    Some(path) => write!(f, "{}", path.display())?,
                    None => f.write_str("<script>")?,
                }
                write!(f, ":{}: {}", position.pos, self.kind)
            }
            None => write!(f, "{}", self.kind),
        }
    }
}

impl error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<String> for Error {
    fn from(error: String) -> Self {
        Self::new(ErrorKind::StringError(error))
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Self::new(ErrorKind::StringError(error.into()))
    }
}

/// The Result type used by the Quill runtime
pub type Result<T> = std::result::Result<T, Error>;

/// Creates an [Error] from a message or an [ErrorKind], wrapped in `Err`
///
/// Wrapping the result in `Err` is a convenience for functions that need to
/// return immediately when an error has occurred.
#[macro_export]
macro_rules! runtime_error {
    ($error:literal) => {
        Err($crate::Error::from(format!($error)))
    };
    ($error:expr) => {
        Err($crate::Error::from($error))
    };
    ($error:literal, $($y:expr),+ $(,)?) => {
        Err($crate::Error::from(format!($error, $($y),+)))
    };
}

/// Creates an error that describes a type mismatch, wrapped in `Err`
pub fn unexpected_type<T>(expected: &'static str, found: &QValue) -> Result<T> {
    runtime_error!(ErrorKind::UnexpectedType {
        expected,
        found: found.type_as_string(),
    })
}

/// Creates an error that describes a mismatched argument, wrapped in `Err`
pub fn unexpected_argument_type<T>(
    name: &'static str,
    expected: &'static str,
    found: &QValue,
) -> Result<T> {
    runtime_error!(ErrorKind::UnexpectedArgumentType {
        name,
        expected,
        found: found.type_as_string(),
    })
}

/// Creates an error that describes a mismatched argument count, wrapped in `Err`
pub fn wrong_number_of_arguments<T>(want: usize, got: usize) -> Result<T> {
    runtime_error!(ErrorKind::WrongNumberOfArguments { want, got })
}
