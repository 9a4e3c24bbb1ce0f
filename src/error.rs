//! Errors raised while evaluating eo sources.
//!
//! Every error is terminal: it unwinds the recursive evaluation up to the
//! driver, and no partial output survives it.

use std::path::PathBuf;

use thiserror::Error;

use crate::reader::Location;

/// The main result type for evaluation.
pub type EvalResult<T> = Result<T, Error>;

/// A construct that needs an explicit closing delimiter.
///
/// Comments and text literals are closed implicitly by the end of input,
/// so they have no entry here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    FunctionHeader,
    FunctionBody,
    Expression,
    Include,
}

impl std::fmt::Display for Construct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Construct::FunctionHeader => "function header",
            Construct::FunctionBody => "function body",
            Construct::Expression => "expression",
            Construct::Include => "include",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A byte literal whose second character is not an uppercase hex digit.
    #[error("malformed hex byte {pair:?} at {at}")]
    MalformedHex { pair: String, at: Location },

    #[error("unbound name {0:?}")]
    UnboundName(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulus by zero")]
    ModulusByZero,

    /// An integer operand or result that does not fit in 128 unsigned bits.
    #[error("arithmetic overflow in `{op}`")]
    Overflow { op: &'static str },

    #[error("cannot include {:?}", .path)]
    IncludeNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An include file that exists but could not be read as UTF-8 text.
    #[error("cannot read include file {:?}", .path)]
    IncludeUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unterminated {construct} starting at {at}")]
    UnterminatedConstruct { construct: Construct, at: Location },

    #[error("recursion limit of {limit} nested evaluations exceeded")]
    RecursionLimit { limit: usize },

    #[error("failed to read source")]
    Io(#[from] std::io::Error),
}
