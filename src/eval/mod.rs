//! The eo evaluator.
//!
//! Evaluation is a single pass over a [`Cursor`]: the dispatcher reads one
//! character, picks the construct it starts, and hands the cursor to that
//! construct's reader. Readers recurse back into the dispatcher (arguments,
//! operands) or into a fresh driver over new text (function bodies, operand
//! values, include paths and included files).
//!
//! There are three pieces of state:
//!
//! -   The _cursor_ of the current frame. Each nested evaluation owns its own.
//! -   The _environment_, passed by reference and cloned into any scope that
//!     may add definitions. Only a driver mutates its own copy.
//! -   The _depth_ of nested evaluations, which bounds recursion.

use std::cell::Cell;
use std::io::Read;
use std::path::PathBuf;

use crate::data::{Environment, FunctionDef, Symbols};
use crate::error::{Construct, Error, EvalResult};
use crate::reader::{literal, Cursor};

mod expression;
mod function;
mod include;
mod operators;

pub use expression::Operand;
pub use operators::{Operator, OPERATORS};


/// Environment variable holding extra include directories.
pub const PATH_VAR: &str = "EO_PATH";

/// Evaluator configuration.
#[derive(Debug, Clone)]
pub struct Options {
    /// How many evaluations may be nested (function bodies, operands, includes)
    /// before evaluation fails with [`Error::RecursionLimit`].
    pub max_depth: usize,
    /// Directories searched, in order, for relative include paths that
    /// don't resolve from the working directory.
    pub include_paths: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: 128,
            include_paths: Vec::new(),
        }
    }
}

impl Options {
    /// Default options, with include directories from `EO_PATH` appended.
    pub fn from_env() -> Self {
        let mut options = Options::default();
        if let Some(paths) = std::env::var_os(PATH_VAR) {
            options.include_paths.extend(std::env::split_paths(&paths));
        }
        options
    }
}

/// One value read by the dispatcher.
#[derive(Debug)]
pub enum Value {
    Byte(u8),
    Text(String),
    Definition(FunctionDef),
    Expression(Vec<u8>),
    /// Output of an included file, and the environment it finished with.
    Include {
        output: Vec<u8>,
        scope: Environment,
    },
    Call(Vec<u8>),
    /// A comment.
    Skip,
}

impl Value {
    /// The bytes this value contributes to output.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Value::Byte(b) => vec![b],
            Value::Text(s) => s.into_bytes(),
            Value::Expression(v) | Value::Call(v) | Value::Include { output: v, .. } => v,
            Value::Definition(_) | Value::Skip => Vec::new(),
        }
    }
}

/// Evaluation context: options, interned names, and the nesting depth.
///
/// An [`Environment`] is only meaningful to the evaluator whose symbol table
/// interned its names.
#[derive(Default)]
pub struct Evaluator {
    options: Options,
    symbols: Symbols,
    depth: Cell<usize>,
}

/// Tracks one level of nested evaluation; releases it on drop.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_options(options: Options) -> Self {
        Evaluator {
            options,
            ..Default::default()
        }
    }

    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    /// An empty environment.
    pub fn environment(&self) -> Environment {
        Environment::new()
    }

    /// Evaluate `source` under a copy of `env`.
    ///
    /// Definitions made by the source don't outlive the call.
    pub fn evaluate(&self, source: &str, env: &Environment) -> EvalResult<Vec<u8>> {
        let mut env = env.clone();
        self.run(source, &mut env)
    }

    /// Read a whole stream, then evaluate it under a copy of `env`.
    pub fn evaluate_reader(&self, mut input: impl Read, env: &Environment) -> EvalResult<Vec<u8>> {
        let mut source = String::new();
        input.read_to_string(&mut source)?;
        self.evaluate(&source, env)
    }

    /// The driver: dispatch until end of buffer, installing definitions into
    /// `env` and accumulating everything else.
    pub fn run(&self, source: &str, env: &mut Environment) -> EvalResult<Vec<u8>> {
        let _guard = self.enter()?;
        let mut cursor = Cursor::new(source);
        let mut output = Vec::new();
        while !cursor.is_at_end() {
            match self.next_value(&mut cursor, env)? {
                Value::Definition(def) => {
                    tracing::debug!("define {:?}", self.symbols.resolve(def.name));
                    env.define(def);
                }
                Value::Include { output: included, scope } => {
                    *env = scope;
                    output.extend(included);
                }
                value => output.extend(value.into_bytes()),
            }
        }
        Ok(output)
    }

    /// The dispatcher: read the next value from `cursor`.
    ///
    /// At end of buffer this is an empty text literal. Characters that start
    /// no construct (whitespace, punctuation) are skipped.
    pub fn next_value(&self, cursor: &mut Cursor, env: &Environment) -> EvalResult<Value> {
        loop {
            let Some(ch) = cursor.read() else {
                return Ok(Value::Text(String::new()));
            };
            let value = match ch {
                '(' => {
                    literal::skip_comment(cursor);
                    Value::Skip
                }
                ch if literal::is_hex_digit(ch) => Value::Byte(literal::read_byte(ch, cursor)?),
                '"' => Value::Text(literal::read_text(cursor).to_owned()),
                '@' => Value::Definition(self.read_definition(cursor)?),
                '[' => Value::Expression(self.read_expression(cursor, env)?),
                '#' => {
                    let (output, scope) = self.read_include(cursor, env)?;
                    Value::Include { output, scope }
                }
                ch if literal::is_identifier_char(ch) => {
                    let name = literal::read_identifier(ch, cursor);
                    Value::Call(self.call(name, cursor, env)?)
                }
                _ => continue,
            };
            tracing::trace!("read {:?}", value);
            return Ok(value);
        }
    }

    fn enter(&self) -> EvalResult<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            return Err(Error::RecursionLimit {
                limit: self.options.max_depth,
            });
        }
        self.depth.set(depth + 1);
        Ok(DepthGuard { depth: &self.depth })
    }
}

/// The error for a construct opened at byte `start` that ran into end of buffer.
fn unterminated(cursor: &Cursor, construct: Construct, start: usize) -> Error {
    Error::UnterminatedConstruct {
        construct,
        at: cursor.location_of(start),
    }
}

/// Evaluate a source with an empty environment and default options.
pub fn evaluate(source: &str) -> EvalResult<Vec<u8>> {
    let evaluator = Evaluator::new();
    evaluator.evaluate(source, &evaluator.environment())
}
