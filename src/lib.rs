//! eo: a macro language for writing binary data.
//!
//! A source mixes hex byte pairs, quoted text, comments, function
//! definitions, bracketed expressions and file includes. Evaluating it
//! produces one byte sequence:
//!
//! ```
//! let output = eo::evaluate(r#"@greet who { "hello " who } greet "eo" 21"#).unwrap();
//! assert_eq!(output, b"hello eo!");
//! ```

pub mod data;
pub mod error;
pub mod eval;
pub mod reader;

pub use data::Environment;
pub use error::{Error, EvalResult};
pub use eval::{evaluate, Evaluator, Options};
