//! Bracketed operator chains.
//!
//! `[ operand (operator operand)* ]` is folded strictly left to right, with
//! no precedence: `[ 01 + 02 * 03 ]` is `(01 + 02) * 03`.
//!
//! Operands are collected as raw source text and only evaluated when an
//! operator needs their value, so the right side of `?` is never evaluated
//! when the condition is false.

use std::borrow::Cow;

use crate::data::Environment;
use crate::error::{Construct, EvalResult};
use crate::reader::Cursor;

use super::operators::{self, Operator};
use super::{unterminated, Evaluator};

/// An expression operand: source text not yet evaluated, or an
/// intermediate result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand<'a> {
    Deferred(&'a str),
    Evaluated(Vec<u8>),
}

impl Operand<'_> {
    /// The operand's output: evaluate deferred text, or take the result as-is.
    pub fn force(self, evaluator: &Evaluator, env: &Environment) -> EvalResult<Vec<u8>> {
        match self {
            Operand::Deferred(source) => evaluator.evaluate(source, env),
            Operand::Evaluated(bytes) => Ok(bytes),
        }
    }

    /// The operand as eo source.
    ///
    /// Results render as uppercase hex pairs, which read back as byte literals.
    pub fn to_source(&self) -> Cow<'_, str> {
        match self {
            Operand::Deferred(source) => Cow::Borrowed(source),
            Operand::Evaluated(bytes) => Cow::Owned(operators::encode_hex(bytes)),
        }
    }
}

impl Evaluator {
    /// Read and reduce an expression after its `[`.
    pub(super) fn read_expression(
        &self,
        cursor: &mut Cursor,
        env: &Environment,
    ) -> EvalResult<Vec<u8>> {
        let start = cursor.position() - 1;
        let mut acc = Operand::Deferred(read_operand(cursor, start)?);
        while let Some(op) = read_operator(cursor, start)? {
            let rhs = Operand::Deferred(read_operand(cursor, start)?);
            tracing::trace!("{} {} {}", acc.to_source(), op.symbol(), rhs.to_source());
            acc = op.apply(self, acc, rhs, env)?;
        }
        acc.force(self, env)
    }
}

/// Collect one operand's raw text, leaving the cursor on the operator or `]`
/// that ends it. Nested brackets are part of the operand.
fn read_operand<'a>(cursor: &mut Cursor<'a>, start: usize) -> EvalResult<&'a str> {
    let operand_start = cursor.position();
    let mut depth = 0usize;
    loop {
        let Some(ch) = cursor.read() else {
            return Err(unterminated(cursor, Construct::Expression, start));
        };
        match ch {
            '[' => depth += 1,
            ']' if depth == 0 => break,
            ']' => depth -= 1,
            ch if depth == 0 && starts_operator(ch, cursor) => break,
            _ => (),
        }
    }
    cursor.unread();
    Ok(cursor.slice_from(operand_start))
}

/// Whether `ch`, just read, begins an operator.
///
/// `!` only does when followed by `=`; a lone `!` is text. An include can
/// close inside an operand only if its path has no operator characters.
fn starts_operator(ch: char, cursor: &mut Cursor) -> bool {
    if ch != '!' {
        return operators::starts_operator(ch);
    }
    match cursor.read() {
        Some(next) => {
            cursor.unread();
            next == '='
        }
        None => false,
    }
}

/// Read the operator after an operand, or None at the closing `]`.
fn read_operator(cursor: &mut Cursor, start: usize) -> EvalResult<Option<Operator>> {
    let Some(first) = cursor.read() else {
        return Err(unterminated(cursor, Construct::Expression, start));
    };
    if first == ']' {
        return Ok(None);
    }
    let mut symbol = String::from(first);
    if let Some(second) = cursor.read() {
        symbol.push(second);
        if let Some(op) = operators::lookup(&symbol) {
            return Ok(Some(op));
        }
        cursor.unread();
        symbol.pop();
    }
    // read_operand only stops at operator starts, so this always matches.
    Ok(operators::lookup(&symbol))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::Error;

    #[test]
    fn operands_split_at_operators() -> EvalResult<()> {
        let mut cursor = Cursor::new("[ 01 <= [02 + 03] != \"x\" ]");
        cursor.read();
        assert_eq!(read_operand(&mut cursor, 0)?, " 01 ");
        assert_eq!(read_operator(&mut cursor, 0)?, Some(Operator::Le));
        assert_eq!(read_operand(&mut cursor, 0)?, " [02 + 03] ");
        assert_eq!(read_operator(&mut cursor, 0)?, Some(Operator::Ne));
        assert_eq!(read_operand(&mut cursor, 0)?, " \"x\" ");
        assert_eq!(read_operator(&mut cursor, 0)?, None);
        assert!(cursor.is_at_end());
        Ok(())
    }

    #[test]
    fn lookahead_is_pushed_back() -> EvalResult<()> {
        let mut cursor = Cursor::new("<01");
        assert_eq!(read_operator(&mut cursor, 0)?, Some(Operator::Lt));
        assert_eq!(cursor.remainder(), "01");
        Ok(())
    }

    #[test]
    fn lone_bang_is_operand_text() -> EvalResult<()> {
        let mut cursor = Cursor::new("#lib! = 01]");
        assert_eq!(read_operand(&mut cursor, 0)?, "#lib! ");
        assert_eq!(read_operator(&mut cursor, 0)?, Some(Operator::Eq));
        Ok(())
    }

    #[test]
    fn operand_runs_into_end() {
        let mut cursor = Cursor::new("[ 01 [ 02 ]");
        cursor.read();
        match read_operand(&mut cursor, 0) {
            Err(Error::UnterminatedConstruct { construct, .. }) => {
                assert_eq!(construct, Construct::Expression)
            }
            v => panic!("unexpected result: {v:?}"),
        }
    }

    #[test]
    fn results_render_as_uppercase_hex() -> EvalResult<()> {
        let operand = Operand::Evaluated(vec![0x0A, 0xBC]);
        assert_eq!(operand.to_source(), "0ABC");

        let evaluator = Evaluator::new();
        let env = evaluator.environment();
        let reread = Operand::Deferred(&operand.to_source()).force(&evaluator, &env)?;
        assert_eq!(reread, vec![0x0A, 0xBC]);
        Ok(())
    }
}
