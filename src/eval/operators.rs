//! The expression operators.
//!
//! Arithmetic and bitwise operators read each operand's output as an
//! unsigned big-endian integer (the hex digits of its bytes; empty output is
//! zero) and produce the result's minimal big-endian bytes, at least one
//! byte long. Comparisons and logical operators produce `01` for true and
//! nothing for false.

use std::fmt::Write;

use crate::data::Environment;
use crate::error::{Error, EvalResult};

use super::{Evaluator, Operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    And,
    Or,
    Cond,
}

/// Every operator, by its source spelling.
///
/// Two-character operators are only recognized by lookahead after their
/// first character, which is itself an operator for all but `!=`.
pub const OPERATORS: &[(&str, Operator)] = &[
    ("+", Operator::Add),
    ("-", Operator::Sub),
    ("*", Operator::Mul),
    ("/", Operator::Div),
    ("%", Operator::Rem),
    ("&", Operator::BitAnd),
    ("|", Operator::BitOr),
    ("^", Operator::BitXor),
    ("<<", Operator::Shl),
    (">>", Operator::Shr),
    ("=", Operator::Eq),
    ("!=", Operator::Ne),
    (">", Operator::Gt),
    ("<", Operator::Lt),
    (">=", Operator::Ge),
    ("<=", Operator::Le),
    ("&&", Operator::And),
    ("||", Operator::Or),
    ("?", Operator::Cond),
];

pub fn lookup(symbol: &str) -> Option<Operator> {
    OPERATORS
        .iter()
        .find(|(spelling, _)| *spelling == symbol)
        .map(|&(_, op)| op)
}

pub fn starts_operator(ch: char) -> bool {
    OPERATORS.iter().any(|(spelling, _)| spelling.starts_with(ch))
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|&&(_, op)| op == self)
            .map(|&(spelling, _)| spelling)
            .unwrap_or("?")
    }

    /// Combine the accumulated operand with the next one.
    pub fn apply<'a>(
        self,
        evaluator: &Evaluator,
        lhs: Operand<'a>,
        rhs: Operand<'a>,
        env: &Environment,
    ) -> EvalResult<Operand<'a>> {
        use Operator::*;

        if self == Cond {
            // The right side stays unevaluated until something needs it.
            return if lhs.force(evaluator, env)?.is_empty() {
                Ok(truth(false))
            } else {
                Ok(rhs)
            };
        }

        // Both sides are always evaluated; && and || don't short-circuit.
        let a = lhs.force(evaluator, env)?;
        let b = rhs.force(evaluator, env)?;
        let result = match self {
            Eq => truth(a == b),
            Ne => truth(a != b),
            Gt => truth(a > b),
            Lt => truth(a < b),
            Ge => truth(a >= b),
            Le => truth(a <= b),
            And => truth(!a.is_empty() && !b.is_empty()),
            Or => truth(!a.is_empty() || !b.is_empty()),
            _ => {
                let a = to_integer(&a, self)?;
                let b = to_integer(&b, self)?;
                Operand::Evaluated(from_integer(self.arithmetic(a, b)?))
            }
        };
        Ok(result)
    }

    fn arithmetic(self, a: u128, b: u128) -> EvalResult<u128> {
        use Operator::*;

        let overflow = || Error::Overflow { op: self.symbol() };
        match self {
            Add => a.checked_add(b).ok_or_else(overflow),
            Sub => a.checked_sub(b).ok_or_else(overflow),
            Mul => a.checked_mul(b).ok_or_else(overflow),
            Div => a.checked_div(b).ok_or(Error::DivisionByZero),
            Rem => a.checked_rem(b).ok_or(Error::ModulusByZero),
            BitAnd => Ok(a & b),
            BitOr => Ok(a | b),
            BitXor => Ok(a ^ b),
            Shl => {
                if a == 0 {
                    return Ok(0);
                }
                let shift = u32::try_from(b).map_err(|_| overflow())?;
                let result = a.checked_shl(shift).ok_or_else(overflow)?;
                // checked_shl only rejects oversized shifts; bits shifted out are lost silently.
                if result >> shift != a {
                    return Err(overflow());
                }
                Ok(result)
            }
            Shr => Ok(u32::try_from(b)
                .ok()
                .and_then(|shift| a.checked_shr(shift))
                .unwrap_or(0)),
            _ => unreachable!("{self:?} is not an arithmetic operator"),
        }
    }
}

fn truth(value: bool) -> Operand<'static> {
    Operand::Evaluated(if value { vec![1] } else { Vec::new() })
}

/// Read output bytes as a big-endian unsigned integer.
pub fn to_integer(bytes: &[u8], op: Operator) -> EvalResult<u128> {
    let significant = bytes
        .iter()
        .position(|&b| b != 0)
        .map_or(&[][..], |first| &bytes[first..]);
    if significant.len() > 16 {
        return Err(Error::Overflow { op: op.symbol() });
    }
    Ok(significant
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b)))
}

/// The minimal big-endian bytes of `value`; zero is a single `00`.
pub fn from_integer(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

/// Uppercase hex pairs for `bytes`.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02X}");
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_spelling() {
        assert_eq!(lookup("<<"), Some(Operator::Shl));
        assert_eq!(lookup("!="), Some(Operator::Ne));
        assert_eq!(lookup("!"), None);
        assert_eq!(lookup("=="), None);
        for (spelling, op) in OPERATORS {
            assert_eq!(op.symbol(), *spelling);
        }
    }

    #[test]
    fn operator_starts() {
        for ch in "+-*/%&|^<>=!?".chars() {
            assert!(starts_operator(ch), "{ch:?} should start an operator");
        }
        for ch in "[]\"#@ a0".chars() {
            assert!(!starts_operator(ch), "{ch:?} should not start an operator");
        }
    }

    #[test]
    fn integers_from_bytes() -> EvalResult<()> {
        assert_eq!(to_integer(b"", Operator::Add)?, 0);
        assert_eq!(to_integer(&[0x01, 0x00], Operator::Add)?, 0x100);
        assert_eq!(to_integer(b"abc", Operator::Add)?, 0x616263);
        // Leading zeros don't count against the width.
        let mut wide = vec![0u8; 8];
        wide.extend([0xFF; 16]);
        assert_eq!(to_integer(&wide, Operator::Add)?, u128::MAX);
        match to_integer(&[0x01; 17], Operator::Mul) {
            Err(Error::Overflow { op }) => assert_eq!(op, "*"),
            v => panic!("unexpected result: {v:?}"),
        }
        Ok(())
    }

    #[test]
    fn integers_to_bytes() {
        assert_eq!(from_integer(0), vec![0x00]);
        assert_eq!(from_integer(0x09), vec![0x09]);
        assert_eq!(from_integer(0x100), vec![0x01, 0x00]);
        assert_eq!(from_integer(u128::MAX), vec![0xFF; 16]);
    }

    #[test]
    fn hex_is_uppercase() {
        assert_eq!(encode_hex(&[0x0a, 0xff, 0x00]), "0AFF00");
        assert_eq!(encode_hex(&[]), "");
    }

    #[test]
    fn arithmetic_edges() {
        assert_eq!(Operator::Shl.arithmetic(1, 127).ok(), Some(1 << 127));
        assert!(matches!(
            Operator::Shl.arithmetic(2, 127),
            Err(Error::Overflow { op: "<<" })
        ));
        assert!(matches!(
            Operator::Shl.arithmetic(1, 128),
            Err(Error::Overflow { .. })
        ));
        assert_eq!(Operator::Shl.arithmetic(0, 1000).ok(), Some(0));
        assert_eq!(Operator::Shr.arithmetic(u128::MAX, 200).ok(), Some(0));
        assert!(matches!(
            Operator::Sub.arithmetic(1, 2),
            Err(Error::Overflow { op: "-" })
        ));
        assert!(matches!(
            Operator::Div.arithmetic(1, 0),
            Err(Error::DivisionByZero)
        ));
        assert!(matches!(
            Operator::Rem.arithmetic(1, 0),
            Err(Error::ModulusByZero)
        ));
    }
}
