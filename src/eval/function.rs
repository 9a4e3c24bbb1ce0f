//! Function definitions and calls.
//!
//! A definition captures its body as raw text; nothing in it is evaluated
//! until a call. A call binds each parameter by name: the parameter becomes a
//! zero-argument definition whose body is the argument's source text, so
//! every reference evaluates the argument again.

use crate::data::{Environment, FunctionDef};
use crate::error::{Construct, Error, EvalResult};
use crate::reader::{literal, Cursor};

use super::{unterminated, Evaluator};

impl Evaluator {
    /// Read a definition after its `@`.
    ///
    /// The body ends at the first `}`. Braces don't nest, so a body can't
    /// contain a `}` anywhere, not even inside a text literal.
    pub(super) fn read_definition(&self, cursor: &mut Cursor) -> EvalResult<FunctionDef> {
        let start = cursor.position() - 1;
        let name_start = cursor.position();
        let name_end = loop {
            let end = cursor.position();
            match cursor.read() {
                None => return Err(unterminated(cursor, Construct::FunctionHeader, start)),
                Some('{') => {
                    cursor.unread();
                    break end;
                }
                Some(ch) if ch.is_whitespace() => break end,
                Some(_) => (),
            }
        };
        let name = cursor.slice(name_start, name_end);

        let (header, closed) = cursor.read_until('{');
        if !closed {
            return Err(unterminated(cursor, Construct::FunctionHeader, start));
        }
        let (body, closed) = cursor.read_until('}');
        if !closed {
            return Err(unterminated(cursor, Construct::FunctionBody, start));
        }

        if name.is_empty() {
            tracing::warn!(
                "function at {} has an empty name and can never be called",
                cursor.location_of(start)
            );
        }
        let params = literal::parameter_names(header)
            .map(|param| self.symbols.intern(param))
            .collect();
        Ok(FunctionDef::new(self.symbols.intern(name), params, body))
    }

    /// Call the function bound to `name`, reading its arguments from `cursor`.
    pub(super) fn call(
        &self,
        name: &str,
        cursor: &mut Cursor,
        env: &Environment,
    ) -> EvalResult<Vec<u8>> {
        let def = self
            .symbols
            .get(name)
            .and_then(|symbol| env.lookup(symbol))
            .cloned()
            .ok_or_else(|| Error::UnboundName(name.to_owned()))?;

        let mut arguments = Vec::with_capacity(def.params.len());
        // An argument may itself be a call reading arguments; that nesting
        // counts against the limit like any other.
        let _guard = (!def.params.is_empty()).then(|| self.enter()).transpose()?;
        for &param in &def.params {
            let start = cursor.position();
            // Read as a full value, so a malformed argument fails here;
            // only its text is bound.
            self.next_value(cursor, env)?;
            arguments.push(FunctionDef::argument(
                param,
                cursor.slice_from(start),
                env.clone(),
            ));
        }

        tracing::debug!("call {name:?} with {} argument(s)", arguments.len());
        // Argument bindings evaluate where they were written;
        // functions evaluate in the caller's scope.
        let mut local = def.scope.as_ref().unwrap_or(env).derive(arguments);
        self.run(&def.body, &mut local)
    }
}
