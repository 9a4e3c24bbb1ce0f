//! Function bindings and the environments that hold them.
//!
//! An environment is an ordered list of bindings. It is a value: cloning
//! shares the list, and the first definition made through a clone copies it.
//! A call never mutates its caller's environment; it builds a derived one
//! with the argument bindings in front of the caller's bindings, which is
//! what makes a parameter shadow an outer function of the same name.
//!
//! Names are interned in a [`Symbols`] table owned by the evaluator, so an
//! environment is only meaningful to the evaluator that built it.

use std::cell::RefCell;
use std::rc::Rc;

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// An interned function or parameter name.
pub type Symbol = DefaultSymbol;

/// The table of interned names.
#[derive(Default)]
pub struct Symbols {
    interner: RefCell<DefaultStringInterner>,
}

impl Symbols {
    pub fn intern(&self, name: &str) -> Symbol {
        self.interner.borrow_mut().get_or_intern(name)
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.interner.borrow().get(name)
    }

    pub fn resolve(&self, symbol: Symbol) -> String {
        self.interner
            .borrow()
            .resolve(symbol)
            .unwrap_or_default()
            .to_owned()
    }
}

/// A named, parameterized macro.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: Symbol,
    /// Declared parameter names, in order. Duplicates are allowed.
    pub params: Vec<Symbol>,
    /// Unparsed body text.
    pub body: Rc<str>,
    /// For call-by-name argument bindings: the environment of the call site
    /// that supplied the argument. The body is evaluated there.
    pub scope: Option<Environment>,
}

impl FunctionDef {
    pub fn new(name: Symbol, params: Vec<Symbol>, body: impl Into<Rc<str>>) -> Self {
        FunctionDef {
            name,
            params,
            body: body.into(),
            scope: None,
        }
    }

    /// A zero-argument binding of `name` to the raw text of an argument.
    pub fn argument(name: Symbol, raw: &str, scope: Environment) -> Self {
        FunctionDef {
            name,
            params: Vec::new(),
            body: raw.into(),
            scope: Some(scope),
        }
    }
}

/// Ordered function bindings visible at a point in evaluation.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: Rc<Vec<Rc<FunctionDef>>>,
}

impl Environment {
    pub fn new() -> Self {
        Default::default()
    }

    /// The first binding for `name`.
    pub fn lookup(&self, name: Symbol) -> Option<&Rc<FunctionDef>> {
        self.bindings.iter().find(|def| def.name == name)
    }

    /// Install a definition, replacing any existing binding of the same name.
    pub fn define(&mut self, def: FunctionDef) {
        let bindings = Rc::make_mut(&mut self.bindings);
        bindings.retain(|existing| existing.name != def.name);
        bindings.push(Rc::new(def));
    }

    /// A new environment with `locals` ahead of all of this environment's bindings.
    pub fn derive(&self, locals: impl IntoIterator<Item = FunctionDef>) -> Environment {
        let mut bindings: Vec<Rc<FunctionDef>> = locals.into_iter().map(Rc::new).collect();
        bindings.extend(self.bindings.iter().cloned());
        Environment {
            bindings: Rc::new(bindings),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionDef> {
        self.bindings.iter().map(|def| def.as_ref())
    }
}
