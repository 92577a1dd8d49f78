//! Dynamic runtime values.
//!
//! Every operation on a tape caches a `Value`; the "value not yet computed"
//! state is represented by `Option<Value>::None` on the operation, so `Unit`
//! remains a legitimate value and is never confused with an absent one.

use std::fmt;
use std::rc::Rc;

use crate::error::Error;

/// A runtime value produced or consumed during tape construction and playback.
#[derive(Debug, Clone)]
pub enum Value {
    F64(f64),
    I64(i64),
    Bool(bool),
    Str(String),
    /// Ordered element values. Loop operations yield their exit values as a tuple.
    Tuple(Vec<Value>),
    /// Unit value for calls with no meaningful result.
    Unit,
    /// A host function value, callable through a `Call` operation.
    Func(Func),
}

impl Value {
    /// Returns the discriminant-level type of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::F64(_) => Kind::F64,
            Value::I64(_) => Kind::I64,
            Value::Bool(_) => Kind::Bool,
            Value::Str(_) => Kind::Str,
            Value::Tuple(_) => Kind::Tuple,
            Value::Unit => Kind::Unit,
            Value::Func(_) => Kind::Func,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Unit, Value::Unit) => true,
            // Functions compare by identity.
            (Value::Func(a), Value::Func(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::F64(x) => write!(f, "{}", x),
            Value::I64(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Tuple(elems) => {
                write!(f, "(")?;
                for (i, v) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Value::Unit => write!(f, "()"),
            Value::Func(func) => write!(f, "<fn {}>", func.name()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::F64(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::I64(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Func> for Value {
    fn from(func: Func) -> Self {
        Value::Func(func)
    }
}

/// The discriminant-level type of a `Value`.
///
/// Recorded by `Const` operations at construction and observed everywhere
/// else via `Value::kind()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    F64,
    I64,
    Bool,
    Str,
    Tuple,
    Unit,
    Func,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::F64 => "f64",
            Kind::I64 => "i64",
            Kind::Bool => "bool",
            Kind::Str => "str",
            Kind::Tuple => "tuple",
            Kind::Unit => "unit",
            Kind::Func => "fn",
        };
        f.write_str(s)
    }
}

/// A named host function.
///
/// `Func` is cheaply cloneable; clones share the underlying closure and
/// compare equal. Errors returned by the closure propagate unchanged through
/// construction-time evaluation and playback.
#[derive(Clone)]
pub struct Func {
    name: Rc<str>,
    f: Rc<dyn Fn(&[Value]) -> Result<Value, Error>>,
}

impl Func {
    pub fn new(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, Error> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the function to the given argument values.
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        (self.f)(args)
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        // Identity, not name: two distinct functions may share a name.
        std::ptr::eq(
            Rc::as_ptr(&self.f) as *const (),
            Rc::as_ptr(&other.f) as *const (),
        )
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
