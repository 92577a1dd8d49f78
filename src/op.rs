//! Tape operations.
//!
//! An [`Op`] is one node of the IR: an `Input`, a `Const`, a `Call`, or a
//! `Loop`. Every operation carries a mutable 1-based identifier (0 before
//! insertion into a tape) and a cached value slot; `None` in the slot means
//! "not yet computed", which is distinct from any legitimate value.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Error;
use crate::tape::Tape;
use crate::value::{Func, Kind, Value};
use crate::var::Var;

/// Shared handle to an operation. Bound variables and the owning tape all
/// refer to the same cell, which is what lets identifier updates propagate.
pub type OpRef<C = ()> = Rc<RefCell<Op<C>>>;

/// One argument of a `Call`: either a reference to an earlier operation or a
/// raw constant value.
pub enum Arg<C = ()> {
    Var(Var<C>),
    Const(Value),
}

impl<C> Arg<C> {
    /// Returns the variable if this argument is one.
    pub fn var(&self) -> Option<&Var<C>> {
        match self {
            Arg::Var(v) => Some(v),
            Arg::Const(_) => None,
        }
    }

    /// Returns the argument's value if it is known without a tape: a raw
    /// constant, or a bound variable whose referent has a cached value.
    /// Free variables resolve to `None`.
    pub fn cached_value(&self) -> Option<Value> {
        match self {
            Arg::Const(v) => Some(v.clone()),
            Arg::Var(Var::Bound(op)) => op.borrow().val.clone(),
            Arg::Var(Var::Free(_)) => None,
        }
    }
}

impl<C> Clone for Arg<C> {
    fn clone(&self) -> Self {
        match self {
            Arg::Var(v) => Arg::Var(v.clone()),
            Arg::Const(c) => Arg::Const(c.clone()),
        }
    }
}

impl<C> PartialEq for Arg<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Var(a), Arg::Var(b)) => a == b,
            (Arg::Const(a), Arg::Const(b)) => a == b,
            _ => false,
        }
    }
}

impl<C> From<Var<C>> for Arg<C> {
    fn from(v: Var<C>) -> Self {
        Arg::Var(v)
    }
}

impl<C> From<&Var<C>> for Arg<C> {
    fn from(v: &Var<C>) -> Self {
        Arg::Var(v.clone())
    }
}

impl<C> From<Value> for Arg<C> {
    fn from(v: Value) -> Self {
        Arg::Const(v)
    }
}

impl<C> From<f64> for Arg<C> {
    fn from(x: f64) -> Self {
        Arg::Const(Value::F64(x))
    }
}

impl<C> From<i64> for Arg<C> {
    fn from(n: i64) -> Self {
        Arg::Const(Value::I64(n))
    }
}

impl<C> fmt::Display for Arg<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Var(v) => write!(f, "{}", v),
            Arg::Const(c) => write!(f, "{}", c),
        }
    }
}

impl<C> fmt::Debug for Arg<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Var(v) => write!(f, "Var({:?})", v),
            Arg::Const(c) => write!(f, "Const({:?})", c),
        }
    }
}

/// The called function of a `Call`: a concrete host function, or a variable
/// whose operation produces the function.
pub enum Callee<C = ()> {
    Func(Func),
    Var(Var<C>),
}

impl<C> Clone for Callee<C> {
    fn clone(&self) -> Self {
        match self {
            Callee::Func(func) => Callee::Func(func.clone()),
            Callee::Var(v) => Callee::Var(v.clone()),
        }
    }
}

impl<C> From<Func> for Callee<C> {
    fn from(func: Func) -> Self {
        Callee::Func(func)
    }
}

impl<C> From<Var<C>> for Callee<C> {
    fn from(v: Var<C>) -> Self {
        Callee::Var(v)
    }
}

impl<C> From<&Var<C>> for Callee<C> {
    fn from(v: &Var<C>) -> Self {
        Callee::Var(v.clone())
    }
}

impl<C> fmt::Display for Callee<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Func(func) => write!(f, "{}", func),
            Callee::Var(v) => write!(f, "{}", v),
        }
    }
}

impl<C> fmt::Debug for Callee<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Func(func) => write!(f, "Func({:?})", func),
            Callee::Var(v) => write!(f, "Var({:?})", v),
        }
    }
}

/// A structured loop: a nested tape executed repeatedly over loop-carried
/// state.
///
/// Invariants (checked by [`Op::loop_`]):
/// 1. `parent_inputs`, `cont_vars`, and the subtape's inputs have equal
///    length; slot `k` of each corresponds to the same piece of carried
///    state.
/// 2. `exit_vars` is a subset of `cont_vars`, order preserved.
/// 3. `condition`, `cont_vars`, and `exit_vars` address operations of
///    `subtape`; `parent_inputs` address the enclosing tape.
pub struct LoopOp<C = ()> {
    /// Variables in the enclosing tape providing initial carried values.
    pub parent_inputs: Vec<Var<C>>,
    /// The loop body. Its inputs hold the carried state for one iteration.
    pub subtape: Tape<C>,
    /// Boolean variable within the subtape; the loop stops when it turns false.
    pub condition: Var<C>,
    /// Subtape variables whose values seed the next iteration's inputs.
    pub cont_vars: Vec<Var<C>>,
    /// The subset of `cont_vars` whose final values form the loop result.
    pub exit_vars: Vec<Var<C>>,
}

/// The variant tag of an operation.
pub enum OpKind<C = ()> {
    /// A formal parameter of the traced program; the value slot holds the
    /// most recently supplied actual argument.
    Input,
    /// A compile-time-known value whose type is pinned at construction.
    Const { kind: Kind },
    /// A function application over earlier operations and raw constants.
    Call { callee: Callee<C>, args: Vec<Arg<C>> },
    Loop(Box<LoopOp<C>>),
}

pub struct Op<C = ()> {
    /// Position in the owning tape, 1-based. 0 until inserted.
    pub id: usize,
    /// Cached value; `None` until computed.
    pub val: Option<Value>,
    pub kind: OpKind<C>,
}

impl<C> Op<C> {
    pub fn input(val: Value) -> Self {
        Self {
            id: 0,
            val: Some(val),
            kind: OpKind::Input,
        }
    }

    pub fn constant(val: Value) -> Self {
        let kind = val.kind();
        Self {
            id: 0,
            val: Some(val),
            kind: OpKind::Const { kind },
        }
    }

    /// Builds a `Call`, eagerly evaluating it when every element of
    /// `(callee, args…)` is either a raw value or a bound variable with a
    /// cached value. Errors raised by the called function propagate
    /// unchanged; a non-calculable call is constructed with an empty value
    /// slot.
    pub fn call(callee: impl Into<Callee<C>>, args: Vec<Arg<C>>) -> Result<Self, Error> {
        let callee = callee.into();
        let val = Self::try_compute(&callee, &args)?;
        Ok(Self {
            id: 0,
            val,
            kind: OpKind::Call { callee, args },
        })
    }

    /// Builds a `Call` with the value slot set verbatim, skipping
    /// construction-time evaluation. `None` keeps the call symbolic even if
    /// it would be calculable; transform passes use this to insert
    /// placeholder operations.
    pub fn call_with_val(
        callee: impl Into<Callee<C>>,
        args: Vec<Arg<C>>,
        val: Option<Value>,
    ) -> Self {
        Self {
            id: 0,
            val,
            kind: OpKind::Call {
                callee: callee.into(),
                args,
            },
        }
    }

    /// Builds a `Loop`. Panics on arity violations; see [`LoopOp`].
    pub fn loop_(
        parent_inputs: Vec<Var<C>>,
        subtape: Tape<C>,
        condition: Var<C>,
        cont_vars: Vec<Var<C>>,
        exit_vars: Vec<Var<C>>,
    ) -> Self {
        let n_inputs = subtape.inputs().len();
        if parent_inputs.len() != n_inputs || cont_vars.len() != n_inputs {
            panic!(
                "Loop: {} parent inputs and {} continue variables for a subtape with {} inputs",
                parent_inputs.len(),
                cont_vars.len(),
                n_inputs
            );
        }
        for ev in &exit_vars {
            if !cont_vars.contains(ev) {
                panic!(
                    "Loop: exit variable %{} is not one of the continue variables",
                    ev.id()
                );
            }
        }
        Self {
            id: 0,
            val: None,
            kind: OpKind::Loop(Box::new(LoopOp {
                parent_inputs,
                subtape,
                condition,
                cont_vars,
                exit_vars,
            })),
        }
    }

    /// Calculability check and eager evaluation for `call`.
    fn try_compute(callee: &Callee<C>, args: &[Arg<C>]) -> Result<Option<Value>, Error> {
        let func = match callee {
            Callee::Func(func) => func.clone(),
            Callee::Var(Var::Bound(op)) => match &op.borrow().val {
                Some(Value::Func(func)) => func.clone(),
                Some(_) => return Err(Error::NotAFunction { id: op.borrow().id }),
                None => return Ok(None),
            },
            Callee::Var(Var::Free(_)) => return Ok(None),
        };
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            match arg.cached_value() {
                Some(v) => vals.push(v),
                None => return Ok(None),
            }
        }
        func.call(&vals).map(Some)
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, OpKind::Input)
    }

    /// Returns the variables this operation consumes in its enclosing tape.
    /// For a `Loop` that is the parent inputs only; subtape-internal
    /// variables are not operands of the enclosing tape.
    pub fn operands(&self) -> Vec<Var<C>> {
        match &self.kind {
            OpKind::Input | OpKind::Const { .. } => Vec::new(),
            OpKind::Call { callee, args } => {
                let mut vars = Vec::new();
                if let Callee::Var(v) = callee {
                    vars.push(v.clone());
                }
                vars.extend(args.iter().filter_map(|a| a.var().cloned()));
                vars
            }
            OpKind::Loop(lp) => lp.parent_inputs.clone(),
        }
    }

    /// The displayed type of the cached value, or `missing`.
    fn val_kind_str(&self) -> String {
        match &self.val {
            Some(v) => v.kind().to_string(),
            None => "missing".to_owned(),
        }
    }
}

impl<C> fmt::Display for Op<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            OpKind::Input => write!(f, "inp %{}::{}", self.id, self.val_kind_str()),
            OpKind::Const { kind } => {
                let val = match &self.val {
                    Some(v) => v.to_string(),
                    None => "missing".to_owned(),
                };
                write!(f, "const %{} = {}::{}", self.id, val, kind)
            }
            OpKind::Call { callee, args } => {
                write!(f, "%{} = {}(", self.id, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")::{}", self.val_kind_str())
            }
            OpKind::Loop(lp) => {
                write!(f, "%{} = Loop(", self.id)?;
                for (i, v) in lp.parent_inputs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl<C> fmt::Debug for Op<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
