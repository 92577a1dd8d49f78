//! The tape: an ordered, mutable container of operations.
//!
//! Position in the sequence equals the operation's 1-based identifier; every
//! structural edit (`push`, `insert`, `replace`) renumbers so this invariant
//! holds at all times. Operations are stored behind shared cells, so bound
//! variables held by callers keep referring to the same operation instances
//! across edits and transparently observe new identifiers.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::op::{Op, OpRef};
use crate::value::Value;
use crate::var::Var;

pub struct Tape<C = ()> {
    /// Operations in program order. `ops[i]` has identifier `i + 1`.
    pub(crate) ops: Vec<OpRef<C>>,
    /// The variable designating the tape's final value.
    result: Option<Var<C>>,
    /// Free-form bookkeeping for transform passes.
    pub meta: HashMap<String, Value>,
    /// User-supplied context; transform passes attach structured state here.
    pub context: C,
}

impl Tape {
    pub fn new() -> Tape {
        Tape::with_context(())
    }
}

impl Default for Tape {
    fn default() -> Self {
        Tape::new()
    }
}

impl<C> Tape<C> {
    pub fn with_context(context: C) -> Self {
        Self {
            ops: Vec::new(),
            result: None,
            meta: HashMap::new(),
            context,
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates over operations in tape order.
    pub fn iter(&self) -> impl Iterator<Item = &OpRef<C>> {
        self.ops.iter()
    }

    /// Returns the operation at the 1-based position `idx`.
    ///
    /// Panics if `idx` is out of range.
    pub fn op_at(&self, idx: usize) -> OpRef<C> {
        if idx == 0 || idx > self.ops.len() {
            panic!(
                "Tape: position {} out of range (tape has {} operations)",
                idx,
                self.ops.len()
            );
        }
        Rc::clone(&self.ops[idx - 1])
    }

    /// Returns the operation addressed by `v`, i.e. the one at `v.id()`.
    pub fn op(&self, v: &Var<C>) -> OpRef<C> {
        self.op_at(v.id())
    }

    /// Converts `v` to its bound form by looking up the operation at its
    /// current identifier.
    pub fn bound(&self, v: &Var<C>) -> Var<C> {
        Var::Bound(self.op(v))
    }

    pub fn result(&self) -> Option<&Var<C>> {
        self.result.as_ref()
    }

    pub fn set_result(&mut self, v: Var<C>) {
        self.result = Some(v);
    }

    /// Returns bound variables for the tape's `Input` operations in
    /// positional order.
    pub fn inputs(&self) -> Vec<Var<C>> {
        self.ops
            .iter()
            .filter(|op| op.borrow().is_input())
            .map(|op| Var::Bound(Rc::clone(op)))
            .collect()
    }

    /// Sets the tape's input values. On a tape without inputs this appends
    /// one `Input` operation per value; otherwise it overwrites the existing
    /// inputs' cached values in order.
    ///
    /// Panics when overwriting with a mismatched count.
    pub fn set_inputs(&mut self, vals: Vec<Value>) -> Vec<Var<C>> {
        let existing = self.inputs();
        if existing.is_empty() {
            return vals
                .into_iter()
                .map(|val| self.push(Op::input(val)))
                .collect();
        }
        if vals.len() != existing.len() {
            panic!(
                "Tape: expected {} input values, got {}",
                existing.len(),
                vals.len()
            );
        }
        for (var, val) in existing.iter().zip(vals) {
            self.op(var).borrow_mut().val = Some(val);
        }
        existing
    }

    /// Appends an operation, assigning it the next identifier. Returns a
    /// bound variable to it.
    pub fn push(&mut self, mut op: Op<C>) -> Var<C> {
        op.id = self.ops.len() + 1;
        let cell = Rc::new(std::cell::RefCell::new(op));
        self.ops.push(Rc::clone(&cell));
        Var::Bound(cell)
    }

    /// Inserts operations starting at the 1-based position `idx`, shifting
    /// later operations right and renumbering everything from `idx` on.
    /// Returns bound variables for the inserted operations.
    ///
    /// Bound variables held by callers keep referring to the same operation
    /// instances and report the new positions; free variables still refer to
    /// positions and are logically stale after this call.
    pub fn insert(&mut self, idx: usize, ops: Vec<Op<C>>) -> Vec<Var<C>> {
        if idx == 0 || idx > self.ops.len() + 1 {
            panic!(
                "Tape: insert position {} out of range (tape has {} operations)",
                idx,
                self.ops.len()
            );
        }
        let cells: Vec<OpRef<C>> = ops
            .into_iter()
            .map(|op| Rc::new(std::cell::RefCell::new(op)))
            .collect();
        for (offset, cell) in cells.iter().enumerate() {
            self.ops.insert(idx - 1 + offset, Rc::clone(cell));
        }
        self.renumber_from(idx);
        cells.into_iter().map(Var::Bound).collect()
    }

    /// Overwrites the operation at position `idx` in place. Existing bound
    /// variables addressing that position now see the new operation; no
    /// rebinding or renumbering happens.
    pub fn set_op(&mut self, idx: usize, mut op: Op<C>) -> Var<C> {
        let cell = self.op_at(idx);
        op.id = idx;
        *cell.borrow_mut() = op;
        Var::Bound(cell)
    }

    /// Reassigns identifiers from the 1-based position `idx` through the end
    /// so that each equals its position.
    pub(crate) fn renumber_from(&mut self, idx: usize) {
        for (i, op) in self.ops.iter().enumerate().skip(idx.saturating_sub(1)) {
            op.borrow_mut().id = i + 1;
        }
    }
}

impl<'a, C> IntoIterator for &'a Tape<C> {
    type Item = &'a OpRef<C>;
    type IntoIter = std::slice::Iter<'a, OpRef<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

impl<C> fmt::Display for Tape<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tape{{{}}}", short_type_name::<C>())?;
        for op in &self.ops {
            write!(f, "\n  {}", &*op.borrow())?;
        }
        Ok(())
    }
}

impl<C> fmt::Debug for Tape<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
