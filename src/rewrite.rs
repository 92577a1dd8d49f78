//! Identifier substitution and rebinding.
//!
//! `replace` and `rebind` keep the operation graph consistent under
//! structural edits: a substitution maps old identifiers to new ones, and
//! rebinding mutates every matching variable reference to bind to the
//! operation now at the mapped position. Subtape-internal operations are
//! never descended into; a loop's own variable lists are rewritten against
//! their governing tapes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::op::{Arg, Callee, LoopOp, Op, OpKind, OpRef};
use crate::tape::Tape;
use crate::var::Var;

/// A finite mapping `old_id -> new_id`.
#[derive(Debug, Clone, Default)]
pub struct Subst(HashMap<usize, usize>);

impl Subst {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn single(from: usize, to: usize) -> Self {
        Self(HashMap::from([(from, to)]))
    }

    pub fn insert(&mut self, from: usize, to: usize) {
        self.0.insert(from, to);
    }

    pub fn get(&self, id: usize) -> Option<usize> {
        self.0.get(&id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, usize)> for Subst {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// User-defined tape context.
///
/// The only obligation is the rebind hook, invoked after every tape rebind
/// so contexts holding variables can rewrite them. The default does nothing.
pub trait Context {
    fn rebind(&mut self, subst: &Subst) {
        let _ = subst;
    }
}

impl Context for () {}

/// Returns the bound replacement for `v` if the substitution maps its
/// current identifier, binding to the operation at the mapped position.
fn rebound<C>(ops: &[OpRef<C>], v: &Var<C>, subst: &Subst) -> Option<Var<C>> {
    let new_id = subst.get(v.id())?;
    if new_id == 0 || new_id > ops.len() {
        panic!(
            "Tape: rebind target %{} out of range (tape has {} operations)",
            new_id,
            ops.len()
        );
    }
    Some(Var::Bound(Rc::clone(&ops[new_id - 1])))
}

fn rebind_var<C>(ops: &[OpRef<C>], v: &mut Var<C>, subst: &Subst) {
    if let Some(nv) = rebound(ops, v, subst) {
        *v = nv;
    }
}

fn rebind_op<C>(parent_ops: &[OpRef<C>], op: &mut Op<C>, subst: &Subst) {
    match &mut op.kind {
        OpKind::Input | OpKind::Const { .. } => {}
        OpKind::Call { callee, args } => {
            if let Callee::Var(v) = callee {
                rebind_var(parent_ops, v, subst);
            }
            for arg in args {
                if let Arg::Var(v) = arg {
                    rebind_var(parent_ops, v, subst);
                }
            }
        }
        OpKind::Loop(lp) => {
            let LoopOp {
                parent_inputs,
                subtape,
                condition,
                cont_vars,
                exit_vars,
            } = &mut **lp;
            for v in parent_inputs.iter_mut() {
                rebind_var(parent_ops, v, subst);
            }
            // The remaining lists address the subtape, so their targets
            // resolve there. The subtape's own operations are left alone.
            let sub_ops: &[OpRef<C>] = &subtape.ops;
            rebind_var(sub_ops, condition, subst);
            for v in cont_vars.iter_mut() {
                rebind_var(sub_ops, v, subst);
            }
            for v in exit_vars.iter_mut() {
                rebind_var(sub_ops, v, subst);
            }
        }
    }
}

impl<C: Context> Tape<C> {
    /// Applies `subst` to every operation, then to the tape result, then
    /// invokes the context rebind hook.
    pub fn rebind(&mut self, subst: &Subst) {
        let len = self.len();
        self.rebind_range(subst, 1, len);
    }

    /// Like [`rebind`](Tape::rebind) but only rewrites operations at
    /// positions `from..=to` (1-based, inclusive; an empty range is allowed).
    /// The tape result and the context hook are always processed.
    pub fn rebind_range(&mut self, subst: &Subst, from: usize, to: usize) {
        if from == 0 {
            panic!("Tape: rebind range starts at 0; positions are 1-based");
        }
        if to > self.len() {
            panic!(
                "Tape: rebind range end {} out of range (tape has {} operations)",
                to,
                self.len()
            );
        }
        for idx in from..=to {
            let op = self.op_at(idx);
            rebind_op(&self.ops, &mut op.borrow_mut(), subst);
        }
        if let Some(res) = self.result().cloned() {
            if let Some(nv) = rebound(&self.ops, &res, subst) {
                self.set_result(nv);
            }
        }
        self.context.rebind(subst);
    }

    /// Replaces the operation at position `idx` by `ops`, rebinding
    /// downstream references to the last replacement operation.
    pub fn replace(&mut self, idx: usize, ops: Vec<Op<C>>) -> Vec<Var<C>> {
        let last = ops.len();
        self.replace_rebind_to(idx, ops, last)
    }

    /// Replaces the single operation at position `idx` by the sequence
    /// `ops`: the first replacement takes over position `idx`, the rest are
    /// inserted after it, and everything from `idx` on is renumbered.
    ///
    /// Downstream references to the replaced position (any variable whose
    /// identifier read `idx` before the call, at positions past the
    /// replacement sequence, plus the tape result) are rebound to
    /// `ops[rebind_to]` (1-based index into `ops`). The replacement
    /// operations themselves are not rebound, preserving their internally
    /// chosen references. Returns bound variables for the replacements.
    pub fn replace_rebind_to(
        &mut self,
        idx: usize,
        ops: Vec<Op<C>>,
        rebind_to: usize,
    ) -> Vec<Var<C>> {
        if idx == 0 || idx > self.len() {
            panic!(
                "Tape: replace position {} out of range (tape has {} operations)",
                idx,
                self.len()
            );
        }
        if ops.is_empty() {
            panic!("Tape: replace requires at least one replacement operation");
        }
        if rebind_to == 0 || rebind_to > ops.len() {
            panic!(
                "Tape: rebind_to {} out of range for {} replacement operations",
                rebind_to,
                ops.len()
            );
        }
        let count = ops.len();
        let cells: Vec<OpRef<C>> = ops
            .into_iter()
            .map(|op| Rc::new(RefCell::new(op)))
            .collect();
        // The replaced operation keeps its (now stale) identifier, so
        // downstream references to it still read `idx` and match the
        // substitution below.
        self.ops[idx - 1] = Rc::clone(&cells[0]);
        for (offset, cell) in cells[1..].iter().enumerate() {
            self.ops.insert(idx + offset, Rc::clone(cell));
        }
        self.renumber_from(idx);

        let subst = Subst::single(idx, idx + rebind_to - 1);
        let len = self.len();
        self.rebind_range(&subst, idx + count, len);
        cells.into_iter().map(Var::Bound).collect()
    }
}
