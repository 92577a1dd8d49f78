//! Variable handles.
//!
//! A [`Var`] addresses an operation on a tape in one of two modes. A *free*
//! variable holds a bare 1-based position and is a positional query ("the 3rd
//! operation"); a *bound* variable holds a shared reference to an operation
//! and survives renumbering, because its identifier is read through the
//! referent. Rewrites that shift operations therefore leave bound variables
//! pointing at the same operation instances while free variables go stale.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::op::OpRef;

pub enum Var<C = ()> {
    /// Positional identifier, 1-based. No operation reference.
    Free(usize),
    /// Durable reference to an operation; the identifier is derived from it.
    Bound(OpRef<C>),
}

impl<C> Var<C> {
    /// Returns the current identifier: the stored position for a free
    /// variable, the referent operation's identifier for a bound one.
    pub fn id(&self) -> usize {
        match self {
            Var::Free(id) => *id,
            Var::Bound(op) => op.borrow().id,
        }
    }

    /// Writes the identifier: updates the referent operation if bound,
    /// otherwise the stored position.
    pub fn set_id(&mut self, id: usize) {
        match self {
            Var::Free(slot) => *slot = id,
            Var::Bound(op) => op.borrow_mut().id = id,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self, Var::Bound(_))
    }

    /// Returns the referent operation of a bound variable.
    pub fn op(&self) -> Option<&OpRef<C>> {
        match self {
            Var::Free(_) => None,
            Var::Bound(op) => Some(op),
        }
    }
}

impl<C> Clone for Var<C> {
    fn clone(&self) -> Self {
        match self {
            Var::Free(id) => Var::Free(*id),
            Var::Bound(op) => Var::Bound(Rc::clone(op)),
        }
    }
}

/// Two variables are equal iff both are bound to the same operation
/// instance, or both are free with equal identifiers. A bound and a free
/// variable with the same numeric identifier are not equal.
impl<C> PartialEq for Var<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Var::Free(a), Var::Free(b)) => a == b,
            (Var::Bound(a), Var::Bound(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<C> Eq for Var<C> {}

impl<C> Hash for Var<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Var::Free(id) => {
                state.write_u8(0);
                id.hash(state);
            }
            Var::Bound(op) => {
                state.write_u8(1);
                (Rc::as_ptr(op) as *const ()).hash(state);
            }
        }
    }
}

impl<C> fmt::Display for Var<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.id())
    }
}

impl<C> fmt::Debug for Var<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Var::Free(id) => write!(f, "Free(%{})", id),
            Var::Bound(_) => write!(f, "Bound(%{})", self.id()),
        }
    }
}
