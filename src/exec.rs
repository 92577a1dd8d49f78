//! Tape playback.
//!
//! Executes a tape over fresh input values by walking its operations in
//! order and refreshing each cached value. Loop operations run their subtape
//! with the cursor wrap-around rule: when the cursor passes the end of the
//! body, the continue variables' values are carried into the subtape inputs
//! and the body starts over.

use crate::error::Error;
use crate::op::{Arg, Callee, LoopOp, Op, OpKind, OpRef};
use crate::tape::Tape;
use crate::value::{Func, Kind, Value};
use crate::var::Var;

/// Execution options.
#[derive(Debug, Clone, Copy)]
pub struct ExecOptions {
    /// Maximum number of operation executions before aborting, counting
    /// every subtape iteration (default: 1 000 000). A loop whose condition
    /// never turns false hits this limit instead of spinning forever.
    pub max_steps: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
        }
    }
}

/// Re-executes `tape` over the given input values and returns the value of
/// its result operation.
///
/// Argument `i` overwrites the value of operation `i + 1`, which must be an
/// `Input`; supplying more arguments than there are inputs panics. Apart
/// from refreshed cached values the tape is left unchanged, so replaying
/// with identical inputs yields identical results.
pub fn play<C>(tape: &Tape<C>, args: &[Value]) -> Result<Value, Error> {
    play_with_options(tape, args, ExecOptions::default())
}

/// Like [`play`] but with custom execution limits.
pub fn play_with_options<C>(
    tape: &Tape<C>,
    args: &[Value],
    opts: ExecOptions,
) -> Result<Value, Error> {
    Executor { opts, steps: 0 }.run(tape, args)
}

/// Returns the concrete kinds `(callee, args…)` of a call operation after
/// resolving all variables, for method-table lookup by downstream passes.
///
/// Panics if `op` is not a call.
pub fn call_signature<C>(tape: &Tape<C>, op: &Op<C>) -> Result<Vec<Kind>, Error> {
    let (callee, args) = match &op.kind {
        OpKind::Call { callee, args } => (callee, args),
        _ => panic!("call_signature: operation %{} is not a call", op.id),
    };
    let mut kinds = Vec::with_capacity(args.len() + 1);
    kinds.push(match callee {
        Callee::Func(_) => Kind::Func,
        Callee::Var(v) => resolve_var(tape, v)?.kind(),
    });
    for arg in args {
        kinds.push(resolve_arg(tape, arg)?.kind());
    }
    Ok(kinds)
}

// ---------------------------------------------------------------------------
// Executor state
// ---------------------------------------------------------------------------

struct Executor {
    opts: ExecOptions,
    /// Operations executed so far, across all nesting levels.
    steps: usize,
}

impl Executor {
    fn run<C>(&mut self, tape: &Tape<C>, args: &[Value]) -> Result<Value, Error> {
        for (i, arg) in args.iter().enumerate() {
            if i >= tape.len() {
                panic!(
                    "Executor: {} arguments supplied but tape has {} operations",
                    args.len(),
                    tape.len()
                );
            }
            let op = tape.op_at(i + 1);
            if !op.borrow().is_input() {
                panic!("Executor: operation %{} is not an input", i + 1);
            }
            op.borrow_mut().val = Some(arg.clone());
        }
        for op in tape.iter() {
            self.exec_op(tape, op)?;
        }
        let res = tape.result().ok_or(Error::NoResult)?;
        resolve_var(tape, res)
    }

    fn exec_op<C>(&mut self, tape: &Tape<C>, op: &OpRef<C>) -> Result<(), Error> {
        self.steps += 1;
        if self.steps > self.opts.max_steps {
            return Err(Error::StepLimit {
                limit: self.opts.max_steps,
            });
        }
        if matches!(op.borrow().kind, OpKind::Loop(_)) {
            return self.exec_loop(tape, op);
        }
        // Inputs and constants already hold their values.
        let work = {
            let b = op.borrow();
            match &b.kind {
                OpKind::Input | OpKind::Const { .. } => None,
                OpKind::Call { callee, args } => {
                    let func = resolve_callee(tape, callee)?;
                    let mut vals = Vec::with_capacity(args.len());
                    for arg in args {
                        vals.push(resolve_arg(tape, arg)?);
                    }
                    Some((func, vals))
                }
                OpKind::Loop(_) => unreachable!("loops are handled above"),
            }
        };
        if let Some((func, vals)) = work {
            let out = func.call(&vals)?;
            op.borrow_mut().val = Some(out);
        }
        Ok(())
    }

    fn exec_loop<C>(&mut self, tape: &Tape<C>, op: &OpRef<C>) -> Result<(), Error> {
        let exit_vals = {
            let b = op.borrow();
            let lp = match &b.kind {
                OpKind::Loop(lp) => lp,
                _ => unreachable!("exec_loop on a non-loop operation"),
            };
            self.run_loop(tape, lp)?
        };
        op.borrow_mut().val = Some(Value::Tuple(exit_vals));
        Ok(())
    }

    fn run_loop<C>(&mut self, tape: &Tape<C>, lp: &LoopOp<C>) -> Result<Vec<Value>, Error> {
        let sub = &lp.subtape;
        let carried = lp.parent_inputs.len();

        // Seed the subtape inputs with the parent values.
        for (slot, pv) in lp.parent_inputs.iter().enumerate() {
            let val = resolve_var(tape, pv)?;
            let inp = sub.op_at(slot + 1);
            if !inp.borrow().is_input() {
                panic!("Loop: subtape operation %{} is not an input", slot + 1);
            }
            inp.borrow_mut().val = Some(val);
        }

        let body_start = carried + 1;
        if body_start > sub.len() {
            panic!("Loop: subtape has no body operations");
        }
        let mut vi = body_start;
        loop {
            let cur = sub.op_at(vi);
            self.exec_op(sub, &cur)?;

            if vi == lp.condition.id() {
                let keep_going = match resolve_var(sub, &lp.condition)? {
                    Value::Bool(b) => b,
                    other => {
                        return Err(Error::TypeError {
                            detail: format!(
                                "loop condition %{} evaluated to {}, expected bool",
                                lp.condition.id(),
                                other.kind()
                            ),
                        })
                    }
                };
                if !keep_going {
                    return gather_exit_values(sub, lp, vi);
                }
            }

            vi += 1;
            if vi > sub.len() {
                // Wrap: carry the continue values into the inputs and start
                // the next iteration.
                vi = body_start;
                for (slot, cv) in lp.cont_vars.iter().enumerate() {
                    let val = resolve_var(sub, cv)?;
                    sub.op_at(slot + 1).borrow_mut().val = Some(val);
                }
            }
        }
    }
}

/// Collects the loop's exit values at the moment the condition turned false.
///
/// A continue variable whose position the cursor has already passed holds
/// this iteration's updated value. One the cursor has not reached yet was
/// computed for the *previous* iteration, so the exit takes the
/// corresponding input's pre-iteration value instead.
fn gather_exit_values<C>(
    sub: &Tape<C>,
    lp: &LoopOp<C>,
    vi: usize,
) -> Result<Vec<Value>, Error> {
    let mut vals = Vec::with_capacity(lp.exit_vars.len());
    for ev in &lp.exit_vars {
        let slot = lp
            .cont_vars
            .iter()
            .position(|cv| cv == ev)
            .unwrap_or_else(|| {
                panic!(
                    "Loop: exit variable %{} is not one of the continue variables",
                    ev.id()
                )
            });
        let val = if vi > lp.cont_vars[slot].id() {
            resolve_var(sub, &lp.cont_vars[slot])?
        } else {
            resolve_var(sub, &Var::Free(slot + 1))?
        };
        vals.push(val);
    }
    Ok(vals)
}

// ---------------------------------------------------------------------------
// Value resolution
// ---------------------------------------------------------------------------

fn resolve_var<C>(tape: &Tape<C>, v: &Var<C>) -> Result<Value, Error> {
    let val = match v {
        Var::Bound(op) => op.borrow().val.clone(),
        Var::Free(id) => tape.op_at(*id).borrow().val.clone(),
    };
    val.ok_or(Error::UndefinedValue { id: v.id() })
}

fn resolve_arg<C>(tape: &Tape<C>, arg: &Arg<C>) -> Result<Value, Error> {
    match arg {
        Arg::Const(v) => Ok(v.clone()),
        Arg::Var(v) => resolve_var(tape, v),
    }
}

/// Resolves the called function, looking through variable indirection: a
/// variable callee contributes its referent's cached value, whatever
/// operation produced it.
fn resolve_callee<C>(tape: &Tape<C>, callee: &Callee<C>) -> Result<Func, Error> {
    match callee {
        Callee::Func(func) => Ok(func.clone()),
        Callee::Var(v) => match resolve_var(tape, v)? {
            Value::Func(func) => Ok(func),
            _ => Err(Error::NotAFunction { id: v.id() }),
        },
    }
}
