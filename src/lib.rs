//! Reel: a linearized, mutable intermediate representation for dynamically
//! traced programs.
//!
//! A tape records a sequence of primitive operations (inputs, constants,
//! calls, and structured loops), each addressable by a stable variable
//! handle:
//!
//! ```text
//! producer → push/insert/replace → [Tape] → play → result value
//! ```
//!
//! Three workflows are supported:
//! 1. *Tracing*: append operations as a program runs; calls whose operands
//!    are all known evaluate eagerly, so cached values stay coherent.
//! 2. *Rewriting*: insert, replace, and rebind operations while keeping the
//!    operation graph consistent; bound variables track renumbering
//!    automatically.
//! 3. *Playback*: re-execute the whole tape over fresh input values,
//!    including nested loop tapes.
//!
//! ```
//! use reel::{builtin, play, Op, Tape, Value};
//!
//! let mut tape = Tape::new();
//! let inputs = tape.set_inputs(vec![Value::F64(3.0), Value::F64(5.0)]);
//! let r = tape.push(Op::call(builtin::mul(), vec![(&inputs[0]).into(), (&inputs[1]).into()]).unwrap());
//! tape.set_result(r.clone());
//! assert_eq!(tape.op(&r).borrow().val, Some(Value::F64(15.0)));
//! assert_eq!(play(&tape, &[Value::F64(2.0), Value::F64(4.0)]).unwrap(), Value::F64(8.0));
//! ```

pub mod builtin;
pub mod error;
pub mod exec;
pub mod op;
pub mod rewrite;
pub mod tape;
pub mod value;
pub mod var;

pub use error::Error;
pub use exec::{call_signature, play, play_with_options, ExecOptions};
pub use op::{Arg, Callee, LoopOp, Op, OpKind, OpRef};
pub use rewrite::{Context, Subst};
pub use tape::Tape;
pub use value::{Func, Kind, Value};
pub use var::Var;
