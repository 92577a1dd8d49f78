//! Tests for structured loop operations: carried state, the cursor
//! wrap-around rule, exit-value selection, and the step limit.

use reel::{builtin, play, play_with_options, Error, ExecOptions, Op, Tape, Value, Var};

fn i(n: i64) -> Value {
    Value::I64(n)
}

/// Counts up from the parent input until the incremented value reaches 5.
///
/// Subtape layout: `%1` carried input, `%2 = add(%1, 1)`, `%3 = lt(%2, 5)`.
fn count_to_five() -> Tape {
    let mut parent = Tape::new();
    let x0 = parent.set_inputs(vec![i(1)]).remove(0);

    let mut sub = Tape::new();
    let si = sub.set_inputs(vec![i(1)]).remove(0);
    let next = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );
    let cond = sub.push(
        Op::call(builtin::lt(), vec![(&next).into(), i(5).into()]).expect("should build call"),
    );

    let lp = parent.push(Op::loop_(
        vec![x0],
        sub,
        cond,
        vec![next.clone()],
        vec![next],
    ));
    parent.set_result(lp);
    parent
}

#[test]
fn test_loop_counts_until_condition_fails() {
    let parent = count_to_five();
    let out = play(&parent, &[i(1)]).expect("play should succeed");
    // The condition follows the continue variable, so the exit sees the
    // updated value of the final iteration.
    assert_eq!(out, Value::Tuple(vec![i(5)]));
}

#[test]
fn test_loop_replays_with_fresh_inputs() {
    let parent = count_to_five();
    assert_eq!(
        play(&parent, &[i(3)]).expect("play should succeed"),
        Value::Tuple(vec![i(5)])
    );
    assert_eq!(
        play(&parent, &[i(1)]).expect("play should succeed"),
        Value::Tuple(vec![i(5)])
    );
}

#[test]
fn test_loop_exit_before_continue_var_takes_pre_iteration_value() {
    // The condition precedes the continue variable: when it turns false the
    // increment for that iteration has not run yet, so the exit must take
    // the input's pre-iteration value.
    //
    // Subtape layout: `%1` carried input, `%2 = lt(%1, 3)`, `%3 = add(%1, 1)`.
    let mut parent = Tape::new();
    let x0 = parent.set_inputs(vec![i(0)]).remove(0);

    let mut sub = Tape::new();
    let si = sub.set_inputs(vec![i(0)]).remove(0);
    let cond = sub.push(
        Op::call(builtin::lt(), vec![(&si).into(), i(3).into()]).expect("should build call"),
    );
    let next = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );

    let lp = parent.push(Op::loop_(
        vec![x0],
        sub,
        cond,
        vec![next.clone()],
        vec![next],
    ));
    parent.set_result(lp);

    let out = play(&parent, &[i(0)]).expect("play should succeed");
    assert_eq!(out, Value::Tuple(vec![i(3)]));
}

/// Sums `1..=n` with three carried slots: the counter, the accumulator, and
/// the bound carried through unchanged.
///
/// Subtape layout: `%1..%3` carried inputs, `%4 = add(%1, 1)`,
/// `%5 = add(%2, %1)`, `%6 = le(%4, %3)`.
fn sum_tape() -> Tape {
    let mut parent = Tape::new();
    let inputs = parent.set_inputs(vec![i(1), i(0), i(3)]);

    let mut sub = Tape::new();
    let svars = sub.set_inputs(vec![i(1), i(0), i(3)]);
    let (si, sacc, sn) = (svars[0].clone(), svars[1].clone(), svars[2].clone());
    let next_i = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );
    let next_acc = sub.push(
        Op::call(builtin::add(), vec![(&sacc).into(), (&si).into()]).expect("should build call"),
    );
    let cond = sub.push(
        Op::call(builtin::le(), vec![(&next_i).into(), (&sn).into()]).expect("should build call"),
    );

    let lp = parent.push(Op::loop_(
        inputs,
        sub,
        cond,
        // The bound is carried through unchanged: its continue variable is
        // the input itself.
        vec![next_i, next_acc.clone(), sn],
        vec![next_acc],
    ));
    parent.set_result(lp);
    parent
}

#[test]
fn test_loop_with_multiple_carried_slots() {
    let parent = sum_tape();
    let out = play(&parent, &[i(1), i(0), i(3)]).expect("play should succeed");
    assert_eq!(out, Value::Tuple(vec![i(6)]), "1 + 2 + 3");
}

#[test]
fn test_loop_carried_bound_changes_iteration_count() {
    let parent = sum_tape();
    let out = play(&parent, &[i(1), i(0), i(4)]).expect("play should succeed");
    assert_eq!(out, Value::Tuple(vec![i(10)]), "1 + 2 + 3 + 4");
}

#[test]
fn test_runaway_loop_hits_step_limit() {
    // The condition compares two constants and never turns false.
    let mut parent = Tape::new();
    let x0 = parent.set_inputs(vec![i(0)]).remove(0);

    let mut sub = Tape::new();
    let si = sub.set_inputs(vec![i(0)]).remove(0);
    let next = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );
    let cond = sub.push(
        Op::call(builtin::lt(), vec![i(0).into(), i(1).into()]).expect("should build call"),
    );

    let lp = parent.push(Op::loop_(
        vec![x0],
        sub,
        cond,
        vec![next.clone()],
        vec![next],
    ));
    parent.set_result(lp);

    let err = play_with_options(&parent, &[i(0)], ExecOptions { max_steps: 100 }).unwrap_err();
    assert_eq!(err, Error::StepLimit { limit: 100 });
}

#[test]
fn test_loop_condition_must_be_bool() {
    let mut parent = Tape::new();
    let x0 = parent.set_inputs(vec![i(0)]).remove(0);

    let mut sub = Tape::new();
    let si = sub.set_inputs(vec![i(0)]).remove(0);
    let next = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );

    let lp = parent.push(Op::loop_(
        vec![x0],
        sub,
        // The "condition" yields an integer, not a bool.
        next.clone(),
        vec![next.clone()],
        vec![next],
    ));
    parent.set_result(lp);

    let err = play(&parent, &[i(0)]).unwrap_err();
    assert!(
        matches!(err, Error::TypeError { .. }),
        "expected a type error, got {:?}",
        err
    );
}

#[test]
#[should_panic(expected = "subtape with 1 input")]
fn test_loop_arity_mismatch_panics() {
    let mut sub: Tape = Tape::new();
    sub.set_inputs(vec![i(0)]);
    let cond = sub.push(
        Op::call(builtin::lt(), vec![i(0).into(), i(1).into()]).expect("should build call"),
    );
    let _ = Op::loop_(vec![], sub, cond, vec![], vec![]);
}

#[test]
#[should_panic(expected = "not one of the continue variables")]
fn test_loop_exit_var_outside_continue_vars_panics() {
    let mut sub: Tape = Tape::new();
    let si = sub.set_inputs(vec![i(0)]).remove(0);
    let next = sub.push(
        Op::call(builtin::add(), vec![(&si).into(), i(1).into()]).expect("should build call"),
    );
    let cond = sub.push(
        Op::call(builtin::lt(), vec![(&next).into(), i(5).into()]).expect("should build call"),
    );
    let _ = Op::loop_(
        vec![Var::Free(1)],
        sub,
        cond.clone(),
        vec![next],
        // The condition is not a continue variable.
        vec![cond],
    );
}
