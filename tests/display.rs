//! Golden tests for the fixed display forms.

use reel::{builtin, Op, Tape, Value, Var};

fn f(x: f64) -> Value {
    Value::F64(x)
}

#[test]
fn test_variable_display() {
    assert_eq!(Var::<()>::Free(3).to_string(), "%3");
}

#[test]
fn test_input_display() {
    let mut tape = Tape::new();
    tape.set_inputs(vec![f(3.0), Value::Str("hi".into())]);
    assert_eq!(tape.op_at(1).borrow().to_string(), "inp %1::f64");
    assert_eq!(tape.op_at(2).borrow().to_string(), "inp %2::str");
}

#[test]
fn test_constant_display() {
    let mut tape = Tape::new();
    tape.push(Op::constant(Value::I64(42)));
    tape.push(Op::constant(Value::Bool(true)));
    assert_eq!(tape.op_at(1).borrow().to_string(), "const %1 = 42::i64");
    assert_eq!(tape.op_at(2).borrow().to_string(), "const %2 = true::bool");
}

#[test]
fn test_call_display() {
    let mut tape = Tape::new();
    let inputs = tape.set_inputs(vec![f(3.0), f(5.0)]);
    tape.push(
        Op::call(
            builtin::mul(),
            vec![(&inputs[0]).into(), (&inputs[1]).into()],
        )
        .expect("should build call"),
    );
    tape.push(
        Op::call(builtin::add(), vec![(&inputs[0]).into(), f(2.0).into()])
            .expect("should build call"),
    );
    assert_eq!(tape.op_at(3).borrow().to_string(), "%3 = mul(%1, %2)::f64");
    assert_eq!(tape.op_at(4).borrow().to_string(), "%4 = add(%1, 2)::f64");
}

#[test]
fn test_symbolic_call_displays_missing() {
    let mut tape = Tape::new();
    tape.set_inputs(vec![f(3.0)]);
    tape.push(Op::call_with_val(
        builtin::mul(),
        vec![reel::Arg::Var(Var::Free(1)), f(2.0).into()],
        None,
    ));
    assert_eq!(
        tape.op_at(2).borrow().to_string(),
        "%2 = mul(%1, 2)::missing"
    );
}

#[test]
fn test_variable_callee_display() {
    let mut tape = Tape::new();
    let fv = tape.push(Op::constant(Value::Func(builtin::add())));
    tape.push(Op::call(&fv, vec![f(1.0).into(), f(2.0).into()]).expect("should build call"));
    assert_eq!(tape.op_at(2).borrow().to_string(), "%2 = %1(1, 2)::f64");
}

#[test]
fn test_loop_display() {
    let mut parent = Tape::new();
    let inputs = parent.set_inputs(vec![Value::I64(1), Value::I64(3)]);

    let mut sub = Tape::new();
    let svars = sub.set_inputs(vec![Value::I64(1), Value::I64(3)]);
    let next = sub.push(
        Op::call(
            builtin::add(),
            vec![(&svars[0]).into(), Value::I64(1).into()],
        )
        .expect("should build call"),
    );
    let cond = sub.push(
        Op::call(builtin::le(), vec![(&next).into(), (&svars[1]).into()])
            .expect("should build call"),
    );
    parent.push(Op::loop_(
        inputs,
        sub,
        cond,
        vec![next.clone(), svars[1].clone()],
        vec![next],
    ));

    assert_eq!(parent.op_at(3).borrow().to_string(), "%3 = Loop(%1, %2)");
}

#[test]
fn test_tape_listing() {
    let mut tape = Tape::new();
    let inputs = tape.set_inputs(vec![f(3.0), f(5.0)]);
    tape.push(Op::constant(Value::I64(2)));
    tape.push(
        Op::call(
            builtin::mul(),
            vec![(&inputs[0]).into(), (&inputs[1]).into()],
        )
        .expect("should build call"),
    );

    insta::assert_snapshot!(tape.to_string(), @r"
    Tape{()}
      inp %1::f64
      inp %2::f64
      const %3 = 2::i64
      %4 = mul(%1, %2)::f64
    ");
}

#[test]
fn test_tape_header_names_context_type() {
    struct PassState;
    impl reel::Context for PassState {}

    let tape = Tape::with_context(PassState);
    assert_eq!(tape.to_string(), "Tape{PassState}");
}
