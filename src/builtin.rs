//! Built-in host functions.
//!
//! A small arithmetic/comparison vocabulary so tapes are runnable without a
//! tracing front-end. Mixed `i64`/`f64` operands promote to `f64`. These are
//! conveniences only: any user-constructed [`Func`] is an equally valid
//! callee, and the policy for what counts as a primitive lives outside this
//! crate.

use crate::error::Error;
use crate::value::{Func, Value};

fn two<'a>(args: &'a [Value], name: &str) -> Result<(&'a Value, &'a Value), Error> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(Error::TypeError {
            detail: format!("{} expects 2 arguments, got {}", name, args.len()),
        }),
    }
}

fn one<'a>(args: &'a [Value], name: &str) -> Result<&'a Value, Error> {
    match args {
        [a] => Ok(a),
        _ => Err(Error::TypeError {
            detail: format!("{} expects 1 argument, got {}", name, args.len()),
        }),
    }
}

fn arith(
    name: &'static str,
    int: fn(i64, i64) -> Result<i64, Error>,
    float: fn(f64, f64) -> f64,
) -> Func {
    Func::new(name, move |args| {
        let (a, b) = two(args, name)?;
        match (a, b) {
            (Value::I64(x), Value::I64(y)) => Ok(Value::I64(int(*x, *y)?)),
            (Value::F64(x), Value::F64(y)) => Ok(Value::F64(float(*x, *y))),
            (Value::I64(x), Value::F64(y)) => Ok(Value::F64(float(*x as f64, *y))),
            (Value::F64(x), Value::I64(y)) => Ok(Value::F64(float(*x, *y as f64))),
            _ => Err(Error::TypeError {
                detail: format!("{}({}, {}) is not defined", name, a.kind(), b.kind()),
            }),
        }
    })
}

fn compare(name: &'static str, ord: fn(f64, f64) -> bool) -> Func {
    Func::new(name, move |args| {
        let (a, b) = two(args, name)?;
        let (x, y) = match (a, b) {
            (Value::I64(x), Value::I64(y)) => (*x as f64, *y as f64),
            (Value::F64(x), Value::F64(y)) => (*x, *y),
            (Value::I64(x), Value::F64(y)) => (*x as f64, *y),
            (Value::F64(x), Value::I64(y)) => (*x, *y as f64),
            _ => {
                return Err(Error::TypeError {
                    detail: format!("{}({}, {}) is not defined", name, a.kind(), b.kind()),
                })
            }
        };
        Ok(Value::Bool(ord(x, y)))
    })
}

pub fn add() -> Func {
    arith("add", |a, b| Ok(a.wrapping_add(b)), |a, b| a + b)
}

pub fn sub() -> Func {
    arith("sub", |a, b| Ok(a.wrapping_sub(b)), |a, b| a - b)
}

pub fn mul() -> Func {
    arith("mul", |a, b| Ok(a.wrapping_mul(b)), |a, b| a * b)
}

/// Integer division by zero fails with [`Error::DivisionByZero`]; float
/// division follows IEEE 754.
pub fn div() -> Func {
    arith(
        "div",
        |a, b| {
            if b == 0 {
                Err(Error::DivisionByZero)
            } else {
                Ok(a.wrapping_div(b))
            }
        },
        |a, b| a / b,
    )
}

pub fn neg() -> Func {
    Func::new("neg", |args| {
        let a = one(args, "neg")?;
        match a {
            Value::I64(n) => Ok(Value::I64(n.wrapping_neg())),
            Value::F64(x) => Ok(Value::F64(-x)),
            _ => Err(Error::TypeError {
                detail: format!("neg({}) is not defined", a.kind()),
            }),
        }
    })
}

pub fn lt() -> Func {
    compare("lt", |a, b| a < b)
}

pub fn le() -> Func {
    compare("le", |a, b| a <= b)
}

pub fn gt() -> Func {
    compare("gt", |a, b| a > b)
}

pub fn ge() -> Func {
    compare("ge", |a, b| a >= b)
}

/// Structural equality over any pair of values.
pub fn eq() -> Func {
    Func::new("eq", |args| {
        let (a, b) = two(args, "eq")?;
        Ok(Value::Bool(a == b))
    })
}

pub fn ne() -> Func {
    Func::new("ne", |args| {
        let (a, b) = two(args, "ne")?;
        Ok(Value::Bool(a != b))
    })
}

pub fn not() -> Func {
    Func::new("not", |args| {
        let a = one(args, "not")?;
        match a {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            _ => Err(Error::TypeError {
                detail: format!("not({}) is not defined", a.kind()),
            }),
        }
    })
}

/// Tuple constructor over all of its arguments.
pub fn tuple() -> Func {
    Func::new("tuple", |args| Ok(Value::Tuple(args.to_vec())))
}
