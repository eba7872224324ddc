use rust_decimal::Decimal;

use super::builtins::POWER_PRIORITY;
use super::{arity, number_at, operand_number};
use crate::env::Environment;
use crate::value::{Number, Value, ValueKind};
use crate::EngineError;

/// Register the math-function catalog and the postfix factorial operator
/// at its default priority (shared with exponentiation).
pub fn install(env: &mut Environment) {
  install_with_factorial_priority(env, POWER_PRIORITY);
}

/// Same as [`install`], with the factorial operator's parser priority
/// overridden. Re-loading is idempotent: an already-registered operator
/// entry is reused, and function registrations replace themselves.
pub fn install_with_factorial_priority(env: &mut Environment, priority: i32) {
  let factorial_op = env.postfix_or_create("!", priority);
  factorial_op.add_handler(ValueKind::Number, |operand, scope, ev| {
    let num = operand_number(operand, "!", scope, ev)?;
    factorial(num)
  });
  // A list reduces to its sum before the factorial applies.
  factorial_op.add_handler(ValueKind::List, |operand, scope, ev| {
    let num = ev.eval(operand, scope)?.sum()?;
    factorial(num)
  });

  env.register_function("e", |_args, _scope, _ev| {
    Ok(Value::Number(Number::new(Decimal::E)))
  });
  env.register_function("pi", |_args, _scope, _ev| {
    Ok(Value::Number(Number::new(Decimal::PI)))
  });

  env.register_function("abs", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("abs", "a number"));
    }
    let num = number_at(args, 0, "abs", "a number", scope, ev)?;
    Ok(Value::Number(num.abs()))
  });

  env.register_function("sign", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("sign", "a number"));
    }
    let num = number_at(args, 0, "sign", "a number", scope, ev)?;
    let sign: i64 = if num.is_zero() {
      0
    } else if num.value().is_sign_negative() {
      -1
    } else {
      1
    };
    Ok(Value::number(sign))
  });

  env.register_function("floor", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("floor", "a number"));
    }
    let num = number_at(args, 0, "floor", "a number", scope, ev)?;
    Ok(Value::Number(Number::new(num.value().floor())))
  });

  env.register_function("ceiling", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("ceiling", "a number"));
    }
    let num = number_at(args, 0, "ceiling", "a number", scope, ev)?;
    Ok(Value::Number(Number::new(num.value().ceil())))
  });

  env.register_function("copysign", |args, scope, ev| {
    if args.len() < 2 {
      return Err(arity("copysign", "two numbers"));
    }
    let magnitude = number_at(args, 0, "copysign", "two numbers", scope, ev)?;
    let sign_of = number_at(args, 1, "copysign", "two numbers", scope, ev)?;
    let result = if sign_of.value().is_sign_negative() {
      -magnitude.abs()
    } else {
      magnitude.abs()
    };
    Ok(Value::Number(result))
  });

  env.register_function("atan2", |args, scope, ev| {
    if args.len() < 2 {
      return Err(arity("atan2", "two numbers"));
    }
    let y = number_at(args, 0, "atan2", "two numbers", scope, ev)?;
    let x = number_at(args, 1, "atan2", "two numbers", scope, ev)?;
    let y_f = to_f64("atan2", y)?;
    let x_f = to_f64("atan2", x)?;
    from_f64("atan2", y_f.atan2(x_f))
  });

  env.register_function("max", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("max", "numbers"));
    }
    let mut max = Decimal::MIN;
    for index in 0..args.len() {
      let num = number_at(args, index, "max", "numbers", scope, ev)?;
      if num.value() > max {
        max = num.value();
      }
    }
    Ok(Value::Number(Number::new(max)))
  });

  env.register_function("min", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("min", "numbers"));
    }
    let mut min = Decimal::MAX;
    for index in 0..args.len() {
      let num = number_at(args, index, "min", "numbers", scope, ev)?;
      if num.value() < min {
        min = num.value();
      }
    }
    Ok(Value::Number(Number::new(min)))
  });

  // The magnitude variants compare each candidate's magnitude against the
  // signed running value. Single-input behavior is the identity.
  env.register_function("maxmagnitude", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("maxmagnitude", "numbers"));
    }
    let mut max = Decimal::ZERO;
    for index in 0..args.len() {
      let num = number_at(args, index, "maxmagnitude", "numbers", scope, ev)?;
      if num.value().abs() > max {
        max = num.value();
      }
    }
    Ok(Value::Number(Number::new(max)))
  });

  env.register_function("minmagnitude", |args, scope, ev| {
    if args.is_empty() {
      return Err(arity("minmagnitude", "numbers"));
    }
    let mut min = Decimal::MAX;
    for index in 0..args.len() {
      let num = number_at(args, index, "minmagnitude", "numbers", scope, ev)?;
      if num.value().abs() < min {
        min = num.value();
      }
    }
    Ok(Value::Number(Number::new(min)))
  });

  register_unary_f64(env, "log", f64::ln);
  register_unary_f64(env, "sin", f64::sin);
  register_unary_f64(env, "cos", f64::cos);
  register_unary_f64(env, "tan", f64::tan);
  register_unary_f64(env, "asin", f64::asin);
  register_unary_f64(env, "acos", f64::acos);
  register_unary_f64(env, "atan", f64::atan);
  register_unary_f64(env, "sinh", f64::sinh);
  register_unary_f64(env, "cosh", f64::cosh);
  register_unary_f64(env, "tanh", f64::tanh);
  register_unary_f64(env, "asinh", f64::asinh);
  register_unary_f64(env, "acosh", f64::acosh);
  register_unary_f64(env, "atanh", f64::atanh);
}

/// Register a one-argument function computed through f64 — the documented
/// precision-loss round-trip for transcendental functions.
fn register_unary_f64(
  env: &mut Environment,
  name: &'static str,
  f: fn(f64) -> f64,
) {
  env.register_function(name, move |args, scope, ev| {
    if args.is_empty() {
      return Err(arity(name, "a number"));
    }
    let num = number_at(args, 0, name, "a number", scope, ev)?;
    from_f64(name, f(to_f64(name, num)?))
  });
}

fn to_f64(function: &str, num: Number) -> Result<f64, EngineError> {
  num.to_f64().ok_or_else(|| {
    EngineError::Math(format!(
      "{{!{function}}} was passed a value outside the f64 range."
    ))
  })
}

/// Round an f64 result back into the 15-digit number representation.
/// Out-of-domain inputs surface here as non-finite results.
fn from_f64(function: &str, value: f64) -> Result<Value, EngineError> {
  Number::from_f64(value).map(Value::Number).ok_or_else(|| {
    EngineError::Math(format!(
      "{{!{function}}} produced a result outside the numeric range."
    ))
  })
}

fn factorial(num: Number) -> Result<Value, EngineError> {
  let bound = num.value();
  let mut product = Decimal::ONE;
  let mut factor = Decimal::TWO;
  while factor <= bound {
    product = product.checked_mul(factor).ok_or_else(|| {
      EngineError::Math("factorial overflowed the numeric range".into())
    })?;
    factor += Decimal::ONE;
  }
  Ok(Value::Number(Number::new(product)))
}
