use rust_decimal::prelude::ToPrimitive;
use rust_decimal::MathematicalOps;

use super::operand_number;
use crate::env::Environment;
use crate::value::{Number, Value, ValueKind};
use crate::EngineError;

/// Parser priorities of the core operators. The spacing leaves room for
/// extension modules to slot operators between the stock ones.
pub const ADDITION_PRIORITY: i32 = 0;
pub const MULTIPLICATION_PRIORITY: i32 = 4;
pub const SIGN_PRIORITY: i32 = 6;
pub const POWER_PRIORITY: i32 = 8;

/// Register the core operators: arithmetic on numbers, concatenation on
/// strings and lists, and the sign prefixes.
pub fn install(env: &mut Environment) {
  env.register_binary(
    "+",
    ADDITION_PRIORITY,
    false,
    ValueKind::Number,
    |left, right, scope, ev| {
      let lhs = operand_number(left, "+", scope, ev)?;
      let rhs = operand_number(right, "+", scope, ev)?;
      Ok(Value::Number(lhs + rhs))
    },
  );
  env.register_binary(
    "+",
    ADDITION_PRIORITY,
    false,
    ValueKind::Text,
    |left, right, scope, ev| {
      let lhs = match ev.eval(left, scope)? {
        Value::Text(s) => s,
        other => {
          return Err(EngineError::Type(format!(
            "The operator + requires a string on the left, but was given a {}.",
            other.kind()
          )))
        }
      };
      let rhs = match ev.eval(right, scope)? {
        Value::Text(s) => s,
        Value::Number(n) => n.to_display_string(),
        Value::List(_) => {
          return Err(EngineError::Type(
            "The operator + cannot append a list to a string.".into(),
          ))
        }
      };
      Ok(Value::Text(lhs + &rhs))
    },
  );
  env.register_binary(
    "+",
    ADDITION_PRIORITY,
    false,
    ValueKind::List,
    |left, right, scope, ev| {
      let mut items = match ev.eval(left, scope)? {
        Value::List(items) => items,
        other => {
          return Err(EngineError::Type(format!(
            "The operator + requires a list on the left, but was given a {}.",
            other.kind()
          )))
        }
      };
      match ev.eval(right, scope)? {
        Value::List(more) => items.extend(more),
        other => items.push(other),
      }
      Ok(Value::List(items))
    },
  );

  env.register_binary(
    "-",
    ADDITION_PRIORITY,
    false,
    ValueKind::Number,
    |left, right, scope, ev| {
      let lhs = operand_number(left, "-", scope, ev)?;
      let rhs = operand_number(right, "-", scope, ev)?;
      Ok(Value::Number(lhs - rhs))
    },
  );

  env.register_binary(
    "*",
    MULTIPLICATION_PRIORITY,
    false,
    ValueKind::Number,
    |left, right, scope, ev| {
      let lhs = operand_number(left, "*", scope, ev)?;
      let rhs = operand_number(right, "*", scope, ev)?;
      Ok(Value::Number(lhs * rhs))
    },
  );

  env.register_binary(
    "/",
    MULTIPLICATION_PRIORITY,
    false,
    ValueKind::Number,
    |left, right, scope, ev| {
      let lhs = operand_number(left, "/", scope, ev)?;
      let rhs = operand_number(right, "/", scope, ev)?;
      let quotient = lhs
        .value()
        .checked_div(rhs.value())
        .ok_or(EngineError::DivisionByZero)?;
      Ok(Value::Number(Number::new(quotient)))
    },
  );

  env.register_binary(
    "%",
    MULTIPLICATION_PRIORITY,
    false,
    ValueKind::Number,
    |left, right, scope, ev| {
      let lhs = operand_number(left, "%", scope, ev)?;
      let rhs = operand_number(right, "%", scope, ev)?;
      let remainder = lhs
        .value()
        .checked_rem(rhs.value())
        .ok_or(EngineError::DivisionByZero)?;
      Ok(Value::Number(Number::new(remainder)))
    },
  );

  env.register_binary(
    "^",
    POWER_PRIORITY,
    true,
    ValueKind::Number,
    |left, right, scope, ev| {
      let base = operand_number(left, "^", scope, ev)?;
      let exponent = operand_number(right, "^", scope, ev)?;
      power(base, exponent)
    },
  );

  env.register_prefix(
    "-",
    SIGN_PRIORITY,
    ValueKind::Number,
    |operand, scope, ev| {
      let num = operand_number(operand, "-", scope, ev)?;
      Ok(Value::Number(-num))
    },
  );
  env.register_prefix(
    "-",
    SIGN_PRIORITY,
    ValueKind::List,
    |operand, scope, ev| negate(ev.eval(operand, scope)?),
  );
  env.register_prefix(
    "+",
    SIGN_PRIORITY,
    ValueKind::Number,
    |operand, scope, ev| {
      let num = operand_number(operand, "+", scope, ev)?;
      Ok(Value::Number(num))
    },
  );
}

/// Exponentiation: exact for integral exponents, through f64 (a documented
/// precision-loss point) for fractional ones.
fn power(base: Number, exponent: Number) -> Result<Value, EngineError> {
  let exp = exponent.value();
  if exp.fract().is_zero() {
    if let Some(int_exp) = exp.to_i64() {
      let result = base.value().checked_powi(int_exp).ok_or_else(|| {
        EngineError::Math(
          "exponentiation overflowed the numeric range".into(),
        )
      })?;
      return Ok(Value::Number(Number::new(result)));
    }
  }
  let base_f = base
    .to_f64()
    .ok_or_else(|| EngineError::Math("base is not representable".into()))?;
  let exp_f = exponent
    .to_f64()
    .ok_or_else(|| EngineError::Math("exponent is not representable".into()))?;
  Number::from_f64(base_f.powf(exp_f))
    .map(Value::Number)
    .ok_or_else(|| {
      EngineError::Math("exponentiation produced a non-finite result".into())
    })
}

fn negate(value: Value) -> Result<Value, EngineError> {
  match value {
    Value::Number(n) => Ok(Value::Number(-n)),
    Value::Text(_) => Err(EngineError::Type(
      "The operator - cannot negate a string.".into(),
    )),
    Value::List(items) => items
      .into_iter()
      .map(negate)
      .collect::<Result<Vec<_>, _>>()
      .map(Value::List),
  }
}
