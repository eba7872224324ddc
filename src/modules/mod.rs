pub mod builtins;
pub mod math;

use crate::evaluator::Evaluator;
use crate::expr::Expr;
use crate::scope::LocalScope;
use crate::value::{Number, Value};
use crate::EngineError;

pub(crate) fn arity(function: &str, requires: &str) -> EngineError {
  EngineError::Arity {
    function: function.to_string(),
    requires: requires.to_string(),
  }
}

/// Evaluate the argument at `index` and coerce it to a number. Missing
/// arguments fail the function's arity contract; non-numeric results fail
/// with a type error naming the function.
pub(crate) fn number_at(
  args: &[Expr],
  index: usize,
  function: &str,
  requires: &str,
  scope: &LocalScope,
  evaluator: &mut Evaluator<'_>,
) -> Result<Number, EngineError> {
  let Some(arg) = args.get(index) else {
    return Err(arity(function, requires));
  };
  match evaluator.eval(arg, scope)? {
    Value::Number(n) => Ok(n),
    other => Err(EngineError::Type(format!(
      "{{!{function}}} was passed a {} where a number was expected.",
      other.kind()
    ))),
  }
}

/// Evaluate an operator operand and coerce it to a number.
pub(crate) fn operand_number(
  operand: &Expr,
  symbol: &str,
  scope: &LocalScope,
  evaluator: &mut Evaluator<'_>,
) -> Result<Number, EngineError> {
  match evaluator.eval(operand, scope)? {
    Value::Number(n) => Ok(n),
    other => Err(EngineError::Type(format!(
      "The operator {symbol} requires number operands, but was given a {}.",
      other.kind()
    ))),
  }
}
