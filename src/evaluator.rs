use crate::context::ContextProvider;
use crate::env::{Environment, Fixity};
use crate::expr::Expr;
use crate::scope::LocalScope;
use crate::value::{Value, ValueKind};
use crate::EngineError;

/// Default bound on evaluation depth. Deep enough for any reasonable
/// expression tree, shallow enough to fail cleanly before the host stack
/// does.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// The recursive evaluation engine.
///
/// Bundles the environment and context a call tree runs against, plus the
/// recursion-depth guard. Create one per top-level evaluation; native
/// function and operator implementations receive it to evaluate their
/// operand expressions.
pub struct Evaluator<'e> {
  env: &'e Environment,
  ctx: &'e dyn ContextProvider,
  depth: usize,
  max_depth: usize,
}

impl<'e> Evaluator<'e> {
  pub fn new(env: &'e Environment, ctx: &'e dyn ContextProvider) -> Self {
    Evaluator {
      env,
      ctx,
      depth: 0,
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }

  pub fn with_max_depth(
    env: &'e Environment,
    ctx: &'e dyn ContextProvider,
    max_depth: usize,
  ) -> Self {
    Evaluator {
      env,
      ctx,
      depth: 0,
      max_depth,
    }
  }

  pub fn env(&self) -> &'e Environment {
    self.env
  }

  pub fn context(&self) -> &'e dyn ContextProvider {
    self.ctx
  }

  /// Evaluate an expression to a resolved value under the given scope.
  ///
  /// A cyclic reference (e.g. a global variable naming itself) fails with
  /// `RecursionLimit` instead of overflowing the host stack.
  pub fn eval(
    &mut self,
    expr: &Expr,
    scope: &LocalScope,
  ) -> Result<Value, EngineError> {
    if self.depth >= self.max_depth {
      return Err(EngineError::RecursionLimit(self.max_depth));
    }
    self.depth += 1;
    let result = self.eval_inner(expr, scope);
    self.depth -= 1;
    result
  }

  fn eval_inner(
    &mut self,
    expr: &Expr,
    scope: &LocalScope,
  ) -> Result<Value, EngineError> {
    match expr {
      Expr::Value(value) => Ok(value.clone()),
      Expr::List(items) => {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
          values.push(self.eval(item, scope)?);
        }
        Ok(Value::List(values))
      }
      Expr::Native { name, args } => {
        let env = self.env;
        let function = env
          .function(name)
          .ok_or_else(|| EngineError::UnknownFunction(name.clone()))?;
        function.invoke(args, scope, self)
      }
      Expr::Name { name, args } => {
        let target = self.resolve(name, args, scope)?;
        // Calling a named function or variable rebinds the parameter
        // scope to this reference's own arguments; named bindings carry
        // over from the enclosing scope.
        let inner = LocalScope::nested(args.clone(), scope);
        self.eval(&target, &inner)
      }
      Expr::Op {
        left,
        symbol,
        right,
      } => {
        self.apply_operator(left.as_deref(), symbol, right.as_deref(), scope)
      }
    }
  }

  /// Resolve a named reference to the expression it denotes. The first
  /// applicable rule wins; resolution is repeated on every evaluation so
  /// that registry and global changes between evaluations are observed.
  fn resolve(
    &mut self,
    name: &str,
    args: &[Expr],
    scope: &LocalScope,
  ) -> Result<Expr, EngineError> {
    // 1. Native-call marker. Falls through when no such function exists.
    if let Some(stripped) = name.strip_prefix('!') {
      if self.env.has_function(stripped) {
        return Ok(Expr::Native {
          name: stripped.to_string(),
          args: args.to_vec(),
        });
      }
    }

    // 2. Scope variable. Never falls through.
    if name.starts_with('_') || name.starts_with('^') {
      return match scope.var(name) {
        Some(bound) => Ok(bound.clone()),
        None => Err(EngineError::UnknownVariable(name.to_string())),
      };
    }

    // 3. Positional parameter.
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
      if let Ok(position) = name.parse::<usize>() {
        if position == 0 {
          // A zero numeral resolves to its own text, letting expressions
          // introspect their positional index as a string.
          return Ok(Expr::Value(Value::Text(name.to_string())));
        }
        if let Some(param) = scope.param(position - 1) {
          return Ok(param.clone());
        }
        if let Some(fallback) = args.first() {
          return Ok(fallback.clone());
        }
        return Err(EngineError::MissingParameter(position));
      }
    }

    // 4. Variadic marker: every bound parameter, in order.
    if name == "..." {
      return Ok(Expr::List(scope.copy_params()));
    }

    // 5. Stored global.
    match self.ctx.lookup_global(name) {
      Some(stored) => Ok(stored),
      None => Err(EngineError::UnknownVariable(name.to_string())),
    }
  }

  /// Dispatch an operator application. Fixity follows from which operands
  /// are present; the operand that keys the dispatch table is evaluated,
  /// and the selected implementation receives the raw operand
  /// expressions, so operators may be non-strict in the other operand.
  fn apply_operator(
    &mut self,
    left: Option<&Expr>,
    symbol: &str,
    right: Option<&Expr>,
    scope: &LocalScope,
  ) -> Result<Value, EngineError> {
    let env = self.env;
    match (left, right) {
      (Some(left), Some(right)) => {
        let operator = env.binary(symbol).ok_or_else(|| {
          EngineError::UnknownOperator {
            symbol: symbol.to_string(),
            fixity: Fixity::Binary,
          }
        })?;
        let kind = self.eval(left, scope)?.kind();
        let handler = operator
          .handler(kind)
          .ok_or_else(|| unsupported(symbol, kind))?;
        handler(left, right, scope, self)
      }
      (None, Some(operand)) => {
        let operator = env.prefix(symbol).ok_or_else(|| {
          EngineError::UnknownOperator {
            symbol: symbol.to_string(),
            fixity: Fixity::Prefix,
          }
        })?;
        let kind = self.eval(operand, scope)?.kind();
        let handler = operator
          .handler(kind)
          .ok_or_else(|| unsupported(symbol, kind))?;
        handler(operand, scope, self)
      }
      (Some(operand), None) => {
        let operator = env.postfix(symbol).ok_or_else(|| {
          EngineError::UnknownOperator {
            symbol: symbol.to_string(),
            fixity: Fixity::Postfix,
          }
        })?;
        let kind = self.eval(operand, scope)?.kind();
        let handler = operator
          .handler(kind)
          .ok_or_else(|| unsupported(symbol, kind))?;
        handler(operand, scope, self)
      }
      (None, None) => Err(EngineError::MalformedOperation(symbol.to_string())),
    }
  }
}

fn unsupported(symbol: &str, kind: ValueKind) -> EngineError {
  EngineError::UnsupportedOperand {
    symbol: symbol.to_string(),
    kind,
  }
}
