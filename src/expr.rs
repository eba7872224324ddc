use std::hash::{Hash, Hasher};

use crate::context::ContextProvider;
use crate::env::Environment;
use crate::evaluator::Evaluator;
use crate::scope::LocalScope;
use crate::value::Value;
use crate::EngineError;

/// An unevaluated node of the expression tree.
///
/// Trees are immutable once built; evaluation never rewrites them, it only
/// produces a [`Value`].
#[derive(Debug, Clone)]
pub enum Expr {
  /// A resolved leaf. Evaluates to itself.
  Value(Value),
  /// A call to a registered native function. The name is looked up again
  /// on every evaluation, so registry changes between evaluations are
  /// observed.
  Native { name: String, args: Vec<Expr> },
  /// A list literal whose elements are evaluated on demand.
  List(Vec<Expr>),
  /// A named reference: a native call marker, a scope variable, a
  /// positional parameter, the variadic marker, or a stored global,
  /// depending on the lexical form of the name.
  Name { name: String, args: Vec<Expr> },
  /// Application of a registered operator. Both sides present = binary,
  /// left absent = prefix, right absent = postfix.
  Op {
    left: Option<Box<Expr>>,
    symbol: String,
    right: Option<Box<Expr>>,
  },
}

impl Expr {
  /// A native call node. Refuses to form the node when no function of
  /// that name is registered.
  pub fn native(
    env: &Environment,
    name: impl Into<String>,
    args: Vec<Expr>,
  ) -> Result<Expr, EngineError> {
    let name = name.into().to_lowercase();
    if !env.has_function(&name) {
      return Err(EngineError::UnknownFunction(name));
    }
    Ok(Expr::Native { name, args })
  }

  /// A named reference. Names are case-insensitive and stored lowercased.
  pub fn reference(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Name {
      name: name.into().to_lowercase(),
      args,
    }
  }

  pub fn binary(left: Expr, symbol: impl Into<String>, right: Expr) -> Expr {
    Expr::Op {
      left: Some(Box::new(left)),
      symbol: symbol.into(),
      right: Some(Box::new(right)),
    }
  }

  pub fn prefix(symbol: impl Into<String>, right: Expr) -> Expr {
    Expr::Op {
      left: None,
      symbol: symbol.into(),
      right: Some(Box::new(right)),
    }
  }

  pub fn postfix(left: Expr, symbol: impl Into<String>) -> Expr {
    Expr::Op {
      left: Some(Box::new(left)),
      symbol: symbol.into(),
      right: None,
    }
  }

  /// Evaluate this expression to a resolved value with default limits.
  pub fn evaluate(
    &self,
    env: &Environment,
    scope: &LocalScope,
    ctx: &dyn ContextProvider,
  ) -> Result<Value, EngineError> {
    Evaluator::new(env, ctx).eval(self, scope)
  }

  /// Canonical, round-trippable serialization. Two expressions are equal
  /// iff their canonical serializations are character-identical.
  pub fn to_code(&self) -> String {
    match self {
      Expr::Value(v) => v.to_code(),
      Expr::Native { name, args } => {
        let mut out = format!("{{!{name}");
        for arg in args {
          out.push(',');
          out.push_str(&arg.to_code());
        }
        out.push('}');
        out
      }
      Expr::Name { name, args } => {
        let mut out = format!("{{{name}");
        for arg in args {
          out.push(',');
          out.push_str(&arg.to_code());
        }
        out.push('}');
        out
      }
      Expr::List(items) => {
        let parts: Vec<String> = items.iter().map(Expr::to_code).collect();
        format!("[{}]", parts.join(","))
      }
      Expr::Op {
        left,
        symbol,
        right,
      } => {
        let left = left.as_ref().map(|e| e.to_code()).unwrap_or_default();
        let right = right.as_ref().map(|e| e.to_code()).unwrap_or_default();
        format!("({left}{symbol}{right})")
      }
    }
  }

  /// Human-readable rendering, bounded by `depth`: nested structure below
  /// the bound collapses to an ellipsis.
  pub fn to_display_string(&self, depth: usize) -> String {
    match self {
      Expr::Value(v) => v.to_display_string(depth),
      Expr::Native { name, args } => {
        display_call(&format!("!{name}"), args, depth)
      }
      Expr::Name { name, args } => display_call(name, args, depth),
      Expr::List(items) => {
        if depth == 0 {
          return "[ ... ]".to_string();
        }
        let parts: Vec<String> = items
          .iter()
          .map(|item| item.to_display_string(depth - 1))
          .collect();
        format!("[{}]", parts.join(", "))
      }
      Expr::Op {
        left,
        symbol,
        right,
      } => {
        if depth == 0 {
          return "(...)".to_string();
        }
        let left = left
          .as_ref()
          .map(|e| e.to_display_string(depth - 1))
          .unwrap_or_default();
        let right = right
          .as_ref()
          .map(|e| e.to_display_string(depth - 1))
          .unwrap_or_default();
        format!("({left}{symbol}{right})")
      }
    }
  }

  /// Indented structural dump for diagnostics.
  pub fn to_debug_tree(&self, level: usize) -> String {
    let indent = "  ".repeat(level);
    match self {
      Expr::Value(v) => v.to_debug_tree(level),
      Expr::Native { name, args } => {
        debug_call(&format!("{indent}NativeCall: {name}"), args, level)
      }
      Expr::Name { name, args } => {
        debug_call(&format!("{indent}Reference: {name}"), args, level)
      }
      Expr::List(items) => {
        if items.is_empty() {
          return format!("{indent}ListExpression: (empty)");
        }
        let mut out = format!("{indent}ListExpression:");
        for item in items {
          out.push('\n');
          out.push_str(&item.to_debug_tree(level + 1));
        }
        out
      }
      Expr::Op {
        left,
        symbol,
        right,
      } => {
        let mut out = format!("{indent}Operation: {symbol}");
        if let Some(left) = left {
          out.push('\n');
          out.push_str(&left.to_debug_tree(level + 1));
        }
        if let Some(right) = right {
          out.push('\n');
          out.push_str(&right.to_debug_tree(level + 1));
        }
        out
      }
    }
  }
}

fn display_call(name: &str, args: &[Expr], depth: usize) -> String {
  let mut out = format!("{{{name}");
  if !args.is_empty() {
    if depth == 0 {
      out.push_str(", ...");
    } else {
      for arg in args {
        out.push_str(", ");
        out.push_str(&arg.to_display_string(depth - 1));
      }
    }
  }
  out.push('}');
  out
}

fn debug_call(header: &str, args: &[Expr], level: usize) -> String {
  if args.is_empty() {
    return format!("{header} (no args)");
  }
  let mut out = header.to_string();
  for arg in args {
    out.push('\n');
    out.push_str(&arg.to_debug_tree(level + 1));
  }
  out
}

impl PartialEq for Expr {
  fn eq(&self, other: &Self) -> bool {
    self.to_code() == other.to_code()
  }
}

impl Eq for Expr {}

impl Hash for Expr {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.to_code().hash(state);
  }
}

impl From<Value> for Expr {
  fn from(value: Value) -> Self {
    Expr::Value(value)
  }
}

impl std::fmt::Display for Expr {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_display_string(usize::MAX))
  }
}
