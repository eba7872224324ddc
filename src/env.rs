use std::collections::HashMap;

use crate::evaluator::Evaluator;
use crate::expr::Expr;
use crate::scope::LocalScope;
use crate::value::{Value, ValueKind};
use crate::EngineError;

/// Whether an operator is written before, between, or after its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
  Prefix,
  Binary,
  Postfix,
}

impl std::fmt::Display for Fixity {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Fixity::Prefix => "prefix",
      Fixity::Binary => "binary",
      Fixity::Postfix => "postfix",
    };
    write!(f, "{name}")
  }
}

type NativeImpl = Box<
  dyn Fn(
      &[Expr],
      &LocalScope,
      &mut Evaluator<'_>,
    ) -> Result<Value, EngineError>
    + Send
    + Sync,
>;

type BinaryImpl = Box<
  dyn Fn(
      &Expr,
      &Expr,
      &LocalScope,
      &mut Evaluator<'_>,
    ) -> Result<Value, EngineError>
    + Send
    + Sync,
>;

type UnaryImpl = Box<
  dyn Fn(&Expr, &LocalScope, &mut Evaluator<'_>) -> Result<Value, EngineError>
    + Send
    + Sync,
>;

/// A named native function. Implementations receive their argument
/// expressions unevaluated, so they decide whether and how to evaluate
/// each one, and validate their own arity.
pub struct NativeFunction {
  name: String,
  body: NativeImpl,
}

impl NativeFunction {
  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn invoke(
    &self,
    args: &[Expr],
    scope: &LocalScope,
    evaluator: &mut Evaluator<'_>,
  ) -> Result<Value, EngineError> {
    (self.body)(args, scope, evaluator)
  }
}

/// A binary operator: a parser priority, an associativity, and a dispatch
/// table keyed by the runtime type of the resolved left operand.
pub struct BinaryOperator {
  priority: i32,
  right_associative: bool,
  handlers: HashMap<ValueKind, BinaryImpl>,
}

impl BinaryOperator {
  pub fn priority(&self) -> i32 {
    self.priority
  }

  pub fn is_right_associative(&self) -> bool {
    self.right_associative
  }

  /// Add or replace the implementation for one operand type. Entries for
  /// other types are untouched.
  pub fn add_handler<F>(&mut self, kind: ValueKind, handler: F)
  where
    F: Fn(
        &Expr,
        &Expr,
        &LocalScope,
        &mut Evaluator<'_>,
      ) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    self.handlers.insert(kind, Box::new(handler));
  }

  pub fn handler(&self, kind: ValueKind) -> Option<&BinaryImpl> {
    self.handlers.get(&kind)
  }
}

/// A prefix or postfix operator: a parser priority and a dispatch table
/// keyed by the runtime type of its single resolved operand.
pub struct UnaryOperator {
  priority: i32,
  handlers: HashMap<ValueKind, UnaryImpl>,
}

impl UnaryOperator {
  pub fn priority(&self) -> i32 {
    self.priority
  }

  pub fn add_handler<F>(&mut self, kind: ValueKind, handler: F)
  where
    F: Fn(&Expr, &LocalScope, &mut Evaluator<'_>) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    self.handlers.insert(kind, Box::new(handler));
  }

  pub fn handler(&self, kind: ValueKind) -> Option<&UnaryImpl> {
    self.handlers.get(&kind)
  }
}

/// The operator and function registries for one engine instance.
///
/// An environment is populated by modules at startup and then passed
/// read-only into every evaluation. Registered implementations are
/// `Send + Sync`, so one environment may be shared across threads once
/// registration is done. Independent environments never interact.
#[derive(Default)]
pub struct Environment {
  functions: HashMap<String, NativeFunction>,
  binary: HashMap<String, BinaryOperator>,
  prefix: HashMap<String, UnaryOperator>,
  postfix: HashMap<String, UnaryOperator>,
}

impl Environment {
  /// An environment with nothing registered.
  pub fn new() -> Self {
    Environment::default()
  }

  /// An environment with the stock modules loaded: the core operators and
  /// the math-function catalog.
  pub fn standard() -> Self {
    let mut env = Environment::new();
    crate::modules::builtins::install(&mut env);
    crate::modules::math::install(&mut env);
    env
  }

  /// Register a native function, replacing any previous one of the same
  /// name. Module loading is therefore idempotent.
  pub fn register_function<F>(&mut self, name: impl Into<String>, body: F)
  where
    F: Fn(
        &[Expr],
        &LocalScope,
        &mut Evaluator<'_>,
      ) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    let name = name.into();
    self.functions.insert(
      name.clone(),
      NativeFunction {
        name,
        body: Box::new(body),
      },
    );
  }

  pub fn function(&self, name: &str) -> Option<&NativeFunction> {
    self.functions.get(name)
  }

  pub fn has_function(&self, name: &str) -> bool {
    self.functions.contains_key(name)
  }

  /// The binary operator for `symbol`, creating it with the given
  /// priority and associativity when absent. An existing entry is
  /// returned as-is, so re-loading a module never duplicates an operator
  /// or disturbs its dispatch table.
  pub fn binary_or_create(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
    right_associative: bool,
  ) -> &mut BinaryOperator {
    self.binary.entry(symbol.into()).or_insert_with(|| {
      BinaryOperator {
        priority,
        right_associative,
        handlers: HashMap::new(),
      }
    })
  }

  pub fn prefix_or_create(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
  ) -> &mut UnaryOperator {
    self.prefix.entry(symbol.into()).or_insert_with(|| UnaryOperator {
      priority,
      handlers: HashMap::new(),
    })
  }

  pub fn postfix_or_create(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
  ) -> &mut UnaryOperator {
    self.postfix.entry(symbol.into()).or_insert_with(|| UnaryOperator {
      priority,
      handlers: HashMap::new(),
    })
  }

  /// Register one binary dispatch entry, creating the operator if needed.
  pub fn register_binary<F>(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
    right_associative: bool,
    kind: ValueKind,
    handler: F,
  ) where
    F: Fn(
        &Expr,
        &Expr,
        &LocalScope,
        &mut Evaluator<'_>,
      ) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    self
      .binary_or_create(symbol, priority, right_associative)
      .add_handler(kind, handler);
  }

  /// Register one prefix dispatch entry, creating the operator if needed.
  pub fn register_prefix<F>(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
    kind: ValueKind,
    handler: F,
  ) where
    F: Fn(&Expr, &LocalScope, &mut Evaluator<'_>) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    self.prefix_or_create(symbol, priority).add_handler(kind, handler);
  }

  /// Register one postfix dispatch entry, creating the operator if needed.
  pub fn register_postfix<F>(
    &mut self,
    symbol: impl Into<String>,
    priority: i32,
    kind: ValueKind,
    handler: F,
  ) where
    F: Fn(&Expr, &LocalScope, &mut Evaluator<'_>) -> Result<Value, EngineError>
      + Send
      + Sync
      + 'static,
  {
    self.postfix_or_create(symbol, priority).add_handler(kind, handler);
  }

  pub fn binary(&self, symbol: &str) -> Option<&BinaryOperator> {
    self.binary.get(symbol)
  }

  pub fn prefix(&self, symbol: &str) -> Option<&UnaryOperator> {
    self.prefix.get(symbol)
  }

  pub fn postfix(&self, symbol: &str) -> Option<&UnaryOperator> {
    self.postfix.get(symbol)
  }

  pub fn has_operator(&self, symbol: &str, fixity: Fixity) -> bool {
    match fixity {
      Fixity::Prefix => self.prefix.contains_key(symbol),
      Fixity::Binary => self.binary.contains_key(symbol),
      Fixity::Postfix => self.postfix.contains_key(symbol),
    }
  }

  /// Every registered operator symbol, across all fixities. The parser
  /// uses this set to split runs of adjacent operator characters.
  pub fn operator_symbols(&self) -> impl Iterator<Item = &str> {
    self
      .binary
      .keys()
      .chain(self.prefix.keys())
      .chain(self.postfix.keys())
      .map(String::as_str)
  }
}
