//! Embeddable expression-evaluation engine.
//!
//! Expressions form a tree of typed nodes that evaluate to resolved
//! values (numbers, strings, lists). Name resolution and operator
//! application go through the operator/function registries owned by an
//! [`Environment`], so host applications and extension modules register
//! behavior by operand type without touching the engine.

use pest_derive::Parser;
use thiserror::Error;

pub mod context;
pub mod env;
pub mod evaluator;
pub mod expr;
pub mod modules;
pub mod parser;
pub mod scope;
pub mod value;

pub use context::{ContextProvider, EmptyContext, Globals};
pub use env::{
  BinaryOperator, Environment, Fixity, NativeFunction, UnaryOperator,
};
pub use evaluator::{Evaluator, DEFAULT_MAX_DEPTH};
pub use expr::Expr;
pub use parser::parse;
pub use scope::LocalScope;
pub use value::{Number, Value, ValueKind};

#[derive(Parser)]
#[grammar = "calc.pest"]
pub struct CalcParser;

#[derive(Error, Debug)]
pub enum EngineError {
  #[error("Parse error: {0}")]
  Parse(#[from] Box<pest::error::Error<Rule>>),
  #[error("No variable named {0} exists.")]
  UnknownVariable(String),
  #[error("No parameter #{0} exists.")]
  MissingParameter(usize),
  #[error("{{!{function}}} requires {requires}.")]
  Arity { function: String, requires: String },
  #[error("{0}")]
  Type(String),
  #[error("The operator {symbol} is not defined for {kind} operands.")]
  UnsupportedOperand { symbol: String, kind: ValueKind },
  #[error("No function named {0} exists.")]
  UnknownFunction(String),
  #[error("No {fixity} operator {symbol} is registered.")]
  UnknownOperator { symbol: String, fixity: Fixity },
  #[error("Division by zero.")]
  DivisionByZero,
  #[error("Math error: {0}.")]
  Math(String),
  #[error("Recursion limit of {0} exceeded.")]
  RecursionLimit(usize),
  #[error("An operation needs at least one operand ({0}).")]
  MalformedOperation(String),
}

/// Parse and evaluate `input` with an empty scope and no globals.
pub fn interpret(
  env: &Environment,
  input: &str,
) -> Result<Value, EngineError> {
  interpret_with_context(env, input, &EmptyContext)
}

/// Parse and evaluate `input` with an empty scope against the given
/// context provider.
pub fn interpret_with_context(
  env: &Environment,
  input: &str,
  ctx: &dyn ContextProvider,
) -> Result<Value, EngineError> {
  let expr = parser::parse(env, input)?;
  expr.evaluate(env, &LocalScope::new(), ctx)
}
