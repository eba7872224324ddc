use std::collections::HashMap;

use crate::expr::Expr;

/// The parameter bindings of one evaluation frame.
///
/// Holds the ordered argument expressions passed to the current call plus
/// any named variable bindings (`_name` / `^name`). A scope is created
/// fresh per call and is only read during evaluation; `set_var` exists for
/// hosts to bind variables before handing the scope to the engine.
#[derive(Debug, Clone, Default)]
pub struct LocalScope {
  params: Vec<Expr>,
  vars: HashMap<String, Expr>,
}

impl LocalScope {
  pub fn new() -> Self {
    LocalScope::default()
  }

  pub fn from_params(params: Vec<Expr>) -> Self {
    LocalScope {
      params,
      vars: HashMap::new(),
    }
  }

  /// The scope for a named call: its own parameters, with the enclosing
  /// scope's named bindings carried over for fallback resolution.
  pub fn nested(params: Vec<Expr>, enclosing: &LocalScope) -> Self {
    LocalScope {
      params,
      vars: enclosing.vars.clone(),
    }
  }

  pub fn param_count(&self) -> usize {
    self.params.len()
  }

  pub fn param(&self, index: usize) -> Option<&Expr> {
    self.params.get(index)
  }

  /// A copy of every bound parameter, in order. Backs the variadic
  /// forwarding marker.
  pub fn copy_params(&self) -> Vec<Expr> {
    self.params.clone()
  }

  pub fn var(&self, name: &str) -> Option<&Expr> {
    self.vars.get(name)
  }

  pub fn set_var(&mut self, name: impl Into<String>, expr: Expr) {
    self.vars.insert(name.into(), expr);
  }
}
