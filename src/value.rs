use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::EngineError;

/// Number of fractional digits every `Number` is rounded to.
pub const PRECISION: u32 = 15;

/// Fractional digits used by the human-readable display format.
const DISPLAY_PRECISION: u32 = 3;

/// A fixed-precision decimal quantity.
///
/// Construction rounds to 15 fractional digits (banker's rounding), and all
/// arithmetic goes back through the constructor, so two numbers differing
/// only beyond the 15th fractional digit compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number(Decimal);

impl Number {
  pub fn new(value: Decimal) -> Self {
    Number(value.round_dp(PRECISION))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  /// Convert from a binary float, e.g. the result of a transcendental
  /// function. Returns `None` for non-finite inputs.
  pub fn from_f64(value: f64) -> Option<Self> {
    Decimal::from_f64_retain(value).map(Number::new)
  }

  /// Convert to a binary float for transcendental functions. This is a
  /// documented precision-loss point: callers round the result back
  /// through `from_f64`.
  pub fn to_f64(&self) -> Option<f64> {
    self.0.to_f64()
  }

  pub fn abs(&self) -> Self {
    Number::new(self.0.abs())
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  pub fn to_code(&self) -> String {
    let plain = format_decimal(self.0, PRECISION);
    if plain.starts_with('-') {
      format!("({plain})")
    } else {
      plain
    }
  }

  pub fn to_display_string(&self) -> String {
    format_decimal(self.0, DISPLAY_PRECISION)
  }
}

/// Format with at most `max_dp` fractional digits, trailing zeros stripped.
fn format_decimal(value: Decimal, max_dp: u32) -> String {
  let rounded = value.round_dp(max_dp).normalize();
  if rounded.is_zero() {
    "0".to_string()
  } else {
    rounded.to_string()
  }
}

impl From<Decimal> for Number {
  fn from(value: Decimal) -> Self {
    Number::new(value)
  }
}

impl From<i64> for Number {
  fn from(value: i64) -> Self {
    Number::new(Decimal::from(value))
  }
}

impl From<i32> for Number {
  fn from(value: i32) -> Self {
    Number::new(Decimal::from(value))
  }
}

impl std::ops::Add for Number {
  type Output = Self;

  fn add(self, rhs: Self) -> Self {
    Number::new(self.0 + rhs.0)
  }
}

impl std::ops::Sub for Number {
  type Output = Self;

  fn sub(self, rhs: Self) -> Self {
    Number::new(self.0 - rhs.0)
  }
}

impl std::ops::Mul for Number {
  type Output = Self;

  fn mul(self, rhs: Self) -> Self {
    Number::new(self.0 * rhs.0)
  }
}

impl std::ops::Neg for Number {
  type Output = Self;

  fn neg(self) -> Self {
    Number::new(-self.0)
  }
}

impl std::fmt::Display for Number {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_display_string())
  }
}

/// Runtime type tag of a resolved value, used as the key of operator and
/// function dispatch tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
  Number,
  Text,
  List,
}

impl std::fmt::Display for ValueKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      ValueKind::Number => "number",
      ValueKind::Text => "string",
      ValueKind::List => "list",
    };
    write!(f, "{name}")
  }
}

/// A fully resolved value: the result of evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Number(Number),
  Text(String),
  List(Vec<Value>),
}

impl Value {
  pub fn number(value: impl Into<Number>) -> Self {
    Value::Number(value.into())
  }

  pub fn text(value: impl Into<String>) -> Self {
    Value::Text(value.into())
  }

  pub fn list(items: Vec<Value>) -> Self {
    Value::List(items)
  }

  pub fn kind(&self) -> ValueKind {
    match self {
      Value::Number(_) => ValueKind::Number,
      Value::Text(_) => ValueKind::Text,
      Value::List(_) => ValueKind::List,
    }
  }

  /// Recursive total of all number leaves. Fails if any leaf is a string.
  pub fn sum(&self) -> Result<Number, EngineError> {
    match self {
      Value::Number(n) => Ok(*n),
      Value::Text(_) => {
        Err(EngineError::Type("Strings cannot be summed.".into()))
      }
      Value::List(items) => {
        let mut total = Number::from(0);
        for item in items {
          total = total + item.sum()?;
        }
        Ok(total)
      }
    }
  }

  /// Recursive predicate: does any leaf hold a string?
  pub fn has_string(&self) -> bool {
    match self {
      Value::Number(_) => false,
      Value::Text(_) => true,
      Value::List(items) => items.iter().any(Value::has_string),
    }
  }

  /// Round-trippable literal form.
  pub fn to_code(&self) -> String {
    match self {
      Value::Number(n) => n.to_code(),
      Value::Text(s) => {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
      }
      Value::List(items) => {
        let parts: Vec<String> = items.iter().map(Value::to_code).collect();
        format!("[{}]", parts.join(","))
      }
    }
  }

  /// Human-readable form. Numbers print at most 3 fractional digits, a
  /// list without string leaves is prefixed by its sum, and `depth == 0`
  /// collapses nested structure to an ellipsis.
  pub fn to_display_string(&self, depth: usize) -> String {
    match self {
      Value::Number(n) => n.to_display_string(),
      Value::Text(s) => s.clone(),
      Value::List(items) => {
        let mut out = match self.sum() {
          Ok(total) => format!("{} [", total.to_display_string()),
          Err(_) => "[".to_string(),
        };
        if depth == 0 {
          out.push_str(" ... ");
        } else {
          let parts: Vec<String> = items
            .iter()
            .map(|item| item.to_display_string(depth - 1))
            .collect();
          out.push_str(&parts.join(", "));
        }
        out.push(']');
        out
      }
    }
  }

  /// Indented structural dump for diagnostics.
  pub fn to_debug_tree(&self, level: usize) -> String {
    let indent = "  ".repeat(level);
    match self {
      Value::Number(n) => format!("{indent}Number: {}", n.to_code()),
      Value::Text(_) => format!("{indent}String: {}", self.to_code()),
      Value::List(items) => {
        if items.is_empty() {
          return format!("{indent}List: (empty)");
        }
        let mut out = format!("{indent}List:");
        for item in items {
          out.push('\n');
          out.push_str(&item.to_debug_tree(level + 1));
        }
        out
      }
    }
  }
}

impl Hash for Value {
  fn hash<H: Hasher>(&self, state: &mut H) {
    match self {
      Value::Number(n) => n.hash(state),
      Value::Text(s) => s.hash(state),
      // A list hashes to the XOR of its element hashes. This is
      // order-insensitive, which weakens the hash but is a documented
      // property of the list type.
      Value::List(items) => {
        let mut combined = 0u64;
        for item in items {
          let mut hasher = DefaultHasher::new();
          item.hash(&mut hasher);
          combined ^= hasher.finish();
        }
        state.write_u64(combined);
      }
    }
  }
}

impl std::fmt::Display for Value {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_display_string(usize::MAX))
  }
}
