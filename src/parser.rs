use std::str::FromStr;

use pest::error::ErrorVariant;
use pest::iterators::Pair;
use pest::Parser;
use rust_decimal::Decimal;

use crate::env::Environment;
use crate::expr::Expr;
use crate::value::{Number, Value};
use crate::{CalcParser, EngineError, Rule};

/// Parse source text into an expression tree.
///
/// The grammar only tokenizes; operator grouping is decided here by
/// priority climbing over the operator table registered in `env`, so
/// extension modules influence parsing as well as evaluation. Literal
/// numbers and strings become resolved value leaves.
pub fn parse(env: &Environment, input: &str) -> Result<Expr, EngineError> {
  let mut pairs =
    CalcParser::parse(Rule::program, input).map_err(Box::new)?;
  let Some(expression) = pairs.next() else {
    return Err(error_at(input, 0, "empty input"));
  };

  // Longest symbols first, so runs like `!+` split against the registered
  // set greedily.
  let mut symbols: Vec<String> =
    env.operator_symbols().map(str::to_string).collect();
  symbols.sort();
  symbols.dedup();
  symbols.sort_by(|a, b| b.len().cmp(&a.len()));

  let builder = Builder {
    env,
    input,
    symbols,
  };
  builder.build_expression(expression)
}

struct Builder<'a> {
  env: &'a Environment,
  input: &'a str,
  symbols: Vec<String>,
}

enum TokenKind {
  Operand(Expr),
  Symbol(String),
}

struct Token {
  kind: TokenKind,
  offset: usize,
}

impl Builder<'_> {
  fn build_expression(&self, pair: Pair<Rule>) -> Result<Expr, EngineError> {
    let end = pair.as_span().end();
    let tokens = self.collect_tokens(pair)?;
    let mut stream = TokenStream {
      builder: self,
      tokens,
      pos: 0,
      end,
    };
    let expr = stream.parse_expression(i64::MIN)?;
    if let Some(extra) = stream.tokens.get(stream.pos) {
      return Err(error_at(self.input, extra.offset, "unexpected token"));
    }
    Ok(expr)
  }

  fn collect_tokens(&self, pair: Pair<Rule>) -> Result<Vec<Token>, EngineError> {
    let mut tokens = Vec::new();
    for item in pair.into_inner() {
      let offset = item.as_span().start();
      match item.as_rule() {
        Rule::number => {
          let literal = Decimal::from_str(item.as_str()).map_err(|_| {
            error_at(self.input, offset, "number literal out of range")
          })?;
          tokens.push(Token {
            kind: TokenKind::Operand(Expr::Value(Value::Number(
              Number::new(literal),
            ))),
            offset,
          });
        }
        Rule::string => {
          let inner = item
            .into_inner()
            .next()
            .map(|p| p.as_str().to_string())
            .unwrap_or_default();
          tokens.push(Token {
            kind: TokenKind::Operand(Expr::Value(Value::Text(unescape(
              &inner,
            )))),
            offset,
          });
        }
        Rule::list => {
          let items = item
            .into_inner()
            .map(|element| self.build_expression(element))
            .collect::<Result<Vec<_>, _>>()?;
          tokens.push(Token {
            kind: TokenKind::Operand(Expr::List(items)),
            offset,
          });
        }
        Rule::reference => {
          let mut parts = item.into_inner();
          let Some(name) = parts.next() else {
            return Err(error_at(self.input, offset, "empty reference"));
          };
          let args = parts
            .map(|arg| self.build_expression(arg))
            .collect::<Result<Vec<_>, _>>()?;
          tokens.push(Token {
            kind: TokenKind::Operand(Expr::reference(name.as_str(), args)),
            offset,
          });
        }
        Rule::group => {
          let Some(inner) = item.into_inner().next() else {
            return Err(error_at(self.input, offset, "empty group"));
          };
          tokens.push(Token {
            kind: TokenKind::Operand(self.build_expression(inner)?),
            offset,
          });
        }
        Rule::operator => {
          self.split_symbols(item.as_str(), offset, &mut tokens)?;
        }
        rule => {
          return Err(error_at(
            self.input,
            offset,
            format!("unexpected {rule:?}"),
          ));
        }
      }
    }
    Ok(tokens)
  }

  /// Split a run of adjacent operator characters into registered symbols,
  /// longest match first.
  fn split_symbols(
    &self,
    run: &str,
    offset: usize,
    tokens: &mut Vec<Token>,
  ) -> Result<(), EngineError> {
    let mut rest = run;
    let mut at = offset;
    'outer: while !rest.is_empty() {
      for symbol in &self.symbols {
        if rest.starts_with(symbol.as_str()) {
          tokens.push(Token {
            kind: TokenKind::Symbol(symbol.clone()),
            offset: at,
          });
          at += symbol.len();
          rest = &rest[symbol.len()..];
          continue 'outer;
        }
      }
      return Err(error_at(
        self.input,
        at,
        format!("unknown operator `{rest}`"),
      ));
    }
    Ok(())
  }
}

struct TokenStream<'a, 'b> {
  builder: &'b Builder<'a>,
  tokens: Vec<Token>,
  pos: usize,
  end: usize,
}

impl TokenStream<'_, '_> {
  /// Priority climbing. Binding powers are doubled priorities so that
  /// associativity fits between two levels.
  fn parse_expression(&mut self, min_bp: i64) -> Result<Expr, EngineError> {
    let mut lhs = self.parse_operand()?;
    while self.pos < self.tokens.len() {
      let token = &self.tokens[self.pos];
      let offset = token.offset;
      let symbol = match &token.kind {
        TokenKind::Symbol(symbol) => symbol.clone(),
        TokenKind::Operand(_) => {
          return Err(error_at(
            self.builder.input,
            offset,
            "expected an operator",
          ));
        }
      };

      if self.is_postfix_here(&symbol) {
        // Known registered: is_postfix_here checked the table.
        let Some(operator) = self.builder.env.postfix(&symbol) else {
          break;
        };
        if operand_bp(operator.priority()) < min_bp {
          break;
        }
        self.pos += 1;
        lhs = Expr::postfix(lhs, symbol);
        continue;
      }

      let Some(operator) = self.builder.env.binary(&symbol) else {
        return Err(error_at(
          self.builder.input,
          offset,
          format!("`{symbol}` is not a binary operator"),
        ));
      };
      let (l_bp, r_bp) =
        binary_bp(operator.priority(), operator.is_right_associative());
      if l_bp < min_bp {
        break;
      }
      self.pos += 1;
      let rhs = self.parse_expression(r_bp)?;
      lhs = Expr::binary(lhs, symbol, rhs);
    }
    Ok(lhs)
  }

  fn parse_operand(&mut self) -> Result<Expr, EngineError> {
    let Some(token) = self.tokens.get(self.pos) else {
      return Err(error_at(
        self.builder.input,
        self.end,
        "expected an operand",
      ));
    };
    match &token.kind {
      TokenKind::Operand(expr) => {
        let expr = expr.clone();
        self.pos += 1;
        Ok(expr)
      }
      TokenKind::Symbol(symbol) => {
        let offset = token.offset;
        let symbol = symbol.clone();
        let Some(operator) = self.builder.env.prefix(&symbol) else {
          return Err(error_at(
            self.builder.input,
            offset,
            format!("`{symbol}` cannot start an operand"),
          ));
        };
        let r_bp = operand_bp(operator.priority());
        self.pos += 1;
        let operand = self.parse_expression(r_bp)?;
        Ok(Expr::prefix(symbol, operand))
      }
    }
  }

  /// A symbol registered as postfix applies as postfix unless it is also
  /// a binary operator with an operand following.
  fn is_postfix_here(&self, symbol: &str) -> bool {
    if self.builder.env.postfix(symbol).is_none() {
      return false;
    }
    if self.builder.env.binary(symbol).is_none() {
      return true;
    }
    !matches!(
      self.tokens.get(self.pos + 1).map(|t| &t.kind),
      Some(TokenKind::Operand(_))
    )
  }
}

fn binary_bp(priority: i32, right_associative: bool) -> (i64, i64) {
  let base = i64::from(priority) * 2;
  if right_associative {
    (base + 1, base)
  } else {
    (base, base + 1)
  }
}

fn operand_bp(priority: i32) -> i64 {
  i64::from(priority) * 2
}

fn unescape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut chars = text.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      if let Some(escaped) = chars.next() {
        out.push(escaped);
      }
    } else {
      out.push(c);
    }
  }
  out
}

fn error_at(
  input: &str,
  offset: usize,
  message: impl Into<String>,
) -> EngineError {
  let pos = pest::Position::new(input, offset)
    .unwrap_or_else(|| pest::Position::from_start(input));
  EngineError::Parse(Box::new(pest::error::Error::new_from_pos(
    ErrorVariant::CustomError {
      message: message.into(),
    },
    pos,
  )))
}
