use super::*;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use pretty_assertions::assert_eq;
use reckon::{parse, EngineError, Expr};

fn value(literal: &str) -> Expr {
  Expr::Value(num(literal))
}

fn hash_of(expr: &Expr) -> u64 {
  let mut hasher = DefaultHasher::new();
  expr.hash(&mut hasher);
  hasher.finish()
}

mod canonical_form {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn operations_parenthesize() {
    let expr = Expr::binary(value("2"), "^", value("10"));
    assert_eq!(expr.to_code(), "(2^10)");
    assert_eq!(Expr::prefix("-", value("3")).to_code(), "(-3)");
    assert_eq!(Expr::postfix(value("5"), "!").to_code(), "(5!)");
  }

  #[test]
  fn references_brace_their_name_and_arguments() {
    let expr = Expr::reference("max", vec![value("1"), value("2")]);
    assert_eq!(expr.to_code(), "{max,1,2}");
    assert_eq!(Expr::reference("...", vec![]).to_code(), "{...}");
  }

  #[test]
  fn native_calls_carry_the_marker() {
    let env = standard();
    let call = Expr::native(&env, "abs", vec![value("-3")]).unwrap();
    assert_eq!(call.to_code(), "{!abs,(-3)}");
  }

  #[test]
  fn native_calls_cannot_name_unregistered_functions() {
    let env = standard();
    assert!(matches!(
      Expr::native(&env, "nope", vec![]),
      Err(EngineError::UnknownFunction(name)) if name == "nope"
    ));
  }

  #[test]
  fn reference_names_fold_case() {
    assert_eq!(Expr::reference("MAX", vec![]).to_code(), "{max}");
  }
}

mod structural_equality {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn equality_follows_the_canonical_serialization() {
    let a = Expr::binary(value("1"), "+", value("2"));
    let b = Expr::binary(value("1"), "+", value("2"));
    let c = Expr::binary(value("2"), "+", value("1"));
    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn a_reference_with_marker_equals_the_bound_native_call() {
    let env = standard();
    let by_name = Expr::reference("!abs", vec![value("3")]);
    let bound = Expr::native(&env, "abs", vec![value("3")]).unwrap();
    assert_eq!(by_name, bound);
  }

  #[test]
  fn hashing_is_consistent_with_equality() {
    let a = Expr::reference("f", vec![value("1")]);
    let b = Expr::reference("f", vec![value("1")]);
    assert_eq!(hash_of(&a), hash_of(&b));
  }
}

mod round_trip {
  use super::*;
  use pretty_assertions::assert_eq;

  fn assert_round_trips(expr: &Expr) {
    let env = standard();
    let reparsed = parse(&env, &expr.to_code()).unwrap();
    assert_eq!(&reparsed, expr, "code was {}", expr.to_code());
  }

  #[test]
  fn values_round_trip() {
    assert_round_trips(&value("42"));
    assert_round_trips(&value("-3.25"));
    assert_round_trips(&Expr::Value(Value::text("say \"hi\" \\ more")));
    assert_round_trips(&Expr::Value(Value::list(vec![
      num("1"),
      Value::text("two"),
      Value::list(vec![num("3")]),
    ])));
  }

  #[test]
  fn operations_round_trip() {
    assert_round_trips(&Expr::binary(
      Expr::binary(value("1"), "+", value("2")),
      "*",
      value("3"),
    ));
    assert_round_trips(&Expr::postfix(
      Expr::prefix("-", value("4")),
      "!",
    ));
  }

  #[test]
  fn references_round_trip() {
    let env = standard();
    assert_round_trips(&Expr::reference(
      "fn",
      vec![value("1"), Expr::List(vec![value("2"), value("3")])],
    ));
    assert_round_trips(
      &Expr::native(&env, "max", vec![value("1"), value("2")]).unwrap(),
    );
    assert_round_trips(&Expr::reference("...", vec![]));
  }
}

mod rendering {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn display_collapses_at_depth_zero() {
    let expr = Expr::binary(value("1"), "+", value("2"));
    assert_eq!(expr.to_display_string(0), "(...)");
    let call = Expr::reference("f", vec![value("1")]);
    assert_eq!(call.to_display_string(0), "{f, ...}");
    assert_eq!(Expr::reference("f", vec![]).to_display_string(0), "{f}");
  }

  #[test]
  fn display_spells_out_shallow_trees() {
    let expr = Expr::binary(value("1"), "+", value("2"));
    assert_eq!(expr.to_display_string(2), "(1+2)");
    let call = Expr::reference("f", vec![value("1"), value("2")]);
    assert_eq!(call.to_display_string(2), "{f, 1, 2}");
  }

  #[test]
  fn debug_tree_shows_the_node_structure() {
    let expr = Expr::binary(
      value("2"),
      "^",
      Expr::reference("f", vec![value("1")]),
    );
    assert_eq!(
      expr.to_debug_tree(0),
      "Operation: ^\n  Number: 2\n  Reference: f\n    Number: 1"
    );
  }

  #[test]
  fn debug_tree_marks_empty_argument_lists() {
    assert_eq!(
      Expr::reference("f", vec![]).to_debug_tree(0),
      "Reference: f (no args)"
    );
    assert_eq!(Expr::List(vec![]).to_debug_tree(0), "ListExpression: (empty)");
  }
}
