use super::*;

use pretty_assertions::assert_eq;
use reckon::EngineError;

mod arity {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn abs_requires_an_argument() {
    let env = standard();
    let err = interpret(&env, "{!abs}").unwrap_err();
    assert!(matches!(
      &err,
      EngineError::Arity { function, .. } if function == "abs"
    ));
    assert_eq!(err.to_string(), "{!abs} requires a number.");
  }

  #[test]
  fn two_argument_functions_check_both() {
    let env = standard();
    assert!(matches!(
      interpret(&env, "{!atan2,1}"),
      Err(EngineError::Arity { function, .. }) if function == "atan2"
    ));
    assert!(matches!(
      interpret(&env, "{!copysign,1}"),
      Err(EngineError::Arity { function, .. }) if function == "copysign"
    ));
  }
}

mod absolutes_and_signs {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn abs() {
    let env = standard();
    assert_eq!(interpret(&env, "{!abs,-3}").unwrap(), num("3"));
    assert_eq!(interpret(&env, "{!abs,3}").unwrap(), num("3"));
  }

  #[test]
  fn sign() {
    let env = standard();
    assert_eq!(interpret(&env, "{!sign,-9}").unwrap(), num("-1"));
    assert_eq!(interpret(&env, "{!sign,0}").unwrap(), num("0"));
    assert_eq!(interpret(&env, "{!sign,0.5}").unwrap(), num("1"));
  }

  #[test]
  fn copysign() {
    let env = standard();
    assert_eq!(interpret(&env, "{!copysign,3,-1}").unwrap(), num("-3"));
    assert_eq!(interpret(&env, "{!copysign,-3,1}").unwrap(), num("3"));
  }
}

mod rounding {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn floor_rounds_towards_negative_infinity() {
    let env = standard();
    assert_eq!(interpret(&env, "{!floor,2.7}").unwrap(), num("2"));
    assert_eq!(interpret(&env, "{!floor,-2.5}").unwrap(), num("-3"));
  }

  #[test]
  fn ceiling_rounds_towards_positive_infinity() {
    let env = standard();
    assert_eq!(interpret(&env, "{!ceiling,2.1}").unwrap(), num("3"));
    assert_eq!(interpret(&env, "{!ceiling,-2.9}").unwrap(), num("-2"));
  }
}

mod extrema {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn max_and_min_fold_every_argument() {
    let env = standard();
    assert_eq!(interpret(&env, "{!max,3,9,2}").unwrap(), num("9"));
    assert_eq!(interpret(&env, "{!min,3,9,2}").unwrap(), num("2"));
    assert_eq!(interpret(&env, "{!max,-3}").unwrap(), num("-3"));
  }

  #[test]
  fn non_numeric_arguments_fail() {
    let env = standard();
    assert!(matches!(
      interpret(&env, "{!max,3,\"a\"}"),
      Err(EngineError::Type(_))
    ));
  }

  #[test]
  fn magnitude_variants_are_the_identity_on_a_single_input() {
    let env = standard();
    assert_eq!(interpret(&env, "{!maxmagnitude,-7}").unwrap(), num("-7"));
    assert_eq!(interpret(&env, "{!minmagnitude,9}").unwrap(), num("9"));
  }

  #[test]
  fn magnitude_variants_compare_against_the_signed_running_value() {
    let env = standard();
    // The candidate's magnitude is compared with the signed running
    // value, so sign and order both matter.
    assert_eq!(interpret(&env, "{!maxmagnitude,-5,3}").unwrap(), num("3"));
    assert_eq!(interpret(&env, "{!maxmagnitude,3,-5}").unwrap(), num("-5"));
    assert_eq!(interpret(&env, "{!minmagnitude,3,-1}").unwrap(), num("-1"));
    assert_eq!(interpret(&env, "{!minmagnitude,-3,1}").unwrap(), num("-3"));
  }
}

mod transcendentals {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn constants() {
    let env = standard();
    let pi = interpret(&env, "{!pi}").unwrap();
    assert_eq!(pi.to_display_string(1), "3.142");
    let e = interpret(&env, "{!e}").unwrap();
    assert_eq!(e.to_display_string(1), "2.718");
  }

  #[test]
  fn trig_at_zero() {
    let env = standard();
    assert_eq!(interpret(&env, "{!sin,0}").unwrap(), num("0"));
    assert_eq!(interpret(&env, "{!cos,0}").unwrap(), num("1"));
    assert_eq!(interpret(&env, "{!tan,0}").unwrap(), num("0"));
    assert_eq!(interpret(&env, "{!atan2,0,1}").unwrap(), num("0"));
  }

  #[test]
  fn hyperbolics_at_zero() {
    let env = standard();
    assert_eq!(interpret(&env, "{!sinh,0}").unwrap(), num("0"));
    assert_eq!(interpret(&env, "{!cosh,0}").unwrap(), num("1"));
    assert_eq!(interpret(&env, "{!tanh,0}").unwrap(), num("0"));
  }

  #[test]
  fn log_is_the_natural_logarithm() {
    let env = standard();
    assert_eq!(interpret(&env, "{!log,1}").unwrap(), num("0"));
    assert_eq!(interpret(&env, "{!log,{!e}}").unwrap(), num("1"));
  }

  #[test]
  fn out_of_domain_inputs_surface_as_math_errors() {
    let env = standard();
    assert!(matches!(
      interpret(&env, "{!acos,2}"),
      Err(EngineError::Math(_))
    ));
    assert!(matches!(
      interpret(&env, "{!atanh,1}"),
      Err(EngineError::Math(_))
    ));
  }

  #[test]
  fn results_round_back_to_the_fixed_precision() {
    let env = standard();
    // asin(sin(x)) comes back through f64 twice and still lands on the
    // 15-digit representation.
    assert_eq!(interpret(&env, "{!asin,{!sin,0}}").unwrap(), num("0"));
  }
}

mod calls_through_the_scope {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn arguments_are_expressions_not_values() {
    let env = standard();
    // The argument is itself a call; the native implementation evaluates
    // it on demand.
    assert_eq!(interpret(&env, "{!abs,{!min,-4,2}}").unwrap(), num("4"));
    assert_eq!(interpret(&env, "{!max,1+1,3*3}").unwrap(), num("9"));
  }

  #[test]
  fn function_registration_replaces_idempotently() {
    let mut env = standard();
    reckon::modules::math::install(&mut env);
    assert_eq!(interpret(&env, "{!abs,-3}").unwrap(), num("3"));
  }
}
