//! # SMT Query Builder Tests
//!
//! Type-directed lowering of path conditions to bit-vector formulas.

use lawcheck::smt::{to_smtlib, BvOp, BvPred, QueryBuilder, SmtSort, SmtTerm};
use lawcheck::symbolic::{ArithOp, CmpOp, ConstraintExpr, PathCondition};
use lawcheck::types::{IntKind, Type};
use lawcheck::Error;

fn var(name: &str, ty: Type) -> ConstraintExpr {
    ConstraintExpr::var(name, ty)
}

fn lower_one(guard: ConstraintExpr) -> lawcheck::Result<SmtTerm> {
    QueryBuilder::new().lower(&guard)
}

#[test]
fn test_boolean_equality_lowers_to_iff() {
    let term = lower_one(ConstraintExpr::compare(
        CmpOp::Eq,
        var("p", Type::Bool),
        var("q", Type::Bool),
    ))
    .unwrap();
    assert_eq!(term, SmtTerm::constant("p").iff(SmtTerm::constant("q")));
}

#[test]
fn test_boolean_inequality_lowers_to_xor() {
    let term = lower_one(ConstraintExpr::compare(
        CmpOp::Ne,
        var("p", Type::Bool),
        ConstraintExpr::Bool(true),
    ))
    .unwrap();
    assert_eq!(to_smtlib(&term), "(xor p true)");
}

#[test]
fn test_integer_comparisons_use_signed_predicates_of_kind_width() {
    let term = lower_one(ConstraintExpr::compare(
        CmpOp::Ge,
        var("a", Type::Int(IntKind::I8)),
        ConstraintExpr::int(-128, IntKind::I8),
    ))
    .unwrap();
    assert_eq!(
        term,
        SmtTerm::cmp(BvPred::Sge, SmtTerm::constant("a"), SmtTerm::bv(-128, 8))
    );
    assert_eq!(to_smtlib(&term), "(bvsge a (_ bv128 8))");
}

#[test]
fn test_integer_inequality_is_negated_equality() {
    let term = lower_one(ConstraintExpr::compare(
        CmpOp::Ne,
        var("a", Type::i64()),
        var("b", Type::i64()),
    ))
    .unwrap();
    assert_eq!(to_smtlib(&term), "(not (= a b))");
}

#[test]
fn test_arithmetic_maps_to_bitvector_primitives() {
    let expr = ConstraintExpr::arith(
        ArithOp::Rem,
        ConstraintExpr::arith(
            ArithOp::Shr,
            var("x", Type::i32()),
            ConstraintExpr::int(1, IntKind::I32),
        ),
        var("y", Type::i32()),
    );
    let term = lower_one(expr).unwrap();
    assert_eq!(
        term,
        SmtTerm::bvop(
            BvOp::Srem,
            SmtTerm::bvop(BvOp::Lshr, SmtTerm::constant("x"), SmtTerm::bv(1, 32)),
            SmtTerm::constant("y"),
        )
    );
}

#[test]
fn test_negation_lowers_to_bvneg() {
    let term = lower_one(ConstraintExpr::compare(
        CmpOp::Eq,
        var("x", Type::i32()).neg(),
        ConstraintExpr::int(0, IntKind::I32),
    ))
    .unwrap();
    assert_eq!(to_smtlib(&term), "(= (bvneg x) (_ bv0 32))");
}

#[test]
fn test_exponentiation_is_unsupported() {
    let err = lower_one(ConstraintExpr::compare(
        CmpOp::Eq,
        ConstraintExpr::arith(
            ArithOp::Pow,
            var("x", Type::i32()),
            ConstraintExpr::int(2, IntKind::I32),
        ),
        ConstraintExpr::int(4, IntKind::I32),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn test_width_mismatch_fails_fast() {
    let err = lower_one(ConstraintExpr::compare(
        CmpOp::Lt,
        var("a", Type::Int(IntKind::I16)),
        var("b", Type::i32()),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::IllTyped { .. }));
}

#[test]
fn test_undetermined_type_fails_fast() {
    let untyped = ConstraintExpr::Var {
        name: "z".into(),
        ty: None,
    };
    let err = lower_one(ConstraintExpr::compare(
        CmpOp::Eq,
        untyped,
        ConstraintExpr::int(0, IntKind::I32),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::IllTyped { .. }));
}

#[test]
fn test_non_lowerable_type_fails_fast() {
    let err = lower_one(ConstraintExpr::compare(
        CmpOp::Eq,
        var("s", Type::String),
        var("t", Type::String),
    ))
    .unwrap_err();
    assert!(matches!(err, Error::IllTyped { .. }));
}

#[test]
fn test_path_condition_folds_into_one_conjunction() {
    let path = PathCondition::from_guards(vec![
        var("p", Type::Bool),
        ConstraintExpr::compare(
            CmpOp::Gt,
            var("n", Type::i32()),
            ConstraintExpr::int(0, IntKind::I32),
        ),
    ]);
    let query = QueryBuilder::build(&path).unwrap();
    assert_eq!(
        to_smtlib(query.formula()),
        "(and true p (bvsgt n (_ bv0 32)))"
    );
    let decls: Vec<(&str, SmtSort)> = query.declarations().map(|(n, s)| (n, *s)).collect();
    assert_eq!(decls, vec![("p", SmtSort::Bool), ("n", SmtSort::BitVec(32))]);
}
