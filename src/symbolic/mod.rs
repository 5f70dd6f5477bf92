//! Symbolic values, path conditions and the evaluator interface
//!
//! The verifier drives any [`SymbolicEvaluator`]; [`ReferenceEvaluator`] is
//! the forking interpreter shipped with the crate.

mod constraint;
mod evaluator;
mod fresh;
mod reference;
mod value;

pub use constraint::{unsigned_bits, ArithOp, CmpOp, ConstraintExpr, PathCondition};
pub use evaluator::{Branch, Branches, SymbolicEvaluator};
pub use fresh::FreshNames;
pub use reference::{ReferenceEvaluator, DEFAULT_MAX_CALL_DEPTH};
pub use value::{Opaque, SymbolicEnvironment, SymbolicValue};
