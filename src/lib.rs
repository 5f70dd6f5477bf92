//! # Lawcheck - Law Verification for Program Definitions
//!
//! Proves that program-defined operations satisfy algebraic and
//! order-theoretic laws (associativity, commutativity, partial-order axioms,
//! lattice bounds, monotonicity, strictness, height laws) **for all inputs**,
//! or reports a concrete counterexample.
//!
//! ## How it works
//!
//! - **Enumeration** - finite quantified types (booleans, sum types) are split
//!   into every case; integers, chars and strings become solver placeholders
//! - **Symbolic execution** - every branch of the law body is explored under
//!   each case combination
//! - **Solver discharge** - false branches guarded by a path condition are
//!   lowered to fixed-width bit-vector queries (SMT-LIB2, QF_BV) and decided
//!   by an external solver such as z3
//!
//! ## Quick Start
//!
//! Explore a law body with the reference evaluator:
//!
//! ```rust
//! use lawcheck::ast::{BinaryOp, Expression};
//! use lawcheck::symbolic::{
//!     ReferenceEvaluator, SymbolicEnvironment, SymbolicEvaluator, SymbolicValue,
//! };
//! use lawcheck::types::ProgramTable;
//!
//! # fn main() -> lawcheck::Result<()> {
//! // a && b == b && a, with a = true and b = false
//! let env = SymbolicEnvironment::new()
//!     .with("a", SymbolicValue::True)?
//!     .with("b", SymbolicValue::False)?;
//! let body = Expression::binary(
//!     BinaryOp::Eq,
//!     Expression::binary(BinaryOp::And, Expression::var("a"), Expression::var("b")),
//!     Expression::binary(BinaryOp::And, Expression::var("b"), Expression::var("a")),
//! );
//!
//! let program = ProgramTable::new();
//! let evaluator = ReferenceEvaluator::new();
//! let branches: Vec<_> = evaluator
//!     .evaluate(&body, &env, &program)
//!     .collect::<lawcheck::Result<_>>()?;
//!
//! assert_eq!(branches.len(), 1);
//! assert_eq!(branches[0].value, SymbolicValue::True);
//! # Ok(())
//! # }
//! ```
//!
//! ### Running the verification pass
//!
//! ```rust,no_run
//! use lawcheck::{VerificationOptions, VerificationPass};
//! # fn properties() -> Vec<lawcheck::ast::Property> { Vec::new() }
//! # fn program() -> lawcheck::types::ProgramTable { lawcheck::types::ProgramTable::new() }
//!
//! # fn main() -> lawcheck::Result<()> {
//! let options = VerificationOptions {
//!     verbose: true,
//!     ..Default::default()
//! };
//! let verified = VerificationPass::new(options).run(program(), &properties())?;
//! println!("{}", verified.report.unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Law violations are collected for every property before the run fails with
//! [`Error::VerificationFailed`]; each carries a [`verify::VerifierError`]
//! with the law, source location and rendered counterexample. Anything the
//! checker cannot handle (tuple-typed quantifiers, exponentiation in a path
//! condition, a missing solver) aborts the run with the matching [`Error`].

/// Version of the lawcheck crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod ast;
pub mod config;
pub mod error;
pub mod smt;
pub mod symbolic;
pub mod types;
pub mod verify;

// Re-export main types
pub use ast::{Law, Property, SourceLocation};
pub use config::{SolverOptions, VerificationOptions};
pub use error::{Error, ErrorSeverity, Result};
pub use verify::{
    PropertyResult, VerificationPass, VerificationSummary, Verified, Verifier, VerifierError,
};
