//! # Property Verification
//!
//! Proves algebraic and order-theoretic laws for all inputs, or finds a
//! counterexample.
//!
//! ## How a property is checked
//!
//! 1. The outermost universal binder is enumerated: finite types are split
//!    into every case, primitive types become one solver placeholder.
//! 2. For each resulting environment the evaluator explores every branch of
//!    the quantifier-free body.
//! 3. Each branch is classified. Branches that are true need nothing;
//!    unconditional false branches are counterexamples as they stand; false
//!    branches under a path condition are handed to the solver, which either
//!    shows the path is dead or produces a model for the counterexample.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lawcheck::verify::Verifier;
//!
//! let mut verifier = Verifier::new(&evaluator, &mut solver, &program);
//! match verifier.verify(&property)? {
//!     PropertyResult::Success { .. } => println!("holds"),
//!     PropertyResult::Failure { error, .. } => eprintln!("{}", error),
//!     PropertyResult::Unknown { reason, .. } => eprintln!("unknown: {}", reason),
//! }
//! ```

mod enumerate;
mod pass;
mod render;
mod report;

pub use enumerate::Enumerator;
pub use pass::{VerificationPass, Verified};
pub use render::{concretize, render_value, Counterexample};
pub use report::{law_error, PropertyReport, VerificationSummary, VerifierError};

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::ast::{strip_quantifiers, Property};
use crate::smt::{QueryBuilder, SatResult, SmtSolver, SolverScope};
use crate::symbolic::{Branch, FreshNames, SymbolicEvaluator};
use crate::types::ProgramTable;
use crate::{Error, Result};

/// Counters collected while checking one property
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathStats {
    /// Branches pulled from the evaluator
    pub paths_explored: usize,
    /// Branches submitted to the solver
    pub queries_issued: usize,
    /// Wall-clock time spent on the property
    pub elapsed: Duration,
}

/// Terminal outcome of one property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PropertyResult {
    /// The law holds on every branch
    Success { stats: PathStats },
    /// Some branch refutes the law
    Failure {
        stats: PathStats,
        counterexample: Counterexample,
        error: VerifierError,
    },
    /// No refutation, but some branch could not be decided
    Unknown { stats: PathStats, reason: String },
}

impl PropertyResult {
    pub fn stats(&self) -> &PathStats {
        match self {
            PropertyResult::Success { stats }
            | PropertyResult::Failure { stats, .. }
            | PropertyResult::Unknown { stats, .. } => stats,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PropertyResult::Success { .. })
    }
}

/// What to do with one evaluated branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Holds; nothing to check
    Accepted,
    /// Fails unconditionally; the environment is a counterexample
    Refuted,
    /// Fails under a path condition the solver must decide
    NeedsSolver,
}

/// Classify a branch by its condition and result
///
/// Failure sentinels count as false. Any other non-boolean result means the
/// law expression was not boolean.
pub fn classify(branch: &Branch) -> Result<Classification> {
    let holds = match branch.value.as_bool() {
        Some(b) => b,
        None if branch.value.is_failure() => false,
        None => {
            return Err(Error::NonBooleanResult {
                value: render_value(&branch.value, None),
            })
        }
    };
    Ok(match (holds, branch.condition.is_empty()) {
        (true, _) => Classification::Accepted,
        (false, true) => Classification::Refuted,
        (false, false) => Classification::NeedsSolver,
    })
}

/// Checks properties against a program with a given evaluator and solver
pub struct Verifier<'a, E: SymbolicEvaluator, S: SmtSolver> {
    evaluator: &'a E,
    solver: &'a mut S,
    program: &'a ProgramTable,
    fresh: FreshNames,
    property_timeout: Option<Duration>,
}

impl<'a, E: SymbolicEvaluator, S: SmtSolver> Verifier<'a, E, S> {
    pub fn new(evaluator: &'a E, solver: &'a mut S, program: &'a ProgramTable) -> Self {
        Self {
            evaluator,
            solver,
            program,
            fresh: FreshNames::new(),
            property_timeout: None,
        }
    }

    /// Wall-clock budget per property, checked before every solver query
    pub fn with_property_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.property_timeout = timeout;
        self
    }

    /// Check one property
    ///
    /// Every branch is drained even after a counterexample is found; the
    /// first counterexample in enumeration order is the one reported.
    pub fn verify(&mut self, property: &Property) -> Result<PropertyResult> {
        let start = Instant::now();
        let evaluator = self.evaluator;
        let program = self.program;
        let stripped = strip_quantifiers(&property.expr);

        let enumerator = Enumerator::new(program);
        let envs = enumerator.environments(&stripped.universals, &mut self.fresh)?;
        let envs =
            enumerator.bind_nested_universals(envs, &stripped.nested_universals, &mut self.fresh)?;
        let envs = enumerator.bind_existentials(envs, &stripped.existentials, &mut self.fresh)?;
        tracing::debug!(
            law = %property.law,
            location = %property.location,
            environments = envs.len(),
            "verifying property"
        );

        let mut stats = PathStats::default();
        let mut counterexample: Option<Counterexample> = None;
        let mut unknown: Option<String> = None;

        'envs: for env in &envs {
            for branch in evaluator.evaluate(stripped.body, env, program) {
                let branch = branch?;
                stats.paths_explored += 1;

                match classify(&branch)? {
                    Classification::Accepted => {}
                    Classification::Refuted => {
                        tracing::debug!(law = %property.law, "branch refuted without solver");
                        if counterexample.is_none() {
                            counterexample = Some(Counterexample::from_environment(env, None));
                        }
                    }
                    Classification::NeedsSolver => {
                        if let Some(budget) = self.property_timeout {
                            if start.elapsed() >= budget {
                                tracing::warn!(law = %property.law, "property timeout reached");
                                unknown.get_or_insert_with(|| {
                                    format!("property timeout after {}s", budget.as_secs())
                                });
                                break 'envs;
                            }
                        }

                        let query = QueryBuilder::build(&branch.condition)?;
                        stats.queries_issued += 1;
                        tracing::debug!(condition = %branch.condition, "querying solver");

                        let (result, model) = {
                            let mut scope = SolverScope::acquire(&mut *self.solver)
                                .map_err(|e| Error::solver(e.to_string()))?;
                            scope.check(&query).map_err(|e| Error::solver(e.to_string()))?
                        };

                        match result {
                            SatResult::Unsat => tracing::debug!("path condition unsatisfiable"),
                            SatResult::Sat => {
                                if counterexample.is_none() {
                                    counterexample =
                                        Some(Counterexample::from_environment(env, model.as_ref()));
                                }
                            }
                            SatResult::Unknown(reason) => {
                                tracing::warn!(
                                    law = %property.law,
                                    location = %property.location,
                                    reason = %reason,
                                    "solver returned unknown"
                                );
                                unknown.get_or_insert(reason);
                            }
                        }
                    }
                }
            }
        }

        stats.elapsed = start.elapsed();
        Ok(match (counterexample, unknown) {
            (Some(counterexample), _) => PropertyResult::Failure {
                error: law_error(property.law, property.location.clone(), counterexample.clone()),
                counterexample,
                stats,
            },
            (None, Some(reason)) => PropertyResult::Unknown { stats, reason },
            (None, None) => PropertyResult::Success { stats },
        })
    }

    /// Check every property in order
    pub fn verify_all(&mut self, properties: &[Property]) -> Result<VerificationSummary> {
        let mut summary = VerificationSummary::new();
        for property in properties {
            let result = self.verify(property)?;
            summary.push(property, result);
        }
        Ok(summary)
    }
}
