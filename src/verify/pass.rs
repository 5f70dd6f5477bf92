use std::time::Duration;

use crate::ast::Property;
use crate::config::VerificationOptions;
use crate::smt::{Model, ProcessSolver, SatResult, SmtSolver, SmtSort, SmtTerm};
use crate::symbolic::{ReferenceEvaluator, SymbolicEvaluator};
use crate::types::ProgramTable;
use crate::verify::{VerificationSummary, Verifier};
use crate::{Error, Result};

/// Program that passed verification, forwarded unchanged
#[derive(Debug, Clone)]
pub struct Verified {
    /// The program as it came in
    pub program: ProgramTable,
    /// Total time spent verifying
    pub verification_time: Duration,
    /// Per-property results; `None` when verification is disabled
    pub summary: Option<VerificationSummary>,
    /// Verbose report, when requested
    pub report: Option<String>,
}

impl Verified {
    fn unchecked(program: ProgramTable) -> Self {
        Self {
            program,
            verification_time: Duration::ZERO,
            summary: None,
            report: None,
        }
    }
}

/// Verification step of the compilation pipeline
///
/// Runs every property and rejects the unit if any failed or could not be
/// decided. Diagnostics are collected across all properties first.
#[derive(Debug, Clone, Default)]
pub struct VerificationPass {
    options: VerificationOptions,
}

impl VerificationPass {
    pub fn new(options: VerificationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &VerificationOptions {
        &self.options
    }

    /// Verify with the reference evaluator and the configured solver process
    pub fn run(&self, program: ProgramTable, properties: &[Property]) -> Result<Verified> {
        if !self.options.enabled || properties.is_empty() {
            return self.run_with(program, properties, &ReferenceEvaluator::new(), &mut NoSolver);
        }
        let evaluator = ReferenceEvaluator::with_max_call_depth(self.options.max_call_depth);
        let mut solver = ProcessSolver::spawn(&self.options.solver)?;
        self.run_with(program, properties, &evaluator, &mut solver)
    }

    /// Verify with a caller-supplied evaluator and solver
    pub fn run_with<E, S>(
        &self,
        program: ProgramTable,
        properties: &[Property],
        evaluator: &E,
        solver: &mut S,
    ) -> Result<Verified>
    where
        E: SymbolicEvaluator,
        S: SmtSolver,
    {
        if !self.options.enabled {
            tracing::debug!("verification disabled, forwarding program");
            return Ok(Verified::unchecked(program));
        }

        solver
            .set_timeout(self.options.solver.query_timeout_ms)
            .map_err(|e| Error::solver(e.to_string()))?;

        let summary = {
            let mut verifier = Verifier::new(evaluator, solver, &program)
                .with_property_timeout(self.options.property_timeout());
            verifier.verify_all(properties)?
        };

        let report = if self.options.verbose {
            for line in summary.report_lines() {
                tracing::info!("{}", line);
            }
            tracing::info!("{}", summary.summary_line());
            Some(summary.report())
        } else {
            None
        };

        let errors = summary.errors();
        if !errors.is_empty() {
            for error in &errors {
                tracing::warn!("{}", error);
            }
            return Err(Error::VerificationFailed { errors });
        }

        Ok(Verified {
            program,
            verification_time: summary.elapsed,
            summary: Some(summary),
            report,
        })
    }
}

/// Stand-in for runs that cannot issue a query
#[derive(Debug)]
struct NoSolver;

impl SmtSolver for NoSolver {
    type Error = Error;

    fn declare_const(&mut self, _name: &str, _sort: &SmtSort) -> Result<()> {
        Err(Error::SolverUnavailable("no solver configured".into()))
    }

    fn assert(&mut self, _term: &SmtTerm) -> Result<()> {
        Err(Error::SolverUnavailable("no solver configured".into()))
    }

    fn push(&mut self) -> Result<()> {
        Err(Error::SolverUnavailable("no solver configured".into()))
    }

    fn pop(&mut self) -> Result<()> {
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult> {
        Err(Error::SolverUnavailable("no solver configured".into()))
    }

    fn check_sat_with_model(
        &mut self,
        _consts: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>)> {
        Err(Error::SolverUnavailable("no solver configured".into()))
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }
}
