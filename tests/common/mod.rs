//! Shared test doubles: an evaluator that yields fixed branches and a solver
//! that answers from a script.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use lawcheck::ast::{Expression, Law, Property, QuantifiedVar, SourceLocation};
use lawcheck::smt::{to_smtlib, Model, SatResult, SmtSolver, SmtSort, SmtTerm};
use lawcheck::symbolic::{Branch, Branches, SymbolicEnvironment, SymbolicEvaluator};
use lawcheck::types::{ProgramTable, Type};

/// Yields the same branches for every environment it is asked about
pub struct ScriptedEvaluator {
    branches: Vec<Branch>,
    pub seen: RefCell<Vec<SymbolicEnvironment>>,
}

impl ScriptedEvaluator {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self {
            branches,
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl SymbolicEvaluator for ScriptedEvaluator {
    fn evaluate<'a>(
        &'a self,
        _expr: &'a Expression,
        env: &'a SymbolicEnvironment,
        _program: &'a ProgramTable,
    ) -> Branches<'a> {
        self.seen.borrow_mut().push(env.clone());
        Box::new(self.branches.clone().into_iter().map(Ok))
    }
}

/// Answers `check-sat` from a queue; `Unsat` once the queue runs dry
#[derive(Default)]
pub struct ScriptedSolver {
    answers: VecDeque<(SatResult, Option<Model>)>,
    pub depth: i32,
    pub pushes: usize,
    pub pops: usize,
    pub checks: usize,
    pub declared: Vec<(String, SmtSort)>,
    pub asserted: Vec<String>,
    pub timeout_ms: Option<u64>,
}

impl ScriptedSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(answers: Vec<(SatResult, Option<Model>)>) -> Self {
        Self {
            answers: answers.into(),
            ..Self::default()
        }
    }

    pub fn balanced(&self) -> bool {
        self.depth == 0 && self.pushes == self.pops
    }
}

impl SmtSolver for ScriptedSolver {
    type Error = io::Error;

    fn declare_const(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error> {
        self.declared.push((name.to_string(), *sort));
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error> {
        self.asserted.push(to_smtlib(term));
        Ok(())
    }

    fn push(&mut self) -> Result<(), Self::Error> {
        self.depth += 1;
        self.pushes += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Self::Error> {
        self.depth -= 1;
        self.pops += 1;
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Self::Error> {
        Ok(self.check_sat_with_model(&[])?.0)
    }

    fn check_sat_with_model(
        &mut self,
        _consts: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error> {
        self.checks += 1;
        Ok(self.answers.pop_front().unwrap_or((SatResult::Unsat, None)))
    }

    fn set_timeout(&mut self, timeout_ms: Option<u64>) -> Result<(), Self::Error> {
        self.timeout_ms = timeout_ms;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.depth = 0;
        Ok(())
    }
}

pub fn loc(line: usize) -> SourceLocation {
    SourceLocation::new("laws.lc", line, 1)
}

pub fn i32_vars(names: &[&str]) -> Vec<QuantifiedVar> {
    names
        .iter()
        .enumerate()
        .map(|(i, n)| QuantifiedVar::new(*n, i, Type::i32()))
        .collect()
}

/// `forall vars. body` for `law` at line 1
pub fn property(law: Law, vars: Vec<QuantifiedVar>, body: Expression) -> Property {
    Property::new(law, Expression::forall(vars, body), loc(1))
}
