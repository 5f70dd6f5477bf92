use std::collections::HashMap;
use std::fmt;

use crate::smt::query::Query;
use crate::smt::terms::{SmtSort, SmtTerm};

/// Result of a satisfiability check.
#[derive(Debug, Clone, PartialEq)]
pub enum SatResult {
    Sat,
    Unsat,
    Unknown(String),
}

/// Value assigned to one constant in a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelValue {
    Bool(bool),
    /// Signed interpretation of a bit-vector of `width` bits
    BitVec { value: i64, width: u32 },
}

impl fmt::Display for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelValue::Bool(b) => write!(f, "{}", b),
            ModelValue::BitVec { value, .. } => write!(f, "{}", value),
        }
    }
}

/// A model (constant assignments) extracted from a SAT result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub values: HashMap<String, ModelValue>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of inserting an assignment
    pub fn with(mut self, name: impl Into<String>, value: ModelValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        self.values.get(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ModelValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_bitvec(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ModelValue::BitVec { value, .. }) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Abstract SMT solver interface.
pub trait SmtSolver {
    type Error: std::error::Error;

    /// Declare a new constant.
    fn declare_const(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error>;

    /// Assert a constraint.
    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error>;

    /// Push a new scope.
    fn push(&mut self) -> Result<(), Self::Error>;

    /// Pop a scope.
    fn pop(&mut self) -> Result<(), Self::Error>;

    /// Check satisfiability.
    fn check_sat(&mut self) -> Result<SatResult, Self::Error>;

    /// Check satisfiability and read back `consts` if SAT.
    fn check_sat_with_model(
        &mut self,
        consts: &[(&str, &SmtSort)],
    ) -> Result<(SatResult, Option<Model>), Self::Error>;

    /// Per-check timeout; `None` disables it. Backends without timeout
    /// support ignore the request.
    fn set_timeout(&mut self, _timeout_ms: Option<u64>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Reset the solver state.
    fn reset(&mut self) -> Result<(), Self::Error>;
}

/// One solver scope, popped when dropped
///
/// Declarations and assertions made through the scope disappear with it,
/// so queries never leak into each other even when checking fails midway.
pub struct SolverScope<'s, S: SmtSolver> {
    solver: &'s mut S,
}

impl<'s, S: SmtSolver> SolverScope<'s, S> {
    /// Push a scope on `solver`
    pub fn acquire(solver: &'s mut S) -> Result<Self, S::Error> {
        solver.push()?;
        Ok(Self { solver })
    }

    /// Declare the query's constants, assert its formula, and check it
    pub fn check(&mut self, query: &Query) -> Result<(SatResult, Option<Model>), S::Error> {
        let consts: Vec<(&str, &SmtSort)> = query.declarations().collect();
        for (name, sort) in &consts {
            self.solver.declare_const(name, sort)?;
        }
        self.solver.assert(query.formula())?;
        self.solver.check_sat_with_model(&consts)
    }
}

impl<S: SmtSolver> Drop for SolverScope<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.solver.pop() {
            tracing::warn!(error = %e, "failed to pop solver scope");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::QueryBuilder;
    use crate::symbolic::{ConstraintExpr, PathCondition};
    use crate::types::Type;
    use std::io;

    #[derive(Default)]
    struct MockSolver {
        depth: i32,
        max_depth: i32,
        declared: Vec<String>,
        fail_assert: bool,
    }

    impl SmtSolver for MockSolver {
        type Error = io::Error;

        fn declare_const(&mut self, name: &str, _sort: &SmtSort) -> Result<(), Self::Error> {
            self.declared.push(name.to_string());
            Ok(())
        }

        fn assert(&mut self, _term: &SmtTerm) -> Result<(), Self::Error> {
            if self.fail_assert {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            Ok(())
        }

        fn push(&mut self) -> Result<(), Self::Error> {
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
            Ok(())
        }

        fn pop(&mut self) -> Result<(), Self::Error> {
            self.depth -= 1;
            Ok(())
        }

        fn check_sat(&mut self) -> Result<SatResult, Self::Error> {
            Ok(SatResult::Unsat)
        }

        fn check_sat_with_model(
            &mut self,
            _consts: &[(&str, &SmtSort)],
        ) -> Result<(SatResult, Option<Model>), Self::Error> {
            Ok((self.check_sat()?, None))
        }

        fn reset(&mut self) -> Result<(), Self::Error> {
            self.depth = 0;
            Ok(())
        }
    }

    fn query() -> Query {
        let path = PathCondition::from_guards(vec![ConstraintExpr::var("p", Type::Bool)]);
        QueryBuilder::build(&path).unwrap()
    }

    #[test]
    fn model_getters_return_typed_values_only() {
        let model = Model::new()
            .with("x", ModelValue::BitVec { value: -3, width: 8 })
            .with("flag", ModelValue::Bool(true));

        assert_eq!(model.get_bitvec("x"), Some(-3));
        assert_eq!(model.get_bool("flag"), Some(true));
        assert_eq!(model.get_bitvec("flag"), None);
        assert_eq!(model.get_bool("missing"), None);
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn scope_pops_after_check() {
        let mut solver = MockSolver::default();
        {
            let mut scope = SolverScope::acquire(&mut solver).unwrap();
            let (result, model) = scope.check(&query()).unwrap();
            assert_eq!(result, SatResult::Unsat);
            assert!(model.is_none());
        }
        assert_eq!(solver.depth, 0);
        assert_eq!(solver.max_depth, 1);
        assert_eq!(solver.declared, vec!["p"]);
    }

    #[test]
    fn scope_pops_on_error() {
        let mut solver = MockSolver {
            fail_assert: true,
            ..Default::default()
        };
        {
            let mut scope = SolverScope::acquire(&mut solver).unwrap();
            assert!(scope.check(&query()).is_err());
        }
        assert_eq!(solver.depth, 0);
    }
}
