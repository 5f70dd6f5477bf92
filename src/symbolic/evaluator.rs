use crate::ast::Expression;
use crate::symbolic::{PathCondition, SymbolicEnvironment, SymbolicValue};
use crate::types::ProgramTable;
use crate::Result;

/// One execution branch discovered by an evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Guards under which this branch is taken; empty means always
    pub condition: PathCondition,
    /// Value of the expression on this branch
    pub value: SymbolicValue,
}

impl Branch {
    /// Creates a branch
    pub fn new(condition: PathCondition, value: SymbolicValue) -> Self {
        Self { condition, value }
    }

    /// Branch with an empty condition
    pub fn unconditional(value: SymbolicValue) -> Self {
        Self::new(PathCondition::new(), value)
    }
}

/// Lazily produced, finite sequence of branches
pub type Branches<'a> = Box<dyn Iterator<Item = Result<Branch>> + 'a>;

/// Branch-exhaustive symbolic evaluator
///
/// Implementations must explore every reachable branch of `expr` under
/// `env`, report boolean results as [`SymbolicValue::True`] or
/// [`SymbolicValue::False`], and attach to each branch the guards that must
/// hold for it to be taken. An empty condition means the result holds
/// unconditionally.
pub trait SymbolicEvaluator {
    /// Explore `expr` under `env`
    fn evaluate<'a>(
        &'a self,
        expr: &'a Expression,
        env: &'a SymbolicEnvironment,
        program: &'a ProgramTable,
    ) -> Branches<'a>;
}
