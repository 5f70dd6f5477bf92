//! SMT layer: terms, SMT-LIB2 printing, query lowering and solver backends

mod printer;
mod process;
mod query;
mod solver;
mod terms;

pub use printer::{sort_to_smtlib, to_smtlib};
pub use process::{ProcessError, ProcessSolver};
pub use query::{Query, QueryBuilder};
pub use solver::{Model, ModelValue, SatResult, SmtSolver, SolverScope};
pub use terms::{BvOp, BvPred, SmtSort, SmtTerm};
