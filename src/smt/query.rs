//! Lowering of path conditions to solver queries
//!
//! Integers lower to two's-complement bit-vectors sized by their declared
//! kind; booleans stay booleans. The left operand of every comparison picks
//! the lowering: boolean `==`/`!=` become `iff`/`xor`, integer comparisons
//! become signed bit-vector predicates.

use indexmap::IndexMap;

use crate::smt::printer::{sort_to_smtlib, to_smtlib};
use crate::smt::terms::{BvOp, BvPred, SmtSort, SmtTerm};
use crate::symbolic::{ArithOp, CmpOp, ConstraintExpr, PathCondition};
use crate::types::Type;
use crate::{Error, Result};

/// A lowered path condition, ready for a solver
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    declarations: IndexMap<String, SmtSort>,
    formula: SmtTerm,
}

impl Query {
    /// Constants in first-use order
    pub fn declarations(&self) -> impl Iterator<Item = (&str, &SmtSort)> {
        self.declarations.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Sort of a declared constant
    pub fn sort_of(&self, name: &str) -> Option<SmtSort> {
        self.declarations.get(name).copied()
    }

    /// Number of declared constants
    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    /// The conjunctive formula
    pub fn formula(&self) -> &SmtTerm {
        &self.formula
    }

    /// Standalone SMT-LIB2 script checking this query
    pub fn to_smtlib(&self) -> String {
        let mut script = String::from("(set-logic QF_BV)\n");
        for (name, sort) in &self.declarations {
            script.push_str(&format!("(declare-const {} {})\n", name, sort_to_smtlib(sort)));
        }
        script.push_str(&format!("(assert {})\n", to_smtlib(&self.formula)));
        script.push_str("(check-sat)\n");
        script
    }
}

/// Builds one [`Query`], tracking the constants it references
#[derive(Debug, Default)]
pub struct QueryBuilder {
    declarations: IndexMap<String, SmtSort>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lower a whole path condition into a conjunction rooted at `true`
    pub fn build(path: &PathCondition) -> Result<Query> {
        let mut builder = Self::new();
        let mut conjuncts = vec![SmtTerm::bool(true)];
        for guard in path.guards() {
            conjuncts.push(builder.lower_bool(guard)?);
        }
        let formula = if conjuncts.len() == 1 {
            SmtTerm::bool(true)
        } else {
            SmtTerm::And(conjuncts)
        };
        Ok(builder.finish(formula))
    }

    /// Wrap a formula lowered by this builder
    pub fn finish(self, formula: SmtTerm) -> Query {
        Query {
            declarations: self.declarations,
            formula,
        }
    }

    /// Lower an expression of any lowerable type
    pub fn lower(&mut self, expr: &ConstraintExpr) -> Result<SmtTerm> {
        match expr {
            ConstraintExpr::Bool(b) => Ok(SmtTerm::bool(*b)),
            ConstraintExpr::Int { value, kind } => Ok(SmtTerm::bv(*value, kind.width())),
            ConstraintExpr::Var { name, ty } => {
                let sort = match ty {
                    Some(ty) => sort_for(ty)?,
                    None => {
                        return Err(Error::ill_typed(format!(
                            "variable {} has no declared type",
                            name
                        )))
                    }
                };
                self.declare(name, sort)?;
                Ok(SmtTerm::constant(name.clone()))
            }
            ConstraintExpr::Not(inner) => Ok(self.lower_bool(inner)?.not()),
            ConstraintExpr::And(a, b) => Ok(self.lower_bool(a)?.and(self.lower_bool(b)?)),
            ConstraintExpr::Or(a, b) => Ok(self.lower_bool(a)?.or(self.lower_bool(b)?)),
            ConstraintExpr::Implies(a, b) => Ok(self.lower_bool(a)?.implies(self.lower_bool(b)?)),
            ConstraintExpr::Iff(a, b) => Ok(self.lower_bool(a)?.iff(self.lower_bool(b)?)),
            ConstraintExpr::Compare { op, lhs, rhs } => self.lower_compare(*op, lhs, rhs),
            ConstraintExpr::Arith { op, lhs, rhs } => {
                let width = self.same_width(lhs, rhs)?;
                let bv_op = match op {
                    ArithOp::Add => BvOp::Add,
                    ArithOp::Sub => BvOp::Sub,
                    ArithOp::Mul => BvOp::Mul,
                    ArithOp::Div => BvOp::Sdiv,
                    ArithOp::Rem => BvOp::Srem,
                    ArithOp::BitAnd => BvOp::And,
                    ArithOp::BitOr => BvOp::Or,
                    ArithOp::BitXor => BvOp::Xor,
                    ArithOp::Shl => BvOp::Shl,
                    ArithOp::Shr => BvOp::Lshr,
                    ArithOp::Pow => {
                        return Err(Error::unsupported(format!(
                            "exponentiation on {}-bit integers has no bit-vector lowering",
                            width
                        )))
                    }
                };
                Ok(SmtTerm::bvop(bv_op, self.lower(lhs)?, self.lower(rhs)?))
            }
            ConstraintExpr::Neg(inner) => {
                int_width(inner)?;
                Ok(self.lower(inner)?.neg())
            }
        }
    }

    fn lower_bool(&mut self, expr: &ConstraintExpr) -> Result<SmtTerm> {
        match expr.ty() {
            Some(Type::Bool) => self.lower(expr),
            Some(other) => Err(Error::ill_typed(format!(
                "expected a boolean, found {} in {}",
                other, expr
            ))),
            None => Err(Error::ill_typed(format!("undetermined type of {}", expr))),
        }
    }

    fn lower_compare(
        &mut self,
        op: CmpOp,
        lhs: &ConstraintExpr,
        rhs: &ConstraintExpr,
    ) -> Result<SmtTerm> {
        match lhs.ty() {
            Some(Type::Bool) => {
                let (l, r) = (self.lower(lhs)?, self.lower_bool(rhs)?);
                match op {
                    CmpOp::Eq => Ok(l.iff(r)),
                    CmpOp::Ne => Ok(l.xor(r)),
                    _ => Err(Error::ill_typed(format!(
                        "ordering comparison on booleans: {} {} {}",
                        lhs,
                        op.symbol(),
                        rhs
                    ))),
                }
            }
            Some(Type::Int(_)) => {
                self.same_width(lhs, rhs)?;
                let (l, r) = (self.lower(lhs)?, self.lower(rhs)?);
                Ok(match op {
                    CmpOp::Eq => l.eq(r),
                    CmpOp::Ne => l.eq(r).not(),
                    CmpOp::Lt => SmtTerm::cmp(BvPred::Slt, l, r),
                    CmpOp::Le => SmtTerm::cmp(BvPred::Sle, l, r),
                    CmpOp::Gt => SmtTerm::cmp(BvPred::Sgt, l, r),
                    CmpOp::Ge => SmtTerm::cmp(BvPred::Sge, l, r),
                })
            }
            Some(other) => Err(Error::ill_typed(format!(
                "comparison on non-lowerable type {}",
                other
            ))),
            None => Err(Error::ill_typed(format!(
                "undetermined type of comparison operand {}",
                lhs
            ))),
        }
    }

    fn same_width(&self, lhs: &ConstraintExpr, rhs: &ConstraintExpr) -> Result<u32> {
        let (l, r) = (int_width(lhs)?, int_width(rhs)?);
        if l != r {
            return Err(Error::ill_typed(format!(
                "bit-width mismatch: {} is {}-bit, {} is {}-bit",
                lhs, l, rhs, r
            )));
        }
        Ok(l)
    }

    fn declare(&mut self, name: &str, sort: SmtSort) -> Result<()> {
        match self.declarations.get(name) {
            Some(existing) if *existing != sort => Err(Error::ill_typed(format!(
                "constant {} used as both {} and {}",
                name, existing, sort
            ))),
            Some(_) => Ok(()),
            None => {
                self.declarations.insert(name.to_string(), sort);
                Ok(())
            }
        }
    }
}

fn sort_for(ty: &Type) -> Result<SmtSort> {
    match ty {
        Type::Bool => Ok(SmtSort::Bool),
        Type::Int(kind) => Ok(SmtSort::BitVec(kind.width())),
        other => Err(Error::ill_typed(format!(
            "type {} cannot be lowered to a solver sort",
            other
        ))),
    }
}

fn int_width(expr: &ConstraintExpr) -> Result<u32> {
    match expr.ty() {
        Some(Type::Int(kind)) => Ok(kind.width()),
        Some(other) => Err(Error::ill_typed(format!(
            "expected an integer, found {} in {}",
            other, expr
        ))),
        None => Err(Error::ill_typed(format!("undetermined type of {}", expr))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntKind;

    fn x() -> ConstraintExpr {
        ConstraintExpr::var("x!0", Type::i32())
    }

    #[test]
    fn test_empty_path_is_true() {
        let query = QueryBuilder::build(&PathCondition::new()).unwrap();
        assert_eq!(query.formula(), &SmtTerm::bool(true));
        assert_eq!(query.declaration_count(), 0);
    }

    #[test]
    fn test_declarations_in_first_use_order() {
        let y = ConstraintExpr::var("y!1", Type::i32());
        let path = PathCondition::from_guards(vec![
            ConstraintExpr::compare(CmpOp::Lt, y.clone(), x()),
            ConstraintExpr::compare(CmpOp::Eq, x(), ConstraintExpr::int(3, IntKind::I32)),
        ]);
        let query = QueryBuilder::build(&path).unwrap();
        let names: Vec<&str> = query.declarations().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["y!1", "x!0"]);
        assert_eq!(query.sort_of("x!0"), Some(SmtSort::BitVec(32)));
    }

    #[test]
    fn test_conflicting_sorts_rejected() {
        let path = PathCondition::from_guards(vec![
            ConstraintExpr::var("p", Type::Bool),
            ConstraintExpr::compare(
                CmpOp::Eq,
                ConstraintExpr::var("p", Type::i32()),
                ConstraintExpr::int(0, IntKind::I32),
            ),
        ]);
        assert!(matches!(QueryBuilder::build(&path), Err(Error::IllTyped { .. })));
    }

    #[test]
    fn test_script_has_declarations_and_assertion() {
        let path = PathCondition::from_guards(vec![ConstraintExpr::compare(
            CmpOp::Gt,
            x(),
            ConstraintExpr::int(-1, IntKind::I32),
        )]);
        let script = QueryBuilder::build(&path).unwrap().to_smtlib();
        assert!(script.contains("(declare-const x!0 (_ BitVec 32))"));
        assert!(script.contains("(assert (and true (bvsgt x!0 (_ bv4294967295 32))))"));
        assert!(script.ends_with("(check-sat)\n"));
    }
}
