use crate::smt::terms::{SmtSort, SmtTerm};
use crate::symbolic::unsigned_bits;

/// Print an [`SmtTerm`] in SMT-LIB2 syntax
pub fn to_smtlib(term: &SmtTerm) -> String {
    match term {
        SmtTerm::Const(name) => name.clone(),
        SmtTerm::BoolLit(b) => {
            if *b {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        SmtTerm::BvLit { value, width } => {
            format!("(_ bv{} {})", unsigned_bits(*value, *width), width)
        }
        SmtTerm::Not(inner) => format!("(not {})", to_smtlib(inner)),
        SmtTerm::And(terms) => nary("and", "true", terms),
        SmtTerm::Or(terms) => nary("or", "false", terms),
        SmtTerm::Implies(lhs, rhs) => format!("(=> {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::Iff(lhs, rhs) | SmtTerm::Eq(lhs, rhs) => {
            format!("(= {} {})", to_smtlib(lhs), to_smtlib(rhs))
        }
        SmtTerm::Xor(lhs, rhs) => format!("(xor {} {})", to_smtlib(lhs), to_smtlib(rhs)),
        SmtTerm::BvCmp { pred, lhs, rhs } => {
            format!("({} {} {})", pred.name(), to_smtlib(lhs), to_smtlib(rhs))
        }
        SmtTerm::Bv { op, lhs, rhs } => {
            format!("({} {} {})", op.name(), to_smtlib(lhs), to_smtlib(rhs))
        }
        SmtTerm::BvNeg(inner) => format!("(bvneg {})", to_smtlib(inner)),
    }
}

fn nary(op: &str, unit: &str, terms: &[SmtTerm]) -> String {
    match terms {
        [] => unit.to_string(),
        [single] => to_smtlib(single),
        _ => {
            let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
            format!("({} {})", op, inner.join(" "))
        }
    }
}

/// Print a sort in SMT-LIB2 syntax
pub fn sort_to_smtlib(sort: &SmtSort) -> String {
    sort.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::terms::{BvOp, BvPred};

    #[test]
    fn test_negative_literal_prints_unsigned_bits() {
        assert_eq!(to_smtlib(&SmtTerm::bv(-1, 8)), "(_ bv255 8)");
        assert_eq!(to_smtlib(&SmtTerm::bv(5, 32)), "(_ bv5 32)");
    }

    #[test]
    fn test_nary_degenerate_forms() {
        assert_eq!(to_smtlib(&SmtTerm::And(vec![])), "true");
        assert_eq!(to_smtlib(&SmtTerm::Or(vec![])), "false");
        assert_eq!(to_smtlib(&SmtTerm::And(vec![SmtTerm::constant("p")])), "p");
    }

    #[test]
    fn test_nested_bitvector_term() {
        let term = SmtTerm::cmp(
            BvPred::Slt,
            SmtTerm::bvop(BvOp::Sub, SmtTerm::constant("x!0"), SmtTerm::constant("y!1")),
            SmtTerm::bv(0, 32),
        );
        assert_eq!(to_smtlib(&term), "(bvslt (bvsub x!0 y!1) (_ bv0 32))");
    }

    #[test]
    fn test_sorts() {
        assert_eq!(sort_to_smtlib(&SmtSort::Bool), "Bool");
        assert_eq!(sort_to_smtlib(&SmtSort::BitVec(16)), "(_ BitVec 16)");
    }
}
