use std::fmt;

use crate::types::{sign_extend, IntKind, Type};
use crate::{Error, Result};

/// Comparison operators of the constraint language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<` (signed)
    Lt,
    /// `<=` (signed)
    Le,
    /// `>` (signed)
    Gt,
    /// `>=` (signed)
    Ge,
}

impl CmpOp {
    /// Evaluate on concrete signed operands
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        }
    }

    /// Infix spelling
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// Arithmetic and bitwise operators of the constraint language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    /// Wrapping addition
    Add,
    /// Wrapping subtraction
    Sub,
    /// Wrapping multiplication
    Mul,
    /// Signed division (SMT-LIB `bvsdiv`)
    Div,
    /// Signed remainder (SMT-LIB `bvsrem`)
    Rem,
    /// Exponentiation; has no bit-vector lowering
    Pow,
    /// Bitwise and
    BitAnd,
    /// Bitwise or
    BitOr,
    /// Bitwise xor
    BitXor,
    /// Shift left
    Shl,
    /// Logical shift right
    Shr,
}

impl ArithOp {
    /// Evaluate on concrete operands with two's-complement semantics of `kind`
    ///
    /// Division and remainder by zero follow SMT-LIB so that folded
    /// constants agree with what the solver would compute.
    pub fn apply(self, kind: IntKind, a: i64, b: i64) -> Result<i64> {
        let width = kind.width();
        let (wa, wb) = (a as i128, b as i128);
        let value = match self {
            ArithOp::Add => kind.wrap(wa + wb),
            ArithOp::Sub => kind.wrap(wa - wb),
            ArithOp::Mul => kind.wrap(wa * wb),
            ArithOp::Div => {
                if b == 0 {
                    if a >= 0 {
                        -1
                    } else {
                        1
                    }
                } else {
                    kind.wrap(wa / wb)
                }
            }
            ArithOp::Rem => {
                if b == 0 {
                    a
                } else {
                    kind.wrap(wa % wb)
                }
            }
            ArithOp::Pow => {
                if b < 0 {
                    return Err(Error::unsupported(format!(
                        "negative exponent {} in {} exponentiation",
                        b, kind
                    )));
                }
                let mut base = kind.wrap(wa);
                let mut exp = b as u64;
                let mut acc: i64 = 1;
                while exp > 0 {
                    if exp & 1 == 1 {
                        acc = kind.wrap(acc as i128 * base as i128);
                    }
                    base = kind.wrap(base as i128 * base as i128);
                    exp >>= 1;
                }
                acc
            }
            ArithOp::BitAnd => kind.wrap((a & b) as i128),
            ArithOp::BitOr => kind.wrap((a | b) as i128),
            ArithOp::BitXor => kind.wrap((a ^ b) as i128),
            ArithOp::Shl => {
                let amount = unsigned_bits(b, width);
                if amount >= width as u64 {
                    0
                } else {
                    kind.wrap(wa << amount)
                }
            }
            ArithOp::Shr => {
                let amount = unsigned_bits(b, width);
                if amount >= width as u64 {
                    0
                } else {
                    sign_extend(unsigned_bits(a, width) >> amount, width)
                }
            }
        };
        Ok(value)
    }

    fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
            ArithOp::Pow => "**",
            ArithOp::BitAnd => "&",
            ArithOp::BitOr => "|",
            ArithOp::BitXor => "^",
            ArithOp::Shl => "<<",
            ArithOp::Shr => ">>",
        }
    }
}

/// Low `width` bits of `value` as an unsigned number
pub fn unsigned_bits(value: i64, width: u32) -> u64 {
    if width >= 64 {
        value as u64
    } else {
        (value as u64) & ((1u64 << width) - 1)
    }
}

/// Constraint over placeholders, the solver's input language
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintExpr {
    /// Boolean constant
    Bool(bool),
    /// Integer constant of a declared kind
    Int {
        /// Value
        value: i64,
        /// Kind (fixes the bit width)
        kind: IntKind,
    },
    /// Placeholder reference; `ty` is `None` when upstream could not type it
    Var {
        /// Solver constant name
        name: String,
        /// Declared type
        ty: Option<Type>,
    },
    /// Negation
    Not(Box<ConstraintExpr>),
    /// Conjunction
    And(Box<ConstraintExpr>, Box<ConstraintExpr>),
    /// Disjunction
    Or(Box<ConstraintExpr>, Box<ConstraintExpr>),
    /// Implication
    Implies(Box<ConstraintExpr>, Box<ConstraintExpr>),
    /// Equivalence
    Iff(Box<ConstraintExpr>, Box<ConstraintExpr>),
    /// Comparison; the left operand's type picks the lowering
    Compare {
        /// Operator
        op: CmpOp,
        /// Left operand
        lhs: Box<ConstraintExpr>,
        /// Right operand
        rhs: Box<ConstraintExpr>,
    },
    /// Arithmetic or bitwise operation
    Arith {
        /// Operator
        op: ArithOp,
        /// Left operand
        lhs: Box<ConstraintExpr>,
        /// Right operand
        rhs: Box<ConstraintExpr>,
    },
    /// Arithmetic negation
    Neg(Box<ConstraintExpr>),
}

#[allow(clippy::should_implement_trait)]
impl ConstraintExpr {
    /// Typed placeholder reference
    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        ConstraintExpr::Var {
            name: name.into(),
            ty: Some(ty),
        }
    }

    /// Integer constant
    pub fn int(value: i64, kind: IntKind) -> Self {
        ConstraintExpr::Int { value, kind }
    }

    /// Negation
    pub fn not(self) -> Self {
        ConstraintExpr::Not(Box::new(self))
    }

    /// Conjunction
    pub fn and(self, other: ConstraintExpr) -> Self {
        ConstraintExpr::And(Box::new(self), Box::new(other))
    }

    /// Disjunction
    pub fn or(self, other: ConstraintExpr) -> Self {
        ConstraintExpr::Or(Box::new(self), Box::new(other))
    }

    /// Implication
    pub fn implies(self, other: ConstraintExpr) -> Self {
        ConstraintExpr::Implies(Box::new(self), Box::new(other))
    }

    /// Equivalence
    pub fn iff(self, other: ConstraintExpr) -> Self {
        ConstraintExpr::Iff(Box::new(self), Box::new(other))
    }

    /// Comparison
    pub fn compare(op: CmpOp, lhs: ConstraintExpr, rhs: ConstraintExpr) -> Self {
        ConstraintExpr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Arithmetic
    pub fn arith(op: ArithOp, lhs: ConstraintExpr, rhs: ConstraintExpr) -> Self {
        ConstraintExpr::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Arithmetic negation
    pub fn neg(self) -> Self {
        ConstraintExpr::Neg(Box::new(self))
    }

    /// Declared type of the node, `None` if undetermined
    pub fn ty(&self) -> Option<Type> {
        match self {
            ConstraintExpr::Bool(_)
            | ConstraintExpr::Not(_)
            | ConstraintExpr::And(..)
            | ConstraintExpr::Or(..)
            | ConstraintExpr::Implies(..)
            | ConstraintExpr::Iff(..)
            | ConstraintExpr::Compare { .. } => Some(Type::Bool),
            ConstraintExpr::Int { kind, .. } => Some(Type::Int(*kind)),
            ConstraintExpr::Var { ty, .. } => ty.clone(),
            ConstraintExpr::Arith { lhs, .. } => lhs.ty(),
            ConstraintExpr::Neg(inner) => inner.ty(),
        }
    }
}

impl fmt::Display for ConstraintExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintExpr::Bool(b) => write!(f, "{}", b),
            ConstraintExpr::Int { value, kind } => write!(f, "{}{}", value, kind),
            ConstraintExpr::Var { name, .. } => f.write_str(name),
            ConstraintExpr::Not(inner) => write!(f, "!({})", inner),
            ConstraintExpr::And(a, b) => write!(f, "({} && {})", a, b),
            ConstraintExpr::Or(a, b) => write!(f, "({} || {})", a, b),
            ConstraintExpr::Implies(a, b) => write!(f, "({} ==> {})", a, b),
            ConstraintExpr::Iff(a, b) => write!(f, "({} <=> {})", a, b),
            ConstraintExpr::Compare { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            ConstraintExpr::Arith { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            ConstraintExpr::Neg(inner) => write!(f, "-({})", inner),
        }
    }
}

/// Conjunction of branch guards accumulated along one execution path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathCondition {
    guards: Vec<ConstraintExpr>,
}

impl PathCondition {
    /// Empty condition (holds unconditionally)
    pub fn new() -> Self {
        Self::default()
    }

    /// Condition made of the given guards
    pub fn from_guards(guards: Vec<ConstraintExpr>) -> Self {
        Self { guards }
    }

    /// Append a guard
    pub fn push(&mut self, guard: ConstraintExpr) {
        self.guards.push(guard);
    }

    /// Copy of this condition with one more guard
    pub fn extended(&self, guard: ConstraintExpr) -> Self {
        let mut next = self.clone();
        next.push(guard);
        next
    }

    /// Guards in accumulation order
    pub fn guards(&self) -> &[ConstraintExpr] {
        &self.guards
    }

    /// True when no guard was accumulated
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Number of guards
    pub fn len(&self) -> usize {
        self.guards.len()
    }
}

impl fmt::Display for PathCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.guards.is_empty() {
            return f.write_str("true");
        }
        for (i, g) in self.guards.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            write!(f, "{}", g)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapping_arith() {
        let k = IntKind::I8;
        assert_eq!(ArithOp::Add.apply(k, 127, 1).unwrap(), -128);
        assert_eq!(ArithOp::Sub.apply(k, -128, 1).unwrap(), 127);
        assert_eq!(ArithOp::Mul.apply(k, 16, 16).unwrap(), 0);
        assert_eq!(ArithOp::Div.apply(k, -128, -1).unwrap(), -128);
    }

    #[test]
    fn test_division_by_zero_follows_smtlib() {
        let k = IntKind::I32;
        assert_eq!(ArithOp::Div.apply(k, 5, 0).unwrap(), -1);
        assert_eq!(ArithOp::Div.apply(k, -5, 0).unwrap(), 1);
        assert_eq!(ArithOp::Rem.apply(k, -5, 0).unwrap(), -5);
        assert_eq!(ArithOp::Rem.apply(k, -7, 2).unwrap(), -1);
    }

    #[test]
    fn test_shifts_are_logical() {
        let k = IntKind::I8;
        assert_eq!(ArithOp::Shr.apply(k, -128, 7).unwrap(), 1);
        assert_eq!(ArithOp::Shl.apply(k, 1, 7).unwrap(), -128);
        assert_eq!(ArithOp::Shl.apply(k, 1, 8).unwrap(), 0);
        assert_eq!(ArithOp::Shr.apply(k, -1, -1).unwrap(), 0);
    }

    #[test]
    fn test_pow() {
        assert_eq!(ArithOp::Pow.apply(IntKind::I32, 3, 4).unwrap(), 81);
        assert_eq!(ArithOp::Pow.apply(IntKind::I8, 2, 7).unwrap(), -128);
        assert!(ArithOp::Pow.apply(IntKind::I32, 2, -1).is_err());
    }

    #[test]
    fn test_types() {
        let x = ConstraintExpr::var("x!0", Type::i32());
        let sum =
            ConstraintExpr::arith(ArithOp::Add, x.clone(), ConstraintExpr::int(1, IntKind::I32));
        assert_eq!(sum.ty(), Some(Type::i32()));
        assert_eq!(
            ConstraintExpr::compare(CmpOp::Lt, x, sum).ty(),
            Some(Type::Bool)
        );
        let untyped = ConstraintExpr::Var {
            name: "u".into(),
            ty: None,
        };
        assert_eq!(untyped.neg().ty(), None);
    }

    #[test]
    fn test_path_condition_display() {
        let mut pc = PathCondition::new();
        assert_eq!(pc.to_string(), "true");
        pc.push(ConstraintExpr::var("b!0", Type::Bool));
        let pc2 = pc.extended(ConstraintExpr::var("b!1", Type::Bool).not());
        assert_eq!(pc.len(), 1);
        assert_eq!(pc2.to_string(), "b!0 && !(b!1)");
    }
}
