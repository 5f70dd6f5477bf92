use std::fmt;

/// SMT sorts used by lowered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmtSort {
    /// Boolean
    Bool,
    /// Fixed-width bit-vector
    BitVec(u32),
}

impl fmt::Display for SmtSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmtSort::Bool => write!(f, "Bool"),
            SmtSort::BitVec(width) => write!(f, "(_ BitVec {})", width),
        }
    }
}

/// Signed bit-vector predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvPred {
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl BvPred {
    /// SMT-LIB operator name
    pub fn name(self) -> &'static str {
        match self {
            BvPred::Slt => "bvslt",
            BvPred::Sle => "bvsle",
            BvPred::Sgt => "bvsgt",
            BvPred::Sge => "bvsge",
        }
    }
}

/// Binary bit-vector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    Srem,
    And,
    Or,
    Xor,
    Shl,
    Lshr,
}

impl BvOp {
    /// SMT-LIB operator name
    pub fn name(self) -> &'static str {
        match self {
            BvOp::Add => "bvadd",
            BvOp::Sub => "bvsub",
            BvOp::Mul => "bvmul",
            BvOp::Sdiv => "bvsdiv",
            BvOp::Srem => "bvsrem",
            BvOp::And => "bvand",
            BvOp::Or => "bvor",
            BvOp::Xor => "bvxor",
            BvOp::Shl => "bvshl",
            BvOp::Lshr => "bvlshr",
        }
    }
}

/// Solver-agnostic term over booleans and bit-vectors
#[derive(Debug, Clone, PartialEq)]
pub enum SmtTerm {
    /// Declared constant by name
    Const(String),
    /// Boolean literal
    BoolLit(bool),
    /// Bit-vector literal; `value` is the signed interpretation
    BvLit { value: i64, width: u32 },

    // Boolean logic
    Not(Box<SmtTerm>),
    And(Vec<SmtTerm>),
    Or(Vec<SmtTerm>),
    Implies(Box<SmtTerm>, Box<SmtTerm>),
    Iff(Box<SmtTerm>, Box<SmtTerm>),
    Xor(Box<SmtTerm>, Box<SmtTerm>),

    /// Equality of two bit-vectors of the same width
    Eq(Box<SmtTerm>, Box<SmtTerm>),
    /// Signed comparison
    BvCmp {
        pred: BvPred,
        lhs: Box<SmtTerm>,
        rhs: Box<SmtTerm>,
    },
    /// Arithmetic or bitwise operation
    Bv {
        op: BvOp,
        lhs: Box<SmtTerm>,
        rhs: Box<SmtTerm>,
    },
    /// Two's-complement negation
    BvNeg(Box<SmtTerm>),
}

#[allow(clippy::should_implement_trait)]
impl SmtTerm {
    pub fn constant(name: impl Into<String>) -> Self {
        SmtTerm::Const(name.into())
    }

    pub fn bool(b: bool) -> Self {
        SmtTerm::BoolLit(b)
    }

    pub fn bv(value: i64, width: u32) -> Self {
        SmtTerm::BvLit { value, width }
    }

    pub fn not(self) -> Self {
        SmtTerm::Not(Box::new(self))
    }

    pub fn and(self, other: SmtTerm) -> Self {
        SmtTerm::And(vec![self, other])
    }

    pub fn or(self, other: SmtTerm) -> Self {
        SmtTerm::Or(vec![self, other])
    }

    pub fn implies(self, other: SmtTerm) -> Self {
        SmtTerm::Implies(Box::new(self), Box::new(other))
    }

    pub fn iff(self, other: SmtTerm) -> Self {
        SmtTerm::Iff(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: SmtTerm) -> Self {
        SmtTerm::Xor(Box::new(self), Box::new(other))
    }

    pub fn eq(self, other: SmtTerm) -> Self {
        SmtTerm::Eq(Box::new(self), Box::new(other))
    }

    pub fn cmp(pred: BvPred, lhs: SmtTerm, rhs: SmtTerm) -> Self {
        SmtTerm::BvCmp {
            pred,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn bvop(op: BvOp, lhs: SmtTerm, rhs: SmtTerm) -> Self {
        SmtTerm::Bv {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn neg(self) -> Self {
        SmtTerm::BvNeg(Box::new(self))
    }
}
