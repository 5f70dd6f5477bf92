//! # Law Expression AST
//!
//! Properties arrive from upstream analysis already parsed and typed. This
//! module holds the law taxonomy, the property record, and the expression
//! tree the evaluator interprets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{IntKind, Type};

/// Algebraic and order-theoretic laws the checker knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Law {
    /// `f(f(a, b), c) == f(a, f(b, c))`
    Associativity,
    /// `f(a, b) == f(b, a)`
    Commutativity,
    /// `a <= a`
    Reflexivity,
    /// `a <= b && b <= a ==> a == b`
    AntiSymmetry,
    /// `a <= b && b <= c ==> a <= c`
    Transitivity,
    /// A bottom element exists
    LeastElement,
    /// `a <= join(a, b)`
    UpperBound,
    /// `a <= c && b <= c ==> join(a, b) <= c`
    LeastUpperBound,
    /// A top element exists
    GreatestElement,
    /// `meet(a, b) <= a`
    LowerBound,
    /// `c <= a && c <= b ==> c <= meet(a, b)`
    GreatestLowerBound,
    /// `f(bottom) == bottom`
    Strict,
    /// `a <= b ==> f(a) <= f(b)`
    Monotone,
    /// `height(a) >= 0`
    HeightNonNegative,
    /// `a < b ==> height(b) < height(a)`
    HeightStrictlyDecreasing,
}

impl Law {
    /// Every law, in declaration order
    pub const ALL: [Law; 15] = [
        Law::Associativity,
        Law::Commutativity,
        Law::Reflexivity,
        Law::AntiSymmetry,
        Law::Transitivity,
        Law::LeastElement,
        Law::UpperBound,
        Law::LeastUpperBound,
        Law::GreatestElement,
        Law::LowerBound,
        Law::GreatestLowerBound,
        Law::Strict,
        Law::Monotone,
        Law::HeightNonNegative,
        Law::HeightStrictlyDecreasing,
    ];

    /// Structural laws assert existence; their diagnostics carry no counterexample
    pub fn is_structural(self) -> bool {
        matches!(self, Law::LeastElement | Law::GreatestElement)
    }
}

impl fmt::Display for Law {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Law::Associativity => "associativity",
            Law::Commutativity => "commutativity",
            Law::Reflexivity => "reflexivity",
            Law::AntiSymmetry => "anti-symmetry",
            Law::Transitivity => "transitivity",
            Law::LeastElement => "least element",
            Law::UpperBound => "upper bound",
            Law::LeastUpperBound => "least upper bound",
            Law::GreatestElement => "greatest element",
            Law::LowerBound => "lower bound",
            Law::GreatestLowerBound => "greatest lower bound",
            Law::Strict => "strictness",
            Law::Monotone => "monotonicity",
            Law::HeightNonNegative => "non-negative height",
            Law::HeightStrictlyDecreasing => "strictly decreasing height",
        };
        f.write_str(name)
    }
}

/// Source location in the program under verification
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file path
    pub file: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Creates a location
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A variable bound by a quantifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantifiedVar {
    /// Variable name as written
    pub name: String,
    /// Synthetic index assigned by the binder
    pub index: usize,
    /// Declared type
    pub ty: Type,
    /// Binding site
    pub location: SourceLocation,
}

impl QuantifiedVar {
    /// Creates a variable with a default location
    pub fn new(name: impl Into<String>, index: usize, ty: Type) -> Self {
        Self {
            name: name.into(),
            index,
            ty,
            location: SourceLocation::default(),
        }
    }
}

/// A law instance to be checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Which law this property states
    pub law: Law,
    /// Quantified boolean expression
    pub expr: Expression,
    /// Where the law was required
    pub location: SourceLocation,
}

impl Property {
    /// Creates a property
    pub fn new(law: Law, expr: Expression, location: SourceLocation) -> Self {
        Self {
            law,
            expr,
            location,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical not
    Not,
    /// Arithmetic negation
    Neg,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/` (signed)
    Div,
    /// `%` (signed)
    Rem,
    /// `**`
    Pow,

    // Bitwise
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>` (logical)
    Shr,

    // Comparison
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,

    // Logical
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==>`
    Implies,
    /// `<=>`
    Iff,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Implies => "==>",
            BinaryOp::Iff => "<=>",
        };
        f.write_str(s)
    }
}

/// Pattern in a `match` arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// Matches a constructor, optionally binding its payload
    Tag {
        /// Constructor name
        name: String,
        /// Name bound to the payload
        binding: Option<String>,
    },
    /// Matches anything
    Wildcard,
}

/// One arm of a `match` expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    /// Pattern tested against the scrutinee
    pub pattern: Pattern,
    /// Arm body
    pub body: Expression,
}

/// Expressions of the law surface language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Literals
    /// `()`
    Unit,
    /// Boolean literal
    Bool(bool),
    /// Integer literal of a given kind
    Int {
        /// Value (already within range of `kind`)
        value: i64,
        /// Integer kind
        kind: IntKind,
    },
    /// Character literal
    Char(char),
    /// String literal
    Str(String),

    /// Variable reference
    Variable(String),

    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
    },

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },

    /// Conditional
    If {
        /// Condition
        condition: Box<Expression>,
        /// Value when true
        then_branch: Box<Expression>,
        /// Value when false
        else_branch: Box<Expression>,
    },

    /// Call of a program function or a closure-valued variable
    Call {
        /// Callee name
        function: String,
        /// Arguments
        args: Vec<Expression>,
    },

    /// Sum-type constructor application
    Construct {
        /// Constructor tag
        tag: String,
        /// Payload
        payload: Option<Box<Expression>>,
    },

    /// Case analysis on a sum-type value
    Match {
        /// Value inspected
        scrutinee: Box<Expression>,
        /// Arms tried in order
        arms: Vec<MatchArm>,
    },

    /// Tuple construction
    Tuple(Vec<Expression>),

    /// Anonymous function
    Lambda {
        /// Parameter names
        params: Vec<String>,
        /// Body
        body: Box<Expression>,
    },

    /// Universal quantifier
    Forall {
        /// Bound variables
        vars: Vec<QuantifiedVar>,
        /// Body
        body: Box<Expression>,
    },

    /// Existential quantifier
    Exists {
        /// Bound variables
        vars: Vec<QuantifiedVar>,
        /// Body
        body: Box<Expression>,
    },

    /// Explicit user failure
    Fail(String),
}

impl Expression {
    /// Variable reference
    pub fn var(name: impl Into<String>) -> Self {
        Expression::Variable(name.into())
    }

    /// `i32` literal
    pub fn i32(value: i32) -> Self {
        Expression::Int {
            value: value as i64,
            kind: IntKind::I32,
        }
    }

    /// Binary operation
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Unary operation
    pub fn unary(op: UnaryOp, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Function call
    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            function: function.into(),
            args,
        }
    }

    /// Conditional
    pub fn if_then_else(
        condition: Expression,
        then_branch: Expression,
        else_branch: Expression,
    ) -> Self {
        Expression::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Constructor application
    pub fn construct(tag: impl Into<String>, payload: Option<Expression>) -> Self {
        Expression::Construct {
            tag: tag.into(),
            payload: payload.map(Box::new),
        }
    }

    /// Universal quantifier
    pub fn forall(vars: Vec<QuantifiedVar>, body: Expression) -> Self {
        Expression::Forall {
            vars,
            body: Box::new(body),
        }
    }

    /// Existential quantifier
    pub fn exists(vars: Vec<QuantifiedVar>, body: Expression) -> Self {
        Expression::Exists {
            vars,
            body: Box::new(body),
        }
    }
}

/// Quantifier prefix of a property expression
#[derive(Debug, Clone, PartialEq)]
pub struct Stripped<'a> {
    /// Variables of the outermost universal binder
    pub universals: Vec<QuantifiedVar>,
    /// Variables of universal binders below the outermost one
    pub nested_universals: Vec<QuantifiedVar>,
    /// Variables of every existential binder in the prefix
    pub existentials: Vec<QuantifiedVar>,
    /// Quantifier-free body
    pub body: &'a Expression,
}

/// Peel the quantifier prefix off a property expression
///
/// Only the outermost universal binder is enumerated. Further universal
/// binders in the prefix land in `nested_universals`, existential binders in
/// `existentials`; both are left to the solver.
pub fn strip_quantifiers(expr: &Expression) -> Stripped<'_> {
    let mut universals = Vec::new();
    let mut nested_universals = Vec::new();
    let mut existentials = Vec::new();
    let mut body = expr;
    let mut outermost = true;
    loop {
        match body {
            Expression::Forall { vars, body: inner } if outermost => {
                universals.extend(vars.iter().cloned());
                body = inner;
                outermost = false;
            }
            Expression::Forall { vars, body: inner } => {
                nested_universals.extend(vars.iter().cloned());
                body = inner;
                outermost = false;
            }
            Expression::Exists { vars, body: inner } => {
                existentials.extend(vars.iter().cloned());
                body = inner;
                outermost = false;
            }
            _ => break,
        }
    }
    Stripped {
        universals,
        nested_universals,
        existentials,
        body,
    }
}
