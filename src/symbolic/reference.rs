//! # Reference Symbolic Evaluator
//!
//! A forking interpreter for the law expression AST. Placeholders of
//! boolean and integer type turn into constraint terms; every `if` over a
//! term splits the current path in two. Concrete operands are folded with
//! the same two's-complement semantics the solver uses, so a fully concrete
//! environment always yields branches with empty conditions.

use indexmap::IndexMap;
use std::sync::Arc;

use crate::ast::{BinaryOp, Expression, MatchArm, Pattern, UnaryOp};
use crate::symbolic::{
    ArithOp, Branch, Branches, CmpOp, ConstraintExpr, Opaque, PathCondition, SymbolicEnvironment,
    SymbolicEvaluator, SymbolicValue,
};
use crate::types::{IntKind, ProgramTable, Type};
use crate::{Error, Result};

/// Default bound on nested function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Evaluator-internal value; unlike [`SymbolicValue`] it can hold terms
#[derive(Debug, Clone)]
enum Sym {
    Unit,
    Bool(bool),
    Int { value: i64, kind: IntKind },
    Char(char),
    Str(String),
    /// Boolean- or integer-typed constraint term
    Term(ConstraintExpr),
    /// Values the evaluator carries but cannot compute with
    Other(SymbolicValue),
    Tag { name: String, payload: Option<Box<Sym>> },
    Tuple(Vec<Sym>),
    Closure(Arc<ClosureData>),
    Failure(SymbolicValue),
}

#[derive(Debug)]
struct ClosureData {
    params: Vec<String>,
    body: Expression,
    captured: Scope,
}

type Scope = IndexMap<String, Sym>;
type Outcomes = Vec<(PathCondition, Sym)>;

impl Sym {
    fn from_value(value: &SymbolicValue) -> Result<Sym> {
        Ok(match value {
            SymbolicValue::Unit => Sym::Unit,
            SymbolicValue::True => Sym::Bool(true),
            SymbolicValue::False => Sym::Bool(false),
            SymbolicValue::Atom { name, ty } if ty.is_lowerable() => {
                Sym::Term(ConstraintExpr::var(name.clone(), ty.clone()))
            }
            SymbolicValue::Atom { .. } | SymbolicValue::Environment(_) => Sym::Other(value.clone()),
            SymbolicValue::Int { value, kind } => Sym::Int {
                value: *value,
                kind: *kind,
            },
            SymbolicValue::Char(c) => Sym::Char(*c),
            SymbolicValue::Str(s) => Sym::Str(s.clone()),
            SymbolicValue::Tag { name, payload } => Sym::Tag {
                name: name.clone(),
                payload: match payload {
                    Some(p) => Some(Box::new(Sym::from_value(p)?)),
                    None => None,
                },
            },
            SymbolicValue::Tuple(elems) => Sym::Tuple(
                elems
                    .iter()
                    .map(Sym::from_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            SymbolicValue::Closure(opaque) => match opaque.downcast_ref::<Arc<ClosureData>>() {
                Some(data) => Sym::Closure(Arc::clone(data)),
                None => return Err(Error::evaluation("closure was created by another evaluator")),
            },
            SymbolicValue::UserFailure(_)
            | SymbolicValue::MatchFailure
            | SymbolicValue::SwitchFailure => Sym::Failure(value.clone()),
        })
    }

    fn into_value(self) -> Result<SymbolicValue> {
        Ok(match self {
            Sym::Unit => SymbolicValue::Unit,
            Sym::Bool(b) => SymbolicValue::bool(b),
            Sym::Int { value, kind } => SymbolicValue::Int { value, kind },
            Sym::Char(c) => SymbolicValue::Char(c),
            Sym::Str(s) => SymbolicValue::Str(s),
            Sym::Term(t) => {
                return Err(Error::evaluation(format!(
                    "symbolic term {} escapes as a result component",
                    t
                )))
            }
            Sym::Other(v) | Sym::Failure(v) => v,
            Sym::Tag { name, payload } => SymbolicValue::Tag {
                name,
                payload: match payload {
                    Some(p) => Some(Box::new(p.into_value()?)),
                    None => None,
                },
            },
            Sym::Tuple(elems) => SymbolicValue::Tuple(
                elems
                    .into_iter()
                    .map(Sym::into_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Sym::Closure(data) => SymbolicValue::Closure(Opaque::new(data)),
        })
    }

    fn describe(&self) -> String {
        match self {
            Sym::Unit => "unit".into(),
            Sym::Bool(_) => "bool".into(),
            Sym::Int { kind, .. } => kind.to_string(),
            Sym::Char(_) => "char".into(),
            Sym::Str(_) => "string".into(),
            Sym::Term(t) => match t.ty() {
                Some(ty) => format!("symbolic {}", ty),
                None => "untyped term".into(),
            },
            Sym::Other(_) => "opaque value".into(),
            Sym::Tag { name, .. } => format!("tag {}", name),
            Sym::Tuple(elems) => format!("{}-tuple", elems.len()),
            Sym::Closure(_) => "closure".into(),
            Sym::Failure(_) => "failure".into(),
        }
    }

    /// Constraint view of a lowerable value
    fn to_term(&self) -> Option<ConstraintExpr> {
        match self {
            Sym::Bool(b) => Some(ConstraintExpr::Bool(*b)),
            Sym::Int { value, kind } => Some(ConstraintExpr::int(*value, *kind)),
            Sym::Term(t) => Some(t.clone()),
            _ => None,
        }
    }
}

/// Forking symbolic interpreter over [`Expression`]
#[derive(Debug, Clone)]
pub struct ReferenceEvaluator {
    max_call_depth: usize,
}

impl ReferenceEvaluator {
    /// Evaluator with the default call depth bound
    pub fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Evaluator with a custom call depth bound
    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }

    fn explore(
        &self,
        expr: &Expression,
        env: &SymbolicEnvironment,
        program: &ProgramTable,
    ) -> Result<Vec<Branch>> {
        let scope = env
            .iter()
            .map(|(name, value)| Ok((name.clone(), Sym::from_value(value)?)))
            .collect::<Result<Scope>>()?;
        let mut interp = Interp {
            program,
            depth: 0,
            max_depth: self.max_call_depth,
        };
        let outcomes = interp.eval(expr, &scope, PathCondition::new())?;

        let mut branches = Vec::with_capacity(outcomes.len());
        for (path, value) in outcomes {
            match value {
                Sym::Term(term) if term.ty() == Some(Type::Bool) => {
                    branches.push(Branch::new(path.extended(term.clone()), SymbolicValue::True));
                    branches.push(Branch::new(path.extended(term.not()), SymbolicValue::False));
                }
                other => branches.push(Branch::new(path, other.into_value()?)),
            }
        }
        Ok(branches)
    }
}

impl Default for ReferenceEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolicEvaluator for ReferenceEvaluator {
    fn evaluate<'a>(
        &'a self,
        expr: &'a Expression,
        env: &'a SymbolicEnvironment,
        program: &'a ProgramTable,
    ) -> Branches<'a> {
        match self.explore(expr, env, program) {
            Ok(branches) => Box::new(branches.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

struct Interp<'p> {
    program: &'p ProgramTable,
    depth: usize,
    max_depth: usize,
}

impl<'p> Interp<'p> {
    fn eval(&mut self, expr: &Expression, scope: &Scope, path: PathCondition) -> Result<Outcomes> {
        let single = |v: Sym| Ok(vec![(path.clone(), v)]);
        match expr {
            Expression::Unit => single(Sym::Unit),
            Expression::Bool(b) => single(Sym::Bool(*b)),
            Expression::Int { value, kind } => single(Sym::Int {
                value: kind.wrap(*value as i128),
                kind: *kind,
            }),
            Expression::Char(c) => single(Sym::Char(*c)),
            Expression::Str(s) => single(Sym::Str(s.clone())),
            Expression::Variable(name) => match scope.get(name) {
                Some(v) => single(v.clone()),
                None => Err(Error::evaluation(format!("unbound variable {}", name))),
            },
            Expression::Fail(message) => {
                single(Sym::Failure(SymbolicValue::UserFailure(message.clone())))
            }
            Expression::Lambda { params, body } => single(Sym::Closure(Arc::new(ClosureData {
                params: params.clone(),
                body: (**body).clone(),
                captured: scope.clone(),
            }))),
            Expression::Forall { .. } | Expression::Exists { .. } => Err(Error::evaluation(
                "quantifier inside a quantifier-free law body",
            )),

            Expression::Unary { op, operand } => self
                .eval(operand, scope, path)?
                .into_iter()
                .map(|(p, v)| Ok((p, unary(*op, v)?)))
                .collect(),

            Expression::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or | BinaryOp::Implies => {
                    self.eval_connective(*op, left, right, scope, path)
                }
                _ => {
                    let mut out = Vec::new();
                    for (p, l) in self.eval(left, scope, path)? {
                        if let Sym::Failure(_) = l {
                            out.push((p, l));
                            continue;
                        }
                        for (p2, r) in self.eval(right, scope, p)? {
                            out.push((p2, binary(*op, l.clone(), r)?));
                        }
                    }
                    Ok(out)
                }
            },

            Expression::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = Vec::new();
                for (p, c) in self.eval(condition, scope, path)? {
                    match c {
                        Sym::Bool(true) => out.extend(self.eval(then_branch, scope, p)?),
                        Sym::Bool(false) => out.extend(self.eval(else_branch, scope, p)?),
                        Sym::Term(t) if t.ty() == Some(Type::Bool) => {
                            out.extend(self.eval(then_branch, scope, p.extended(t.clone()))?);
                            out.extend(self.eval(else_branch, scope, p.extended(t.not()))?);
                        }
                        Sym::Failure(_) => out.push((p, c)),
                        _ => out.push((p, Sym::Failure(SymbolicValue::SwitchFailure))),
                    }
                }
                Ok(out)
            }

            Expression::Call { function, args } => {
                let mut out = Vec::new();
                for (p, values) in self.eval_all(args, scope, path)? {
                    if let Some(failure) = values.iter().find(|v| matches!(v, Sym::Failure(_))) {
                        out.push((p, failure.clone()));
                        continue;
                    }
                    out.extend(self.call(function, values, scope, p)?);
                }
                Ok(out)
            }

            Expression::Construct { tag, payload } => match payload {
                None => single(Sym::Tag {
                    name: tag.clone(),
                    payload: None,
                }),
                Some(inner) => Ok(self
                    .eval(inner, scope, path)?
                    .into_iter()
                    .map(|(p, v)| match v {
                        Sym::Failure(_) => (p, v),
                        v => (
                            p,
                            Sym::Tag {
                                name: tag.clone(),
                                payload: Some(Box::new(v)),
                            },
                        ),
                    })
                    .collect()),
            },

            Expression::Tuple(elems) => Ok(self
                .eval_all(elems, scope, path)?
                .into_iter()
                .map(|(p, values)| {
                    match values.iter().find(|v| matches!(v, Sym::Failure(_))) {
                        Some(failure) => (p, failure.clone()),
                        None => (p, Sym::Tuple(values)),
                    }
                })
                .collect()),

            Expression::Match { scrutinee, arms } => {
                let mut out = Vec::new();
                for (p, s) in self.eval(scrutinee, scope, path)? {
                    match s {
                        Sym::Tag { name, payload } => {
                            match select_arm(arms, &name) {
                                Some(arm) => {
                                    let mut inner = scope.clone();
                                    if let Pattern::Tag {
                                        binding: Some(binding),
                                        ..
                                    } = &arm.pattern
                                    {
                                        let bound = payload.map(|b| *b).unwrap_or(Sym::Unit);
                                        inner.insert(binding.clone(), bound);
                                    }
                                    out.extend(self.eval(&arm.body, &inner, p)?);
                                }
                                None => out.push((p, Sym::Failure(SymbolicValue::MatchFailure))),
                            }
                        }
                        Sym::Failure(_) => out.push((p, s)),
                        other => {
                            return Err(Error::unsupported(format!(
                                "match on {}",
                                other.describe()
                            )))
                        }
                    }
                }
                Ok(out)
            }
        }
    }

    /// Evaluate a list left to right, forking per element
    fn eval_all(
        &mut self,
        exprs: &[Expression],
        scope: &Scope,
        path: PathCondition,
    ) -> Result<Vec<(PathCondition, Vec<Sym>)>> {
        let mut acc = vec![(path, Vec::with_capacity(exprs.len()))];
        for expr in exprs {
            let mut next = Vec::with_capacity(acc.len());
            for (p, values) in acc {
                for (p2, v) in self.eval(expr, scope, p)? {
                    let mut extended = values.clone();
                    extended.push(v);
                    next.push((p2, extended));
                }
            }
            acc = next;
        }
        Ok(acc)
    }

    fn eval_connective(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        scope: &Scope,
        path: PathCondition,
    ) -> Result<Outcomes> {
        let mut out = Vec::new();
        for (p, l) in self.eval(left, scope, path)? {
            match (&l, op) {
                (Sym::Failure(_), _) => out.push((p, l)),
                (Sym::Bool(false), BinaryOp::And) => out.push((p, Sym::Bool(false))),
                (Sym::Bool(true), BinaryOp::Or) => out.push((p, Sym::Bool(true))),
                (Sym::Bool(false), BinaryOp::Implies) => out.push((p, Sym::Bool(true))),
                (Sym::Bool(_), _) => out.extend(self.eval(right, scope, p)?),
                (Sym::Term(t), _) if t.ty() == Some(Type::Bool) => {
                    for (p2, r) in self.eval(right, scope, p)? {
                        let combined = match r {
                            Sym::Failure(_) => r,
                            Sym::Bool(rb) => match op {
                                BinaryOp::And if rb => l.clone(),
                                BinaryOp::And => Sym::Bool(false),
                                BinaryOp::Or if rb => Sym::Bool(true),
                                BinaryOp::Or => l.clone(),
                                _ if rb => Sym::Bool(true),
                                _ => Sym::Term(t.clone().not()),
                            },
                            Sym::Term(u) if u.ty() == Some(Type::Bool) => Sym::Term(match op {
                                BinaryOp::And => t.clone().and(u),
                                BinaryOp::Or => t.clone().or(u),
                                _ => t.clone().implies(u),
                            }),
                            other => {
                                return Err(Error::ill_typed(format!(
                                    "{} applied to {}",
                                    op,
                                    other.describe()
                                )))
                            }
                        };
                        out.push((p2, combined));
                    }
                }
                _ => {
                    return Err(Error::ill_typed(format!(
                        "{} applied to {}",
                        op,
                        l.describe()
                    )))
                }
            }
        }
        Ok(out)
    }

    fn call(
        &mut self,
        function: &str,
        args: Vec<Sym>,
        scope: &Scope,
        path: PathCondition,
    ) -> Result<Outcomes> {
        match scope.get(function) {
            Some(Sym::Closure(data)) => {
                let data = Arc::clone(data);
                return self.apply_closure(&data, args, path);
            }
            Some(other) => {
                return Err(Error::evaluation(format!(
                    "{} is a {}, not a function",
                    function,
                    other.describe()
                )))
            }
            None => {}
        }

        let program = self.program;
        let def = program
            .function(function)
            .ok_or_else(|| Error::UnknownDefinition {
                kind: "function",
                name: function.to_string(),
            })?;
        let params: Vec<String> = def.params.iter().map(|(n, _)| n.clone()).collect();
        let mut inner = Scope::new();
        bind_params(function, &params, args, &mut inner)?;
        self.enter()?;
        let result = self.eval(&def.body, &inner, path);
        self.depth -= 1;
        result
    }

    fn apply_closure(
        &mut self,
        data: &ClosureData,
        args: Vec<Sym>,
        path: PathCondition,
    ) -> Result<Outcomes> {
        let mut inner = data.captured.clone();
        bind_params("<closure>", &data.params, args, &mut inner)?;
        self.enter()?;
        let result = self.eval(&data.body, &inner, path);
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::CallDepthExceeded {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }
}

fn bind_params(function: &str, params: &[String], args: Vec<Sym>, scope: &mut Scope) -> Result<()> {
    if params.len() != args.len() {
        return Err(Error::evaluation(format!(
            "{} expects {} argument(s), got {}",
            function,
            params.len(),
            args.len()
        )));
    }
    for (name, value) in params.iter().zip(args) {
        scope.insert(name.clone(), value);
    }
    Ok(())
}

fn select_arm<'e>(arms: &'e [MatchArm], tag: &str) -> Option<&'e MatchArm> {
    arms.iter().find(|arm| match &arm.pattern {
        Pattern::Tag { name, .. } => name == tag,
        Pattern::Wildcard => true,
    })
}

fn unary(op: UnaryOp, value: Sym) -> Result<Sym> {
    match (op, value) {
        (_, v @ Sym::Failure(_)) => Ok(v),
        (UnaryOp::Not, Sym::Bool(b)) => Ok(Sym::Bool(!b)),
        (UnaryOp::Not, Sym::Term(t)) if t.ty() == Some(Type::Bool) => Ok(Sym::Term(t.not())),
        (UnaryOp::Neg, Sym::Int { value, kind }) => Ok(Sym::Int {
            value: kind.wrap(-(value as i128)),
            kind,
        }),
        (UnaryOp::Neg, Sym::Term(t)) if matches!(t.ty(), Some(Type::Int(_))) => {
            Ok(Sym::Term(t.neg()))
        }
        (op, v) => Err(Error::ill_typed(format!(
            "{:?} applied to {}",
            op,
            v.describe()
        ))),
    }
}

fn arith_op(op: BinaryOp) -> Option<ArithOp> {
    Some(match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Div => ArithOp::Div,
        BinaryOp::Rem => ArithOp::Rem,
        BinaryOp::Pow => ArithOp::Pow,
        BinaryOp::BitAnd => ArithOp::BitAnd,
        BinaryOp::BitOr => ArithOp::BitOr,
        BinaryOp::BitXor => ArithOp::BitXor,
        BinaryOp::Shl => ArithOp::Shl,
        BinaryOp::Shr => ArithOp::Shr,
        _ => return None,
    })
}

fn cmp_op(op: BinaryOp) -> Option<CmpOp> {
    Some(match op {
        BinaryOp::Lt => CmpOp::Lt,
        BinaryOp::Le => CmpOp::Le,
        BinaryOp::Gt => CmpOp::Gt,
        BinaryOp::Ge => CmpOp::Ge,
        _ => return None,
    })
}

fn binary(op: BinaryOp, l: Sym, r: Sym) -> Result<Sym> {
    if let Sym::Failure(_) = l {
        return Ok(l);
    }
    if let Sym::Failure(_) = r {
        return Ok(r);
    }

    if let Some(aop) = arith_op(op) {
        return match (&l, &r) {
            (Sym::Int { value: a, kind: ka }, Sym::Int { value: b, kind: kb }) if ka == kb => {
                Ok(Sym::Int {
                    value: aop.apply(*ka, *a, *b)?,
                    kind: *ka,
                })
            }
            _ if is_int_like(&l) && is_int_like(&r) => Ok(Sym::Term(ConstraintExpr::arith(
                aop,
                term_of(&l)?,
                term_of(&r)?,
            ))),
            _ => Err(mismatch(op, &l, &r)),
        };
    }

    if let Some(cop) = cmp_op(op) {
        return match (&l, &r) {
            (Sym::Int { value: a, kind: ka }, Sym::Int { value: b, kind: kb }) if ka == kb => {
                Ok(Sym::Bool(cop.holds(*a, *b)))
            }
            (Sym::Char(a), Sym::Char(b)) => Ok(Sym::Bool(cop.holds(*a as i64, *b as i64))),
            (Sym::Str(a), Sym::Str(b)) => Ok(Sym::Bool(cop.holds(ordering_rank(a.cmp(b)), 0))),
            _ if is_int_like(&l) && is_int_like(&r) => Ok(Sym::Term(ConstraintExpr::compare(
                cop,
                term_of(&l)?,
                term_of(&r)?,
            ))),
            _ => Err(mismatch(op, &l, &r)),
        };
    }

    match op {
        BinaryOp::Eq => structural_eq(&l, &r),
        BinaryOp::Ne => Ok(match structural_eq(&l, &r)? {
            Sym::Bool(b) => Sym::Bool(!b),
            Sym::Term(t) => Sym::Term(t.not()),
            other => other,
        }),
        BinaryOp::Iff => match (&l, &r) {
            (Sym::Bool(a), Sym::Bool(b)) => Ok(Sym::Bool(a == b)),
            _ if is_bool_like(&l) && is_bool_like(&r) => {
                Ok(Sym::Term(term_of(&l)?.iff(term_of(&r)?)))
            }
            _ => Err(mismatch(op, &l, &r)),
        },
        _ => Err(mismatch(op, &l, &r)),
    }
}

fn ordering_rank(ordering: std::cmp::Ordering) -> i64 {
    match ordering {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    }
}

fn is_int_like(v: &Sym) -> bool {
    match v {
        Sym::Int { .. } => true,
        Sym::Term(t) => matches!(t.ty(), Some(Type::Int(_))),
        _ => false,
    }
}

fn is_bool_like(v: &Sym) -> bool {
    match v {
        Sym::Bool(_) => true,
        Sym::Term(t) => t.ty() == Some(Type::Bool),
        _ => false,
    }
}

fn term_of(v: &Sym) -> Result<ConstraintExpr> {
    v.to_term()
        .ok_or_else(|| Error::ill_typed(format!("{} is not lowerable", v.describe())))
}

fn mismatch(op: BinaryOp, l: &Sym, r: &Sym) -> Error {
    Error::ill_typed(format!(
        "operator {} applied to {} and {}",
        op,
        l.describe(),
        r.describe()
    ))
}

/// Conjunction that folds concrete booleans away
fn conjoin(a: Sym, b: Sym) -> Sym {
    match (a, b) {
        (Sym::Bool(false), _) | (_, Sym::Bool(false)) => Sym::Bool(false),
        (Sym::Bool(true), other) | (other, Sym::Bool(true)) => other,
        (Sym::Term(x), Sym::Term(y)) => Sym::Term(x.and(y)),
        (other, _) => other,
    }
}

fn structural_eq(l: &Sym, r: &Sym) -> Result<Sym> {
    Ok(match (l, r) {
        (Sym::Unit, Sym::Unit) => Sym::Bool(true),
        (Sym::Bool(a), Sym::Bool(b)) => Sym::Bool(a == b),
        (Sym::Int { value: a, kind: ka }, Sym::Int { value: b, kind: kb }) if ka == kb => {
            Sym::Bool(a == b)
        }
        (Sym::Char(a), Sym::Char(b)) => Sym::Bool(a == b),
        (Sym::Str(a), Sym::Str(b)) => Sym::Bool(a == b),
        (Sym::Term(_), _) | (_, Sym::Term(_))
            if (is_int_like(l) && is_int_like(r)) || (is_bool_like(l) && is_bool_like(r)) =>
        {
            Sym::Term(ConstraintExpr::compare(CmpOp::Eq, term_of(l)?, term_of(r)?))
        }
        (
            Sym::Tag {
                name: na,
                payload: pa,
            },
            Sym::Tag {
                name: nb,
                payload: pb,
            },
        ) => {
            if na != nb {
                Sym::Bool(false)
            } else {
                match (pa, pb) {
                    (None, None) => Sym::Bool(true),
                    (Some(a), Some(b)) => structural_eq(a, b)?,
                    _ => Sym::Bool(false),
                }
            }
        }
        (Sym::Tuple(a), Sym::Tuple(b)) => {
            if a.len() != b.len() {
                return Ok(Sym::Bool(false));
            }
            let mut acc = Sym::Bool(true);
            for (x, y) in a.iter().zip(b) {
                acc = conjoin(acc, structural_eq(x, y)?);
            }
            acc
        }
        (
            Sym::Other(SymbolicValue::Atom { name: a, .. }),
            Sym::Other(SymbolicValue::Atom { name: b, .. }),
        ) if a == b =>
        {
            Sym::Bool(true)
        }
        _ => return Err(mismatch(BinaryOp::Eq, l, r)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expr: &Expression, env: &SymbolicEnvironment, program: &ProgramTable) -> Vec<Branch> {
        ReferenceEvaluator::new()
            .evaluate(expr, env, program)
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn atom(name: &str) -> SymbolicValue {
        SymbolicValue::Atom {
            name: name.into(),
            ty: Type::i32(),
        }
    }

    #[test]
    fn test_concrete_expression_has_single_unconditional_branch() {
        let expr = Expression::binary(
            BinaryOp::Lt,
            Expression::i32(1),
            Expression::binary(BinaryOp::Add, Expression::i32(1), Expression::i32(1)),
        );
        let branches = run(&expr, &SymbolicEnvironment::new(), &ProgramTable::new());
        assert_eq!(branches, vec![Branch::unconditional(SymbolicValue::True)]);
    }

    #[test]
    fn test_symbolic_boolean_result_forks() {
        let env = SymbolicEnvironment::new().with("x", atom("x!0")).unwrap();
        let expr = Expression::binary(BinaryOp::Le, Expression::var("x"), Expression::var("x"));
        let branches = run(&expr, &env, &ProgramTable::new());
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].value, SymbolicValue::True);
        assert_eq!(branches[1].value, SymbolicValue::False);
        assert_eq!(branches[1].condition.len(), 1);
        assert!(matches!(branches[1].condition.guards()[0], ConstraintExpr::Not(_)));
    }

    #[test]
    fn test_if_on_term_forks_with_guards() {
        let env = SymbolicEnvironment::new().with("x", atom("x!0")).unwrap();
        // if x < 0 then -x else x  >=  0
        let abs = Expression::if_then_else(
            Expression::binary(BinaryOp::Lt, Expression::var("x"), Expression::i32(0)),
            Expression::unary(UnaryOp::Neg, Expression::var("x")),
            Expression::var("x"),
        );
        let expr = Expression::binary(BinaryOp::Ge, abs, Expression::i32(0));
        let branches = run(&expr, &env, &ProgramTable::new());
        // two paths through the if, each forking on the final comparison
        assert_eq!(branches.len(), 4);
        assert!(branches.iter().all(|b| b.condition.len() == 2));
    }

    #[test]
    fn test_function_inlining_and_match() {
        let mut program = ProgramTable::new();
        program.define_function(
            "is_red",
            vec![("c".into(), Type::Sum("Color".into()))],
            Type::Bool,
            Expression::Match {
                scrutinee: Box::new(Expression::var("c")),
                arms: vec![
                    MatchArm {
                        pattern: Pattern::Tag {
                            name: "Red".into(),
                            binding: None,
                        },
                        body: Expression::Bool(true),
                    },
                    MatchArm {
                        pattern: Pattern::Wildcard,
                        body: Expression::Bool(false),
                    },
                ],
            },
        );
        let env = SymbolicEnvironment::new()
            .with("c", SymbolicValue::tag("Green"))
            .unwrap();
        let branches = run(&Expression::call("is_red", vec![Expression::var("c")]), &env, &program);
        assert_eq!(branches, vec![Branch::unconditional(SymbolicValue::False)]);
    }

    #[test]
    fn test_match_without_arm_yields_match_failure() {
        let expr = Expression::Match {
            scrutinee: Box::new(Expression::construct("A", None)),
            arms: vec![MatchArm {
                pattern: Pattern::Tag {
                    name: "B".into(),
                    binding: None,
                },
                body: Expression::Bool(true),
            }],
        };
        let branches = run(&expr, &SymbolicEnvironment::new(), &ProgramTable::new());
        assert_eq!(branches[0].value, SymbolicValue::MatchFailure);
    }

    #[test]
    fn test_failure_propagates_through_operators() {
        let expr = Expression::binary(
            BinaryOp::Eq,
            Expression::binary(BinaryOp::Add, Expression::Fail("boom".into()), Expression::i32(1)),
            Expression::i32(2),
        );
        let branches = run(&expr, &SymbolicEnvironment::new(), &ProgramTable::new());
        assert_eq!(branches[0].value, SymbolicValue::UserFailure("boom".into()));
    }

    #[test]
    fn test_if_on_integer_is_switch_failure() {
        let expr = Expression::if_then_else(
            Expression::i32(1),
            Expression::Bool(true),
            Expression::Bool(false),
        );
        let branches = run(&expr, &SymbolicEnvironment::new(), &ProgramTable::new());
        assert_eq!(branches[0].value, SymbolicValue::SwitchFailure);
    }

    #[test]
    fn test_recursion_is_bounded() {
        let mut program = ProgramTable::new();
        program.define_function(
            "loop",
            vec![("n".into(), Type::i32())],
            Type::Bool,
            Expression::call("loop", vec![Expression::var("n")]),
        );
        let evaluator = ReferenceEvaluator::with_max_call_depth(8);
        let env = SymbolicEnvironment::new();
        let expr = Expression::call("loop", vec![Expression::i32(0)]);
        let result: Result<Vec<Branch>> = evaluator.evaluate(&expr, &env, &program).collect();
        assert!(matches!(result, Err(Error::CallDepthExceeded { limit: 8 })));
    }

    #[test]
    fn test_tag_equality_compares_payload_terms() {
        let env = SymbolicEnvironment::new()
            .with("a", SymbolicValue::tag_with("Some", atom("a!0")))
            .and_then(|e| e.with("b", SymbolicValue::tag_with("Some", atom("b!1"))))
            .unwrap();
        let expr = Expression::binary(BinaryOp::Eq, Expression::var("a"), Expression::var("b"));
        let branches = run(&expr, &env, &ProgramTable::new());
        assert_eq!(branches.len(), 2);
        assert_eq!(
            branches[0].condition.guards()[0],
            ConstraintExpr::compare(
                CmpOp::Eq,
                ConstraintExpr::var("a!0", Type::i32()),
                ConstraintExpr::var("b!1", Type::i32())
            )
        );
    }

    #[test]
    fn test_closures_round_trip_through_values() {
        let expr = Expression::Lambda {
            params: vec!["x".into()],
            body: Box::new(Expression::var("x")),
        };
        let branches = run(&expr, &SymbolicEnvironment::new(), &ProgramTable::new());
        let closure = branches[0].value.clone();
        assert!(matches!(closure, SymbolicValue::Closure(_)));

        let env = SymbolicEnvironment::new().with("id", closure).unwrap();
        let call = Expression::call("id", vec![Expression::Bool(false)]);
        let branches = run(&call, &env, &ProgramTable::new());
        assert_eq!(branches, vec![Branch::unconditional(SymbolicValue::False)]);
    }
}
