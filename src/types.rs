//! # Semantic Types and Program Table
//!
//! The verifier does not type-check anything itself. It receives the
//! declared type of every quantified variable from upstream analysis and
//! consults the [`ProgramTable`] to expand sum types and inline functions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ast::Expression;
use crate::{Error, Result};

/// Fixed-width signed integer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntKind {
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
}

impl IntKind {
    /// Bit width of the kind
    pub fn width(self) -> u32 {
        match self {
            IntKind::I8 => 8,
            IntKind::I16 => 16,
            IntKind::I32 => 32,
            IntKind::I64 => 64,
        }
    }

    /// Truncate to the kind's width and sign-extend back to `i64`
    pub fn wrap(self, value: i128) -> i64 {
        let width = self.width();
        let masked = (value as u128) & mask(width);
        sign_extend(masked as u64, width)
    }

    /// Smallest representable value
    pub fn min_value(self) -> i64 {
        match self {
            IntKind::I8 => i8::MIN as i64,
            IntKind::I16 => i16::MIN as i64,
            IntKind::I32 => i32::MIN as i64,
            IntKind::I64 => i64::MIN,
        }
    }

    /// Largest representable value
    pub fn max_value(self) -> i64 {
        match self {
            IntKind::I8 => i8::MAX as i64,
            IntKind::I16 => i16::MAX as i64,
            IntKind::I32 => i32::MAX as i64,
            IntKind::I64 => i64::MAX,
        }
    }
}

impl fmt::Display for IntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.width())
    }
}

fn mask(width: u32) -> u128 {
    (1u128 << width) - 1
}

/// Interpret the low `width` bits of `bits` as a two's-complement number
pub fn sign_extend(bits: u64, width: u32) -> i64 {
    if width >= 64 {
        return bits as i64;
    }
    let shift = 64 - width;
    ((bits << shift) as i64) >> shift
}

/// Source-level type of a quantified variable or expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Unit type
    Unit,
    /// Boolean type
    Bool,
    /// Fixed-width signed integer
    Int(IntKind),
    /// Unicode scalar
    Char,
    /// String type
    String,
    /// Named sum type, resolved through the [`ProgramTable`]
    Sum(String),
    /// Tuple: (T1, T2, ...)
    Tuple(Vec<Type>),
    /// Function: (T1, T2, ...) -> R
    Function {
        /// Parameter types
        params: Vec<Type>,
        /// Return type
        ret: Box<Type>,
    },
}

impl Type {
    /// Shorthand for `Type::Int(IntKind::I32)`
    pub fn i32() -> Self {
        Type::Int(IntKind::I32)
    }

    /// Shorthand for `Type::Int(IntKind::I64)`
    pub fn i64() -> Self {
        Type::Int(IntKind::I64)
    }

    /// Whether values of this type can appear in a solver query
    pub fn is_lowerable(&self) -> bool {
        matches!(self, Type::Bool | Type::Int(_))
    }

    /// Primitive types are represented by a single solver placeholder
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Int(_) | Type::Char | Type::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "()"),
            Type::Bool => write!(f, "bool"),
            Type::Int(kind) => write!(f, "{}", kind),
            Type::Char => write!(f, "char"),
            Type::String => write!(f, "string"),
            Type::Sum(name) => write!(f, "{}", name),
            Type::Tuple(elems) => {
                write!(f, "(")?;
                for (i, t) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ")")
            }
            Type::Function { params, ret } => {
                write!(f, "fn(")?;
                for (i, t) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ") -> {}", ret)
            }
        }
    }
}

/// One constructor of a sum type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constructor {
    /// Constructor tag
    pub name: String,
    /// Payload type, `None` for nullary constructors
    pub payload: Option<Type>,
}

impl Constructor {
    /// Nullary constructor
    pub fn unit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Constructor carrying a payload
    pub fn with_payload(name: impl Into<String>, payload: Type) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

/// Sum type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumTypeDef {
    /// Type name
    pub name: String,
    /// Constructors in declaration order
    pub constructors: Vec<Constructor>,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Parameter names and types
    pub params: Vec<(String, Type)>,
    /// Return type
    pub ret: Type,
    /// Function body
    pub body: Expression,
}

/// Type and definition table of the program under verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramTable {
    sums: IndexMap<String, SumTypeDef>,
    functions: IndexMap<String, FunctionDef>,
}

impl ProgramTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sum type, replacing any previous definition
    pub fn define_sum(&mut self, name: impl Into<String>, constructors: Vec<Constructor>) {
        let name = name.into();
        self.sums.insert(
            name.clone(),
            SumTypeDef {
                name,
                constructors,
            },
        );
    }

    /// Register a function, replacing any previous definition
    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        params: Vec<(String, Type)>,
        ret: Type,
        body: Expression,
    ) {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            FunctionDef {
                name,
                params,
                ret,
                body,
            },
        );
    }

    /// Look up a sum type by name
    pub fn sum(&self, name: &str) -> Result<&SumTypeDef> {
        self.sums.get(name).ok_or_else(|| Error::UnknownDefinition {
            kind: "sum type",
            name: name.to_string(),
        })
    }

    /// Look up a function by name
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Number of functions defined
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_truncates_to_width() {
        assert_eq!(IntKind::I8.wrap(127 + 1), -128);
        assert_eq!(IntKind::I8.wrap(-129), 127);
        assert_eq!(IntKind::I32.wrap(i32::MAX as i128 + 1), i32::MIN as i64);
        assert_eq!(IntKind::I64.wrap(i64::MAX as i128 + 1), i64::MIN);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0xff, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(0xffff_fffe, 32), -2);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn test_missing_sum_type() {
        let table = ProgramTable::new();
        match table.sum("Color") {
            Err(Error::UnknownDefinition { kind, name }) => {
                assert_eq!(kind, "sum type");
                assert_eq!(name, "Color");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_type_display() {
        let t = Type::Function {
            params: vec![Type::i32(), Type::Bool],
            ret: Box::new(Type::Tuple(vec![Type::Char, Type::Sum("Opt".into())])),
        };
        assert_eq!(t.to_string(), "fn(i32, bool) -> (char, Opt)");
    }
}
