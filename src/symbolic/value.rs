use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::types::{IntKind, Type};
use crate::{Error, Result};

/// Uninterpreted payload of closures and environment snapshots
///
/// The verifier never looks inside; only the evaluator that created the
/// payload may downcast it.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Wrap an evaluator-private value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Opaque(Arc::new(value))
    }

    /// Recover the evaluator-private value
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Value of a variable or expression during symbolic execution
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolicValue {
    /// `()`
    Unit,
    /// Boolean true
    True,
    /// Boolean false
    False,
    /// Free variable of primitive type, resolved only by the solver
    Atom {
        /// Solver constant name
        name: String,
        /// Declared type
        ty: Type,
    },
    /// Concrete integer
    Int {
        /// Value
        value: i64,
        /// Integer kind
        kind: IntKind,
    },
    /// Concrete character
    Char(char),
    /// Concrete string
    Str(String),
    /// Sum-type constructor application
    Tag {
        /// Constructor name
        name: String,
        /// Payload
        payload: Option<Box<SymbolicValue>>,
    },
    /// Ordered tuple
    Tuple(Vec<SymbolicValue>),
    /// Function value
    Closure(Opaque),
    /// Captured environment snapshot
    Environment(Opaque),
    /// Program called `fail`
    UserFailure(String),
    /// No match arm applied
    MatchFailure,
    /// Conditional over a non-boolean value
    SwitchFailure,
}

impl SymbolicValue {
    /// Boolean value
    pub fn bool(b: bool) -> Self {
        if b {
            SymbolicValue::True
        } else {
            SymbolicValue::False
        }
    }

    /// `Some(b)` for the two boolean variants
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SymbolicValue::True => Some(true),
            SymbolicValue::False => Some(false),
            _ => None,
        }
    }

    /// Nullary tag
    pub fn tag(name: impl Into<String>) -> Self {
        SymbolicValue::Tag {
            name: name.into(),
            payload: None,
        }
    }

    /// Tag with payload
    pub fn tag_with(name: impl Into<String>, payload: SymbolicValue) -> Self {
        SymbolicValue::Tag {
            name: name.into(),
            payload: Some(Box::new(payload)),
        }
    }

    /// One of the three error sentinels
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SymbolicValue::UserFailure(_)
                | SymbolicValue::MatchFailure
                | SymbolicValue::SwitchFailure
        )
    }
}

/// One case combination of quantified variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolicEnvironment {
    bindings: IndexMap<String, SymbolicValue>,
}

impl SymbolicEnvironment {
    /// Empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh name; rebinding an existing name is a defect
    pub fn bind(&mut self, name: impl Into<String>, value: SymbolicValue) -> Result<()> {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return Err(Error::DuplicateVariable { name });
        }
        self.bindings.insert(name, value);
        Ok(())
    }

    /// Builder form of [`bind`](Self::bind)
    pub fn with(mut self, name: impl Into<String>, value: SymbolicValue) -> Result<Self> {
        self.bind(name, value)?;
        Ok(self)
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&SymbolicValue> {
        self.bindings.get(name)
    }

    /// Bindings in quantifier order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SymbolicValue)> {
        self.bindings.iter()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// True when no variable is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
