//! Counterexample rendering

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::smt::{Model, ModelValue};
use crate::symbolic::{SymbolicEnvironment, SymbolicValue};
use crate::types::Type;
use crate::Result;

/// Render one value for display, resolving placeholders through `model`
pub fn render_value(value: &SymbolicValue, model: Option<&Model>) -> String {
    match value {
        SymbolicValue::Unit => "()".to_string(),
        SymbolicValue::True => "true".to_string(),
        SymbolicValue::False => "false".to_string(),
        SymbolicValue::Int { value, .. } => value.to_string(),
        SymbolicValue::Char(c) => format!("{:?}", c),
        SymbolicValue::Str(s) => format!("{:?}", s),
        SymbolicValue::Atom { name, .. } => match model.and_then(|m| m.get(name)) {
            Some(v) => v.to_string(),
            None => format!("<unresolved {}>", name),
        },
        SymbolicValue::Tag { name, payload: None } => name.clone(),
        SymbolicValue::Tag {
            name,
            payload: Some(payload),
        } => format!("{}({})", name, render_value(payload, model)),
        SymbolicValue::Tuple(elems) => {
            let parts: Vec<String> = elems.iter().map(|e| render_value(e, model)).collect();
            format!("({})", parts.join(", "))
        }
        SymbolicValue::Closure(_) => "<closure>".to_string(),
        SymbolicValue::Environment(_) => "<environment>".to_string(),
        SymbolicValue::UserFailure(_) => "<user failure>".to_string(),
        SymbolicValue::MatchFailure => "<match failure>".to_string(),
        SymbolicValue::SwitchFailure => "<switch failure>".to_string(),
    }
}

/// Rendered assignment of every quantified variable, in quantifier order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Counterexample {
    bindings: IndexMap<String, String>,
}

impl Counterexample {
    /// Render `env`, resolving placeholders through `model`
    pub fn from_environment(env: &SymbolicEnvironment, model: Option<&Model>) -> Self {
        Self {
            bindings: env
                .iter()
                .map(|(name, value)| (name.clone(), render_value(value, model)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bindings.is_empty() {
            return f.write_str("{}");
        }
        let parts: Vec<String> = self
            .bindings
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Replace every placeholder the model resolves by its literal
///
/// Placeholders the model does not mention, or of types the solver never
/// sees, are kept.
pub fn concretize(env: &SymbolicEnvironment, model: &Model) -> Result<SymbolicEnvironment> {
    let mut out = SymbolicEnvironment::new();
    for (name, value) in env.iter() {
        out.bind(name.clone(), concretize_value(value, model))?;
    }
    Ok(out)
}

fn concretize_value(value: &SymbolicValue, model: &Model) -> SymbolicValue {
    match value {
        SymbolicValue::Atom { name, ty } => match (ty, model.get(name)) {
            (Type::Bool, Some(ModelValue::Bool(b))) => SymbolicValue::bool(*b),
            (Type::Int(kind), Some(ModelValue::BitVec { value, .. })) => SymbolicValue::Int {
                value: kind.wrap(*value as i128),
                kind: *kind,
            },
            _ => value.clone(),
        },
        SymbolicValue::Tag {
            name,
            payload: Some(payload),
        } => SymbolicValue::tag_with(name.clone(), concretize_value(payload, model)),
        SymbolicValue::Tuple(elems) => {
            SymbolicValue::Tuple(elems.iter().map(|e| concretize_value(e, model)).collect())
        }
        other => other.clone(),
    }
}
