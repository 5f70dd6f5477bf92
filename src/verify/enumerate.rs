//! Quantifier enumeration
//!
//! Finite types are split into every case; primitive types get a single
//! solver placeholder. The product over all quantified variables gives one
//! environment per case combination.

use indexmap::IndexSet;

use crate::ast::QuantifiedVar;
use crate::symbolic::{FreshNames, SymbolicEnvironment, SymbolicValue};
use crate::types::{ProgramTable, Type};
use crate::{Error, Result};

/// Expands quantified variables into representative environments
#[derive(Debug, Clone, Copy)]
pub struct Enumerator<'p> {
    program: &'p ProgramTable,
}

impl<'p> Enumerator<'p> {
    pub fn new(program: &'p ProgramTable) -> Self {
        Self { program }
    }

    /// Representative values of `ty`, in declaration order
    ///
    /// `hint` names any placeholder drawn for primitive types.
    pub fn representatives(
        &self,
        ty: &Type,
        hint: &str,
        fresh: &mut FreshNames,
    ) -> Result<Vec<SymbolicValue>> {
        let mut visiting = Vec::new();
        self.expand(ty, hint, fresh, &mut visiting)
    }

    fn expand(
        &self,
        ty: &Type,
        hint: &str,
        fresh: &mut FreshNames,
        visiting: &mut Vec<String>,
    ) -> Result<Vec<SymbolicValue>> {
        match ty {
            Type::Unit => Ok(vec![SymbolicValue::Unit]),
            Type::Bool => Ok(vec![SymbolicValue::True, SymbolicValue::False]),
            Type::Int(_) | Type::Char | Type::String => Ok(vec![SymbolicValue::Atom {
                name: fresh.fresh(hint),
                ty: ty.clone(),
            }]),
            Type::Sum(name) => {
                if visiting.iter().any(|v| v == name) {
                    return Err(Error::unsupported(format!(
                        "enumeration of recursive sum type {}",
                        name
                    )));
                }
                let def = self.program.sum(name)?;
                visiting.push(name.clone());
                let mut values = Vec::new();
                for ctor in &def.constructors {
                    match &ctor.payload {
                        None => values.push(SymbolicValue::tag(ctor.name.clone())),
                        Some(payload) => {
                            for rep in self.expand(payload, hint, fresh, visiting)? {
                                values.push(SymbolicValue::tag_with(ctor.name.clone(), rep));
                            }
                        }
                    }
                }
                visiting.pop();
                Ok(values)
            }
            Type::Tuple(_) => Err(Error::unsupported(format!(
                "enumeration of tuple-typed variable {} : {}",
                hint, ty
            ))),
            Type::Function { .. } => Err(Error::unsupported(format!(
                "enumeration of function-typed variable {} : {}",
                hint, ty
            ))),
        }
    }

    /// One environment per combination of representatives
    ///
    /// The first variable varies slowest. No variables yields a single empty
    /// environment.
    pub fn environments(
        &self,
        vars: &[QuantifiedVar],
        fresh: &mut FreshNames,
    ) -> Result<Vec<SymbolicEnvironment>> {
        check_unique(vars)?;
        let mut envs = vec![SymbolicEnvironment::new()];
        for var in vars {
            let reps = self.representatives(&var.ty, &var.name, fresh)?;
            let mut next = Vec::with_capacity(envs.len() * reps.len());
            for env in &envs {
                for rep in &reps {
                    next.push(env.clone().with(var.name.clone(), rep.clone())?);
                }
            }
            envs = next;
        }
        tracing::debug!(vars = vars.len(), environments = envs.len(), "enumerated quantifiers");
        Ok(envs)
    }

    /// Bind existential variables to placeholders in every environment
    ///
    /// Witnesses are left to the solver, so each existential gets one fresh
    /// placeholder shared by all environments.
    pub fn bind_existentials(
        &self,
        envs: Vec<SymbolicEnvironment>,
        vars: &[QuantifiedVar],
        fresh: &mut FreshNames,
    ) -> Result<Vec<SymbolicEnvironment>> {
        bind_placeholders(envs, vars, fresh, "existential")
    }

    /// Bind universal variables below the outermost binder
    ///
    /// These are not case-split; like existentials they become one shared
    /// placeholder each.
    pub fn bind_nested_universals(
        &self,
        envs: Vec<SymbolicEnvironment>,
        vars: &[QuantifiedVar],
        fresh: &mut FreshNames,
    ) -> Result<Vec<SymbolicEnvironment>> {
        bind_placeholders(envs, vars, fresh, "nested universal")
    }
}

fn bind_placeholders(
    envs: Vec<SymbolicEnvironment>,
    vars: &[QuantifiedVar],
    fresh: &mut FreshNames,
    binder: &str,
) -> Result<Vec<SymbolicEnvironment>> {
    if vars.is_empty() {
        return Ok(envs);
    }
    check_unique(vars)?;
    let mut witnesses = Vec::with_capacity(vars.len());
    for var in vars {
        let value = match &var.ty {
            Type::Unit => SymbolicValue::Unit,
            ty @ (Type::Bool | Type::Int(_) | Type::Char | Type::String) => SymbolicValue::Atom {
                name: fresh.fresh(&var.name),
                ty: ty.clone(),
            },
            other => {
                return Err(Error::unsupported(format!(
                    "{} variable {} of type {}",
                    binder, var.name, other
                )))
            }
        };
        witnesses.push((var.name.clone(), value));
    }
    envs.into_iter()
        .map(|mut env| {
            for (name, value) in &witnesses {
                env.bind(name.clone(), value.clone())?;
            }
            Ok(env)
        })
        .collect()
}

fn check_unique(vars: &[QuantifiedVar]) -> Result<()> {
    let mut seen = IndexSet::with_capacity(vars.len());
    for var in vars {
        if !seen.insert(var.name.as_str()) {
            return Err(Error::DuplicateVariable {
                name: var.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Constructor;

    fn program() -> ProgramTable {
        let mut program = ProgramTable::new();
        program.define_sum(
            "Option",
            vec![Constructor::unit("None"), Constructor::with_payload("Some", Type::Bool)],
        );
        program.define_sum(
            "List",
            vec![
                Constructor::unit("Nil"),
                Constructor::with_payload("Cons", Type::Sum("List".into())),
            ],
        );
        program
    }

    #[test]
    fn test_sum_payloads_expand_in_order() {
        let program = program();
        let reps = Enumerator::new(&program)
            .representatives(&Type::Sum("Option".into()), "o", &mut FreshNames::new())
            .unwrap();
        assert_eq!(
            reps,
            vec![
                SymbolicValue::tag("None"),
                SymbolicValue::tag_with("Some", SymbolicValue::True),
                SymbolicValue::tag_with("Some", SymbolicValue::False),
            ]
        );
    }

    #[test]
    fn test_recursive_sum_is_unsupported() {
        let program = program();
        let err = Enumerator::new(&program)
            .representatives(&Type::Sum("List".into()), "l", &mut FreshNames::new())
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }

    #[test]
    fn test_first_variable_varies_slowest() {
        let program = program();
        let vars = vec![
            QuantifiedVar::new("a", 0, Type::Bool),
            QuantifiedVar::new("b", 1, Type::Bool),
        ];
        let envs = Enumerator::new(&program)
            .environments(&vars, &mut FreshNames::new())
            .unwrap();
        let rows: Vec<(bool, bool)> = envs
            .iter()
            .map(|e| {
                (
                    e.get("a").and_then(SymbolicValue::as_bool).unwrap(),
                    e.get("b").and_then(SymbolicValue::as_bool).unwrap(),
                )
            })
            .collect();
        assert_eq!(rows, vec![(true, true), (true, false), (false, true), (false, false)]);
    }

    #[test]
    fn test_existentials_share_one_placeholder() {
        let program = program();
        let enumerator = Enumerator::new(&program);
        let mut fresh = FreshNames::new();
        let envs = enumerator
            .environments(&[QuantifiedVar::new("a", 0, Type::Bool)], &mut fresh)
            .unwrap();
        let envs = enumerator
            .bind_existentials(envs, &[QuantifiedVar::new("w", 1, Type::i32())], &mut fresh)
            .unwrap();
        assert_eq!(envs.len(), 2);
        for env in &envs {
            assert_eq!(
                env.get("w"),
                Some(&SymbolicValue::Atom {
                    name: "w!0".into(),
                    ty: Type::i32()
                })
            );
        }
    }

    #[test]
    fn test_existential_of_sum_type_rejected() {
        let program = program();
        let err = Enumerator::new(&program)
            .bind_existentials(
                vec![SymbolicEnvironment::new()],
                &[QuantifiedVar::new("o", 0, Type::Sum("Option".into()))],
                &mut FreshNames::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }));
    }
}
