//! Law diagnostics and run reports

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::ast::{Law, Property, SourceLocation};
use crate::verify::{Counterexample, PropertyResult};
use crate::{Error, Result};

/// A law that does not hold, one variant per law
///
/// Relational laws carry the rendered counterexample; the two existence laws
/// carry only their location.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum VerifierError {
    #[error("{location}: operation is not associative for {counterexample}")]
    AssociativityError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: operation is not commutative for {counterexample}")]
    CommutativityError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: ordering is not reflexive for {counterexample}")]
    ReflexivityError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: ordering is not anti-symmetric for {counterexample}")]
    AntiSymmetryError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: ordering is not transitive for {counterexample}")]
    TransitivityError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: bottom is not a least element")]
    LeastElementError { location: SourceLocation },

    #[error("{location}: join is not an upper bound for {counterexample}")]
    UpperBoundError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: join is not the least upper bound for {counterexample}")]
    LeastUpperBoundError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: top is not a greatest element")]
    GreatestElementError { location: SourceLocation },

    #[error("{location}: meet is not a lower bound for {counterexample}")]
    LowerBoundError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: meet is not the greatest lower bound for {counterexample}")]
    GreatestLowerBoundError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: function is not strict for {counterexample}")]
    StrictError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: function is not monotone for {counterexample}")]
    MonotoneError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: height is negative for {counterexample}")]
    HeightNonNegativeError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    #[error("{location}: height does not strictly decrease for {counterexample}")]
    HeightStrictlyDecreasingError {
        location: SourceLocation,
        counterexample: Counterexample,
    },

    /// The solver could not decide a branch
    #[error("{location}: {law} could not be verified ({reason})")]
    Inconclusive {
        law: Law,
        location: SourceLocation,
        reason: String,
    },
}

/// Diagnostic for `law` failing at `location`
pub fn law_error(
    law: Law,
    location: SourceLocation,
    counterexample: Counterexample,
) -> VerifierError {
    use VerifierError::*;
    match law {
        Law::Associativity => AssociativityError { location, counterexample },
        Law::Commutativity => CommutativityError { location, counterexample },
        Law::Reflexivity => ReflexivityError { location, counterexample },
        Law::AntiSymmetry => AntiSymmetryError { location, counterexample },
        Law::Transitivity => TransitivityError { location, counterexample },
        Law::LeastElement => LeastElementError { location },
        Law::UpperBound => UpperBoundError { location, counterexample },
        Law::LeastUpperBound => LeastUpperBoundError { location, counterexample },
        Law::GreatestElement => GreatestElementError { location },
        Law::LowerBound => LowerBoundError { location, counterexample },
        Law::GreatestLowerBound => GreatestLowerBoundError { location, counterexample },
        Law::Strict => StrictError { location, counterexample },
        Law::Monotone => MonotoneError { location, counterexample },
        Law::HeightNonNegative => HeightNonNegativeError { location, counterexample },
        Law::HeightStrictlyDecreasing => HeightStrictlyDecreasingError { location, counterexample },
    }
}

impl VerifierError {
    /// Law this diagnostic is about
    pub fn law(&self) -> Law {
        use VerifierError::*;
        match self {
            AssociativityError { .. } => Law::Associativity,
            CommutativityError { .. } => Law::Commutativity,
            ReflexivityError { .. } => Law::Reflexivity,
            AntiSymmetryError { .. } => Law::AntiSymmetry,
            TransitivityError { .. } => Law::Transitivity,
            LeastElementError { .. } => Law::LeastElement,
            UpperBoundError { .. } => Law::UpperBound,
            LeastUpperBoundError { .. } => Law::LeastUpperBound,
            GreatestElementError { .. } => Law::GreatestElement,
            LowerBoundError { .. } => Law::LowerBound,
            GreatestLowerBoundError { .. } => Law::GreatestLowerBound,
            StrictError { .. } => Law::Strict,
            MonotoneError { .. } => Law::Monotone,
            HeightNonNegativeError { .. } => Law::HeightNonNegative,
            HeightStrictlyDecreasingError { .. } => Law::HeightStrictlyDecreasing,
            Inconclusive { law, .. } => *law,
        }
    }

    /// Where the law was declared
    pub fn location(&self) -> &SourceLocation {
        use VerifierError::*;
        match self {
            AssociativityError { location, .. }
            | CommutativityError { location, .. }
            | ReflexivityError { location, .. }
            | AntiSymmetryError { location, .. }
            | TransitivityError { location, .. }
            | LeastElementError { location }
            | UpperBoundError { location, .. }
            | LeastUpperBoundError { location, .. }
            | GreatestElementError { location }
            | LowerBoundError { location, .. }
            | GreatestLowerBoundError { location, .. }
            | StrictError { location, .. }
            | MonotoneError { location, .. }
            | HeightNonNegativeError { location, .. }
            | HeightStrictlyDecreasingError { location, .. }
            | Inconclusive { location, .. } => location,
        }
    }

    /// Counterexample, if the variant carries one
    pub fn counterexample(&self) -> Option<&Counterexample> {
        use VerifierError::*;
        match self {
            AssociativityError { counterexample, .. }
            | CommutativityError { counterexample, .. }
            | ReflexivityError { counterexample, .. }
            | AntiSymmetryError { counterexample, .. }
            | TransitivityError { counterexample, .. }
            | UpperBoundError { counterexample, .. }
            | LeastUpperBoundError { counterexample, .. }
            | LowerBoundError { counterexample, .. }
            | GreatestLowerBoundError { counterexample, .. }
            | StrictError { counterexample, .. }
            | MonotoneError { counterexample, .. }
            | HeightNonNegativeError { counterexample, .. }
            | HeightStrictlyDecreasingError { counterexample, .. } => Some(counterexample),
            LeastElementError { .. } | GreatestElementError { .. } | Inconclusive { .. } => None,
        }
    }
}

/// Outcome of one property, tagged with what it checked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyReport {
    pub law: Law,
    pub location: SourceLocation,
    pub result: PropertyResult,
}

impl PropertyReport {
    /// Diagnostic for a property that did not verify
    pub fn error(&self) -> Option<VerifierError> {
        match &self.result {
            PropertyResult::Success { .. } => None,
            PropertyResult::Failure { error, .. } => Some(error.clone()),
            PropertyResult::Unknown { reason, .. } => Some(VerifierError::Inconclusive {
                law: self.law,
                location: self.location.clone(),
                reason: reason.clone(),
            }),
        }
    }
}

/// Results of a whole verification run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationSummary {
    pub properties: Vec<PropertyReport>,
    pub elapsed: Duration,
}

impl VerificationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of `property`
    pub fn push(&mut self, property: &Property, result: PropertyResult) {
        self.elapsed += result.stats().elapsed;
        self.properties.push(PropertyReport {
            law: property.law,
            location: property.location.clone(),
            result,
        });
    }

    pub fn total(&self) -> usize {
        self.properties.len()
    }

    pub fn successes(&self) -> usize {
        self.count(|r| matches!(r, PropertyResult::Success { .. }))
    }

    pub fn failures(&self) -> usize {
        self.count(|r| matches!(r, PropertyResult::Failure { .. }))
    }

    pub fn unknowns(&self) -> usize {
        self.count(|r| matches!(r, PropertyResult::Unknown { .. }))
    }

    fn count(&self, pred: impl Fn(&PropertyResult) -> bool) -> usize {
        self.properties.iter().filter(|p| pred(&p.result)).count()
    }

    pub fn total_paths(&self) -> usize {
        self.properties.iter().map(|p| p.result.stats().paths_explored).sum()
    }

    pub fn total_queries(&self) -> usize {
        self.properties.iter().map(|p| p.result.stats().queries_issued).sum()
    }

    /// True when every property verified
    pub fn all_verified(&self) -> bool {
        self.successes() == self.total()
    }

    /// Diagnostics for every property that did not verify, in property order
    pub fn errors(&self) -> Vec<VerifierError> {
        self.properties.iter().filter_map(PropertyReport::error).collect()
    }

    /// One line per property
    pub fn report_lines(&self) -> Vec<String> {
        self.properties
            .iter()
            .map(|p| {
                let stats = p.result.stats();
                let marker = match &p.result {
                    PropertyResult::Success { .. } => "✓",
                    PropertyResult::Failure { .. } => "✗",
                    PropertyResult::Unknown { .. } => "?",
                };
                format!(
                    "{} {} at {} (queries: {})",
                    marker, p.law, p.location, stats.queries_issued
                )
            })
            .collect()
    }

    /// Closing line with totals
    pub fn summary_line(&self) -> String {
        format!(
            "Verified {}/{} properties in {:.2}s (paths: {}, queries: {})",
            self.successes(),
            self.total(),
            self.elapsed.as_secs_f64(),
            self.total_paths(),
            self.total_queries()
        )
    }

    /// Per-property lines followed by the summary line
    pub fn report(&self) -> String {
        let mut out = String::new();
        for line in self.report_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&self.summary_line());
        out
    }

    /// Pretty-printed JSON for tooling
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
