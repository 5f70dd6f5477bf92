//! Error types for the law verifier
//!
//! These are *defects*: conditions that abort a verification run. Law
//! violations found while checking are not errors in this sense, they are
//! collected as [`crate::verify::VerifierError`] diagnostics.

use thiserror::Error;

use crate::verify::VerifierError;

/// Lawcheck errors
#[derive(Error, Debug, Clone)]
pub enum Error {
    // Enumeration / lowering gaps
    /// A construct the checker does not handle
    ///
    /// **Triggered by:** Tuple-typed quantified variables, recursive sum types
    /// reached during enumeration, exponentiation in a path condition
    /// **Example:** `forall (p : (i32, i32)). ...`
    #[error("Unsupported construct: {what}")]
    Unsupported {
        /// Description of the construct
        what: String,
    },

    /// An operand type could not be determined or is not lowerable
    ///
    /// **Triggered by:** A comparison whose left operand has no declared type,
    /// or a string/char value reaching bit-vector lowering
    #[error("Ill-typed constraint: {message}")]
    IllTyped {
        /// Error description
        message: String,
    },

    /// Reference to a sum type or function missing from the program table
    #[error("Unknown {kind}: {name}")]
    UnknownDefinition {
        /// "sum type" or "function"
        kind: &'static str,
        /// Missing name
        name: String,
    },

    /// The same quantified variable name was bound twice
    #[error("Duplicate quantified variable: {name}")]
    DuplicateVariable {
        /// Variable name
        name: String,
    },

    // Evaluation
    /// The evaluator failed while exploring a branch
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Evaluator produced a non-boolean value for a law expression
    #[error("Law expression produced a non-boolean value: {value}")]
    NonBooleanResult {
        /// Rendered value
        value: String,
    },

    /// Call depth exceeded while inlining functions
    #[error("Call depth limit exceeded (max: {limit})")]
    CallDepthExceeded {
        /// Maximum allowed depth
        limit: usize,
    },

    // Solver
    /// The external solver misbehaved (I/O, protocol, unexpected reply)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Solver binary could not be started
    #[error("Solver not available: {0}")]
    SolverUnavailable(String),

    // Configuration
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Outcome
    /// One or more properties failed; compilation unit rejected
    #[error(
        "Verification failed: {} propert{} did not hold",
        errors.len(),
        if errors.len() == 1 { "y" } else { "ies" }
    )]
    VerificationFailed {
        /// Every collected diagnostic, in property order
        errors: Vec<VerifierError>,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal defect; the run cannot continue
    Fatal,
    /// Environment problem that may go away on retry (solver missing, I/O)
    Recoverable,
    /// The program was checked and rejected
    Diagnostic,
}

impl Error {
    /// Create an unsupported-construct error
    pub fn unsupported(what: impl Into<String>) -> Self {
        Error::Unsupported { what: what.into() }
    }

    /// Create an ill-typed constraint error
    pub fn ill_typed(message: impl Into<String>) -> Self {
        Error::IllTyped {
            message: message.into(),
        }
    }

    /// Create an evaluation error with a message
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Error::Evaluation(msg.into())
    }

    /// Create a solver error with a message
    pub fn solver(msg: impl Into<String>) -> Self {
        Error::Solver(msg.into())
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self {
            Error::Solver(_) | Error::SolverUnavailable(_) | Error::Config(_) => {
                ErrorSeverity::Recoverable
            }
            Error::VerificationFailed { .. } => ErrorSeverity::Diagnostic,
            _ => ErrorSeverity::Fatal,
        }
    }

    /// Diagnostics carried by a failed verification, empty otherwise
    pub fn diagnostics(&self) -> &[VerifierError] {
        match self {
            Error::VerificationFailed { errors } => errors,
            _ => &[],
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Solver(e.to_string())
    }
}

/// Result type for lawcheck operations
pub type Result<T> = std::result::Result<T, Error>;
