use lucent_common::{Diagnostic, Span};
use thiserror::Error;

use super::types::Type;

/// Which namespace a failed lookup was searching. Only affects message
/// wording; both cases are the same diagnostic kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookingFor {
    Variable,
    Function,
}

impl std::fmt::Display for LookingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookingFor::Variable => write!(f, "variable"),
            LookingFor::Function => write!(f, "function"),
        }
    }
}

/// The closed set of semantic errors the checker can report.
///
/// Each variant carries the operands/types involved; the message text lives
/// in the `#[error]` attributes so callers construct diagnostics from
/// semantic content alone. None of these abort the pass: the checker assigns
/// `<error>` to the offending expression and keeps walking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("declaration of `{name}` conflicts with an earlier declaration in this scope")]
    DeclConflict { name: String },

    #[error("no declaration found for {looking_for} `{name}`")]
    IdentifierNotDeclared {
        name: String,
        looking_for: LookingFor,
    },

    #[error("`{name}` is not a function")]
    NotAFunction { name: String },

    #[error("cannot initialize `{name}` of type {declared} with a value of type {given}")]
    InvalidInitialization {
        name: String,
        declared: Type,
        given: Type,
    },

    #[error("operator '{op}' cannot be applied to {left} and {right}")]
    IncompatibleOperands {
        op: &'static str,
        left: Type,
        right: Type,
    },

    #[error("operator '{op}' cannot be applied to {operand}")]
    IncompatibleOperand { op: &'static str, operand: Type },

    #[error("`{name}` is not an array")]
    NotAnArray { name: String },

    #[error("cannot swizzle `{field}` on non-vector type {base}")]
    InaccessibleSwizzle { field: String, base: Type },

    #[error("invalid swizzle component in `{field}`: only x, y, z and w are allowed")]
    InvalidSwizzle { field: String },

    #[error("swizzle `{field}` selects a component outside {base}")]
    SwizzleOutOfBound { field: String, base: Type },

    #[error("swizzle `{field}` selects more than four components")]
    OversizedVector { field: String },

    #[error("too few arguments to `{name}`: expected {expected}, found {given}")]
    LessFormals {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("too many arguments to `{name}`: expected {expected}, found {given}")]
    ExtraFormals {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("argument {position} to `{name}` has type {given} but the formal is declared {expected}")]
    FormalsTypeMismatch {
        name: String,
        position: usize,
        expected: Type,
        given: Type,
    },

    #[error("test expression must have boolean type, found {found}")]
    TestNotBoolean { found: Type },

    #[error("return type mismatch: expected {expected}, found {found}")]
    ReturnMismatch { expected: Type, found: Type },

    #[error("`break` is only allowed inside a loop or switch")]
    BreakOutsideLoop,

    #[error("`continue` is only allowed inside a loop")]
    ContinueOutsideLoop,
}

impl SemanticError {
    /// Build the reportable diagnostic for this error at `span`.
    pub fn into_diagnostic(self, span: Span) -> Diagnostic {
        Diagnostic::error(self.to_string()).with_span(span)
    }
}
