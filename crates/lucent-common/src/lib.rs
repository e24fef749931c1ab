pub mod errors;
pub mod span;

pub use errors::{Diagnostic, DiagnosticBag, RelatedSpan, Severity};
pub use span::{Position, Span};
