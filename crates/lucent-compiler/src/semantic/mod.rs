pub mod diagnostics;
pub mod resolver;
pub mod scope;
pub mod type_checker;
pub mod types;

use lucent_common::DiagnosticBag;

use crate::ast::nodes::Program;

/// Run semantic analysis on the given program.
///
/// Returns a `DiagnosticBag` containing any errors and warnings found.
/// The pass performs, in one depth-first walk:
///  1. Name resolution through a stack of lexical scopes
///  2. Type checking (operators, swizzles, indexing, initializers, calls)
///  3. Control-flow validation (break/continue placement, return types)
///  4. Unused variable warnings
///
/// Diagnostics never abort the walk; the whole tree is always checked.
pub fn analyze(program: &Program) -> DiagnosticBag {
    resolver::Resolver::new().resolve(program)
}
