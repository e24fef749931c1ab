//! Lucent shading language compiler front half: the AST model produced by
//! the parser and the semantic analysis that checks it.
//!
//! The semantic phase is the interesting part: [`semantic::analyze`] walks a
//! [`ast::Program`], resolves names through a stack of lexical scopes, infers
//! and checks types against a small fixed GLSL-like lattice, validates
//! control flow (break/continue/return placement), and collects everything it
//! finds into a [`lucent_common::DiagnosticBag`] without ever stopping early.

pub mod ast;
pub mod semantic;
