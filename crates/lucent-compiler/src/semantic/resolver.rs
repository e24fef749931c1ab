use lucent_common::{DiagnosticBag, Span};

use crate::ast::nodes::*;

use super::diagnostics::{LookingFor, SemanticError};
use super::scope::{ScopeKind, ScopeStack, Symbol, SymbolKind};
use super::type_checker;
use super::types::Type;

/// Single-pass name resolver, type checker, and control-flow validator.
///
/// Walks the program depth-first. Declarations register symbols as they are
/// encountered (declare-before-use, no forward references). Expression
/// checking returns the resolved type of the expression; a failed rule
/// reports once, yields `<error>`, and `<error>` then converts to and from
/// everything so the failure does not echo through enclosing expressions.
pub struct Resolver {
    scopes: ScopeStack,
    diagnostics: DiagnosticBag,
    /// Declared return type of the enclosing function (if any).
    current_function_return: Option<Type>,
    /// That return type is non-void, so `return;` alone is a mismatch.
    requires_return_value: bool,
    /// Whether the function currently being checked has seen a `return`.
    has_return: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            diagnostics: DiagnosticBag::new(),
            current_function_return: None,
            requires_return_value: false,
            has_return: false,
        }
    }

    /// Run the pass and return accumulated diagnostics.
    pub fn resolve(mut self, program: &Program) -> DiagnosticBag {
        for decl in &program.decls {
            self.check_decl(decl);
        }
        debug_assert!(self.scopes.at_global());
        self.diagnostics
    }

    fn report(&mut self, err: SemanticError, span: Span) {
        self.diagnostics.report(err.into_diagnostic(span));
    }

    /// Run `f` inside a fresh scope of the given kind. Entering scopes only
    /// through this helper keeps every push paired with a pop on every exit
    /// path, and funnels the popped scope through the unused-variable check.
    fn scoped<R>(&mut self, kind: ScopeKind, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(kind);
        let out = f(self);
        let idx = self.scopes.pop();
        self.emit_unused_warnings(idx);
        out
    }

    // ====================================================================
    // Declarations
    // ====================================================================

    fn check_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(v) => self.check_var_decl(v),
            Decl::Fn(f) => self.check_fn_decl(f),
        }
    }

    /// Also used for formal parameters, which are variable declarations in
    /// the function scope.
    fn check_var_decl(&mut self, var: &VarDecl) {
        self.report_local_conflict(&var.name, &var.span);

        // Register before checking the initializer (the new name is in
        // scope on its own right-hand side), and register even after a
        // conflict so later references resolve instead of cascading.
        let declared = Type::from_annotation(&var.declared_type);
        self.scopes
            .define(Symbol::variable(&var.name, declared.clone(), var.span.clone()));

        if let Some(ref init) = var.initializer {
            let given = self.check_expr(init);
            if !given.is_error() && !given.is_convertible_to(&declared) {
                self.report(
                    SemanticError::InvalidInitialization {
                        name: var.name.clone(),
                        declared,
                        given,
                    },
                    init.span.clone(),
                );
            }
        }
    }

    fn check_fn_decl(&mut self, func: &FnDecl) {
        self.report_local_conflict(&func.name, &func.span);

        let return_type = Type::from_annotation(&func.return_type);
        let params: Vec<Type> = func
            .formals
            .iter()
            .map(|f| Type::from_annotation(&f.declared_type))
            .collect();
        self.scopes.define(Symbol::function(
            &func.name,
            params,
            return_type.clone(),
            func.span.clone(),
        ));

        let prev_return = self.current_function_return.take();
        let prev_requires = self.requires_return_value;
        let prev_has = self.has_return;
        self.requires_return_value = return_type != Type::Void;
        self.current_function_return = Some(return_type);
        self.has_return = false;

        // Formals and body share the function scope, so a local that
        // redeclares a formal is a conflict.
        self.scoped(ScopeKind::Function, |r| {
            for formal in &func.formals {
                r.check_var_decl(formal);
            }
            if let Some(ref body) = func.body {
                r.check_block(body);
            }
        });

        self.current_function_return = prev_return;
        self.requires_return_value = prev_requires;
        self.has_return = prev_has;
    }

    fn report_local_conflict(&mut self, name: &str, span: &Span) {
        if let Some(prev) = self.scopes.lookup_local(name) {
            let prev_span = prev.defined_at.clone();
            self.diagnostics.report(
                SemanticError::DeclConflict {
                    name: name.to_string(),
                }
                .into_diagnostic(span.clone())
                .with_related(prev_span, "previously declared here"),
            );
        }
    }

    // ====================================================================
    // Blocks and statements
    // ====================================================================

    /// A block does not open a scope; the construct that owns it already
    /// did (function, branch, loop, switch).
    fn check_block(&mut self, block: &Block) {
        for decl in &block.decls {
            self.check_var_decl(decl);
        }
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(v) => self.check_var_decl(v),
            Stmt::Expr(e) => {
                self.check_expr(e);
            }
            Stmt::Block(b) => self.check_block(b),
            Stmt::If(s) => self.check_if(s),
            Stmt::For(s) => self.check_for(s),
            Stmt::While(s) => self.check_while(s),
            Stmt::Switch(s) => self.check_switch(s),
            Stmt::Return(s) => self.check_return(s),
            Stmt::Break(s) => self.check_break(s),
            Stmt::Continue(s) => self.check_continue(s),
        }
    }

    /// Loop and branch tests must be boolean. Non-fatal: checking continues
    /// either way. A test that already failed to check is not re-reported.
    fn check_test(&mut self, test: &Expr) {
        let ty = self.check_expr(test);
        if !ty.is_error() && !ty.is_equivalent_to(&Type::Bool) {
            self.report(SemanticError::TestNotBoolean { found: ty }, test.span.clone());
        }
    }

    fn check_if(&mut self, stmt: &IfStmt) {
        self.check_test(&stmt.test);
        self.scoped(ScopeKind::Block, |r| r.check_stmt(&stmt.then_branch));
        if let Some(ref else_branch) = stmt.else_branch {
            self.scoped(ScopeKind::Block, |r| r.check_stmt(else_branch));
        }
    }

    fn check_for(&mut self, stmt: &ForStmt) {
        if let Some(ref init) = stmt.init {
            self.check_expr(init);
        }
        self.check_test(&stmt.test);
        if let Some(ref step) = stmt.step {
            self.check_expr(step);
        }
        self.scoped(ScopeKind::Loop, |r| r.check_stmt(&stmt.body));
    }

    fn check_while(&mut self, stmt: &WhileStmt) {
        self.check_test(&stmt.test);
        self.scoped(ScopeKind::Loop, |r| r.check_stmt(&stmt.body));
    }

    fn check_switch(&mut self, stmt: &SwitchStmt) {
        self.check_expr(&stmt.discriminant);
        self.scoped(ScopeKind::Switch, |r| {
            if let Some(ref default) = stmt.default {
                for s in &default.body {
                    r.check_stmt(s);
                }
            }
            for case in &stmt.cases {
                r.check_expr(&case.label);
                for s in &case.body {
                    r.check_stmt(s);
                }
            }
        });
    }

    fn check_return(&mut self, stmt: &ReturnStmt) {
        self.has_return = true;

        match stmt.value {
            None => {
                if self.requires_return_value {
                    let expected = self
                        .current_function_return
                        .clone()
                        .unwrap_or(Type::Void);
                    self.report(
                        SemanticError::ReturnMismatch {
                            expected,
                            found: Type::Void,
                        },
                        stmt.span.clone(),
                    );
                }
            }
            Some(ref value) => {
                let found = self.check_expr(value);
                if found.is_error() {
                    return;
                }
                if !self.requires_return_value {
                    if !found.is_equivalent_to(&Type::Void) {
                        self.report(
                            SemanticError::ReturnMismatch {
                                expected: Type::Void,
                                found,
                            },
                            stmt.span.clone(),
                        );
                    }
                } else if let Some(expected) = self.current_function_return.clone() {
                    if !found.is_equivalent_to(&expected) {
                        self.report(
                            SemanticError::ReturnMismatch { expected, found },
                            stmt.span.clone(),
                        );
                    }
                }
            }
        }
    }

    fn check_break(&mut self, stmt: &BreakStmt) {
        if !self.scopes.in_loop() && !self.scopes.in_switch() {
            self.report(SemanticError::BreakOutsideLoop, stmt.span.clone());
        }
    }

    fn check_continue(&mut self, stmt: &ContinueStmt) {
        if !self.scopes.in_loop() {
            self.report(SemanticError::ContinueOutsideLoop, stmt.span.clone());
        }
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    /// Check an expression and return its resolved type. Every failing rule
    /// has already reported by the time `<error>` comes back.
    fn check_expr(&mut self, expr: &Expr) -> Type {
        match &expr.kind {
            ExprKind::IntLiteral(_) => Type::Int,
            ExprKind::FloatLiteral(_) => Type::Float,
            ExprKind::BoolLiteral(_) => Type::Bool,

            ExprKind::Var(name) => self.check_var_ref(name, &expr.span),

            ExprKind::Binary { left, op, right } => {
                let lty = self.check_expr(left);
                let rty = self.check_expr(right);
                match type_checker::check_binary_op(&lty, *op, &rty) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report(err, expr.span.clone());
                        Type::Error
                    }
                }
            }

            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                match type_checker::check_unary_op(*op, &ty) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report(err, expr.span.clone());
                        Type::Error
                    }
                }
            }

            ExprKind::Postfix { operand, op } => {
                let ty = self.check_expr(operand);
                match type_checker::check_postfix_op(&ty, *op) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report(err, expr.span.clone());
                        Type::Error
                    }
                }
            }

            ExprKind::Assign { left, op, right } => {
                let lty = self.check_expr(left);
                let rty = self.check_expr(right);
                match type_checker::check_assignment(&lty, *op, &rty) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report(err, expr.span.clone());
                        Type::Error
                    }
                }
            }

            ExprKind::Index { base, index } => self.check_index(base, index),

            ExprKind::Field { base, field } => {
                let base_ty = self.check_expr(base);
                match type_checker::check_swizzle(&base_ty, field) {
                    Ok(ty) => ty,
                    Err(err) => {
                        self.report(err, expr.span.clone());
                        Type::Error
                    }
                }
            }

            ExprKind::Call { callee, args } => self.check_call(callee, args, &expr.span),
        }
    }

    fn check_var_ref(&mut self, name: &str, span: &Span) -> Type {
        let resolved = match self.scopes.lookup_mut(name) {
            Some(sym) => {
                sym.used = true;
                match &sym.kind {
                    SymbolKind::Variable { ty } => Some(Some(ty.clone())),
                    SymbolKind::Function { .. } => Some(None),
                }
            }
            None => None,
        };
        match resolved {
            Some(Some(ty)) => ty,
            // Declared, but not as a variable: poisoned without a second
            // diagnostic of its own.
            Some(None) => Type::Error,
            None => {
                self.report(
                    SemanticError::IdentifierNotDeclared {
                        name: name.to_string(),
                        looking_for: LookingFor::Variable,
                    },
                    span.clone(),
                );
                Type::Error
            }
        }
    }

    fn check_index(&mut self, base: &Expr, index: &Expr) -> Type {
        let base_ty = self.check_expr(base);
        // The subscript participates in name resolution; its type is
        // unconstrained in this rule set.
        self.check_expr(index);

        if base_ty.is_error() {
            return Type::Error;
        }
        if base_ty.is_matrix() {
            return base_ty.row_vector();
        }
        if let Type::Array(elem) = base_ty {
            return *elem;
        }
        // Only a bare variable base names the culprit; other base shapes
        // are poisoned silently.
        if let ExprKind::Var(name) = &base.kind {
            self.report(
                SemanticError::NotAnArray { name: name.clone() },
                base.span.clone(),
            );
        }
        Type::Error
    }

    fn check_call(&mut self, callee: &str, args: &[Expr], span: &Span) -> Type {
        let resolved = match self.scopes.lookup_mut(callee) {
            Some(sym) => {
                sym.used = true;
                match &sym.kind {
                    SymbolKind::Function {
                        params,
                        return_type,
                    } => Some(Some((params.clone(), return_type.clone()))),
                    SymbolKind::Variable { .. } => Some(None),
                }
            }
            None => None,
        };
        let (params, return_type) = match resolved {
            Some(Some(sig)) => sig,
            Some(None) => {
                self.report(
                    SemanticError::NotAFunction {
                        name: callee.to_string(),
                    },
                    span.clone(),
                );
                return Type::Error;
            }
            None => {
                self.report(
                    SemanticError::IdentifierNotDeclared {
                        name: callee.to_string(),
                        looking_for: LookingFor::Function,
                    },
                    span.clone(),
                );
                return Type::Error;
            }
        };

        // On an arity mismatch the actuals are not checked at all.
        if args.len() < params.len() {
            self.report(
                SemanticError::LessFormals {
                    name: callee.to_string(),
                    expected: params.len(),
                    given: args.len(),
                },
                span.clone(),
            );
            return Type::Error;
        }
        if args.len() > params.len() {
            self.report(
                SemanticError::ExtraFormals {
                    name: callee.to_string(),
                    expected: params.len(),
                    given: args.len(),
                },
                span.clone(),
            );
            return Type::Error;
        }

        // Actuals must be equivalent (not merely convertible) to their
        // formals. The first mismatch reports and stops; an actual that
        // already failed to check is skipped, not a mismatch.
        for (i, (arg, formal_ty)) in args.iter().zip(&params).enumerate() {
            let given = self.check_expr(arg);
            if given.is_error() {
                continue;
            }
            if !given.is_equivalent_to(formal_ty) {
                self.report(
                    SemanticError::FormalsTypeMismatch {
                        name: callee.to_string(),
                        position: i + 1,
                        expected: formal_ty.clone(),
                        given,
                    },
                    arg.span.clone(),
                );
                return Type::Error;
            }
        }

        return_type
    }

    // ====================================================================
    // Helpers
    // ====================================================================

    /// Emit unused-variable warnings for the scope at `scope_idx`.
    fn emit_unused_warnings(&mut self, scope_idx: usize) {
        // Collect first to avoid overlapping borrows on self.
        let unused: Vec<(String, Span)> = self
            .scopes
            .get_scope(scope_idx)
            .symbols
            .values()
            .filter(|sym| {
                !sym.used
                    && !sym.name.starts_with('_')
                    && matches!(sym.kind, SymbolKind::Variable { .. })
            })
            .map(|sym| (sym.name.clone(), sym.defined_at.clone()))
            .collect();

        for (name, span) in unused {
            self.diagnostics
                .warning(format!("unused variable `{}`", name), span);
        }
    }
}

// ========================================================================
// Tests
// ========================================================================
