//! Static resolver pass.
//!
//! One walk over the already-built AST, independent of any runtime values,
//! doing three things:
//!
//! 1. Build lexical scopes (a stack of `HashMap<String, bool>` tracking
//!    declared/defined) mirroring the environment chain the interpreter will
//!    build at runtime.
//! 2. Report static errors: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside a function,
//!    returning a value from `init`, `this`/`super` outside their legal
//!    contexts, a class inheriting from itself. Errors are accumulated, not
//!    raised — the walk always finishes so one run surfaces them all.
//! 3. Record, for each resolvable expression, the number of scopes between
//!    its use and its binding. Unrecorded expressions are globals and are
//!    looked up dynamically at runtime.
//!
//! `this` and `super` are resolved exactly like ordinary variables, through
//! synthetic bindings pushed around class bodies, so their recorded
//! distances are reused unchanged by the interpreter.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Are we inside a user function, and which kind? Used to validate `return`
/// and the `init` value rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// Are we inside a class body? Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Side table produced by the resolver: expression identity → scope
/// distance (0 = innermost enclosing scope). Computed once, never
/// recomputed; the interpreter consults it for every variable access.
pub type Locals = HashMap<ExprId, usize>;

/// Resolver: tracks scopes, enforces static rules, and records binding
/// distances into the side table.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    locals: Locals,
    errors: Vec<LoxError>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");
        Resolver {
            scopes: Vec::new(),
            locals: Locals::new(),
            errors: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top-level statements. Returns the side table and every
    /// static error found.
    pub fn resolve(mut self, statements: &[Stmt]) -> (Locals, Vec<LoxError>) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
        (self.locals, self.errors)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        debug!("Resolving stmt: {:?}", stmt);
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so a read of the
                // name inside its own initializer is catchable
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible inside its own body (recursion)
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                if let Some(superclass) = superclass {
                    if let Expr::Variable {
                        name: super_name, ..
                    } = superclass
                    {
                        if super_name.lexeme == name.lexeme {
                            self.error(super_name, "A class can't inherit from itself.");
                        }
                    }

                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);

                    // scope holding the synthetic 'super' binding
                    self.begin_scope();
                    self.scopes
                        .last_mut()
                        .expect("scope just pushed")
                        .insert("super".to_string(), true);
                }

                // scope holding the synthetic 'this' binding
                self.begin_scope();
                self.scopes
                    .last_mut()
                    .expect("scope just pushed")
                    .insert("this".to_string(), true);

                for method in methods {
                    let declaration = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };
                    self.resolve_function(method, declaration);
                }

                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        debug!("Resolving expr: {:?}", expr);
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { name, id } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(*id, name);
            }

            Expr::Assign { name, value, id } => {
                // resolve RHS first, then bind the target
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { keyword, id } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { keyword, id, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                        return;
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                        return;
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, decl: &FunctionDecl, ftype: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = ftype;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                let err = LoxError::resolve(
                    name.line,
                    &name.lexeme,
                    "Already a variable with this name in this scope.",
                );
                self.errors.push(err);
                return;
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors
            .push(LoxError::resolve(token.line, &token.lexeme, message));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this variable occurrence as a local at the first matching
    /// depth (innermost → outermost). Not found in any scope ⇒ global,
    /// resolved by direct lookup at runtime.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
