//! Abstract syntax tree for Lox: two closed tagged unions, [`Expr`] and
//! [`Stmt`], built by the parser and consumed (pattern-matched exhaustively)
//! by the resolver, the interpreter, and the debug printer.
//!
//! Nodes are immutable trees with no cycles. Function declarations are held
//! behind `Rc` so that a runtime function value can share the declaration
//! with the tree instead of cloning parameter lists and bodies per call.

use crate::token::Token;
use std::rc::Rc;

/// Identity of a resolvable expression node, assigned by the parser.
///
/// The resolver's side table maps these ids to lexical scope distances; only
/// the four expression forms that name a binding (`Variable`, `Assign`,
/// `This`, `Super`) carry one.
pub type ExprId = u32;

/// A literal constant that appears directly in the source code.
///
/// These variants are the terminal leaves of the expression tree and do not
/// retain a reference to the originating [`Token`]; the parser copies the
/// value at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal, stored as IEEE-754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// AST node representing every kind of expression in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub-expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression: `!isReady` or `-42`.
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        /// Operator token such as `+`, `*`, `==`, …
        operator: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { name: Token, id: ExprId },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        name: Token,
        value: Box<Expr>,
        id: ExprId,
    },

    /// Function, method, or class call: `clock()` or `add(1, 2)`.
    Call {
        /// Expression that evaluates to a callable.
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        /// Argument list (may be empty, capped at 255).
        arguments: Vec<Expr>,
    },

    /// Property read: `object.property`.
    Get { object: Box<Expr>, name: Token },

    /// Property write: `object.property = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { keyword: Token, id: ExprId },

    /// Superclass method access: `super.method`.
    Super {
        keyword: Token,
        method: Token,
        id: ExprId,
    },
}

/// A function or method declaration: name, parameter tokens, body.
///
/// Shared between the `Stmt` tree and any runtime function value closing
/// over it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

/// AST node for statements. A program is a sequence of these, returned by
/// the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand-alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop. `for` loops are desugared into this form by the parser.
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration — becomes a first-class callable value.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for static error locations).
        keyword: Token,

        /// Optional expression to return. Absent ⇒ `nil`.
        value: Option<Expr>,
    },

    /// Class declaration with optional single superclass.
    Class {
        name: Token,

        /// Always an `Expr::Variable` when present, so the resolver can
        /// record its scope distance like any other variable reference.
        superclass: Option<Expr>,

        methods: Vec<Rc<FunctionDecl>>,
    },
}
