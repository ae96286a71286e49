//! Tree-walking evaluator.
//!
//! One evaluation rule per AST variant, executed synchronously and
//! sequentially over the statement list. Static errors never reach this
//! module; every error it produces is a runtime error, and the first one
//! aborts interpretation (fail-fast).
//!
//! `return` is not an error: it is the [`Flow`] control result threaded
//! through statement execution, unwinding exactly to the function call that
//! invoked the currently executing body.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{LoxError, Result};
use crate::resolver::Locals;
use crate::token::{Token, TokenType};
use crate::value::{LoxClass, LoxFunction, LoxInstance, NativeFunction, Value};

/// Upper bound on nested user-function calls. Each interpreted call expands
/// into a deep chain of host frames (`evaluate` → `call_value` →
/// `call_function` → `execute_block` → …), so the cap must stay well under
/// what a default 2 MiB thread stack holds in debug builds. Hitting it
/// converts runaway recursion into a reported runtime error instead of
/// crashing the host.
const MAX_CALL_DEPTH: usize = 64;

/// Outcome of executing one statement: fall through to the next, or unwind
/// to the nearest enclosing function call carrying the returned value.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    /// The global frame. Also the root of every environment chain.
    globals: EnvRef,

    /// The currently active frame.
    environment: EnvRef,

    /// Resolver side table: expression identity → scope distance.
    locals: Locals,

    /// Current user-call nesting, checked against [`MAX_CALL_DEPTH`].
    depth: usize,

    /// Sink for `print` output (stdout in the CLI, a buffer in tests).
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Creates a new Interpreter writing `print` output to `output`, with
    /// the native `clock` function pre-registered in the globals.
    pub fn new(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Environment::new();

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(Rc::new(NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args| {
                    let seconds = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map_err(|e| format!("Clock error: {}", e))?
                        .as_secs_f64();
                    Ok(Value::Number(seconds))
                },
            })),
        );

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            depth: 0,
            output,
        }
    }

    /// Merge a resolver side table in before interpreting the statements it
    /// was computed from. Extending (rather than replacing) keeps bindings
    /// from earlier REPL lines alive.
    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Interprets a program. The first runtime error aborts.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());
        for stmt in statements {
            let flow = self.execute(stmt)?;
            // the resolver rejects top-level 'return'
            debug_assert!(
                matches!(flow, Flow::Normal),
                "top-level statement produced a return"
            );
        }
        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────── statements ───────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, env)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.evaluate(condition)?;
                if is_truthy(&cond) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while {
                    let cond = self.evaluate(condition)?;
                    is_truthy(&cond)
                } {
                    if let Flow::Return(v) = self.execute(body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);
                // capture the frame active at the definition site
                let function = LoxFunction::new(
                    Rc::clone(decl),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Executes statements with `env` as the active frame, restoring the
    /// previous frame on every exit path — normal completion, `return`
    /// unwind, or runtime error — before propagating.
    fn execute_block(&mut self, statements: &[Stmt], env: EnvRef) -> Result<Flow> {
        let previous = Rc::clone(&self.environment);
        self.environment = env;

        let mut flow = Ok(Flow::Normal);
        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => continue,
                other => {
                    flow = other;
                    break;
                }
            }
        }

        self.environment = previous;
        flow
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::ast::FunctionDecl>],
    ) -> Result<Flow> {
        let superclass_value = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };
                    return Err(LoxError::runtime(line, "Superclass must be a class."));
                }
            },
            None => None,
        };

        // bind the name before evaluating methods so they may refer to it
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // with a superclass, method closures get an extra frame binding
        // 'super' to it
        let mut method_env = Rc::clone(&self.environment);
        if let Some(sc) = &superclass_value {
            method_env = Environment::with_enclosing(method_env);
            method_env
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(sc)));
        }

        let mut method_table = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            method_table.insert(
                method.name.lexeme.clone(),
                Rc::new(LoxFunction::new(
                    Rc::clone(method),
                    Rc::clone(&method_env),
                    is_initializer,
                )),
            );
        }

        let class = Value::Class(Rc::new(LoxClass {
            name: name.lexeme.clone(),
            superclass: superclass_value,
            methods: method_table,
        }));

        self.environment.borrow_mut().assign(&name.lexeme, class);
        Ok(Flow::Normal)
    }

    // ─────────────────────────── expressions ──────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                match operator.token_type {
                    TokenType::OR if is_truthy(&left_val) => Ok(left_val),
                    TokenType::AND if !is_truthy(&left_val) => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { name, id } => self.lookup_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value = self.evaluate(value)?;

                let assigned = match self.locals.get(id) {
                    Some(&distance) => environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if assigned {
                    Ok(value)
                } else {
                    Err(LoxError::runtime(
                        name.line,
                        format!("Undefined variable '{}'.", name.lexeme),
                    ))
                }
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee_val, args, paren)
            }

            Expr::Get { object, name } => {
                let object = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(
                        name.line,
                        "Only instances have properties.",
                    ));
                };

                // fields shadow methods
                if let Some(value) = instance.fields.borrow().get(&name.lexeme) {
                    return Ok(value.clone());
                }

                if let Some(method) = instance.class.find_method(&name.lexeme) {
                    return Ok(Value::Function(Rc::new(method.bind(Rc::clone(&instance)))));
                }

                Err(LoxError::runtime(
                    name.line,
                    format!("Undefined property '{}'.", name.lexeme),
                ))
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object = self.evaluate(object)?;

                let Value::Instance(instance) = object else {
                    return Err(LoxError::runtime(name.line, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance
                    .fields
                    .borrow_mut()
                    .insert(name.lexeme.clone(), value.clone());
                Ok(value)
            }

            Expr::This { keyword, id } => self.lookup_variable(keyword, *id),

            Expr::Super {
                keyword,
                method,
                id,
            } => {
                // the resolver rejects 'super' outside a subclass, so the
                // synthetic bindings exist whenever we get here
                let Some(&distance) = self.locals.get(id) else {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Can't use 'super' outside of a class.",
                    ));
                };

                let superclass = environment::get_at(&self.environment, distance, "super");
                let Some(Value::Class(superclass)) = superclass else {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Can't use 'super' outside of a class.",
                    ));
                };

                // 'this' lives one frame inside the 'super' frame; binding
                // it keeps the receiver the actual (possibly more-derived)
                // instance
                let this = environment::get_at(&self.environment, distance - 1, "this");
                let Some(Value::Instance(instance)) = this else {
                    return Err(LoxError::runtime(
                        keyword.line,
                        "Can't use 'super' outside of a class.",
                    ));
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),
                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )),
                }
            }
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),
            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(number_operands_error(operator)),
            },

            // IEEE-754 division: x/0 is ±inf, 0/0 is NaN
            TokenType::SLASH => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(number_operands_error(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
        }
    }

    /// Side-table-driven variable read: walk exactly the recorded number of
    /// enclosing links, or fall back to the global frame for unresolved
    /// names.
    fn lookup_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        let value = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            LoxError::runtime(
                name.line,
                format!("Undefined variable '{}'.", name.lexeme),
            )
        })
    }

    // ───────────────────────────── calls ──────────────────────────────

    fn call_value(&mut self, callee: Value, args: Vec<Value>, paren: &Token) -> Result<Value> {
        match callee {
            Value::NativeFunction(native) => {
                self.check_arity(native.arity, args.len(), paren)?;
                (native.func)(&args).map_err(|msg| LoxError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                self.check_arity(function.arity(), args.len(), paren)?;
                self.call_function(&function, args, paren)
            }

            Value::Class(class) => {
                self.check_arity(class.arity(), args.len(), paren)?;

                let instance = LoxInstance::new(Rc::clone(&class));

                if let Some(initializer) = class.find_method("init") {
                    let bound = initializer.bind(Rc::clone(&instance));
                    self.call_function(&bound, args, paren)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, expected: usize, got: usize, paren: &Token) -> Result<()> {
        if expected != got {
            return Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", expected, got),
            ));
        }
        Ok(())
    }

    /// Invoke a user-defined function: a fresh frame parented at the
    /// function's captured closure (not the caller's environment — this is
    /// what makes closures lexical rather than dynamic), parameters bound
    /// positionally, body executed as a block.
    fn call_function(
        &mut self,
        function: &LoxFunction,
        args: Vec<Value>,
        paren: &Token,
    ) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(LoxError::runtime(paren.line, "Stack overflow."));
        }

        let env = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.declaration.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, arg);
        }

        self.depth += 1;
        let flow = self.execute_block(&function.declaration.body, env);
        self.depth -= 1;

        let returned = match flow? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        };

        // 'init' always yields the constructed instance, whatever the body
        // returned
        if function.is_initializer {
            let this = environment::get_at(&function.closure, 0, "this");
            return match this {
                Some(instance) => Ok(instance),
                None => Ok(returned),
            };
        }

        Ok(returned)
    }
}

fn number_operands_error(operator: &Token) -> LoxError {
    LoxError::runtime(operator.line, "Operands must be numbers.")
}

/// Only `nil` and `false` are falsy; every other value (including `0` and
/// the empty string) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}
