//! Runtime value domain and the callable/object model.
//!
//! `Value` is a closed tagged union: every operator implementation in the
//! interpreter pattern-matches it and rejects unsupported combinations
//! explicitly — there is no implicit coercion anywhere.
//!
//! Functions, classes, and instances live behind `Rc` because they escape
//! the expression that created them: a closure outlives its defining call
//! frame, a class outlives its declaration statement, and an instance lives
//! as long as anything can reach it.

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A host-provided function: fixed arity plus native behavior.
pub struct NativeFunction {
    pub name: String,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A user-defined function: its declaration, the environment frame captured
/// at its definition site, and whether it is a class `init` method.
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a bound method: a new closure whose environment layers a
    /// `this` binding over this method's original captured environment, so
    /// the method can be called later with the correct receiver.
    pub fn bind(&self, instance: Rc<LoxInstance>) -> LoxFunction {
        let env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.borrow_mut().define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

/// A class: name, optional superclass, and method table closed over the
/// class's declaring environment. Immutable once the class statement
/// finishes executing.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    pub methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    /// Method lookup: own table first, then up the inheritance chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<LoxFunction>> {
        if let Some(method) = self.methods.get(name) {
            Some(Rc::clone(method))
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }

    /// Construction arity: the initializer's arity, or zero if none.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

/// An instance: a reference to its class plus a mutable field map.
/// Fields shadow methods on property access.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    pub fields: RefCell<HashMap<String, Value>>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Rc<Self> {
        Rc::new(LoxInstance {
            class,
            fields: RefCell::new(HashMap::new()),
        })
    }
}

/// The dynamic value domain: `nil`, booleans, double-precision numbers,
/// strings, callables (function/native/class), and instances.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<LoxInstance>),
}

impl PartialEq for Value {
    /// Value equality within a type, identity for object-like values,
    /// `false` across types. No coercion.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // integral numbers print without a trailing ".0"
                if n.fract() == 0.0 && n.is_finite() {
                    let mut buf = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(native) => write!(f, "<native fn {}>", native.name),

            Value::Function(func) => write!(f, "<fn {}>", func.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.class.name),
        }
    }
}
