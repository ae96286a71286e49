//! Lexical environment frames.
//!
//! Frames form a tree linked through `enclosing`. A frame is shared
//! (`Rc<RefCell<_>>`) because any number of closures may capture it after
//! the block that created it has exited; a write through one closure is
//! visible through every other that aliases the same frame.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    pub enclosing: Option<EnvRef>,
}

impl Environment {
    /// A root frame with no parent (the globals).
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    /// A child frame parented at `enclosing`.
    pub fn with_enclosing(enclosing: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }))
    }

    /// Bind `name` in this frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: this frame, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Dynamic assignment: first frame up the chain holding `name`.
    /// Returns false if no frame holds it.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }
}

/// Walk exactly `distance` enclosing links from `env`.
///
/// The resolver guarantees the chain is deep enough for every distance it
/// records; a missing ancestor would mean the side table and the runtime
/// chain have diverged.
pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
    let mut frame = Rc::clone(env);
    for _ in 0..distance {
        let parent = frame
            .borrow()
            .enclosing
            .as_ref()
            .map(Rc::clone)
            .expect("resolver distance exceeds environment chain depth");
        frame = parent;
    }
    frame
}

/// Read `name` from the frame exactly `distance` links out.
pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
    ancestor(env, distance).borrow().values.get(name).cloned()
}

/// Write `name` in the frame exactly `distance` links out.
pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
    let frame = ancestor(env, distance);
    let mut frame = frame.borrow_mut();
    if frame.values.contains_key(name) {
        frame.values.insert(name.to_string(), value);
        true
    } else {
        false
    }
}
