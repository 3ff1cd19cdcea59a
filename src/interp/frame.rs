//! Call frames and the bounded call stack.

use std::collections::HashMap;

use crate::diagnostics::RuntimeError;
use crate::object::ObjectRef;
use crate::value::Value;

/// One activation: the executing class/method pair for diagnostics, the
/// receiver (if any), and block-scoped local storage.
#[derive(Debug)]
pub struct Frame {
    pub class: String,
    pub method: String,
    pub this: Option<ObjectRef>,
    scopes: Vec<HashMap<String, Value>>,
}

impl Frame {
    pub(crate) fn new(class: &str, method: &str, this: Option<ObjectRef>) -> Self {
        Self {
            class: class.to_string(),
            method: method.to_string(),
            this,
            scopes: vec![HashMap::new()],
        }
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a local in the innermost scope. Re-declaring a name in the
    /// same scope overwrites it; inner scopes shadow outer ones.
    pub(crate) fn declare(&mut self, name: String, value: Value) {
        self.scopes
            .last_mut()
            .expect("a frame always has at least one scope")
            .insert(name, value);
    }

    pub(crate) fn get(&self, name: &str) -> Option<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Some(value.clone());
            }
        }
        None
    }

    /// Assign to an existing local, innermost declaration first.
    pub(crate) fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(cell) = scope.get_mut(name) {
                *cell = value;
                return true;
            }
        }
        false
    }
}

/// Bookkeeping for active calls. Frames themselves live with their callers;
/// the stack records who is running and enforces the depth limit.
#[derive(Debug)]
pub struct CallStack {
    active: Vec<(String, String)>,
    capacity: usize,
}

impl CallStack {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            active: Vec::new(),
            capacity,
        }
    }

    pub(crate) fn push(&mut self, class: &str, method: &str) -> Result<(), RuntimeError> {
        if self.active.len() >= self.capacity {
            return Err(RuntimeError::StackOverflow {
                limit: self.capacity,
            });
        }
        self.active.push((class.to_string(), method.to_string()));
        Ok(())
    }

    pub(crate) fn pop(&mut self) {
        self.active.pop();
    }

    pub fn depth(&self) -> usize {
        self.active.len()
    }
}
