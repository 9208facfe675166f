//! Lexically scoped environments.
//!
//! Environments are multi-owner: closures, derived scopes, the parser and
//! the REPL all hold handles into the same chain, so the chain lives behind
//! `Gc<GcCell<_>>` and is traced through both parents and bindings.

use std::collections::HashMap;
use std::fmt;

use gc::{Finalize, Gc, GcCell, Trace};

use super::macros::Macro;
use super::value::Value;

pub type GcShared<T> = Gc<GcCell<T>>;

pub fn shared<T: Trace>(value: T) -> GcShared<T> {
    Gc::new(GcCell::new(value))
}

/// A name denotes exactly one of a value or a macro.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Macro(Macro),
}

impl Finalize for Binding {}
unsafe impl Trace for Binding {
    gc::custom_trace!(this, {
        match this {
            Binding::Value(value) => mark(value),
            Binding::Macro(mac) => mark(mac),
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResult {
    NotExist,
    ExistValue,
    ExistMacro,
}

pub struct Environment {
    parent: Option<GcShared<Environment>>,
    bindings: HashMap<String, Binding>,
}

impl Finalize for Environment {}
unsafe impl Trace for Environment {
    gc::custom_trace!(this, {
        if let Some(parent) = &this.parent {
            mark(parent);
        }
        for binding in this.bindings.values() {
            mark(binding);
        }
    });
}

// Bindings can close over this same environment; printing keys only keeps
// Debug terminating.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl Environment {
    /// A fresh root scope.
    pub fn root() -> GcShared<Environment> {
        shared(Environment {
            parent: None,
            bindings: HashMap::new(),
        })
    }

    /// Look a name up, in this scope only or through the whole chain.
    pub fn find(&self, name: &str, current_only: bool) -> FindResult {
        match self.bindings.get(name) {
            Some(Binding::Value(_)) => return FindResult::ExistValue,
            Some(Binding::Macro(_)) => return FindResult::ExistMacro,
            None => {}
        }
        if current_only {
            return FindResult::NotExist;
        }
        let mut current = self.parent.clone();
        while let Some(env) = current {
            let scope = env.borrow();
            match scope.bindings.get(name) {
                Some(Binding::Value(_)) => return FindResult::ExistValue,
                Some(Binding::Macro(_)) => return FindResult::ExistMacro,
                None => {}
            }
            let next = scope.parent.clone();
            drop(scope);
            current = next;
        }
        FindResult::NotExist
    }

    pub fn get_value(&self, name: &str) -> Option<Value> {
        if let Some(Binding::Value(value)) = self.bindings.get(name) {
            return Some(value.clone());
        }
        let mut current = self.parent.clone();
        while let Some(env) = current {
            let scope = env.borrow();
            if let Some(Binding::Value(value)) = scope.bindings.get(name) {
                return Some(value.clone());
            }
            let next = scope.parent.clone();
            drop(scope);
            current = next;
        }
        None
    }

    pub fn get_macro(&self, name: &str) -> Option<Macro> {
        if let Some(Binding::Macro(mac)) = self.bindings.get(name) {
            return Some(mac.clone());
        }
        let mut current = self.parent.clone();
        while let Some(env) = current {
            let scope = env.borrow();
            if let Some(Binding::Macro(mac)) = scope.bindings.get(name) {
                return Some(mac.clone());
            }
            let next = scope.parent.clone();
            drop(scope);
            current = next;
        }
        None
    }

    /// Insert or overwrite in this scope only.
    pub fn define(&mut self, name: &str, binding: Binding) {
        self.bindings.insert(name.to_string(), binding);
    }

    /// Rebind the nearest visible value binding. Never creates; returns
    /// false when no scope in the chain holds the name as a value.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        let mut value = Some(value);
        if let Some(Binding::Value(slot)) = self.bindings.get_mut(name) {
            if let Some(v) = value.take() {
                *slot = v;
            }
            return true;
        }
        let mut current = self.parent.clone();
        while let Some(env) = current {
            {
                let mut scope = env.borrow_mut();
                if let Some(Binding::Value(slot)) = scope.bindings.get_mut(name) {
                    if let Some(v) = value.take() {
                        *slot = v;
                    }
                    return true;
                }
            }
            let next = env.borrow().parent.clone();
            current = next;
        }
        false
    }
}

/// Derive a child scope from a shared handle.
pub trait DeriveScope {
    fn derive(&self) -> Self;
}

impl DeriveScope for GcShared<Environment> {
    fn derive(&self) -> GcShared<Environment> {
        shared(Environment {
            parent: Some(self.clone()),
            bindings: HashMap::new(),
        })
    }
}

/// Ascend to the root of the chain.
pub fn global_of(env: &GcShared<Environment>) -> GcShared<Environment> {
    let mut current = env.clone();
    loop {
        let parent = current.borrow().parent.clone();
        match parent {
            Some(p) => current = p,
            None => return current,
        }
    }
}
