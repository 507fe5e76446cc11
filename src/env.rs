// ABOUTME: Lexically nested environment, a linked chain of single-binding frames

use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// A lexically nested chain of bindings. Each frame binds exactly one name;
/// the frame chain itself is append-only (a new binding is a new head), but
/// the bound slot is mutable so `set!`, `define`, and `letrec` back-patching
/// can update it in place.
///
/// Closures capture an `Rc<Environment>` pointing at this exact chain, so
/// frame sharing is O(1) regardless of how many closures share a scope.
#[derive(Debug)]
pub enum Environment {
    Empty,
    Frame {
        name: String,
        value: RefCell<Value>,
        parent: Rc<Environment>,
    },
}

impl Environment {
    /// A fresh, empty chain.
    pub fn empty() -> Rc<Environment> {
        Rc::new(Environment::Empty)
    }

    /// A new chain with one more frame bound in front of `parent`. Does not
    /// mutate `parent`: the old chain remains valid for whoever still holds
    /// it (e.g. an earlier closure).
    pub fn extend(name: impl Into<String>, value: Value, parent: &Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment::Frame {
            name: name.into(),
            value: RefCell::new(value),
            parent: Rc::clone(parent),
        })
    }

    /// Walks the chain head-first, returning the first binding found.
    /// Inner bindings shadow outer ones of the same name.
    pub fn find(&self, name: &str) -> Option<Value> {
        match self {
            Environment::Empty => None,
            Environment::Frame {
                name: frame_name,
                value,
                parent,
            } => {
                if frame_name == name {
                    Some(value.borrow().clone())
                } else {
                    parent.find(name)
                }
            }
        }
    }

    /// Overwrites the innermost slot bound to `name`. Per §4.1, if no frame
    /// binds `name`, this is silently a no-op: callers that need the slot
    /// to exist (`define`, `letrec`) establish it with `extend` first.
    pub fn modify(&self, name: &str, new_value: Value) {
        match self {
            Environment::Empty => {}
            Environment::Frame {
                name: frame_name,
                value,
                parent,
            } => {
                if frame_name == name {
                    *value.borrow_mut() = new_value;
                } else {
                    parent.modify(name, new_value);
                }
            }
        }
    }

    /// True if some frame in the chain binds `name` (used to detect
    /// shadowing of reserved/primitive names while parsing).
    pub fn is_bound(&self, name: &str) -> bool {
        match self {
            Environment::Empty => false,
            Environment::Frame {
                name: frame_name,
                parent,
                ..
            } => frame_name == name || parent.is_bound(name),
        }
    }
}
