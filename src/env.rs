//! Name-to-value bindings with lexical scoping.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::object::Object;

/// One scope frame, optionally chained to the frame it was opened in.
///
/// Frames are shared (`Rc`) and interiorly mutable because closures keep
/// their defining frame alive, and a frame can in turn hold the closure
/// (`let f = fn() { f() };`). Such cycles are retained until the outermost
/// frame is dropped.
pub struct Environment {
    store: RefCell<HashMap<String, Object>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates an outermost frame.
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// Creates a frame whose misses fall through to `outer`.
    pub fn enclosed(outer: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        match self.store.borrow().get(name) {
            Some(value) => Some(value.clone()),
            None => self.outer.as_ref().and_then(|outer| outer.get(name)),
        }
    }

    /// Binds `name` in this frame only, shadowing any outer binding.
    pub fn set(&self, name: &str, value: Object) {
        self.store.borrow_mut().insert(name.to_string(), value);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings can cycle back to this frame through closures, so only
        // the names are shown.
        let mut names: Vec<String> = self.store.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("names", &names)
            .field("has_outer", &self.outer.is_some())
            .finish()
    }
}
