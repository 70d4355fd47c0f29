//! The module type: a name plus a globals mapping.

use std::{cell::RefCell, rc::Rc};

use crate::{
    intern::StringId,
    value::{Names, Value},
};

/// An imported module. Preinstalled modules get their attributes populated
/// natively; source-loaded modules share the globals map their top-level
/// suite was evaluated in.
#[derive(Debug)]
pub(crate) struct Module {
    name: StringId,
    globals: Rc<RefCell<Names>>,
}

impl Module {
    pub fn new(name: StringId) -> Self {
        Self {
            name,
            globals: Rc::new(RefCell::new(Names::default())),
        }
    }

    pub fn with_globals(name: StringId, globals: Rc<RefCell<Names>>) -> Self {
        Self { name, globals }
    }

    pub fn name(&self) -> StringId {
        self.name
    }

    pub fn globals(&self) -> &Rc<RefCell<Names>> {
        &self.globals
    }

    pub fn get(&self, name: StringId) -> Option<Value> {
        self.globals.borrow().get(&name).cloned()
    }

    pub fn set(&self, name: StringId, value: Value) {
        self.globals.borrow_mut().insert(name, value);
    }
}
