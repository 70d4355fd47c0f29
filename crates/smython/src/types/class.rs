//! Class objects, instances, and bound methods.
//!
//! A class stores its name, an optional superclass link, and its own
//! dictionary; attribute lookup climbs the superclass chain linearly (single
//! inheritance, no MRO). Calling a class constructs a fresh instance and runs
//! `__init__` if the chain defines one.
//!
//! The class dictionary is `Rc`-shared with the frame that evaluates the
//! class body, so every assignment in the body (including `def`) lands
//! directly in the class.

use std::{cell::RefCell, rc::Rc};

use crate::{
    intern::{StaticStrings, StringId},
    types::Function,
    value::{Names, Value},
};

#[derive(Debug)]
pub(crate) struct ClassObject {
    name: StringId,
    base: Option<Rc<ClassObject>>,
    namespace: Rc<RefCell<Names>>,
}

impl ClassObject {
    pub fn new(name: StringId, base: Option<Rc<ClassObject>>) -> Self {
        Self {
            name,
            base,
            namespace: Rc::new(RefCell::new(Names::default())),
        }
    }

    pub fn name(&self) -> StringId {
        self.name
    }

    /// The shared class dictionary, handed to the class-body frame as its
    /// locals.
    pub fn namespace(&self) -> Rc<RefCell<Names>> {
        Rc::clone(&self.namespace)
    }

    /// Looks up `name` on this class, then up the superclass chain.
    pub fn lookup(&self, name: StringId) -> Option<Value> {
        if let Some(value) = self.namespace.borrow().get(&name) {
            return Some(value.clone());
        }
        self.base.as_ref().and_then(|base| base.lookup(name))
    }

    pub fn set(&self, name: StringId, value: Value) {
        self.namespace.borrow_mut().insert(name, value);
    }
}

/// An instance: a class reference plus its own attribute dictionary.
#[derive(Debug)]
pub(crate) struct Instance {
    class: Rc<ClassObject>,
    attrs: RefCell<Names>,
}

impl Instance {
    pub fn new(class: Rc<ClassObject>) -> Self {
        Self {
            class,
            attrs: RefCell::new(Names::default()),
        }
    }

    pub fn class(&self) -> &Rc<ClassObject> {
        &self.class
    }

    /// Instance dict first, then the class chain. Functions retrieved from
    /// the class chain are wrapped as fresh bound methods pairing this
    /// receiver with the stored function.
    pub fn getattr(self: &Rc<Self>, name: StringId) -> Option<Value> {
        if name == StaticStrings::Class.id() {
            return Some(Value::Class(Rc::clone(&self.class)));
        }
        if let Some(value) = self.attrs.borrow().get(&name) {
            return Some(value.clone());
        }
        match self.class.lookup(name)? {
            Value::Function(function) => Some(Value::BoundMethod(Rc::new(BoundMethod {
                receiver: Value::Instance(Rc::clone(self)),
                function,
            }))),
            other => Some(other),
        }
    }

    /// Attribute writes always land in the instance's own dictionary.
    pub fn setattr(&self, name: StringId, value: Value) {
        self.attrs.borrow_mut().insert(name, value);
    }
}

/// A receiver/function pair produced by attribute access; calling it
/// prepends the receiver to the arguments.
#[derive(Debug)]
pub(crate) struct BoundMethod {
    pub receiver: Value,
    pub function: Rc<Function>,
}
