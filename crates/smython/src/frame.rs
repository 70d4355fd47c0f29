//! Frames: the evaluation environment.
//!
//! A frame is a lexical chain of bindings: a locals map, an optional parent
//! link, the shared module globals, and the shared read-only builtins table.
//! At the top frame of a script or module, locals and globals are the same
//! map, which is why top-level assignment writes to globals. A class body
//! evaluates in a frame whose locals *is* the class dictionary.
//!
//! Assignment writes to the first enclosing frame that already binds the
//! name, otherwise it defines the name in the current frame. There is no
//! `nonlocal` keyword; this enclosing-write rule is how closures mutate
//! enclosing state in the dialect. The `global` statement overrides the rule
//! and routes writes for the declared names straight to module globals.

use std::{cell::RefCell, rc::Rc};

use ahash::AHashSet;

use crate::{
    intern::StringId,
    value::{Names, Value},
};

#[derive(Debug)]
pub(crate) struct Frame {
    parent: Option<Rc<Frame>>,
    locals: Rc<RefCell<Names>>,
    globals: Rc<RefCell<Names>>,
    builtins: Rc<Names>,
    /// Names declared `global` in this frame.
    global_decls: RefCell<AHashSet<StringId>>,
    /// Class-body frames define every assignment locally, so `def`s become
    /// class members even when an enclosing frame binds the same name.
    class_scope: bool,
}

impl Frame {
    /// The top frame of a script or module: locals and globals are one map.
    pub fn top(globals: Rc<RefCell<Names>>, builtins: Rc<Names>) -> Rc<Self> {
        Rc::new(Self {
            parent: None,
            locals: Rc::clone(&globals),
            globals,
            builtins,
            global_decls: RefCell::new(AHashSet::new()),
            class_scope: false,
        })
    }

    /// A call or clause frame: fresh locals, everything else inherited.
    pub fn nested(parent: &Rc<Self>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(Rc::clone(parent)),
            locals: Rc::new(RefCell::new(Names::default())),
            globals: Rc::clone(&parent.globals),
            builtins: Rc::clone(&parent.builtins),
            global_decls: RefCell::new(AHashSet::new()),
            class_scope: false,
        })
    }

    /// A class-body frame whose locals is the class dictionary.
    pub fn class_body(parent: &Rc<Self>, namespace: Rc<RefCell<Names>>) -> Rc<Self> {
        Rc::new(Self {
            parent: Some(Rc::clone(parent)),
            locals: namespace,
            globals: Rc::clone(&parent.globals),
            builtins: Rc::clone(&parent.builtins),
            global_decls: RefCell::new(AHashSet::new()),
            class_scope: true,
        })
    }

    pub fn locals(&self) -> &Rc<RefCell<Names>> {
        &self.locals
    }

    /// Lookup order: locals, parent chain, globals, builtins.
    pub fn get(&self, name: StringId) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.locals.borrow().get(&name) {
                return Some(value.clone());
            }
            match &frame.parent {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        if let Some(value) = self.globals.borrow().get(&name) {
            return Some(value.clone());
        }
        self.builtins.get(&name).cloned()
    }

    /// The dialect's assignment rule.
    pub fn set(&self, name: StringId, value: Value) {
        if self.global_decls.borrow().contains(&name) {
            self.globals.borrow_mut().insert(name, value);
            return;
        }
        if !self.class_scope {
            let mut frame = self;
            loop {
                if frame.locals.borrow().contains_key(&name) {
                    frame.locals.borrow_mut().insert(name, value);
                    return;
                }
                match &frame.parent {
                    Some(parent) => frame = parent,
                    None => break,
                }
            }
        }
        self.locals.borrow_mut().insert(name, value);
    }

    /// Binds `name` in this frame's locals unconditionally. Used for
    /// parameters and `except … as` captures, which never write outward.
    pub fn define(&self, name: StringId, value: Value) {
        self.locals.borrow_mut().insert(name, value);
    }

    /// Records a `global` declaration for this frame.
    pub fn declare_global(&self, name: StringId) {
        self.global_decls.borrow_mut().insert(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interns;

    fn setup() -> (Interns, Rc<Frame>) {
        let interns = Interns::new();
        let globals = Rc::new(RefCell::new(Names::default()));
        let builtins = Rc::new(Names::default());
        (interns, Frame::top(globals, builtins))
    }

    #[test]
    fn top_level_assignment_writes_globals() {
        let (mut interns, top) = setup();
        let x = interns.intern("x");
        top.set(x, Value::Int(1));
        assert_eq!(top.get(x), Some(Value::Int(1)));
    }

    #[test]
    fn nested_frames_read_through_the_chain() {
        let (mut interns, top) = setup();
        let x = interns.intern("x");
        top.set(x, Value::Int(7));
        let inner = Frame::nested(&Frame::nested(&top));
        assert_eq!(inner.get(x), Some(Value::Int(7)));
    }

    #[test]
    fn assignment_writes_to_the_frame_that_binds_the_name() {
        let (mut interns, top) = setup();
        let x = interns.intern("x");
        let outer = Frame::nested(&top);
        outer.define(x, Value::Int(1));
        let inner = Frame::nested(&outer);
        inner.set(x, Value::Int(2));
        assert_eq!(outer.get(x), Some(Value::Int(2)));
        assert!(inner.locals().borrow().get(&x).is_none());
    }

    #[test]
    fn unbound_assignment_defines_locally() {
        let (mut interns, top) = setup();
        let y = interns.intern("y");
        let inner = Frame::nested(&top);
        inner.set(y, Value::Int(3));
        assert_eq!(inner.locals().borrow().get(&y), Some(&Value::Int(3)));
        assert_eq!(top.get(y), None);
    }

    #[test]
    fn global_declaration_routes_writes_to_globals() {
        let (mut interns, top) = setup();
        let x = interns.intern("x");
        let inner = Frame::nested(&top);
        inner.declare_global(x);
        inner.set(x, Value::Int(9));
        assert_eq!(top.get(x), Some(Value::Int(9)));
        assert!(inner.locals().borrow().get(&x).is_none());
    }

    #[test]
    fn class_scope_defines_locally_despite_outer_binding() {
        let (mut interns, top) = setup();
        let f = interns.intern("f");
        top.set(f, Value::Int(1));
        let namespace = Rc::new(RefCell::new(Names::default()));
        let body = Frame::class_body(&top, Rc::clone(&namespace));
        body.set(f, Value::Int(2));
        assert_eq!(namespace.borrow().get(&f), Some(&Value::Int(2)));
        assert_eq!(top.get(f), Some(Value::Int(1)));
    }
}
