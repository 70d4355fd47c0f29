//! Classes: construction, inheritance, attribute lookup, bound methods.

use pretty_assertions::assert_eq;
use smython::{Exception, NoPrint, Object, Runtime};

fn run(source: &str) -> Object {
    let mut runtime = Runtime::new();
    runtime
        .execute_with(source, &mut NoPrint)
        .expect("script should succeed")
}

fn run_err(source: &str) -> String {
    let mut runtime = Runtime::new();
    match runtime.execute_with(source, &mut NoPrint) {
        Ok(value) => panic!("expected an error, got {value:?}"),
        Err(Exception::Uncaught(message)) => message,
        Err(other) => panic!("expected a runtime error, got {other}"),
    }
}

#[test]
fn init_binds_instance_attributes() {
    let source = "class Point:\n    def __init__(self, x, y):\n        self.x = x\n        self.y = y\np = Point(3, 4)\n(p.x, p.y)\n";
    assert_eq!(run(source).repr(), "(3, 4)");
}

#[test]
fn init_is_inherited() {
    let source = "class P:\n    def __init__(self, x):\n        self.x = x\nclass C(P): pass\nC(4).x\n";
    assert_eq!(run(source), Object::Int(4));
}

#[test]
fn class_without_init_takes_no_arguments() {
    assert!(run_err("class A: pass\nA(1)\n").starts_with("TypeError:"));
}

#[test]
fn class_attributes_are_shared_and_shadowable() {
    let source = "class A: pass\nA.x = 5\na = A()\nbefore = a.x\na.x = 6\n(before, a.x, A.x)\n";
    assert_eq!(run(source).repr(), "(5, 6, 5)");
}

#[test]
fn class_body_assignments_become_members() {
    let source = "class A:\n    tag = 'a'\n    def get(self):\n        return self.tag\nA().get()\n";
    assert_eq!(run(source).repr(), "'a'");
}

#[test]
fn methods_dispatch_through_the_superclass_chain() {
    let source = "class A:\n    def ping(self): return 'A'\nclass B(A): pass\nclass C(B):\n    def pong(self): return 'C'\nc = C()\nc.ping() + c.pong()\n";
    assert_eq!(run(source).repr(), "'AC'");
}

#[test]
fn subclass_overrides_win() {
    let source = "class A:\n    def ping(self): return 'A'\nclass B(A):\n    def ping(self): return 'B'\nB().ping()\n";
    assert_eq!(run(source).repr(), "'B'");
}

#[test]
fn explicit_none_superclass_is_allowed() {
    assert_eq!(run("class A(None): pass\nA()\nNone\n"), Object::None);
}

#[test]
fn superclass_must_be_a_class() {
    assert!(run_err("class A(3): pass\n").starts_with("TypeError:"));
}

#[test]
fn methods_can_call_methods_through_self() {
    let source = "class Counter:\n    def __init__(self):\n        self.n = 0\n    def bump(self):\n        self.n = self.n + 1\n        return self.n\n    def twice(self):\n        self.bump()\n        return self.bump()\nCounter().twice()\n";
    assert_eq!(run(source), Object::Int(2));
}

#[test]
fn bound_methods_are_fresh_pairs() {
    let source = "class A:\n    def m(self): return 1\na = A()\na.m is a.m\n";
    assert_eq!(run(source), Object::Bool(false));
}

#[test]
fn unbound_class_functions_take_an_explicit_receiver() {
    let source = "class A:\n    def m(self): return 41\nA.m(A()) + 1\n";
    assert_eq!(run(source), Object::Int(42));
}

#[test]
fn dunder_class_names_the_class() {
    let source = "class A: pass\nA().__class__\n";
    assert_eq!(run(source), Object::Repr("<class 'A'>".to_string()));
}

#[test]
fn missing_attribute_is_an_attribute_error() {
    let err = run_err("class A: pass\nA().nope\n");
    assert_eq!(err, "AttributeError: 'A' object has no attribute 'nope'");
}

#[test]
fn classes_may_reference_themselves() {
    // a class storing itself creates a cycle; the interpreter tolerates it
    let source = "class A: pass\nA.me = A\nA.me is A\n";
    assert_eq!(run(source), Object::Bool(true));
}

#[test]
fn instances_are_identity_equal() {
    let source = "class A: pass\na = A()\nb = A()\n(a == a, a == b)\n";
    assert_eq!(run(source).repr(), "(True, False)");
}
