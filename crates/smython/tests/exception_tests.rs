//! Raising, catching, try/else/finally, and control-flow unwinding.

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
fn bare_except_catches_anything() {
    let source = "x = 0\ntry:\n    undefined_name\nexcept:\n    x = 1\nx\n";
    assert_eq!(run(source), Object::Int(1));
}

#[test]
fn clauses_are_tried_in_order() {
    let source = "r = 0\ntry:\n    raise 'b'\nexcept 'a':\n    r = 1\nexcept 'b':\n    r = 2\nexcept:\n    r = 3\nr\n";
    assert_eq!(run(source), Object::Int(2));
}

#[test]
fn unmatched_exceptions_propagate() {
    assert_eq!(run_err("try:\n    raise 'a'\nexcept 'b':\n    pass\n"), "a");
}

#[test]
fn raised_values_need_not_be_strings() {
    let source = "r = 0\ntry:\n    raise 42\nexcept 42 as v:\n    r = v\nr\n";
    assert_eq!(run(source), Object::Int(42));
}

#[test]
fn else_runs_only_without_exception() {
    let clean = "r = 0\ntry:\n    r = 1\nexcept:\n    r = 2\nelse:\n    r = 3\nr\n";
    assert_eq!(run(clean), Object::Int(3));
    let raised = "r = 0\ntry:\n    raise 'e'\nexcept:\n    r = 2\nelse:\n    r = 3\nr\n";
    assert_eq!(run(raised), Object::Int(2));
}

#[test]
fn finally_runs_on_success_and_on_raise() {
    let clean = "x = 0\ntry:\n    y = 1\nfinally:\n    x = 1\nx\n";
    assert_eq!(run(clean), Object::Int(1));
    let raised = "x = 0\ntry:\n    try:\n        raise 'e'\n    finally:\n        x = 1\nexcept 'e':\n    x = x + 1\nx\n";
    assert_eq!(run(raised), Object::Int(2));
}

#[test]
fn finally_runs_when_a_function_returns() {
    let source = "x = 0\ndef f():\n    try:\n        return 1\n    finally:\n        x = 2\nr = f()\n(r, x)\n";
    assert_eq!(run(source).repr(), "(1, 2)");
}

#[test]
fn finally_runs_when_a_loop_breaks() {
    let source = "x = 0\nwhile True:\n    try:\n        break\n    finally:\n        x = 1\nx\n";
    assert_eq!(run(source), Object::Int(1));
}

#[test]
fn except_binds_the_raised_value_in_a_child_frame() {
    // the capture name does not leak into the enclosing frame
    let source = "try:\n    raise 'e'\nexcept 'e' as v:\n    pass\nv\n";
    assert!(run_err(source).starts_with("NameError:"));
}

#[test]
fn return_propagates_through_except_bodies() {
    let source = "def f():\n    try:\n        raise 'e'\n    except 'e':\n        return 7\nf()\n";
    assert_eq!(run(source), Object::Int(7));
}

#[test]
fn builtin_errors_are_catchable() {
    let source = "x = 0\ntry:\n    len(1)\nexcept:\n    x = 1\nx\n";
    assert_eq!(run(source), Object::Int(1));
}

#[test]
fn assert_raises_on_falsy() {
    assert_eq!(run("assert 1 == 1\nNone\n"), Object::None);
    assert_eq!(run_err("assert 1 == 2\n"), "AssertionError");
    assert_eq!(run_err("assert False, 'nope'\n"), "AssertionError: nope");
}

#[test]
fn assert_message_is_lazy() {
    // the message expression is only evaluated when the test fails
    assert_eq!(run("assert True, undefined_name\nNone\n"), Object::None);
}

#[test]
fn uncaught_builtin_errors_name_their_kind() {
    assert_eq!(run_err("undefined\n"), "NameError: name 'undefined' is not defined");
    assert!(run_err("len(1)\n").starts_with("TypeError:"));
    assert!(run_err("(1)(2)\n").starts_with("TypeError:"));
}

#[test]
fn unpacking_errors() {
    assert_eq!(
        run_err("a, b, c = 1, 2\n"),
        "ValueError: not enough values to unpack (expected 3, got 2)"
    );
    assert_eq!(
        run_err("a, b = 1, 2, 3\n"),
        "ValueError: too many values to unpack (expected 2)"
    );
    assert!(run_err("a, b = 5\n").starts_with("TypeError:"));
}
