//! End-to-end scenarios: expressions, operators, slicing, and the overall
//! execute surface.

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
fn factorial() {
    let source = "def fac(n):\n    if n == 0: return 1\n    return n * fac(n - 1)\nfac(10)\n";
    assert_eq!(run(source), Object::Int(3_628_800));
}

#[test]
fn tuple_unpacking_swaps() {
    let result = run("a, b = 1, 2\n(b, a)\n");
    assert_eq!(result.repr(), "(2, 1)");
}

#[test]
fn inherited_bound_method() {
    let source = "class A:\n    def greet(self): return 'hi'\nclass B(A): pass\nB().greet()\n";
    assert_eq!(run(source), Object::Str("hi".to_string()));
}

#[test]
fn while_else_runs_on_normal_exit() {
    let source = "i = 0\nwhile i < 3:\n    i = i + 1\nelse:\n    i = -i\ni\n";
    assert_eq!(run(source), Object::Int(-3));
}

#[test]
fn except_matches_by_value() {
    let source = "x = 0\ntry:\n    raise 'e'\nexcept 'e' as v:\n    x = 1\nx\n";
    assert_eq!(run(source), Object::Int(1));
}

#[test]
fn string_slice() {
    assert_eq!(run("'abcdef'[1:-1]\n").repr(), "'bcde'");
}

#[test]
fn empty_program_evaluates_to_none() {
    assert_eq!(run(""), Object::None);
}

#[test]
fn arithmetic() {
    assert_eq!(run("2 + 3 * 4\n"), Object::Int(14));
    assert_eq!(run("7 % 3\n"), Object::Int(1));
    assert_eq!(run("-7 % 3\n"), Object::Int(-1));
    assert_eq!(run("2.5 + 1\n"), Object::Float(3.5));
    assert_eq!(run("-(3)\n"), Object::Int(-3));
    assert_eq!(run("1 | 6\n"), Object::Int(7));
    assert_eq!(run("3 & 6\n"), Object::Int(2));
}

#[test]
fn division_is_float_division() {
    assert_eq!(run("7 / 2\n"), Object::Float(3.5));
    assert_eq!(run("4 / 2\n").repr(), "2.0");
    assert_eq!(run("1 / 0\n"), Object::Float(f64::INFINITY));
}

#[test]
fn sequence_operators() {
    assert_eq!(run("'a' + 'b'\n").repr(), "'ab'");
    assert_eq!(run("'ab' * 3\n").repr(), "'ababab'");
    assert_eq!(run("[1] + [2]\n").repr(), "[1, 2]");
    assert_eq!(run("[0] * 3\n").repr(), "[0, 0, 0]");
    assert_eq!(run("(1,) + (2, 3)\n").repr(), "(1, 2, 3)");
}

#[test]
fn mixed_operands_raise_type_errors() {
    assert!(run_err("1 + 'a'\n").starts_with("TypeError:"));
    assert!(run_err("'a' | 1\n").starts_with("TypeError:"));
    assert!(run_err("'a' < 1\n").starts_with("TypeError:"));
}

#[test]
fn comparison_chains_short_circuit() {
    assert_eq!(run("1 < 2 < 3\n"), Object::Bool(true));
    assert_eq!(run("1 < 3 < 2\n"), Object::Bool(false));
    // the third operand is never evaluated once a link is false
    let source = "def boom():\n    raise 'boom'\n1 > 2 > boom()\n";
    assert_eq!(run(source), Object::Bool(false));
}

#[test]
fn membership_and_identity() {
    assert_eq!(run("2 in [1, 2]\n"), Object::Bool(true));
    assert_eq!(run("'bc' in 'abc'\n"), Object::Bool(true));
    assert_eq!(run("'x' not in 'abc'\n"), Object::Bool(true));
    assert_eq!(run("3 in {1: 'a', 3: 'b'}\n"), Object::Bool(true));
    assert_eq!(run("a = [1]\nb = a\na is b\n"), Object::Bool(true));
    assert_eq!(run("[1] is [1]\n"), Object::Bool(false));
    assert_eq!(run("None is None\n"), Object::Bool(true));
}

#[test]
fn boolean_operators_return_operands() {
    assert_eq!(run("0 or 'x'\n").repr(), "'x'");
    assert_eq!(run("0 and 'x'\n"), Object::Int(0));
    assert_eq!(run("not 0\n"), Object::Bool(true));
}

#[test]
fn conditional_expression() {
    assert_eq!(run("'yes' if 1 else 'no'\n").repr(), "'yes'");
    assert_eq!(run("'yes' if 0 else 'no'\n").repr(), "'no'");
}

#[test]
fn list_slices_copy() {
    assert_eq!(run("l = [1, 2, 3]\n(l[:] == l, l[:] is l)\n").repr(), "(True, False)");
    assert_eq!(run("len([0, 1, 2, 3, 4][1:3])\n"), Object::Int(2));
    assert_eq!(run("[0, 1, 2, 3][-3:-1]\n").repr(), "[1, 2]");
    assert_eq!(run("[1, 2][5:9]\n").repr(), "[]");
}

#[test]
fn string_indexing() {
    assert_eq!(run("'abc'[0]\n").repr(), "'a'");
    assert_eq!(run("'abc'[-1]\n").repr(), "'c'");
    assert!(run_err("'abc'[3]\n").starts_with("IndexError:"));
}

#[test]
fn slice_step_is_reserved() {
    assert!(run_err("'abc'[::2]\n").starts_with("NotImplementedError:"));
}

#[test]
fn subscript_assignment_is_reserved() {
    assert!(run_err("l = [1]\nl[0] = 2\n").starts_with("NotImplementedError:"));
    assert!(run_err("l = [1]\nl[0] += 1\n").starts_with("NotImplementedError:"));
}

#[test]
fn dict_indexing_defaults_to_none() {
    assert_eq!(run("d = {'a': 1}\nd['a']\n"), Object::Int(1));
    assert_eq!(run("d = {'a': 1}\nd['zz']\n"), Object::None);
}

#[test]
fn dict_iterates_pairs() {
    let source = "total = ''\nfor k, v in {'a': 1, 'b': 2}:\n    total = total + k\ntotal\n";
    assert_eq!(run(source).repr(), "'ab'");
}

#[test]
fn for_visits_in_order_and_else_runs_without_break() {
    assert_eq!(run("total = 0\nfor e in [1, 2, 3]:\n    total = total * 10 + e\ntotal\n"), Object::Int(123));
    let with_else = "r = 0\nfor e in [1, 2, 3]:\n    pass\nelse:\n    r = 99\nr\n";
    assert_eq!(run(with_else), Object::Int(99));
    let with_break = "r = 0\nfor e in [1, 2, 3]:\n    if e == 2: break\nelse:\n    r = 99\nr\n";
    assert_eq!(run(with_break), Object::Int(0));
}

#[test]
fn continue_skips_to_the_next_element() {
    let source = "total = 0\nfor e in [1, 2, 3, 4]:\n    if e % 2: continue\n    total = total + e\ntotal\n";
    assert_eq!(run(source), Object::Int(6));
}

#[test]
fn iterating_a_number_is_a_type_error() {
    assert!(run_err("for x in 5:\n    pass\n").starts_with("TypeError:"));
}

#[test]
fn augmented_assignment() {
    assert_eq!(run("x = 1\nx += 2\nx\n"), Object::Int(3));
    assert_eq!(run("x = 7\nx %= 4\nx\n"), Object::Int(3));
    assert_eq!(run("x = 12\nx &= 10\nx |= 1\nx\n"), Object::Int(9));
    assert_eq!(run("x = 'a'\nx += 'b'\nx\n").repr(), "'ab'");
}

#[test]
fn augmented_assignment_reads_before_writing() {
    assert!(run_err("x += 1\n").starts_with("NameError:"));
}

#[test]
fn semicolons_and_continuations() {
    assert_eq!(run("a = 1; b = 2; a + b\n"), Object::Int(3));
    assert_eq!(run("x = 1 + \\\n2\nx\n"), Object::Int(3));
    assert_eq!(run("x = 1 # trailing comment\nx\n"), Object::Int(1));
}

#[test]
fn adjacent_string_literals_concatenate() {
    assert_eq!(run("'ab' 'cd'\n").repr(), "'abcd'");
}

#[test]
fn set_literals_deduplicate() {
    assert_eq!(run("len({1, 2, 2})\n"), Object::Int(2));
    assert_eq!(run("2 in {1, 2}\n"), Object::Bool(true));
}

#[test]
fn unhashable_keys_are_rejected() {
    assert!(run_err("{[1]: 2}\n").starts_with("TypeError: unhashable"));
    assert!(run_err("x = {1: 2} in {3}\n").starts_with("TypeError: unhashable"));
}

#[test]
fn uncaught_control_flow_is_reported() {
    assert_eq!(run_err("break\n"), "'break' outside loop");
    assert_eq!(run_err("continue\n"), "'continue' outside loop");
    assert_eq!(run_err("return 1\n"), "'return' outside function");
}

#[test]
fn syntax_errors_carry_line_numbers() {
    let mut runtime = Runtime::new();
    let err = runtime.execute("x = 1\ny = = 2\n").unwrap_err();
    assert_eq!(
        err.to_string(),
        "SyntaxError: unexpected '=' (line 2)"
    );
}
