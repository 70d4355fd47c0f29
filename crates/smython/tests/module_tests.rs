//! Imports: the preinstalled stubs, source-loaded modules, and the runtime's
//! module cache.

use std::fs;

use pretty_assertions::assert_eq;
use smython::{CollectStringPrint, Exception, NoPrint, Object, Runtime};

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
fn missing_modules_raise_import_error() {
    assert_eq!(run_err("import nosuchmodule\n"), "ImportError: No module named 'nosuchmodule'");
}

#[test]
fn the_import_entry_point_returns_none_for_missing_modules() {
    let mut runtime = Runtime::new();
    assert_eq!(runtime.import("nosuchmodule").unwrap(), None);
    assert_eq!(
        runtime.import("time").unwrap(),
        Some(Object::Module("time".to_string()))
    );
}

#[test]
fn sys_modules_snapshots_the_cache() {
    assert_eq!(run("import time\nimport sys\nlen(sys.modules)\n"), Object::Int(2));
    assert_eq!(run("import sys\nhasattr(sys, 'modules')\n"), Object::Bool(true));
}

#[test]
fn modules_are_cached() {
    let source = "import time\nfirst = time\nimport time\nfirst is time\n";
    assert_eq!(run(source), Object::Bool(true));
}

#[test]
fn os_stub() {
    assert_eq!(run("import os\nos.getpid() > 0\n"), Object::Bool(true));
    assert_eq!(run("import os\nlen(os.getlogin()) > 0\n"), Object::Bool(true));
}

#[test]
fn random_stub_is_deterministic_when_seeded() {
    let source = "import random\nrandom.seed(42)\na = random.randint(1, 1000)\nrandom.seed(42)\nb = random.randint(1, 1000)\n(a == b, a >= 1, a <= 1000)\n";
    assert_eq!(run(source).repr(), "(True, True, True)");
    assert_eq!(run_err("import random\nrandom.randint(5, 1)\n"), "ValueError: empty range for randint()");
}

#[test]
fn curses_stub_hands_out_windows() {
    let source = "import curses\nw = curses.initscr()\ncurses.endwin()\nw.__class__\n";
    assert_eq!(run(source), Object::Repr("<class 'Window'>".to_string()));
}

#[test]
fn copy_stub_makes_shallow_copies() {
    let source = "import copy\nl = [1, 2]\nm = copy.copy(l)\n(l == m, l is m)\n";
    assert_eq!(run(source).repr(), "(True, False)");
    assert_eq!(run("import copy\ncopy.copy(5)\n"), Object::Int(5));
}

#[test]
fn atexit_callbacks_run_in_registration_order() {
    let mut runtime = Runtime::new();
    let mut print = CollectStringPrint::new();
    let source = "import atexit\ndef bye():\n    print('bye')\ndef last():\n    print('last')\natexit.register(bye)\natexit.register(last)\n";
    runtime.execute_with(source, &mut print).unwrap();
    assert_eq!(print.output(), "");
    runtime.run_exit_callbacks_with(&mut print).unwrap();
    assert_eq!(print.output(), "bye\nlast\n");
}

#[test]
fn from_import_installs_selected_names() {
    assert_eq!(run("from copy import copy\ncopy([1, 2])\n").repr(), "[1, 2]");
    assert!(run_err("from copy import nope\n").starts_with("ImportError:"));
}

#[test]
fn from_import_star_merges_globals() {
    assert_eq!(run("from os import *\ngetpid() > 0\n"), Object::Bool(true));
}

#[test]
fn source_modules_load_from_the_module_dir() {
    let dir = std::env::temp_dir().join(format!("smython-modules-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("helper.py"),
        "value = 41\ndef bump(n):\n    return n + 1\n",
    )
    .unwrap();

    let mut runtime = Runtime::new();
    runtime.set_module_dir(&dir);
    let result = runtime
        .execute_with("import helper\nhelper.bump(helper.value)\n", &mut NoPrint)
        .unwrap();
    assert_eq!(result, Object::Int(42));

    // the module evaluated once; a second import reuses the cache
    let again = runtime
        .execute_with("import helper\nhelper.value\n", &mut NoPrint)
        .unwrap();
    assert_eq!(again, Object::Int(41));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn source_module_syntax_errors_surface_as_raised_errors() {
    let dir = std::env::temp_dir().join(format!("smython-badmod-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("broken.py"), "x = = 1\n").unwrap();

    let mut runtime = Runtime::new();
    runtime.set_module_dir(&dir);
    let err = runtime
        .execute_with("import broken\n", &mut NoPrint)
        .unwrap_err();
    assert!(matches!(err, Exception::Uncaught(message) if message.starts_with("SyntaxError:")));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn check_scripts_parses_a_directory() {
    let dir = std::env::temp_dir().join(format!("smython-check-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("one.py"), "x = 1\n").unwrap();
    fs::write(dir.join("two.py"), "def f():\n    return 2\n").unwrap();
    fs::write(dir.join("ignored.txt"), "not python").unwrap();

    let mut runtime = Runtime::new();
    assert_eq!(runtime.check_scripts(&dir).unwrap(), 2);

    fs::write(dir.join("bad.py"), "def broken(:\n").unwrap();
    assert!(runtime.check_scripts(&dir).is_err());

    fs::remove_dir_all(&dir).ok();
}
