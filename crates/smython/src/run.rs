//! The runtime: builtin seeding, script execution, and module imports.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
};

use rand::rngs::StdRng;
use strum::IntoEnumIterator;

use crate::{
    builtins::Builtins,
    eval::{Args, Vm},
    exceptions::{Exception, RunError},
    frame::Frame,
    intern::Interns,
    io::{PrintWriter, StdPrint},
    modules,
    object::Object,
    parse::parse,
    value::{Names, Value},
};

/// One interpreter instance: the interned-name table, the builtins table,
/// the script globals, the module cache, and the `random`/`atexit` state.
/// Nothing is process-global; two runtimes in one process do not interact.
pub struct Runtime {
    interns: Interns,
    builtins: Rc<Names>,
    globals: Rc<RefCell<Names>>,
    modules: Names,
    module_dir: Option<PathBuf>,
    rng: Option<StdRng>,
    exit_callbacks: Vec<Value>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        let mut interns = Interns::new();
        let mut builtins = Names::default();
        for builtin in Builtins::iter() {
            builtins.insert(interns.intern(&builtin.to_string()), Value::Builtin(builtin));
        }
        Self {
            interns,
            builtins: Rc::new(builtins),
            globals: Rc::new(RefCell::new(Names::default())),
            modules: Names::default(),
            module_dir: None,
            rng: None,
            exit_callbacks: Vec::new(),
        }
    }

    /// Directory searched by `import` for `<name>.py` files.
    pub fn set_module_dir(&mut self, dir: impl Into<PathBuf>) {
        self.module_dir = Some(dir.into());
    }

    /// Parses and runs a script in the runtime's globals, writing `print`
    /// output to stdout. Returns the final value.
    pub fn execute(&mut self, source: &str) -> Result<Object, Exception> {
        self.execute_with(source, &mut StdPrint::new())
    }

    /// As [`Runtime::execute`], with `print` output routed to `print`.
    pub fn execute_with(&mut self, source: &str, print: &mut dyn PrintWriter) -> Result<Object, Exception> {
        let suite = parse(source, &mut self.interns)?;
        let frame = Frame::top(Rc::clone(&self.globals), Rc::clone(&self.builtins));
        let result = self.vm(print).eval_suite(&suite, &frame);
        match result {
            Ok(value) => Ok(Object::from_value(&value, &self.interns)),
            Err(err) => Err(self.to_exception(err)),
        }
    }

    /// Returns the named module, importing it on first use; `Ok(None)` when
    /// no such module exists. A source module's top-level `print` output
    /// goes to stdout.
    pub fn import(&mut self, name: &str) -> Result<Option<Object>, Exception> {
        self.import_with(name, &mut StdPrint::new())
    }

    /// As [`Runtime::import`], with `print` output routed to `print`.
    pub fn import_with(&mut self, name: &str, print: &mut dyn PrintWriter) -> Result<Option<Object>, Exception> {
        let id = self.interns.intern(name);
        let result = modules::import_module(&mut self.vm(print), id);
        match result {
            Ok(Some(value)) => Ok(Some(Object::from_value(&value, &self.interns))),
            Ok(None) => Ok(None),
            Err(err) => Err(self.to_exception(err)),
        }
    }

    /// Invokes the callbacks registered through `atexit.register`, in
    /// registration order. Call after the script finishes.
    pub fn run_exit_callbacks(&mut self) -> Result<(), Exception> {
        self.run_exit_callbacks_with(&mut StdPrint::new())
    }

    /// As [`Runtime::run_exit_callbacks`], with `print` output routed to
    /// `print`.
    pub fn run_exit_callbacks_with(&mut self, print: &mut dyn PrintWriter) -> Result<(), Exception> {
        let callbacks = std::mem::take(&mut self.exit_callbacks);
        let mut vm = self.vm(print);
        let mut result = Ok(());
        for callback in callbacks {
            if let Err(err) = vm.call_value(callback, Args::new()) {
                result = Err(err);
                break;
            }
        }
        result.map_err(|err| self.to_exception(err))
    }

    /// Parses every `.py` file in `dir` (without evaluating), returning how
    /// many parsed cleanly; the first syntax error aborts the scan.
    pub fn check_scripts(&mut self, dir: &Path) -> Result<usize, Exception> {
        let entries =
            std::fs::read_dir(dir).map_err(|err| Exception::Uncaught(format!("cannot read {}: {err}", dir.display())))?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "py"))
            .collect();
        paths.sort();
        let mut count = 0;
        for path in paths {
            let source = std::fs::read_to_string(&path)
                .map_err(|err| Exception::Uncaught(format!("cannot read {}: {err}", path.display())))?;
            parse(&source, &mut self.interns)?;
            count += 1;
        }
        Ok(count)
    }

    fn vm<'a>(&'a mut self, print: &'a mut dyn PrintWriter) -> Vm<'a> {
        Vm {
            interns: &mut self.interns,
            modules: &mut self.modules,
            module_dir: self.module_dir.as_deref(),
            rng: &mut self.rng,
            exit_callbacks: &mut self.exit_callbacks,
            print,
            builtins: Rc::clone(&self.builtins),
        }
    }

    /// Maps an unwind that reached the outermost evaluation to the host
    /// error surface.
    fn to_exception(&self, err: RunError) -> Exception {
        match err {
            RunError::Raise(value) => Exception::Uncaught(value.py_str(&self.interns)),
            RunError::Break => Exception::Uncaught("'break' outside loop".to_string()),
            RunError::Continue => Exception::Uncaught("'continue' outside loop".to_string()),
            RunError::Return(_) => Exception::Uncaught("'return' outside function".to_string()),
        }
    }
}
