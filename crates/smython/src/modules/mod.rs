//! The module registry: preinstalled stubs and source-loaded modules.
//!
//! `import` consults the runtime's cache first, then the table of
//! preinstalled modules, then `<module_dir>/<name>.py`. Source modules are
//! parsed and evaluated into a fresh globals map shared with the returned
//! module value, and cached by interned name.

use std::{cell::RefCell, rc::Rc};

use strum::Display;

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunError, RunResult},
    frame::Frame,
    intern::StringId,
    parse::parse,
    types::Module,
    value::{Names, Value},
};

pub(crate) mod atexit_mod;
pub(crate) mod copy_mod;
pub(crate) mod curses_mod;
pub(crate) mod os;
pub(crate) mod random_mod;
pub(crate) mod sys;
pub(crate) mod time_mod;

/// Functions exposed by the preinstalled modules. Display gives the Python
/// name used in repr output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub(crate) enum ModuleFunction {
    #[strum(serialize = "getlogin")]
    OsGetlogin,
    #[strum(serialize = "getpid")]
    OsGetpid,
    #[strum(serialize = "seed")]
    RandomSeed,
    #[strum(serialize = "randint")]
    RandomRandint,
    #[strum(serialize = "register")]
    AtexitRegister,
    #[strum(serialize = "copy")]
    CopyCopy,
    #[strum(serialize = "initscr")]
    CursesInitscr,
    #[strum(serialize = "endwin")]
    CursesEndwin,
}

impl ModuleFunction {
    pub fn call(self, vm: &mut Vm<'_>, args: Args) -> RunResult<Value> {
        match self {
            Self::OsGetlogin => os::getlogin(&args),
            Self::OsGetpid => os::getpid(&args),
            Self::RandomSeed => random_mod::seed(vm, &args),
            Self::RandomRandint => random_mod::randint(vm, &args),
            Self::AtexitRegister => atexit_mod::register(vm, args),
            Self::CopyCopy => copy_mod::copy(&args),
            Self::CursesInitscr => curses_mod::initscr(vm, &args),
            Self::CursesEndwin => curses_mod::endwin(&args),
        }
    }
}

/// Returns the module named `name`, importing it on first use. `Ok(None)`
/// means no such module exists anywhere.
pub(crate) fn import_module(vm: &mut Vm<'_>, name: StringId) -> RunResult<Option<Value>> {
    if let Some(module) = vm.modules.get(&name) {
        return Ok(Some(module.clone()));
    }
    let module_name = vm.interns.get(name).to_string();
    type PopulateFn = fn(&mut Vm<'_>, &Module) -> RunResult<()>;
    let populate: PopulateFn = match module_name.as_str() {
        "sys" => sys::populate,
        "os" => os::populate,
        "random" => random_mod::populate,
        "curses" => curses_mod::populate,
        "atexit" => atexit_mod::populate,
        "copy" => copy_mod::populate,
        "time" => time_mod::populate,
        _ => return load_source_module(vm, name, &module_name),
    };
    let module = Rc::new(Module::new(name));
    // registered before population so `sys.modules` sees itself
    vm.modules.insert(name, Value::Module(Rc::clone(&module)));
    populate(vm, &module)?;
    Ok(Some(Value::Module(module)))
}

/// Reads `<module_dir>/<name>.py`, evaluates it into a fresh globals map,
/// and caches the resulting module.
fn load_source_module(vm: &mut Vm<'_>, name: StringId, module_name: &str) -> RunResult<Option<Value>> {
    let Some(dir) = vm.module_dir else {
        return Ok(None);
    };
    let path = dir.join(format!("{module_name}.py"));
    let Ok(source) = std::fs::read_to_string(&path) else {
        return Ok(None);
    };
    let suite = parse(&source, vm.interns).map_err(|err| RunError::Raise(Value::new_str(err.to_string())))?;
    let globals = Rc::new(RefCell::new(Names::default()));
    let frame = Frame::top(Rc::clone(&globals), Rc::clone(&vm.builtins));
    vm.eval_suite(&suite, &frame)?;
    let module = Rc::new(Module::with_globals(name, globals));
    vm.modules.insert(name, Value::Module(Rc::clone(&module)));
    Ok(Some(Value::Module(module)))
}

/// Arity check shared by the module functions.
pub(crate) fn check_zero_args(name: &str, args: &Args) -> RunResult<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ExcType::TypeError.raise(format_args!("{name}() takes no arguments ({} given)", args.len())))
    }
}
