//! The `curses` module stub: a `Window` class plus `initscr`/`endwin`.
//!
//! No terminal is touched; `initscr()` hands back a blank `Window` instance
//! so scripts that set up and tear down a screen keep running.

use std::rc::Rc;

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunResult},
    intern::StaticStrings,
    modules::{ModuleFunction, check_zero_args},
    types::{ClassObject, Instance, Module},
    value::Value,
};

pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    let window = Rc::new(ClassObject::new(StaticStrings::Window.id(), None));
    module.set(StaticStrings::Window.id(), Value::Class(window));
    module.set(
        vm.interns.intern("initscr"),
        Value::ModuleFunction(ModuleFunction::CursesInitscr),
    );
    module.set(
        vm.interns.intern("endwin"),
        Value::ModuleFunction(ModuleFunction::CursesEndwin),
    );
    Ok(())
}

/// Returns a fresh `Window` instance.
pub fn initscr(vm: &mut Vm<'_>, args: &Args) -> RunResult<Value> {
    check_zero_args("initscr", args)?;
    let window_class = vm
        .modules
        .get(&StaticStrings::Curses.id())
        .and_then(|module| match module {
            Value::Module(module) => module.get(StaticStrings::Window.id()),
            _ => None,
        });
    match window_class {
        Some(Value::Class(class)) => Ok(Value::Instance(Rc::new(Instance::new(class)))),
        _ => Err(ExcType::TypeError.raise("curses is not initialized")),
    }
}

pub fn endwin(args: &Args) -> RunResult<Value> {
    check_zero_args("endwin", args)?;
    Ok(Value::None)
}
