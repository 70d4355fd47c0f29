//! The `atexit` module stub: a callback registry.
//!
//! `register(f)` records the callable; the host drives execution through
//! [`Runtime::run_exit_callbacks`](crate::Runtime::run_exit_callbacks) after
//! the script finishes.

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunResult},
    modules::ModuleFunction,
    types::Module,
    value::Value,
};

pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    module.set(
        vm.interns.intern("register"),
        Value::ModuleFunction(ModuleFunction::AtexitRegister),
    );
    Ok(())
}

/// Records the callback and returns it, so `register` can be stacked.
pub fn register(vm: &mut Vm<'_>, mut args: Args) -> RunResult<Value> {
    if args.len() != 1 {
        return Err(ExcType::arg_count("register", 1, args.len()));
    }
    let callback = args.pop().expect("length checked");
    match &callback {
        Value::Function(_) | Value::BoundMethod(_) | Value::Builtin(_) | Value::ModuleFunction(_) | Value::Class(_) => {
            vm.exit_callbacks.push(callback.clone());
            Ok(callback)
        }
        other => Err(ExcType::not_callable(other.type_name())),
    }
}
