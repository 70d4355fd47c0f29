//! The `os` module stub: `getlogin` and `getpid`.

use crate::{
    eval::{Args, Vm},
    exceptions::RunResult,
    modules::{ModuleFunction, check_zero_args},
    types::Module,
    value::Value,
};

pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    module.set(
        vm.interns.intern("getlogin"),
        Value::ModuleFunction(ModuleFunction::OsGetlogin),
    );
    module.set(
        vm.interns.intern("getpid"),
        Value::ModuleFunction(ModuleFunction::OsGetpid),
    );
    Ok(())
}

/// The login name from the environment; a fixed fallback keeps sandboxed
/// runs deterministic.
pub fn getlogin(args: &Args) -> RunResult<Value> {
    check_zero_args("getlogin", args)?;
    let name = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "user".to_string());
    Ok(Value::new_str(name))
}

pub fn getpid(args: &Args) -> RunResult<Value> {
    check_zero_args("getpid", args)?;
    Ok(Value::Int(i64::from(std::process::id())))
}
