//! The `sys` module stub: just `sys.modules`.

use std::{cell::RefCell, rc::Rc};

use crate::{
    eval::Vm,
    exceptions::RunResult,
    intern::StaticStrings,
    types::{Dict, Module},
    value::Value,
};

/// `sys.modules` is a snapshot of the module cache taken when `sys` is
/// imported, keyed by module name; the cache itself is not a live object.
pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    let mut modules = Dict::new();
    for (name, value) in vm.modules.iter() {
        modules.insert(Value::new_str(vm.interns.get(*name)), value.clone())?;
    }
    module.set(
        StaticStrings::Modules.id(),
        Value::Dict(Rc::new(RefCell::new(modules))),
    );
    Ok(())
}
