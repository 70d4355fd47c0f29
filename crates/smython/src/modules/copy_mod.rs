//! The `copy` module stub: shallow `copy`.

use std::{cell::RefCell, rc::Rc};

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunResult},
    modules::ModuleFunction,
    types::Module,
    value::Value,
};

pub fn populate(vm: &mut Vm<'_>, module: &Module) -> RunResult<()> {
    module.set(
        vm.interns.intern("copy"),
        Value::ModuleFunction(ModuleFunction::CopyCopy),
    );
    Ok(())
}

/// Shallow copy: a new container sharing the elements. Immutable values
/// (and everything identity-based) come back unchanged.
pub fn copy(args: &Args) -> RunResult<Value> {
    let value = match args.as_slice() {
        [value] => value,
        other => return Err(ExcType::arg_count("copy", 1, other.len())),
    };
    Ok(match value {
        Value::List(items) => Value::new_list(items.borrow().clone()),
        Value::Dict(dict) => Value::Dict(Rc::new(RefCell::new(dict.borrow().copied()))),
        Value::Set(set) => Value::Set(Rc::new(RefCell::new(set.borrow().copied()))),
        other => other.clone(),
    })
}
