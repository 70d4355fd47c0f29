//! The builtin functions seeded at startup.
//!
//! `Builtins` is a fieldless enum dispatched with an explicit match; the
//! strum derives give each variant its lowercase Python name for the
//! builtins table and for repr output.

use std::rc::Rc;

use strum::{Display, EnumIter, EnumString};

use crate::{
    eval::{Args, Vm},
    exceptions::{ExcType, RunResult},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Builtins {
    Print,
    Len,
    Slice,
    Del,
    Range,
    Hasattr,
    Chr,
    Ord,
}

impl Builtins {
    pub fn call(self, vm: &mut Vm<'_>, args: Args) -> RunResult<Value> {
        match self {
            Self::Print => builtin_print(vm, args),
            Self::Len => builtin_len(&args),
            Self::Slice => builtin_slice(args),
            Self::Del => builtin_del(&args),
            Self::Range => builtin_range(&args),
            Self::Hasattr => builtin_hasattr(vm, &args),
            Self::Chr => builtin_chr(&args),
            Self::Ord => builtin_ord(&args),
        }
    }
}

/// Writes the space-separated `str` forms of the arguments followed by a
/// newline.
fn builtin_print(vm: &mut Vm<'_>, args: Args) -> RunResult<Value> {
    let mut first = true;
    for value in &args {
        if first {
            first = false;
        } else {
            vm.print.stdout_push(' ');
        }
        let text = value.py_str(vm.interns);
        vm.print.stdout_write(text.into());
    }
    vm.print.stdout_push('\n');
    Ok(Value::None)
}

fn one_arg<'a>(name: &str, args: &'a Args) -> RunResult<&'a Value> {
    match args.as_slice() {
        [value] => Ok(value),
        other => Err(ExcType::arg_count(name, 1, other.len())),
    }
}

fn two_args<'a>(name: &str, args: &'a Args) -> RunResult<(&'a Value, &'a Value)> {
    match args.as_slice() {
        [a, b] => Ok((a, b)),
        other => Err(ExcType::arg_count(name, 2, other.len())),
    }
}

fn builtin_len(args: &Args) -> RunResult<Value> {
    let value = one_arg("len", args)?;
    match value.py_len() {
        Some(len) => Ok(Value::Int(len as i64)),
        None => Err(ExcType::TypeError.raise(format_args!("object of type '{}' has no len()", value.type_name()))),
    }
}

/// Builds the 3-tuple `(start, stop, step)`. One argument is a bare stop,
/// mirroring `range`; the parser always supplies all three.
fn builtin_slice(mut args: Args) -> RunResult<Value> {
    match args.len() {
        1 => {
            let stop = args.pop().expect("length checked");
            Ok(Value::new_tuple(vec![Value::None, stop, Value::None]))
        }
        2 => Ok(Value::new_tuple(vec![
            args[0].clone(),
            args[1].clone(),
            Value::None,
        ])),
        3 => Ok(Value::new_tuple(args.into_vec())),
        other => Err(ExcType::TypeError.raise(format_args!(
            "slice() takes from 1 to 3 positional arguments but {other} were given"
        ))),
    }
}

/// Removes an index from a list or dict, or a slice 3-tuple range from a
/// list. Removing an absent dict key is not an error.
fn builtin_del(args: &Args) -> RunResult<Value> {
    let (container, index) = two_args("del", args)?;
    match container {
        Value::List(items) => {
            if let Value::Tuple(parts) = index {
                if parts.len() == 3 {
                    return del_list_range(items, &parts[0], &parts[1], &parts[2]);
                }
            }
            let len = items.borrow().len() as i64;
            let Some(i) = index.as_int() else {
                return Err(ExcType::TypeError
                    .raise(format_args!("list indices must be integers, not {}", index.type_name())));
            };
            let wrapped = if i < 0 { i + len } else { i };
            if wrapped < 0 || wrapped >= len {
                return Err(ExcType::IndexError.raise("list index out of range"));
            }
            items.borrow_mut().remove(wrapped as usize);
            Ok(Value::None)
        }
        Value::Dict(dict) => {
            let _ = dict.borrow_mut().remove(index)?;
            Ok(Value::None)
        }
        other => Err(ExcType::TypeError.raise(format_args!(
            "del() expects a list or dict, not '{}'",
            other.type_name()
        ))),
    }
}

fn del_list_range(
    items: &Rc<std::cell::RefCell<Vec<Value>>>,
    start: &Value,
    stop: &Value,
    step: &Value,
) -> RunResult<Value> {
    if !matches!(step, Value::None) {
        return Err(ExcType::NotImplementedError.raise("slice step is not supported"));
    }
    let len = items.borrow().len();
    let bound = |value: &Value, default: usize| -> RunResult<usize> {
        match value {
            Value::None => Ok(default),
            other => match other.as_int() {
                Some(n) if n < 0 => Ok((n + len as i64).max(0) as usize),
                Some(n) => Ok((n as usize).min(len)),
                None => Err(ExcType::TypeError.raise("slice indices must be integers or None")),
            },
        }
    };
    let (from, to) = (bound(start, 0)?, bound(stop, len)?);
    if from < to {
        items.borrow_mut().drain(from..to);
    }
    Ok(Value::None)
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)` — as a
/// list of integers.
fn builtin_range(args: &Args) -> RunResult<Value> {
    let int_arg = |value: &Value| {
        value.as_int().ok_or_else(|| {
            ExcType::TypeError.raise(format_args!(
                "range() argument must be an integer, not '{}'",
                value.type_name()
            ))
        })
    };
    let (start, stop, step) = match args.as_slice() {
        [stop] => (0, int_arg(stop)?, 1),
        [start, stop] => (int_arg(start)?, int_arg(stop)?, 1),
        [start, stop, step] => (int_arg(start)?, int_arg(stop)?, int_arg(step)?),
        other => {
            return Err(ExcType::TypeError.raise(format_args!(
                "range() takes from 1 to 3 positional arguments but {} were given",
                other.len()
            )));
        }
    };
    if step == 0 {
        return Err(ExcType::ValueError.raise("range() arg 3 must not be zero"));
    }
    let mut numbers = Vec::new();
    let mut current = start;
    if step > 0 {
        while current < stop {
            numbers.push(Value::Int(current));
            current += step;
        }
    } else {
        while current > stop {
            numbers.push(Value::Int(current));
            current += step;
        }
    }
    Ok(Value::new_list(numbers))
}

/// Attribute (or key) presence: instances, classes, and modules answer for
/// their attributes, dicts for their keys; everything else is `False`.
fn builtin_hasattr(vm: &Vm<'_>, args: &Args) -> RunResult<Value> {
    let (value, key) = two_args("hasattr", args)?;
    let Value::Str(name) = key else {
        return Err(ExcType::TypeError.raise(format_args!(
            "hasattr(): attribute name must be string, not '{}'",
            key.type_name()
        )));
    };
    let present = match value {
        Value::Dict(dict) => dict.borrow().contains(key)?,
        Value::Instance(instance) => match vm.interns.get_id(name) {
            Some(id) => instance.getattr(id).is_some(),
            None => false,
        },
        Value::Class(class) => vm.interns.get_id(name).and_then(|id| class.lookup(id)).is_some(),
        Value::Module(module) => vm.interns.get_id(name).and_then(|id| module.get(id)).is_some(),
        _ => false,
    };
    Ok(Value::Bool(present))
}

fn builtin_chr(args: &Args) -> RunResult<Value> {
    let value = one_arg("chr", args)?;
    let Some(n) = value.as_int() else {
        return Err(ExcType::TypeError.raise(format_args!(
            "chr() argument must be an integer, not '{}'",
            value.type_name()
        )));
    };
    let c = u32::try_from(n).ok().and_then(char::from_u32);
    match c {
        Some(c) => Ok(Value::new_str(c.to_string())),
        None => Err(ExcType::ValueError.raise("chr() arg not in range")),
    }
}

fn builtin_ord(args: &Args) -> RunResult<Value> {
    let value = one_arg("ord", args)?;
    let Value::Str(s) = value else {
        return Err(ExcType::TypeError.raise(format_args!(
            "ord() expected string of length 1, but {} found",
            value.type_name()
        )));
    };
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
        _ => Err(ExcType::TypeError.raise(format_args!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))),
    }
}
