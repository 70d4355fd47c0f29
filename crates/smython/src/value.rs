//! The runtime value model.
//!
//! `Value` is a tagged enum; the closed set of kinds makes dispatch an
//! explicit match everywhere. Heap composites use ordinary shared ownership
//! (`Rc`, with `RefCell` for the mutable ones). Cycles — classes referencing
//! themselves, closures keeping their defining frame alive — are expected
//! and never collected; correctness does not depend on prompt reclamation.
//!
//! Equality is structural for `None`/`Bool`/numbers/`Str`, reference-free for
//! tuples, structural for the mutable composites, and identity-based for
//! classes, instances, functions, bound methods, and modules. Hashability
//! matches equality: the mutable composites are unhashable and are rejected
//! before they can enter a dict or set.

use std::{
    cell::RefCell,
    fmt::Write as _,
    hash::{Hash, Hasher},
    rc::Rc,
};

use indexmap::IndexMap;

use crate::{
    builtins::Builtins,
    exceptions::{ExcType, RunResult},
    expressions::Literal,
    intern::{Interns, StringId},
    modules::ModuleFunction,
    types::{BoundMethod, ClassObject, Dict, Function, Instance, Module, Set},
};

/// Name→value table used for frame locals, module globals, class and
/// instance dictionaries, and the builtins table.
pub(crate) type Names = IndexMap<StringId, Value, ahash::RandomState>;

#[derive(Debug, Clone)]
pub(crate) enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Set(Rc<RefCell<Set>>),
    Class(Rc<ClassObject>),
    Instance(Rc<Instance>),
    Function(Rc<Function>),
    BoundMethod(Rc<BoundMethod>),
    Builtin(Builtins),
    ModuleFunction(ModuleFunction),
    Module(Rc<Module>),
}

impl Value {
    pub fn new_str(text: impl Into<String>) -> Self {
        Self::Str(Rc::from(text.into()))
    }

    pub fn new_tuple(items: Vec<Self>) -> Self {
        Self::Tuple(Rc::from(items))
    }

    pub fn new_list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::None => Self::None,
            Literal::Bool(b) => Self::Bool(*b),
            Literal::Int(n) => Self::Int(*n),
            Literal::Float(f) => Self::Float(*f),
            Literal::Str(s) => Self::Str(Rc::clone(s)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
            Self::Set(_) => "set",
            Self::Class(_) => "class",
            Self::Instance(_) => "object",
            Self::Function(_) => "function",
            Self::BoundMethod(_) => "method",
            Self::Builtin(_) | Self::ModuleFunction(_) => "builtin",
            Self::Module(_) => "module",
        }
    }

    // === projections ===

    pub fn py_bool(&self) -> bool {
        match self {
            Self::None | Self::Bool(false) => false,
            Self::Bool(true) => true,
            Self::Int(n) => *n != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Tuple(items) => !items.is_empty(),
            Self::List(items) => !items.borrow().is_empty(),
            Self::Dict(dict) => dict.borrow().len() != 0,
            Self::Set(set) => set.borrow().len() != 0,
            _ => true,
        }
    }

    /// Integer projection: `Int` and `Bool` only.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Numeric projection: `Int`, `Float`, and `Bool`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn py_len(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::Tuple(items) => Some(items.len()),
            Self::List(items) => Some(items.borrow().len()),
            Self::Dict(dict) => Some(dict.borrow().len()),
            Self::Set(set) => Some(set.borrow().len()),
            _ => None,
        }
    }

    /// Iterable projection as a snapshot of elements: tuple/list elements,
    /// one-character substrings, dict key/value pairs as 2-tuples, set
    /// elements. `None` for non-iterable values.
    pub fn py_iter(&self) -> Option<Vec<Self>> {
        match self {
            Self::Str(s) => Some(s.chars().map(|c| Self::new_str(c.to_string())).collect()),
            Self::Tuple(items) => Some(items.to_vec()),
            Self::List(items) => Some(items.borrow().clone()),
            Self::Dict(dict) => Some(
                dict.borrow()
                    .iter()
                    .map(|(k, v)| Self::new_tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ),
            Self::Set(set) => Some(set.borrow().iter().cloned().collect()),
            _ => None,
        }
    }

    /// Hashability check applied before any dict/set table operation.
    /// Matches equality: the mutable composites are unhashable; a tuple is
    /// hashable iff its elements are.
    pub fn check_hashable(&self) -> RunResult<()> {
        match self {
            Self::List(_) | Self::Dict(_) | Self::Set(_) => Err(ExcType::unhashable(self.type_name())),
            Self::Tuple(items) => items.iter().try_for_each(Self::check_hashable),
            _ => Ok(()),
        }
    }

    /// Identity, as used by `is` / `is not`: pointer identity for the shared
    /// kinds, plain equality for the immediates (including strings, which
    /// are immutable values).
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b),
            (Self::Set(a), Self::Set(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::BoundMethod(a), Self::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::ModuleFunction(a), Self::ModuleFunction(b)) => a == b,
            (Self::Module(a), Self::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // === printable forms ===

    pub fn py_repr(&self, interns: &Interns) -> String {
        let mut out = String::new();
        self.repr_into(&mut out, interns);
        out
    }

    /// `str` form: strings verbatim, everything else its repr.
    pub fn py_str(&self, interns: &Interns) -> String {
        match self {
            Self::Str(s) => s.to_string(),
            other => other.py_repr(interns),
        }
    }

    fn repr_into(&self, out: &mut String, interns: &Interns) {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Self::Float(f) => out.push_str(&format_float(*f)),
            Self::Str(s) => {
                out.push('\'');
                for c in s.chars() {
                    match c {
                        '\\' => out.push_str("\\\\"),
                        '\'' => out.push_str("\\'"),
                        '\n' => out.push_str("\\n"),
                        other => out.push(other),
                    }
                }
                out.push('\'');
            }
            Self::Tuple(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, interns);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, interns);
                }
                out.push(']');
            }
            Self::Dict(dict) => {
                out.push('{');
                for (i, (key, value)) in dict.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.repr_into(out, interns);
                    out.push_str(": ");
                    value.repr_into(out, interns);
                }
                out.push('}');
            }
            Self::Set(set) => {
                let set = set.borrow();
                if set.len() == 0 {
                    out.push_str("set()");
                    return;
                }
                out.push('{');
                for (i, item) in set.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_into(out, interns);
                }
                out.push('}');
            }
            Self::Class(class) => {
                let _ = write!(out, "<class '{}'>", interns.get(class.name()));
            }
            Self::Instance(instance) => {
                let _ = write!(out, "<{} object>", interns.get(instance.class().name()));
            }
            Self::Function(function) => {
                let _ = write!(out, "<function {}>", interns.get(function.name));
            }
            Self::BoundMethod(method) => {
                let _ = write!(out, "<bound method {}>", interns.get(method.function.name));
            }
            Self::Builtin(builtin) => {
                let _ = write!(out, "<built-in function {builtin}>");
            }
            Self::ModuleFunction(function) => {
                let _ = write!(out, "<built-in function {function}>");
            }
            Self::Module(module) => {
                let _ = write!(out, "<module '{}'>", interns.get(module.name()));
            }
        }
    }

    // === indexing ===

    /// The index protocol: dicts map (missing keys yield `None`); strings,
    /// tuples, and lists take integer indexes (negative wraps, out of range
    /// raises `IndexError`) or a 3-tuple slice.
    pub fn py_getitem(&self, index: &Self) -> RunResult<Self> {
        match self {
            Self::Dict(dict) => Ok(dict.borrow().get(index)?.unwrap_or(Self::None)),
            Self::Str(_) | Self::Tuple(_) | Self::List(_) => {
                if let Self::Tuple(parts) = index {
                    if parts.len() == 3 {
                        return self.get_slice(&parts[0], &parts[1], &parts[2]);
                    }
                }
                let Some(i) = index.as_int() else {
                    return Err(ExcType::TypeError.raise(format_args!(
                        "{} indices must be integers, not {}",
                        self.type_name(),
                        index.type_name()
                    )));
                };
                self.get_element(i)
            }
            _ => Err(ExcType::TypeError.raise(format_args!("'{}' object is not subscriptable", self.type_name()))),
        }
    }

    fn get_element(&self, index: i64) -> RunResult<Self> {
        let len = self.py_len().expect("sequence kinds have a length");
        let wrapped = if index < 0 { index + len as i64 } else { index };
        if wrapped < 0 || wrapped >= len as i64 {
            return Err(ExcType::IndexError.raise(format_args!("{} index out of range", self.type_name())));
        }
        let at = wrapped as usize;
        match self {
            Self::Str(s) => Ok(Self::new_str(
                s.chars().nth(at).expect("index checked against length").to_string(),
            )),
            Self::Tuple(items) => Ok(items[at].clone()),
            Self::List(items) => Ok(items.borrow()[at].clone()),
            _ => unreachable!("get_element is only called for sequences"),
        }
    }

    fn get_slice(&self, start: &Self, stop: &Self, step: &Self) -> RunResult<Self> {
        if !matches!(step, Self::None) {
            return Err(ExcType::NotImplementedError.raise("slice step is not supported"));
        }
        let len = self.py_len().expect("sequence kinds have a length");
        let (from, to) = (slice_bound(start, 0, len)?, slice_bound(stop, len, len)?);
        match self {
            Self::Str(s) => {
                let text: String = if from < to {
                    s.chars().skip(from).take(to - from).collect()
                } else {
                    String::new()
                };
                Ok(Self::new_str(text))
            }
            Self::Tuple(items) => {
                let slice = if from < to { items[from..to].to_vec() } else { Vec::new() };
                Ok(Self::new_tuple(slice))
            }
            Self::List(items) => {
                let items = items.borrow();
                let slice = if from < to { items[from..to].to_vec() } else { Vec::new() };
                Ok(Self::new_list(slice))
            }
            _ => unreachable!("get_slice is only called for sequences"),
        }
    }

    // === attributes ===

    pub fn py_getattr(&self, name: StringId, interns: &Interns) -> RunResult<Self> {
        match self {
            Self::Instance(instance) => instance.getattr(name).ok_or_else(|| {
                ExcType::attribute_error(interns.get(instance.class().name()), interns.get(name))
            }),
            Self::Class(class) => class.lookup(name).ok_or_else(|| {
                ExcType::AttributeError.raise(format_args!(
                    "type object '{}' has no attribute '{}'",
                    interns.get(class.name()),
                    interns.get(name)
                ))
            }),
            Self::Module(module) => module.get(name).ok_or_else(|| {
                ExcType::AttributeError.raise(format_args!(
                    "module '{}' has no attribute '{}'",
                    interns.get(module.name()),
                    interns.get(name)
                ))
            }),
            other => Err(ExcType::attribute_error(other.type_name(), interns.get(name))),
        }
    }

    pub fn py_setattr(&self, name: StringId, value: Self, interns: &Interns) -> RunResult<()> {
        match self {
            Self::Instance(instance) => {
                instance.setattr(name, value);
                Ok(())
            }
            Self::Class(class) => {
                class.set(name, value);
                Ok(())
            }
            Self::Module(module) => {
                module.set(name, value);
                Ok(())
            }
            other => Err(ExcType::AttributeError.raise(format_args!(
                "cannot set attribute '{}' on '{}' object",
                interns.get(name),
                other.type_name()
            ))),
        }
    }
}

/// Resolves one slice bound: `None` takes the default, integers wrap
/// negatives by length and clamp into `0..=len`.
fn slice_bound(value: &Value, default: usize, len: usize) -> RunResult<usize> {
    match value {
        Value::None => Ok(default),
        other => match other.as_int() {
            Some(n) if n < 0 => Ok((n + len as i64).max(0) as usize),
            Some(n) => Ok((n as usize).min(len)),
            None => Err(ExcType::TypeError.raise(format_args!(
                "slice indices must be integers or None, not {}",
                other.type_name()
            ))),
        },
    }
}

/// Float repr: shortest round-trip form, Python spellings for the
/// non-finite values.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    ryu::Buffer::new().format(f).to_string()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Set(a), Self::Set(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::BoundMethod(a), Self::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::ModuleFunction(a), Self::ModuleFunction(b)) => a == b,
            (Self::Module(a), Self::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// Total so values can key hash tables; NaN keys would be irretrievable, but
// hashability checks reject nothing numeric and Python has the same wart.
impl Eq for Value {}

impl Hash for Value {
    /// Consistent with `PartialEq`: an integral float hashes like its
    /// integer. The unhashable kinds hash by identity; they are rejected by
    /// `check_hashable` before reaching any table.
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::None => state.write_u8(0),
            Self::Bool(b) => {
                state.write_u8(1);
                b.hash(state);
            }
            Self::Int(n) => {
                state.write_u8(2);
                n.hash(state);
            }
            Self::Float(f) => {
                #[expect(clippy::cast_possible_truncation, reason = "integral range is checked")]
                if f.fract() == 0.0 && *f >= -9.223_372_036_854_776e18 && *f < 9.223_372_036_854_776e18 {
                    state.write_u8(2);
                    (*f as i64).hash(state);
                } else {
                    state.write_u8(3);
                    f.to_bits().hash(state);
                }
            }
            Self::Str(s) => {
                state.write_u8(4);
                s.hash(state);
            }
            Self::Tuple(items) => {
                state.write_u8(5);
                items.len().hash(state);
                for item in items.iter() {
                    item.hash(state);
                }
            }
            Self::List(l) => {
                state.write_u8(6);
                (Rc::as_ptr(l) as usize).hash(state);
            }
            Self::Dict(d) => {
                state.write_u8(7);
                (Rc::as_ptr(d) as usize).hash(state);
            }
            Self::Set(s) => {
                state.write_u8(8);
                (Rc::as_ptr(s) as usize).hash(state);
            }
            Self::Class(c) => {
                state.write_u8(9);
                (Rc::as_ptr(c) as usize).hash(state);
            }
            Self::Instance(i) => {
                state.write_u8(10);
                (Rc::as_ptr(i) as usize).hash(state);
            }
            Self::Function(f) => {
                state.write_u8(11);
                (Rc::as_ptr(f) as usize).hash(state);
            }
            Self::BoundMethod(m) => {
                state.write_u8(12);
                (Rc::as_ptr(m) as usize).hash(state);
            }
            Self::Builtin(b) => {
                state.write_u8(13);
                b.hash(state);
            }
            Self::ModuleFunction(f) => {
                state.write_u8(14);
                f.hash(state);
            }
            Self::Module(m) => {
                state.write_u8(15);
                (Rc::as_ptr(m) as usize).hash(state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_eq!(hash_of(&Value::Int(1)), hash_of(&Value::Float(1.0)));
    }

    #[test]
    fn tuples_compare_structurally() {
        let a = Value::new_tuple(vec![Value::Int(1), Value::new_str("x")]);
        let b = Value::new_tuple(vec![Value::Int(1), Value::new_str("x")]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn lists_compare_structurally_but_are_unhashable() {
        let a = Value::new_list(vec![Value::Int(1)]);
        let b = Value::new_list(vec![Value::Int(1)]);
        assert_eq!(a, b);
        assert!(a.check_hashable().is_err());
        // a tuple is only as hashable as its elements
        let t = Value::new_tuple(vec![a]);
        assert!(t.check_hashable().is_err());
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::None.py_bool());
        assert!(!Value::Int(0).py_bool());
        assert!(!Value::new_str("").py_bool());
        assert!(!Value::new_tuple(Vec::new()).py_bool());
        assert!(Value::new_str("x").py_bool());
        assert!(Value::Float(0.5).py_bool());
    }

    #[test]
    fn repr_forms() {
        let interns = Interns::new();
        assert_eq!(Value::new_str("a'b\nc").py_repr(&interns), "'a\\'b\\nc'");
        assert_eq!(Value::Float(10.0).py_repr(&interns), "10.0");
        assert_eq!(
            Value::new_tuple(vec![Value::Int(2)]).py_repr(&interns),
            "(2,)"
        );
        assert_eq!(
            Value::new_list(vec![Value::Int(1), Value::Int(2)]).py_repr(&interns),
            "[1, 2]"
        );
        assert_eq!(Value::Set(Rc::new(RefCell::new(Set::new()))).py_repr(&interns), "set()");
    }

    #[test]
    fn string_indexing_wraps_and_bounds() {
        let s = Value::new_str("abc");
        assert_eq!(s.py_getitem(&Value::Int(0)).unwrap(), Value::new_str("a"));
        assert_eq!(s.py_getitem(&Value::Int(-1)).unwrap(), Value::new_str("c"));
        assert!(s.py_getitem(&Value::Int(3)).is_err());
    }

    #[test]
    fn slicing_clamps_and_wraps() {
        let s = Value::new_str("abcdef");
        let index = Value::new_tuple(vec![Value::Int(1), Value::Int(-1), Value::None]);
        assert_eq!(s.py_getitem(&index).unwrap(), Value::new_str("bcde"));
        let all = Value::new_tuple(vec![Value::None, Value::None, Value::None]);
        assert_eq!(s.py_getitem(&all).unwrap(), Value::new_str("abcdef"));
        let empty = Value::new_tuple(vec![Value::Int(4), Value::Int(2), Value::None]);
        assert_eq!(s.py_getitem(&empty).unwrap(), Value::new_str(""));
        let stepped = Value::new_tuple(vec![Value::None, Value::None, Value::Int(2)]);
        assert!(s.py_getitem(&stepped).is_err());
    }

    #[test]
    fn dict_missing_key_yields_none() {
        let dict = Value::Dict(Rc::new(RefCell::new(Dict::new())));
        assert_eq!(dict.py_getitem(&Value::Int(1)).unwrap(), Value::None);
    }
}
