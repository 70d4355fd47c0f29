//! The host-facing value type.
//!
//! `Object` is an owned, heap-free mirror of the internal runtime values:
//! it can be cloned, stored, and compared without the interpreter. Values
//! with no natural host mapping (classes, functions, methods) come back as
//! `Repr` carrying their printable form.

use std::fmt;

use crate::{
    intern::Interns,
    value::{Value, format_float},
};

/// Conversion depth cap; cyclic values truncate rather than recurse forever.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Object>),
    List(Vec<Object>),
    Dict(Vec<(Object, Object)>),
    Set(Vec<Object>),
    /// An imported module, by name.
    Module(String),
    /// A value with no direct `Object` mapping; carries its repr.
    Repr(String),
}

impl Object {
    pub(crate) fn from_value(value: &Value, interns: &Interns) -> Self {
        Self::convert(value, interns, 0)
    }

    fn convert(value: &Value, interns: &Interns, depth: usize) -> Self {
        if depth > MAX_DEPTH {
            return Self::Repr("...".to_string());
        }
        match value {
            Value::None => Self::None,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(n) => Self::Int(*n),
            Value::Float(f) => Self::Float(*f),
            Value::Str(s) => Self::Str(s.to_string()),
            Value::Tuple(items) => Self::Tuple(
                items
                    .iter()
                    .map(|item| Self::convert(item, interns, depth + 1))
                    .collect(),
            ),
            Value::List(items) => Self::List(
                items
                    .borrow()
                    .iter()
                    .map(|item| Self::convert(item, interns, depth + 1))
                    .collect(),
            ),
            Value::Dict(dict) => Self::Dict(
                dict.borrow()
                    .iter()
                    .map(|(k, v)| {
                        (
                            Self::convert(k, interns, depth + 1),
                            Self::convert(v, interns, depth + 1),
                        )
                    })
                    .collect(),
            ),
            Value::Set(set) => Self::Set(
                set.borrow()
                    .iter()
                    .map(|item| Self::convert(item, interns, depth + 1))
                    .collect(),
            ),
            Value::Module(module) => Self::Module(interns.get(module.name()).to_string()),
            other => Self::Repr(other.py_repr(interns)),
        }
    }

    /// The value's printable (repr) form, matching what the interpreter
    /// itself would print.
    pub fn repr(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => f.write_str(&format_float(*x)),
            Self::Str(s) => {
                f.write_str("'")?;
                for c in s.chars() {
                    match c {
                        '\\' => f.write_str("\\\\")?,
                        '\'' => f.write_str("\\'")?,
                        '\n' => f.write_str("\\n")?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("'")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Self::Set(items) => {
                if items.is_empty() {
                    return f.write_str("set()");
                }
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Self::Module(name) => write!(f, "<module '{name}'>"),
            Self::Repr(repr) => f.write_str(repr),
        }
    }
}
