//! Error kinds, control-flow signals, and the public error surface.
//!
//! Runtime errors in Smython are values, not types: a failing operation
//! raises a string of the form `Kind: message`, and `try`/`except` matches
//! clauses by value equality against whatever was raised. [`ExcType`] exists
//! so the interpreter builds those strings uniformly; it never travels inside
//! a raised value.

use std::fmt;

use strum::{Display, EnumString, IntoStaticStr};

use crate::value::Value;

/// Result type alias for operations that can unwind.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Non-local exits used by the tree walker.
///
/// `Break`, `Continue`, and `Return` are the three control-flow signals; they
/// may only be caught at the statement boundaries that expect them (loops and
/// function invocations). `Raise` carries a user-visible exception value and
/// is catchable by `try`/`except`. Reaching the outermost evaluation, a
/// signal becomes a visible error.
#[derive(Debug)]
pub(crate) enum RunError {
    /// `break` unwinding to the nearest enclosing loop.
    Break,
    /// `continue` unwinding to the nearest enclosing loop.
    Continue,
    /// `return` unwinding to the nearest function invocation boundary.
    Return(Value),
    /// A raised exception value.
    Raise(Value),
}

/// The error kinds of the dialect, named by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub(crate) enum ExcType {
    SyntaxError,
    NameError,
    TypeError,
    AttributeError,
    IndexError,
    ValueError,
    AssertionError,
    ImportError,
    /// Used for the operations the core deliberately reserves: assignment to
    /// a subscript, augmented assignment to a subscript, and slices with an
    /// explicit step.
    NotImplementedError,
}

impl ExcType {
    /// Builds the conventional `Kind: message` exception value and wraps it
    /// in a `Raise` signal.
    pub fn raise(self, msg: impl fmt::Display) -> RunError {
        RunError::Raise(Value::new_str(format!("{self}: {msg}")))
    }

    pub fn name_error(name: &str) -> RunError {
        Self::NameError.raise(format_args!("name '{name}' is not defined"))
    }

    pub fn not_callable(type_name: &str) -> RunError {
        Self::TypeError.raise(format_args!("'{type_name}' object is not callable"))
    }

    pub fn not_iterable(type_name: &str) -> RunError {
        Self::TypeError.raise(format_args!("'{type_name}' object is not iterable"))
    }

    pub fn unhashable(type_name: &str) -> RunError {
        Self::TypeError.raise(format_args!("unhashable type: '{type_name}'"))
    }

    pub fn unsupported_operand(op: &str, left: &str, right: &str) -> RunError {
        Self::TypeError.raise(format_args!(
            "unsupported operand type(s) for {op}: '{left}' and '{right}'"
        ))
    }

    pub fn attribute_error(type_name: &str, attr: &str) -> RunError {
        Self::AttributeError.raise(format_args!("'{type_name}' object has no attribute '{attr}'"))
    }

    /// Wrong positional argument count for a named callable.
    pub fn arg_count(name: &str, expected: usize, given: usize) -> RunError {
        let plural = if expected == 1 { "" } else { "s" };
        Self::TypeError.raise(format_args!(
            "{name}() takes {expected} positional argument{plural} but {given} were given"
        ))
    }
}

/// Error returned to the host by [`Runtime`](crate::Runtime) entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Exception {
    /// A scan or parse failure; evaluation never started.
    #[error("SyntaxError: {message} (line {line})")]
    Syntax { message: String, line: usize },
    /// An exception value that reached the outermost evaluation, or a
    /// control-flow signal that escaped its statement (`'break' outside
    /// loop` and friends).
    #[error("{0}")]
    Uncaught(String),
}

impl Exception {
    /// Builds a syntax error at the given 1-based line.
    pub(crate) fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }
}
