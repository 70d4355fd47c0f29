//! The tree-walking evaluator.
//!
//! Statements and expressions evaluate directly against frames; the
//! non-local exits (`break`, `continue`, `return`, `raise`) travel as the
//! `Err` side of [`RunResult`] and are caught exactly at the statement types
//! that expect them. Evaluation order is fully left-to-right, top-to-bottom.

use std::{path::Path, rc::Rc};

use rand::rngs::StdRng;
use smallvec::SmallVec;

use crate::{
    exceptions::{ExcType, RunError, RunResult},
    expressions::{BinOp, CmpOp, Expr, Stmt, Suite, UnaryOp},
    frame::Frame,
    intern::{Interns, StaticStrings},
    io::PrintWriter,
    modules,
    types::{ClassObject, Dict, Function, Instance, Set},
    value::{Names, Value},
};

/// Call arguments; most calls carry at most a handful.
pub(crate) type Args = SmallVec<[Value; 4]>;

/// The mutable runtime state threaded through evaluation: the interner, the
/// module cache and directory, the `random` module RNG, `atexit` callbacks,
/// the print writer, and the shared builtins table.
pub(crate) struct Vm<'a> {
    pub interns: &'a mut Interns,
    pub modules: &'a mut Names,
    pub module_dir: Option<&'a Path>,
    pub rng: &'a mut Option<StdRng>,
    pub exit_callbacks: &'a mut Vec<Value>,
    pub print: &'a mut dyn PrintWriter,
    pub builtins: Rc<Names>,
}

impl Vm<'_> {
    /// Evaluates statements in order; the suite's value is the last
    /// statement's value, `None` for an empty suite.
    pub fn eval_suite(&mut self, suite: &Suite, frame: &Rc<Frame>) -> RunResult<Value> {
        let mut last = Value::None;
        for stmt in &suite.stmts {
            last = self.eval_stmt(stmt, frame)?;
        }
        Ok(last)
    }

    /// Suite evaluation at a function invocation boundary: additionally
    /// catches the `Return` signal and yields its payload.
    pub fn eval_suite_as_func(&mut self, suite: &Suite, frame: &Rc<Frame>) -> RunResult<Value> {
        match self.eval_suite(suite, frame) {
            Err(RunError::Return(value)) => Ok(value),
            other => other,
        }
    }

    fn eval_stmt(&mut self, stmt: &Stmt, frame: &Rc<Frame>) -> RunResult<Value> {
        match stmt {
            Stmt::Expr(expr) => return self.eval_expr(expr, frame),
            Stmt::Pass => {}
            Stmt::Assign { target, value } => {
                let value = self.eval_expr(value, frame)?;
                self.assign(target, value, frame)?;
            }
            Stmt::AugAssign { target, op, value } => {
                if matches!(target, Expr::Index { .. }) {
                    return Err(ExcType::NotImplementedError.raise("augmented assignment to a subscript"));
                }
                let current = self.eval_expr(target, frame)?;
                let rhs = self.eval_expr(value, frame)?;
                let result = binary_op(*op, &current, &rhs)?;
                self.assign(target, result, frame)?;
            }
            Stmt::If { test, then, orelse } => {
                if self.eval_expr(test, frame)?.py_bool() {
                    self.eval_suite(then, frame)?;
                } else {
                    self.eval_suite(orelse, frame)?;
                }
            }
            Stmt::While { test, body, orelse } => {
                loop {
                    if !self.eval_expr(test, frame)?.py_bool() {
                        self.eval_suite(orelse, frame)?;
                        break;
                    }
                    match self.eval_suite(body, frame) {
                        Ok(_) | Err(RunError::Continue) => {}
                        Err(RunError::Break) => break,
                        Err(err) => return Err(err),
                    }
                }
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let iterable = self.eval_expr(iter, frame)?;
                let Some(elements) = iterable.py_iter() else {
                    return Err(ExcType::not_iterable(iterable.type_name()));
                };
                let mut broke = false;
                for element in elements {
                    self.assign(target, element, frame)?;
                    match self.eval_suite(body, frame) {
                        Ok(_) | Err(RunError::Continue) => {}
                        Err(RunError::Break) => {
                            broke = true;
                            break;
                        }
                        Err(err) => return Err(err),
                    }
                }
                if !broke {
                    self.eval_suite(orelse, frame)?;
                }
            }
            Stmt::TryFinally { body, finally } => {
                let result = self.eval_suite(body, frame);
                // the finally suite runs on every exit path; its own error
                // (or unwind) supersedes the body's
                self.eval_suite(finally, frame)?;
                result?;
            }
            Stmt::TryExcept { body, clauses, orelse } => match self.eval_suite(body, frame) {
                Ok(_) => {
                    self.eval_suite(orelse, frame)?;
                }
                Err(RunError::Raise(exc)) => {
                    let mut handled = false;
                    for clause in clauses {
                        let matched = match &clause.test {
                            None => true,
                            Some(test) => self.eval_expr(test, frame)? == exc,
                        };
                        if matched {
                            let child = Frame::nested(frame);
                            if let Some(name) = clause.name {
                                child.define(name, exc.clone());
                            }
                            self.eval_suite(&clause.body, &child)?;
                            handled = true;
                            break;
                        }
                    }
                    if !handled {
                        return Err(RunError::Raise(exc));
                    }
                }
                Err(other) => return Err(other),
            },
            Stmt::Def { name, signature, body } => {
                let function = Function {
                    name: *name,
                    signature: Rc::clone(signature),
                    body: Rc::clone(body),
                    frame: Rc::clone(frame),
                };
                frame.set(*name, Value::Function(Rc::new(function)));
            }
            Stmt::Class {
                name,
                superclass,
                body,
            } => {
                let base = match superclass {
                    None => None,
                    Some(expr) => match self.eval_expr(expr, frame)? {
                        Value::None => None,
                        Value::Class(class) => Some(class),
                        other => {
                            return Err(ExcType::TypeError.raise(format_args!(
                                "superclass must be a class or None, not '{}'",
                                other.type_name()
                            )));
                        }
                    },
                };
                let class = Rc::new(ClassObject::new(*name, base));
                frame.set(*name, Value::Class(Rc::clone(&class)));
                let body_frame = Frame::class_body(frame, class.namespace());
                self.eval_suite(body, &body_frame)?;
            }
            Stmt::Break => return Err(RunError::Break),
            Stmt::Continue => return Err(RunError::Continue),
            Stmt::Return(expr) => {
                let value = self.eval_expr(expr, frame)?;
                return Err(RunError::Return(value));
            }
            Stmt::Raise(expr) => {
                let value = self.eval_expr(expr, frame)?;
                return Err(RunError::Raise(value));
            }
            Stmt::Assert { test, msg } => {
                if !self.eval_expr(test, frame)?.py_bool() {
                    let text = match msg {
                        None => "AssertionError".to_string(),
                        Some(msg) => {
                            let value = self.eval_expr(msg, frame)?;
                            format!("AssertionError: {}", value.py_str(self.interns))
                        }
                    };
                    return Err(RunError::Raise(Value::new_str(text)));
                }
            }
            Stmt::Global(names) => {
                for name in names {
                    frame.declare_global(*name);
                }
            }
            Stmt::Import(names) => {
                for name in names {
                    match modules::import_module(self, *name)? {
                        Some(module) => frame.set(*name, module),
                        None => {
                            return Err(ExcType::ImportError
                                .raise(format_args!("No module named '{}'", self.interns.get(*name))));
                        }
                    }
                }
            }
            Stmt::FromImport { module, names } => {
                let Some(value) = modules::import_module(self, *module)? else {
                    return Err(
                        ExcType::ImportError.raise(format_args!("No module named '{}'", self.interns.get(*module)))
                    );
                };
                let Value::Module(imported) = &value else {
                    return Err(ExcType::ImportError.raise("import did not produce a module"));
                };
                if names.is_empty() {
                    // `from m import *` merges the module's globals into the
                    // current frame's locals
                    let entries: Vec<_> = imported
                        .globals()
                        .borrow()
                        .iter()
                        .map(|(k, v)| (*k, v.clone()))
                        .collect();
                    let mut locals = frame.locals().borrow_mut();
                    for (name, value) in entries {
                        locals.insert(name, value);
                    }
                } else {
                    for name in names {
                        match imported.get(*name) {
                            Some(value) => frame.set(*name, value),
                            None => {
                                return Err(ExcType::ImportError.raise(format_args!(
                                    "cannot import name '{}' from '{}'",
                                    self.interns.get(*name),
                                    self.interns.get(*module)
                                )));
                            }
                        }
                    }
                }
            }
        }
        Ok(Value::None)
    }

    pub fn eval_expr(&mut self, expr: &Expr, frame: &Rc<Frame>) -> RunResult<Value> {
        match expr {
            Expr::Lit(literal) => Ok(Value::from_literal(literal)),
            Expr::Var(name) => frame
                .get(*name)
                .ok_or_else(|| ExcType::name_error(self.interns.get(*name))),
            Expr::Cond { test, then, orelse } => {
                if self.eval_expr(test, frame)?.py_bool() {
                    self.eval_expr(then, frame)
                } else {
                    self.eval_expr(orelse, frame)
                }
            }
            Expr::Or(left, right) => {
                let left = self.eval_expr(left, frame)?;
                if left.py_bool() { Ok(left) } else { self.eval_expr(right, frame) }
            }
            Expr::And(left, right) => {
                let left = self.eval_expr(left, frame)?;
                if left.py_bool() { self.eval_expr(right, frame) } else { Ok(left) }
            }
            Expr::Not(operand) => Ok(Value::Bool(!self.eval_expr(operand, frame)?.py_bool())),
            Expr::Comparison { first, rest } => {
                let mut prev = self.eval_expr(first, frame)?;
                for (op, next) in rest {
                    let next = self.eval_expr(next, frame)?;
                    if !compare(*op, &prev, &next)? {
                        return Ok(Value::Bool(false));
                    }
                    prev = next;
                }
                Ok(Value::Bool(true))
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, frame)?;
                let right = self.eval_expr(right, frame)?;
                binary_op(*op, &left, &right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, frame)?;
                unary_op(*op, &operand)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee, frame)?;
                let mut values = Args::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, frame)?);
                }
                self.call_value(callee, values)
            }
            Expr::Index { obj, index } => {
                let obj = self.eval_expr(obj, frame)?;
                let index = self.eval_expr(index, frame)?;
                obj.py_getitem(&index)
            }
            Expr::Attr { obj, name } => {
                let obj = self.eval_expr(obj, frame)?;
                obj.py_getattr(*name, self.interns)
            }
            Expr::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, frame)?);
                }
                Ok(Value::new_tuple(values))
            }
            Expr::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item, frame)?);
                }
                Ok(Value::new_list(values))
            }
            Expr::Dict(pairs) => {
                let mut dict = Dict::new();
                for (key, value) in pairs {
                    let key = self.eval_expr(key, frame)?;
                    let value = self.eval_expr(value, frame)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::Dict(Rc::new(std::cell::RefCell::new(dict))))
            }
            Expr::Set(items) => {
                let mut set = Set::new();
                for item in items {
                    set.insert(self.eval_expr(item, frame)?)?;
                }
                Ok(Value::Set(Rc::new(std::cell::RefCell::new(set))))
            }
        }
    }

    /// Stores `value` into the target pattern.
    fn assign(&mut self, target: &Expr, value: Value, frame: &Rc<Frame>) -> RunResult<()> {
        match target {
            Expr::Var(name) => {
                frame.set(*name, value);
                Ok(())
            }
            Expr::Attr { obj, name } => {
                let obj = self.eval_expr(obj, frame)?;
                obj.py_setattr(*name, value, self.interns)
            }
            Expr::Index { .. } => Err(ExcType::NotImplementedError.raise("assignment to a subscript")),
            Expr::Tuple(targets) => {
                let Some(elements) = value.py_iter() else {
                    return Err(ExcType::TypeError
                        .raise(format_args!("cannot unpack non-iterable '{}' value", value.type_name())));
                };
                if elements.len() < targets.len() {
                    return Err(ExcType::ValueError.raise(format_args!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        elements.len()
                    )));
                }
                if elements.len() > targets.len() {
                    return Err(
                        ExcType::ValueError.raise(format_args!("too many values to unpack (expected {})", targets.len()))
                    );
                }
                for (target, element) in targets.iter().zip(elements) {
                    self.assign(target, element, frame)?;
                }
                Ok(())
            }
            // the parser only admits assignable targets
            _ => Err(ExcType::TypeError.raise("cannot assign to this expression")),
        }
    }

    // === calls ===

    pub fn call_value(&mut self, callee: Value, args: Args) -> RunResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(&function, args),
            Value::BoundMethod(method) => {
                let mut full = Args::with_capacity(args.len() + 1);
                full.push(method.receiver.clone());
                full.extend(args);
                self.call_function(&method.function, full)
            }
            Value::Class(class) => self.instantiate(&class, args),
            Value::Builtin(builtin) => builtin.call(self, args),
            Value::ModuleFunction(function) => function.call(self, args),
            other => Err(ExcType::not_callable(other.type_name())),
        }
    }

    /// Binds arguments and runs the body in a fresh frame whose parent is
    /// the function's defining frame.
    fn call_function(&mut self, function: &Rc<Function>, args: Args) -> RunResult<Value> {
        let signature = &function.signature;
        let given = args.len();
        let frame = Frame::nested(&function.frame);
        let mut supplied = args.into_iter();
        for param in &signature.params {
            let value = match supplied.next() {
                Some(value) => value,
                // omitted trailing arguments take their default, evaluated
                // now, in the defining frame
                None => match &param.default {
                    Some(default) => self.eval_expr(default, &function.frame)?,
                    None => {
                        return Err(ExcType::TypeError.raise(format_args!(
                            "{}() missing required argument: '{}'",
                            self.interns.get(function.name),
                            self.interns.get(param.name)
                        )));
                    }
                },
            };
            frame.define(param.name, value);
        }
        if let Some(rest) = signature.var_param {
            frame.define(rest, Value::new_tuple(supplied.collect()));
        } else if supplied.next().is_some() {
            return Err(ExcType::arg_count(
                self.interns.get(function.name),
                signature.params.len(),
                given,
            ));
        }
        self.eval_suite_as_func(&function.body, &frame)
    }

    fn instantiate(&mut self, class: &Rc<ClassObject>, args: Args) -> RunResult<Value> {
        let instance = Rc::new(Instance::new(Rc::clone(class)));
        match class.lookup(StaticStrings::Init.id()) {
            Some(Value::Function(init)) => {
                let mut full = Args::with_capacity(args.len() + 1);
                full.push(Value::Instance(Rc::clone(&instance)));
                full.extend(args);
                self.call_function(&init, full)?;
            }
            Some(other) => return Err(ExcType::not_callable(other.type_name())),
            None => {
                if !args.is_empty() {
                    return Err(ExcType::TypeError
                        .raise(format_args!("{}() takes no arguments", self.interns.get(class.name()))));
                }
            }
        }
        Ok(Value::Instance(instance))
    }
}

// === operators ===

pub(crate) fn binary_op(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    match op {
        BinOp::Add => add(left, right),
        BinOp::Sub => arith(op, left, right, i64::checked_sub, |a, b| a - b),
        BinOp::Mul => mul(left, right),
        BinOp::Div => div(left, right),
        BinOp::Mod => modulo(left, right),
        BinOp::BitOr => bitwise(op, left, right),
        BinOp::BitAnd => bitwise(op, left, right),
    }
}

/// Integer arithmetic when both sides project to integers (widening to float
/// on overflow), float arithmetic when both are numeric.
fn arith(
    op: BinOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Ok(match int_op(a, b) {
            Some(n) => Value::Int(n),
            None => Value::Float(float_op(a as f64, b as f64)),
        });
    }
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return Ok(Value::Float(float_op(a, b)));
    }
    Err(ExcType::unsupported_operand(
        op.symbol(),
        left.type_name(),
        right.type_name(),
    ))
}

fn add(left: &Value, right: &Value) -> RunResult<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            let mut text = String::with_capacity(a.len() + b.len());
            text.push_str(a);
            text.push_str(b);
            Ok(Value::new_str(text))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::new_list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.to_vec();
            items.extend(b.iter().cloned());
            Ok(Value::new_tuple(items))
        }
        _ => arith(BinOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

fn mul(left: &Value, right: &Value) -> RunResult<Value> {
    let repeat = |count: i64| usize::try_from(count).unwrap_or(0);
    match (left, right) {
        (Value::Str(s), n) | (n, Value::Str(s)) if n.as_int().is_some() => {
            let count = repeat(n.as_int().expect("guard checked projection"));
            Ok(Value::new_str(s.repeat(count)))
        }
        (Value::List(items), n) | (n, Value::List(items)) if n.as_int().is_some() => {
            let count = repeat(n.as_int().expect("guard checked projection"));
            let items = items.borrow();
            let mut repeated = Vec::with_capacity(items.len() * count);
            for _ in 0..count {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::new_list(repeated))
        }
        _ => arith(BinOp::Mul, left, right, i64::checked_mul, |a, b| a * b),
    }
}

/// Division always yields a numeric (float) result; there is no
/// integer-floor distinction, and zero divisors follow IEEE semantics.
fn div(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return Ok(Value::Float(a / b));
    }
    Err(ExcType::unsupported_operand(
        "/",
        left.type_name(),
        right.type_name(),
    ))
}

/// Host remainder semantics on the numeric projections; a zero integer
/// divisor falls through to float remainder (NaN) rather than erroring.
fn modulo(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        if let Some(n) = a.checked_rem(b) {
            return Ok(Value::Int(n));
        }
    }
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return Ok(Value::Float(a % b));
    }
    Err(ExcType::unsupported_operand(
        "%",
        left.type_name(),
        right.type_name(),
    ))
}

fn bitwise(op: BinOp, left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Ok(Value::Int(match op {
            BinOp::BitOr => a | b,
            BinOp::BitAnd => a & b,
            _ => unreachable!("bitwise handles '|' and '&' only"),
        }));
    }
    Err(ExcType::unsupported_operand(
        op.symbol(),
        left.type_name(),
        right.type_name(),
    ))
}

pub(crate) fn unary_op(op: UnaryOp, operand: &Value) -> RunResult<Value> {
    let symbol = match op {
        UnaryOp::Pos => "+",
        UnaryOp::Neg => "-",
    };
    match operand {
        Value::Int(n) => Ok(match op {
            UnaryOp::Pos => Value::Int(*n),
            UnaryOp::Neg => n.checked_neg().map_or(Value::Float(-(*n as f64)), Value::Int),
        }),
        Value::Float(f) => Ok(Value::Float(match op {
            UnaryOp::Pos => *f,
            UnaryOp::Neg => -*f,
        })),
        Value::Bool(b) => {
            let n = i64::from(*b);
            Ok(Value::Int(if op == UnaryOp::Neg { -n } else { n }))
        }
        other => Err(ExcType::TypeError.raise(format_args!(
            "bad operand type for unary {symbol}: '{}'",
            other.type_name()
        ))),
    }
}

pub(crate) fn compare(op: CmpOp, left: &Value, right: &Value) -> RunResult<bool> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::Ne => Ok(left != right),
        CmpOp::Is => Ok(left.is_identical(right)),
        CmpOp::IsNot => Ok(!left.is_identical(right)),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => Ok(!contains(right, left)?),
        CmpOp::Lt | CmpOp::Gt | CmpOp::Le | CmpOp::Ge => order(op, left, right),
    }
}

/// Ordering comparisons: numeric projections, plus lexicographic strings.
fn order(op: CmpOp, left: &Value, right: &Value) -> RunResult<bool> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return Ok(match op {
            CmpOp::Lt => a < b,
            CmpOp::Gt => a > b,
            CmpOp::Le => a <= b,
            CmpOp::Ge => a >= b,
            _ => unreachable!("order handles ordering operators only"),
        });
    }
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        return Ok(match op {
            CmpOp::Lt => a < b,
            CmpOp::Gt => a > b,
            CmpOp::Le => a <= b,
            CmpOp::Ge => a >= b,
            _ => unreachable!("order handles ordering operators only"),
        });
    }
    Err(ExcType::TypeError.raise(format_args!(
        "'{}' not supported between instances of '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    )))
}

/// Containment for `in`: substring for strings, element for tuples/lists/
/// sets, key for dicts.
fn contains(container: &Value, item: &Value) -> RunResult<bool> {
    match container {
        Value::Str(s) => match item {
            Value::Str(sub) => Ok(s.contains(&**sub)),
            other => Err(ExcType::TypeError.raise(format_args!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Tuple(items) => Ok(items.iter().any(|v| v == item)),
        Value::List(items) => Ok(items.borrow().iter().any(|v| v == item)),
        Value::Set(set) => set.borrow().contains(item),
        Value::Dict(dict) => dict.borrow().contains(item),
        other => Err(ExcType::TypeError.raise(format_args!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}
