//! User-defined functions.

use std::rc::Rc;

use crate::{
    expressions::{Signature, Suite},
    frame::Frame,
    intern::StringId,
};

/// A closure: the frame the `def` executed in, the function name, the
/// parameter list with unevaluated default expressions, and the body.
///
/// A call builds a new frame whose parent is `frame`, binds parameters
/// positionally (evaluating defaults in `frame` for omitted trailing
/// arguments), and executes `body` catching the `Return` signal. Holding
/// `frame` is what keeps a defining frame alive past its own call.
#[derive(Debug)]
pub(crate) struct Function {
    pub name: StringId,
    pub signature: Rc<Signature>,
    pub body: Rc<Suite>,
    pub frame: Rc<Frame>,
}
