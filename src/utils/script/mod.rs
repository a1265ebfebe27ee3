//! Page script handling on top of the oxc parser: re-printing for the page
//! recipes and a sandboxed evaluator for the recovered request literals.

pub mod eval;
pub mod format;

pub use eval::{EvalError, Sandbox, Value};
pub use format::{format, quote_string};
