//! Tree-walking interpreter for BOOSE programs

mod call;
mod cond;
mod eval;
mod exec;
mod scope;
mod store;
mod value;

pub use call::{CallFrame, normalize_method_name, split_call_args};
pub use cond::evaluate_condition;
pub use eval::{EvalMode, evaluate, parse_number, replace_word, substitute_variables, unquote};
pub use exec::Interpreter;
pub use scope::{Scope, ScopeMode, ScopeStack};
pub use store::{Array, MAX_ARRAY_LEN, ProgramStore};
pub use value::{EPSILON, ElementKind, Value};
