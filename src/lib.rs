//! Scope, object and call runtime core for a JavaScript-like engine.
//!
//! A parser and evaluator sit outside this crate. They drive it through
//! [`Interpreter`] (identifier resolution, property access, calls) and branch
//! on the [`Completion`] every operation returns.

pub mod interpreter;
pub mod types;

pub use interpreter::{
    Binding, BindingRef, Completion, ContextRef, EngineConfig, ExecutionContext, Interpreter,
    JsFunction, JsObjectData, LookupError, MAX_ARRAY_INDEX, get_arg, make_array_index,
    to_number,
};
pub use types::{JsObject, JsString, JsValue};
