use super::{ContextRef, Interpreter};
use crate::types::JsValue;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum Completion {
    Normal(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    pub fn into_result(self) -> Result<JsValue, JsValue> {
        match self {
            Completion::Normal(v) => Ok(v),
            Completion::Throw(e) => Err(e),
        }
    }
}

impl From<Result<JsValue, JsValue>> for Completion {
    fn from(result: Result<JsValue, JsValue>) -> Self {
        match result {
            Ok(v) => Completion::Normal(v),
            Err(e) => Completion::Throw(e),
        }
    }
}

/// A named value cell. Contexts and objects hold it through `BindingRef`,
/// so a write through any holder is seen by all of them.
#[derive(Debug, Clone)]
pub struct Binding {
    pub(crate) name: String,
    pub(crate) value: JsValue,
}

pub type BindingRef = Rc<RefCell<Binding>>;

impl Binding {
    pub fn new_ref(name: &str, value: JsValue) -> BindingRef {
        Rc::new(RefCell::new(Binding {
            name: name.to_string(),
            value,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &JsValue {
        &self.value
    }

    pub fn set_value(&mut self, value: JsValue) {
        self.value = value;
    }
}

/// `[[Call]]`: receives `this`, the positional arguments and the calling context.
pub type NativeFn = Rc<dyn Fn(&mut Interpreter, &JsValue, &[JsValue], &ContextRef) -> Completion>;

#[derive(Clone)]
pub enum JsFunction {
    Native(String, usize, NativeFn),
    /// A function built by the evaluator; `source` is what `toString` reports.
    Script {
        name: String,
        source: String,
        body: NativeFn,
    },
}

impl JsFunction {
    pub fn native(
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue], &ContextRef) -> Completion + 'static,
    ) -> Self {
        JsFunction::Native(name.to_string(), arity, Rc::new(f))
    }

    pub fn script(
        name: &str,
        source: &str,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue], &ContextRef) -> Completion + 'static,
    ) -> Self {
        JsFunction::Script {
            name: name.to_string(),
            source: source.to_string(),
            body: Rc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            JsFunction::Native(name, ..) | JsFunction::Script { name, .. } => name,
        }
    }

    pub(crate) fn behavior(&self) -> NativeFn {
        match self {
            JsFunction::Native(_, _, f) | JsFunction::Script { body: f, .. } => f.clone(),
        }
    }

    // §20.2.3.5 Function.prototype.toString
    pub fn source_text(&self) -> String {
        match self {
            JsFunction::Native(name, ..) => format!("function {name}() {{ [native code] }}"),
            JsFunction::Script { source, .. } => source.clone(),
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::Native(name, arity, _) => {
                write!(f, "JsFunction::Native({name:?}, {arity})")
            }
            JsFunction::Script { name, .. } => write!(f, "JsFunction::Script({name:?})"),
        }
    }
}

/// Realm-wide settings fixed when the interpreter is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConfig {
    /// Strict contexts reject assignment to undeclared identifiers.
    pub strict: bool,
}
