use crate::types::{JsObject, JsString, JsValue, number_ops};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

mod types;
pub use types::*;

mod context;
pub use context::*;

mod object;
pub use object::*;

mod helpers;
pub use helpers::{get_arg, to_number};
pub(crate) use helpers::*;

mod builtins;

pub type ObjectRef = Rc<RefCell<JsObjectData>>;

/// The realm: global context, object arena and intrinsic prototypes.
pub struct Interpreter {
    global_context: ContextRef,
    objects: Vec<ObjectRef>,
    object_prototype: Option<ObjectRef>,
    function_prototype: Option<ObjectRef>,
    array_prototype: Option<ObjectRef>,
    error_prototype: Option<ObjectRef>,
    type_error_prototype: Option<ObjectRef>,
    reference_error_prototype: Option<ObjectRef>,
    /// Arrays currently being joined, to cut cycles short.
    join_stack: Vec<u64>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let global = ExecutionContext::with_strict(None, config.strict);
        global.set_local("undefined", JsValue::Undefined);
        global.set_local("NaN", JsValue::Number(f64::NAN));
        global.set_local("Infinity", JsValue::Number(f64::INFINITY));

        let mut interp = Self {
            global_context: global,
            objects: Vec::new(),
            object_prototype: None,
            function_prototype: None,
            array_prototype: None,
            error_prototype: None,
            type_error_prototype: None,
            reference_error_prototype: None,
            join_stack: Vec::new(),
        };
        interp.setup_globals();
        tracing::debug!(strict = config.strict, "interpreter ready");
        interp
    }

    pub fn global_context(&self) -> ContextRef {
        self.global_context.clone()
    }

    pub fn object_prototype(&self) -> Option<ObjectRef> {
        self.object_prototype.clone()
    }

    pub fn function_prototype(&self) -> Option<ObjectRef> {
        self.function_prototype.clone()
    }

    pub fn array_prototype(&self) -> Option<ObjectRef> {
        self.array_prototype.clone()
    }

    pub fn error_prototype(&self) -> Option<ObjectRef> {
        self.error_prototype.clone()
    }

    fn setup_globals(&mut self) {
        let object_proto = self.allocate(JsObjectData::new());
        self.object_prototype = Some(object_proto.clone());

        // Function.prototype is itself callable and returns undefined.
        let mut fn_proto_data = JsObjectData::with_prototype(Some(&object_proto));
        fn_proto_data.class_name = "Function".to_string();
        fn_proto_data.callable = Some(JsFunction::native("", 0, |_, _, _, _| {
            Completion::Normal(JsValue::Undefined)
        }));
        let fn_proto = self.allocate(fn_proto_data);
        self.function_prototype = Some(fn_proto.clone());

        self.setup_object_prototype(&object_proto);
        self.setup_function_prototype(&fn_proto);
        self.setup_error_prototypes(&object_proto);
        self.setup_array_prototype(&object_proto);
    }

    fn allocate(&mut self, data: JsObjectData) -> ObjectRef {
        let obj = Rc::new(RefCell::new(data));
        let id = self.objects.len() as u64;
        obj.borrow_mut().id = Some(id);
        self.objects.push(obj.clone());
        obj
    }

    fn to_value(obj: &ObjectRef) -> JsValue {
        let id = obj.borrow().id.unwrap_or_default();
        JsValue::Object(JsObject { id })
    }

    pub fn get_object(&self, id: u64) -> Option<ObjectRef> {
        self.objects.get(id as usize).cloned()
    }

    fn object_of(&self, val: &JsValue) -> Option<ObjectRef> {
        val.as_object().and_then(|o| self.get_object(o.id))
    }

    /// An ordinary object inheriting from `Object.prototype`.
    pub fn create_object(&mut self) -> JsValue {
        let data = JsObjectData::with_prototype(self.object_prototype.as_ref());
        Self::to_value(&self.allocate(data))
    }

    /// An ordinary object with an explicit prototype, fixed for its lifetime.
    pub fn create_object_with_proto(&mut self, proto: Option<&JsValue>) -> JsValue {
        let proto = proto.and_then(|p| self.object_of(p));
        let data = JsObjectData::with_prototype(proto.as_ref());
        Self::to_value(&self.allocate(data))
    }

    pub fn create_function(&mut self, func: JsFunction) -> JsValue {
        let name = func.name().to_string();
        let arity = match &func {
            JsFunction::Native(_, arity, _) => *arity,
            JsFunction::Script { .. } => 0,
        };
        let mut data = JsObjectData::with_prototype(self.function_prototype.as_ref());
        data.class_name = "Function".to_string();
        data.callable = Some(func);
        data.set_property("name", JsValue::string(&name));
        data.set_property("length", JsValue::Number(arity as f64));
        Self::to_value(&self.allocate(data))
    }

    /// Attaches a native function as an own property of `proto`. This is the
    /// hook a built-ins loader uses to populate intrinsic prototypes.
    pub fn register_builtin(
        &mut self,
        proto: &ObjectRef,
        name: &str,
        arity: usize,
        f: impl Fn(&mut Interpreter, &JsValue, &[JsValue], &ContextRef) -> Completion + 'static,
    ) {
        let func = self.create_function(JsFunction::native(name, arity, f));
        proto.borrow_mut().set_property(name, func);
    }

    pub fn get(&self, target: &JsValue, key: &str) -> JsValue {
        match self.object_of(target) {
            Some(obj) => obj.borrow().get_property(key),
            None => JsValue::Undefined,
        }
    }

    pub fn set(&mut self, target: &JsValue, key: &str, value: JsValue) -> Completion {
        match self.object_of(target) {
            Some(obj) => {
                obj.borrow_mut().set_property(key, value.clone());
                Completion::Normal(value)
            }
            None => {
                let err = self.create_type_error(&format!("Cannot set property '{key}' of {target}"));
                Completion::Throw(err)
            }
        }
    }

    pub fn is_callable(&self, val: &JsValue) -> bool {
        self.object_of(val).is_some_and(|obj| obj.borrow().is_callable())
    }

    // §7.3.14 Call(F, V, argumentsList)
    pub fn call_function(
        &mut self,
        func: &JsValue,
        this: &JsValue,
        args: &[JsValue],
        ctx: &ContextRef,
    ) -> Completion {
        let behavior = self
            .object_of(func)
            .and_then(|obj| obj.borrow().callable.as_ref().map(JsFunction::behavior));
        let Some(behavior) = behavior else {
            let err = self.create_type_error(&format!("{func} is not a function"));
            return Completion::Throw(err);
        };
        tracing::trace!(argc = args.len(), "call");
        behavior(self, this, args, ctx)
    }

    pub fn create_type_error(&mut self, msg: &str) -> JsValue {
        let proto = self.type_error_prototype.clone();
        self.create_error(proto, msg)
    }

    pub fn create_reference_error(&mut self, msg: &str) -> JsValue {
        let proto = self.reference_error_prototype.clone();
        self.create_error(proto, msg)
    }

    fn create_error(&mut self, proto: Option<ObjectRef>, msg: &str) -> JsValue {
        let mut data = JsObjectData::with_prototype(proto.as_ref());
        data.class_name = "Error".to_string();
        data.set_property("message", JsValue::string(msg));
        let err = Self::to_value(&self.allocate(data));
        tracing::debug!(error = %self.get(&err, "name"), message = msg, "throw");
        err
    }

    /// The `name` an error object reports through its prototype chain.
    pub fn error_name(&self, err: &JsValue) -> Option<String> {
        match self.get(err, "name") {
            JsValue::String(s) => Some(s.to_rust_string()),
            _ => None,
        }
    }

    // §7.1.17 ToString; objects go through their own or inherited toString
    pub fn to_display_string(&mut self, val: &JsValue, ctx: &ContextRef) -> Result<JsString, JsValue> {
        if !val.is_object() {
            return Ok(to_js_string(val));
        }
        let to_string = self.get(val, "toString");
        if !self.is_callable(&to_string) {
            return Ok(JsString::from_str("[object Object]"));
        }
        let result = self.call_function(&to_string, val, &[], ctx).into_result()?;
        if result.is_object() {
            return Err(self.create_type_error("Cannot convert object to primitive value"));
        }
        Ok(to_js_string(&result))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
