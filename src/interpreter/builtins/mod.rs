use super::*;

mod array;

impl Interpreter {
    pub(crate) fn setup_object_prototype(&mut self, proto: &ObjectRef) {
        // Object.prototype.toString
        self.register_builtin(proto, "toString", 0, |interp, this, _args, _ctx| {
            let tag = match this {
                JsValue::Undefined => "Undefined".to_string(),
                JsValue::Null => "Null".to_string(),
                JsValue::Boolean(_) => "Boolean".to_string(),
                JsValue::Number(_) => "Number".to_string(),
                JsValue::String(_) => "String".to_string(),
                JsValue::Object(_) => interp
                    .object_of(this)
                    .map(|o| o.borrow().class_name.clone())
                    .unwrap_or_else(|| "Object".to_string()),
            };
            Completion::Normal(JsValue::string(&format!("[object {tag}]")))
        });
    }

    pub(crate) fn setup_function_prototype(&mut self, proto: &ObjectRef) {
        // §20.2.3.5 Function.prototype.toString
        self.register_builtin(proto, "toString", 0, |interp, this, _args, _ctx| {
            let source = interp
                .object_of(this)
                .and_then(|o| o.borrow().callable.as_ref().map(JsFunction::source_text));
            match source {
                Some(text) => Completion::Normal(JsValue::string(&text)),
                None => Completion::Throw(
                    interp.create_type_error("Function.prototype.toString requires that 'this' be a Function"),
                ),
            }
        });

        // §20.2.3.3 Function.prototype.call
        self.register_builtin(proto, "call", 1, |interp, this, args, ctx| {
            if !interp.is_callable(this) {
                return Completion::Throw(
                    interp.create_type_error("Function.prototype.call called on non-callable"),
                );
            }
            let this_arg = get_arg(args, 0);
            let call_args = args.get(1..).unwrap_or(&[]);
            interp.call_function(this, &this_arg, call_args, ctx)
        });

        // §20.2.3.1 Function.prototype.apply
        self.register_builtin(proto, "apply", 2, |interp, this, args, ctx| {
            if !interp.is_callable(this) {
                return Completion::Throw(
                    interp.create_type_error("Function.prototype.apply called on non-callable"),
                );
            }
            let this_arg = get_arg(args, 0);
            let arg_array = get_arg(args, 1);
            let call_args = match interp.create_list_from_array_like(&arg_array) {
                Ok(list) => list,
                Err(e) => return Completion::Throw(e),
            };
            interp.call_function(this, &this_arg, &call_args, ctx)
        });
    }

    // §7.3.19 CreateListFromArrayLike; nullish stands for an empty list
    fn create_list_from_array_like(&mut self, arg_array: &JsValue) -> Result<Vec<JsValue>, JsValue> {
        match arg_array {
            JsValue::Undefined | JsValue::Null => Ok(Vec::new()),
            JsValue::Object(_) => {
                let len = number_ops::to_uint32(to_number(&self.get(arg_array, "length")));
                // Keys are read strictly in ascending order; each read may delegate.
                let list = (0..len)
                    .map(|i| self.get(arg_array, &i.to_string()))
                    .collect();
                Ok(list)
            }
            _ => Err(self.create_type_error("CreateListFromArrayLike called on non-object")),
        }
    }

    pub(crate) fn setup_error_prototypes(&mut self, object_proto: &ObjectRef) {
        let error_proto = self.allocate(JsObjectData::with_prototype(Some(object_proto)));
        {
            let mut e = error_proto.borrow_mut();
            e.class_name = "Error".to_string();
            e.set_property("name", JsValue::string("Error"));
            e.set_property("message", JsValue::string(""));
        }

        // §20.5.3.4 Error.prototype.toString
        self.register_builtin(&error_proto, "toString", 0, |interp, this, _args, ctx| {
            if !this.is_object() {
                return Completion::Throw(
                    interp.create_type_error("Error.prototype.toString called on non-object"),
                );
            }
            let name = match error_part(interp, this, "name", "Error", ctx) {
                Ok(s) => s,
                Err(e) => return Completion::Throw(e),
            };
            let message = match error_part(interp, this, "message", "", ctx) {
                Ok(s) => s,
                Err(e) => return Completion::Throw(e),
            };
            let text = match (name.is_empty(), message.is_empty()) {
                (true, _) => message,
                (false, true) => name,
                (false, false) => format!("{name}: {message}"),
            };
            Completion::Normal(JsValue::string(&text))
        });

        self.type_error_prototype = Some(self.native_error_prototype(&error_proto, "TypeError"));
        self.reference_error_prototype =
            Some(self.native_error_prototype(&error_proto, "ReferenceError"));
        self.error_prototype = Some(error_proto);
    }

    fn native_error_prototype(&mut self, error_proto: &ObjectRef, name: &str) -> ObjectRef {
        let proto = self.allocate(JsObjectData::with_prototype(Some(error_proto)));
        {
            let mut p = proto.borrow_mut();
            p.class_name = "Error".to_string();
            p.set_property("name", JsValue::string(name));
            p.set_property("message", JsValue::string(""));
        }
        proto
    }
}

/// Reads `name` or `message` for Error.prototype.toString; undefined falls back to `default`.
fn error_part(
    interp: &mut Interpreter,
    this: &JsValue,
    key: &str,
    default: &str,
    ctx: &ContextRef,
) -> Result<String, JsValue> {
    let v = interp.get(this, key);
    if v.is_undefined() {
        return Ok(default.to_string());
    }
    interp.to_display_string(&v, ctx).map(|s| s.to_rust_string())
}
