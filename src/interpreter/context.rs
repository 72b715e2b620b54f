use super::*;

/// Internal identifier-lookup failures. These never reach script code; the
/// interpreter turns them into `ReferenceError` throws where script can see them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("identifier `{0}` is not bound in any enclosing context")]
    Unbound(String),
    #[error("identifier `{0}` is not bound in this context")]
    UnboundLocal(String),
    #[error("no local variable at slot {0}")]
    UnboundSlot(usize),
}

pub type ContextRef = Rc<ExecutionContext>;

/// A lexical scope frame. Parents are fixed at creation, so the chain is a tree
/// rooted at the global context.
#[derive(Debug)]
pub struct ExecutionContext {
    bindings: RefCell<FxHashMap<String, BindingRef>>,
    declared: RefCell<Vec<BindingRef>>,
    parent: Option<ContextRef>,
    pub strict: bool,
}

impl ExecutionContext {
    pub fn new(parent: Option<ContextRef>) -> ContextRef {
        let strict = parent.as_ref().is_some_and(|p| p.strict);
        Self::with_strict(parent, strict)
    }

    pub fn with_strict(parent: Option<ContextRef>, strict: bool) -> ContextRef {
        Rc::new(ExecutionContext {
            bindings: RefCell::new(FxHashMap::default()),
            declared: RefCell::new(Vec::new()),
            parent,
            strict,
        })
    }

    pub fn parent(&self) -> Option<&ContextRef> {
        self.parent.as_ref()
    }

    /// Writes into the existing local cell when there is one, so declared
    /// slots and aliases keep observing the binding.
    pub fn set_local(&self, name: &str, value: JsValue) {
        if let Some(binding) = self.bindings.borrow().get(name) {
            binding.borrow_mut().set_value(value);
            return;
        }
        self.set_local_binding(name, Binding::new_ref(name, value));
    }

    /// Installs `binding` itself, so every other holder of the cell shares it.
    /// A declared slot that held the replaced cell follows the new one.
    pub fn set_local_binding(&self, name: &str, binding: BindingRef) {
        let previous = self
            .bindings
            .borrow_mut()
            .insert(name.to_string(), binding.clone());
        if let Some(previous) = previous {
            for slot in self.declared.borrow_mut().iter_mut() {
                if Rc::ptr_eq(slot, &previous) {
                    *slot = binding.clone();
                }
            }
        }
    }

    pub fn get_local(&self, name: &str) -> Result<BindingRef, LookupError> {
        self.bindings
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| LookupError::UnboundLocal(name.to_string()))
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<BindingRef> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(binding) = ctx.bindings.borrow().get(name) {
                return Some(binding.clone());
            }
            current = ctx.parent.as_deref();
        }
        None
    }

    pub fn get(&self, name: &str) -> Result<BindingRef, LookupError> {
        self.lookup(name)
            .ok_or_else(|| LookupError::Unbound(name.to_string()))
    }

    /// Writes through the nearest existing cell named `name`. Never creates one.
    pub fn set_if_local(&self, name: &str, value: JsValue) -> Result<(), LookupError> {
        let binding = self.get(name)?;
        let mut cell = binding.borrow_mut();
        tracing::trace!(name = cell.name(), "write binding");
        cell.set_value(value);
        Ok(())
    }

    pub fn declare_variable(&self, name: &str) {
        if self.is_local(name) {
            return;
        }
        tracing::trace!(name, "declare variable");
        let binding = Binding::new_ref(name, JsValue::Undefined);
        self.declared.borrow_mut().push(binding.clone());
        self.set_local_binding(name, binding);
    }

    pub fn get_local_value(&self, index: usize) -> Result<JsValue, LookupError> {
        self.declared
            .borrow()
            .get(index)
            .map(|b| b.borrow().value().clone())
            .ok_or(LookupError::UnboundSlot(index))
    }

    pub fn declared_count(&self) -> usize {
        self.declared.borrow().len()
    }

    pub fn global(&self) -> &ExecutionContext {
        let mut current = self;
        while let Some(parent) = current.parent.as_deref() {
            current = parent;
        }
        current
    }
}

impl Interpreter {
    /// Reads `name` through the scope chain, throwing a `ReferenceError` when
    /// nothing in the chain binds it.
    pub fn resolve_identifier(&mut self, ctx: &ContextRef, name: &str) -> Completion {
        match ctx.get(name) {
            Ok(binding) => Completion::Normal(binding.borrow().value().clone()),
            Err(_) => {
                let err = self.create_reference_error(&format!("{name} is not defined"));
                Completion::Throw(err)
            }
        }
    }

    /// PutValue on an identifier reference. Sloppy contexts create a global
    /// binding for an unresolvable name; strict contexts throw.
    pub fn assign(&mut self, ctx: &ContextRef, name: &str, value: JsValue) -> Completion {
        match ctx.set_if_local(name, value.clone()) {
            Ok(()) => Completion::Normal(value),
            Err(_) if ctx.strict => {
                let err = self.create_reference_error(&format!("{name} is not defined"));
                Completion::Throw(err)
            }
            Err(_) => {
                tracing::debug!(name, "implicit global binding");
                ctx.global().set_local(name, value.clone());
                Completion::Normal(value)
            }
        }
    }

    pub fn declare_variable(&mut self, ctx: &ContextRef, name: &str) {
        ctx.declare_variable(name);
    }

    pub fn get_local_value(&self, ctx: &ContextRef, index: usize) -> Result<JsValue, LookupError> {
        ctx.get_local_value(index)
    }
}
