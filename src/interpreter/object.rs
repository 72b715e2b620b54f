use super::*;
use std::rc::Weak;

/// Largest valid array index, 2^32 - 2 (§6.1.7).
pub const MAX_ARRAY_INDEX: u32 = u32::MAX - 1;

/// Classifies `key` as an array index. Only the canonical decimal form counts:
/// no sign, no whitespace, and no leading zero unless the key is exactly "0".
pub fn make_array_index(key: &str) -> Option<u32> {
    let bytes = key.as_bytes();
    match bytes {
        [] => return None,
        [b'0'] => return Some(0),
        [b'0', ..] => return None,
        _ => {}
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value: u64 = key.parse().ok()?;
    if value > MAX_ARRAY_INDEX as u64 {
        return None;
    }
    Some(value as u32)
}

pub struct JsObjectData {
    pub id: Option<u64>,
    pub(crate) properties: FxHashMap<String, BindingRef>,
    pub(crate) property_order: Vec<String>,
    /// Read-only delegation target. The arena owns every object; this link never does.
    pub prototype: Option<Weak<RefCell<JsObjectData>>>,
    pub callable: Option<JsFunction>,
    pub class_name: String,
}

impl JsObjectData {
    pub fn new() -> Self {
        Self {
            id: None,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            callable: None,
            class_name: "Object".to_string(),
        }
    }

    pub fn with_prototype(proto: Option<&Rc<RefCell<JsObjectData>>>) -> Self {
        let mut data = Self::new();
        data.prototype = proto.map(Rc::downgrade);
        data
    }

    pub fn is_array(&self) -> bool {
        self.class_name == "Array"
    }

    pub fn is_callable(&self) -> bool {
        self.callable.is_some()
    }

    pub fn prototype(&self) -> Option<Rc<RefCell<JsObjectData>>> {
        self.prototype.as_ref().and_then(Weak::upgrade)
    }

    pub fn get_own(&self, key: &str) -> Option<BindingRef> {
        self.properties.get(key).cloned()
    }

    pub fn has_own_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        if self.has_own_property(key) {
            return true;
        }
        self.prototype().is_some_and(|proto| proto.borrow().has_property(key))
    }

    // §10.1.8 [[Get]], data properties only
    pub fn get_property(&self, key: &str) -> JsValue {
        if let Some(binding) = self.properties.get(key) {
            return binding.borrow().value.clone();
        }
        if let Some(proto) = self.prototype() {
            return proto.borrow().get_property(key);
        }
        JsValue::Undefined
    }

    /// Writes an own property, reusing the existing cell when there is one.
    /// Writes never reach the prototype.
    pub fn set_property(&mut self, key: &str, value: JsValue) {
        if let Some(binding) = self.properties.get(key) {
            binding.borrow_mut().value = value;
        } else {
            self.insert_binding(key, Binding::new_ref(key, value));
        }
        if self.is_array()
            && let Some(index) = make_array_index(key)
            && index >= self.array_length()
        {
            self.write_length(index + 1);
        }
    }

    pub fn insert_binding(&mut self, key: &str, binding: BindingRef) {
        if !self.properties.contains_key(key) {
            self.property_order.push(key.to_string());
        }
        self.properties.insert(key.to_string(), binding);
    }

    pub fn delete_property(&mut self, key: &str) -> bool {
        if self.properties.remove(key).is_some() {
            self.property_order.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.property_order
    }

    pub fn array_length(&self) -> u32 {
        match self.properties.get("length") {
            Some(binding) => number_ops::to_uint32(to_number(&binding.borrow().value)),
            None => 0,
        }
    }

    pub(crate) fn write_length(&mut self, len: u32) {
        let value = JsValue::Number(len as f64);
        if let Some(binding) = self.properties.get("length") {
            binding.borrow_mut().value = value;
        } else {
            self.insert_binding("length", Binding::new_ref("length", value));
        }
    }
}

impl Default for JsObjectData {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JsObjectData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObjectData")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("keys", &self.property_order)
            .field("callable", &self.callable)
            .finish()
    }
}
