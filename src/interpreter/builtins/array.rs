use super::*;
use std::cmp::Ordering;

fn this_object(interp: &mut Interpreter, this: &JsValue, method: &str) -> Result<ObjectRef, JsValue> {
    interp
        .object_of(this)
        .ok_or_else(|| interp.create_type_error(&format!("Array.prototype.{method} called on non-object")))
}

fn length_of_array_like(obj: &ObjectRef) -> u32 {
    number_ops::to_uint32(to_number(&obj.borrow().get_property("length")))
}

fn set_length(obj: &ObjectRef, len: u64) {
    obj.borrow_mut()
        .set_property("length", JsValue::Number(len as f64));
}

/// Stable merge sort that tolerates comparators which are not a total order,
/// and stops at the first comparator error.
fn merge_sort_by<T, E, F>(items: Vec<T>, cmp: &mut F) -> Result<Vec<T>, E>
where
    F: FnMut(&T, &T) -> Result<Ordering, E>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let mut left = items;
    let right = left.split_off(left.len() / 2);
    let left = merge_sort_by(left, cmp)?;
    let right = merge_sort_by(right, cmp)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        let next = if cmp(r, l)? == Ordering::Less {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

impl Interpreter {
    pub(crate) fn setup_array_prototype(&mut self, object_proto: &ObjectRef) {
        let proto = self.allocate(JsObjectData::with_prototype(Some(object_proto)));
        proto.borrow_mut().class_name = "Array".to_string();
        proto.borrow_mut().write_length(0);

        // Array.prototype.push
        self.register_builtin(&proto, "push", 1, |interp, this_val, args, _ctx| {
            let o = match this_object(interp, this_val, "push") {
                Ok(o) => o,
                Err(e) => return Completion::Throw(e),
            };
            let mut len = length_of_array_like(&o) as u64;
            for arg in args {
                o.borrow_mut().set_property(&len.to_string(), arg.clone());
                len += 1;
            }
            set_length(&o, len);
            Completion::Normal(JsValue::Number(len as f64))
        });

        // Array.prototype.pop
        self.register_builtin(&proto, "pop", 0, |interp, this_val, _args, _ctx| {
            let o = match this_object(interp, this_val, "pop") {
                Ok(o) => o,
                Err(e) => return Completion::Throw(e),
            };
            let len = length_of_array_like(&o);
            if len == 0 {
                set_length(&o, 0);
                return Completion::Normal(JsValue::Undefined);
            }
            let idx = (len - 1).to_string();
            let val = o.borrow().get_property(&idx);
            o.borrow_mut().delete_property(&idx);
            set_length(&o, (len - 1) as u64);
            Completion::Normal(val)
        });

        // Array.prototype.sort
        self.register_builtin(&proto, "sort", 1, |interp, this_val, args, ctx| {
            let compare_fn = get_arg(args, 0);
            if !compare_fn.is_undefined() && !interp.is_callable(&compare_fn) {
                return Completion::Throw(interp.create_type_error("compareFn is not a function"));
            }
            let o = match this_object(interp, this_val, "sort") {
                Ok(o) => o,
                Err(e) => return Completion::Throw(e),
            };
            match interp.sort_elements(&o, &compare_fn, ctx) {
                Ok(()) => Completion::Normal(this_val.clone()),
                Err(e) => Completion::Throw(e),
            }
        });

        // Array.prototype.join
        self.register_builtin(&proto, "join", 1, |interp, this_val, args, ctx| {
            let o = match this_object(interp, this_val, "join") {
                Ok(o) => o,
                Err(e) => return Completion::Throw(e),
            };
            let separator = get_arg(args, 0);
            Completion::from(
                interp
                    .join_elements(&o, &separator, ctx)
                    .map(JsValue::String),
            )
        });

        // Array.prototype.toString
        self.register_builtin(&proto, "toString", 0, |interp, this_val, _args, ctx| {
            let join = interp.get(this_val, "join");
            if interp.is_callable(&join) {
                return interp.call_function(&join, this_val, &[], ctx);
            }
            let fallback = interp
                .object_prototype
                .as_ref()
                .map(|p| p.borrow().get_property("toString"))
                .unwrap_or(JsValue::Undefined);
            interp.call_function(&fallback, this_val, &[], ctx)
        });

        self.array_prototype = Some(proto);
    }

    /// Sorts the own index-keyed elements in place. Holes move to the end and
    /// `undefined` sorts after every other value. The sort is stable.
    fn sort_elements(&mut self, o: &ObjectRef, compare_fn: &JsValue, ctx: &ContextRef) -> Result<(), JsValue> {
        let len = length_of_array_like(o);
        let mut present: Vec<(u32, JsValue)> = {
            let obj = o.borrow();
            obj.keys()
                .iter()
                .filter_map(|key| make_array_index(key).filter(|i| *i < len))
                .filter_map(|i| obj.get_own(&i.to_string()).map(|b| (i, b.borrow().value().clone())))
                .collect()
        };
        present.sort_unstable_by_key(|(i, _)| *i);
        present.dedup_by_key(|(i, _)| *i);
        let indices: Vec<u32> = present.iter().map(|(i, _)| *i).collect();

        let (mut undefineds, defined): (Vec<JsValue>, Vec<JsValue>) = present
            .into_iter()
            .map(|(_, v)| v)
            .partition(JsValue::is_undefined);

        let mut sorted: Vec<JsValue> = if compare_fn.is_undefined() {
            let mut keyed = Vec::with_capacity(defined.len());
            for v in defined {
                let key = self.to_display_string(&v, ctx)?;
                keyed.push((key, v));
            }
            keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
            keyed.into_iter().map(|(_, v)| v).collect()
        } else {
            merge_sort_by(defined, &mut |x: &JsValue, y: &JsValue| -> Result<Ordering, JsValue> {
                let args = [x.clone(), y.clone()];
                let v = self
                    .call_function(compare_fn, &JsValue::Undefined, &args, ctx)
                    .into_result()?;
                let n = to_number(&v);
                Ok(if n < 0.0 {
                    Ordering::Less
                } else if n > 0.0 {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                })
            })?
        };
        sorted.append(&mut undefineds);

        let mut obj = o.borrow_mut();
        let filled = sorted.len();
        for (i, v) in sorted.into_iter().enumerate() {
            obj.set_property(&i.to_string(), v);
        }
        // Every index below `filled` was just written; the rest were vacated.
        for i in indices.into_iter().filter(|i| *i as usize >= filled) {
            obj.delete_property(&i.to_string());
        }
        Ok(())
    }

    // §23.1.3.18 Array.prototype.join
    fn join_elements(&mut self, o: &ObjectRef, separator: &JsValue, ctx: &ContextRef) -> Result<JsString, JsValue> {
        let id = o.borrow().id.unwrap_or_default();
        if self.join_stack.contains(&id) {
            return Ok(JsString::from_str(""));
        }
        let sep = if separator.is_undefined() {
            JsString::from_str(",")
        } else {
            self.to_display_string(separator, ctx)?
        };

        self.join_stack.push(id);
        let result = self.join_with(o, &sep, ctx);
        self.join_stack.pop();
        result
    }

    fn join_with(&mut self, o: &ObjectRef, sep: &JsString, ctx: &ContextRef) -> Result<JsString, JsValue> {
        let len = length_of_array_like(o);
        let mut out: Vec<u16> = Vec::new();
        for i in 0..len {
            if i > 0 {
                out.extend_from_slice(&sep.code_units);
            }
            let element = o.borrow().get_property(&i.to_string());
            if !element.is_nullish() {
                out.extend(self.to_display_string(&element, ctx)?.code_units);
            }
        }
        Ok(JsString { code_units: out })
    }

    pub fn create_array(&mut self, values: Vec<JsValue>) -> JsValue {
        let mut obj_data = JsObjectData::with_prototype(
            self.array_prototype
                .as_ref()
                .or(self.object_prototype.as_ref()),
        );
        obj_data.class_name = "Array".to_string();
        obj_data.write_length(0);
        for (i, v) in values.into_iter().enumerate() {
            obj_data.set_property(&i.to_string(), v);
        }
        Self::to_value(&self.allocate(obj_data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(values: &[f64]) -> Vec<JsValue> {
        values.iter().map(|n| JsValue::Number(*n)).collect()
    }

    fn invoke(interp: &mut Interpreter, target: &JsValue, name: &str, args: &[JsValue]) -> Completion {
        let ctx = interp.global_context();
        let f = interp.get(target, name);
        interp.call_function(&f, target, args, &ctx)
    }

    fn length(interp: &Interpreter, arr: &JsValue) -> JsValue {
        interp.get(arr, "length")
    }

    fn printed(interp: &mut Interpreter, arr: &JsValue) -> String {
        let ctx = interp.global_context();
        interp.to_display_string(arr, &ctx).unwrap().to_rust_string()
    }

    #[test]
    fn length_of_literals() {
        let mut interp = Interpreter::new();
        let empty = interp.create_array(vec![]);
        assert_eq!(length(&interp, &empty), JsValue::Number(0.0));
        let three = interp.create_array(numbers(&[1.0, 2.0, 3.0]));
        assert_eq!(length(&interp, &three), JsValue::Number(3.0));
    }

    #[test]
    fn length_follows_index_writes() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(vec![]);
        for (i, v) in [1.0, 2.0, 3.0].into_iter().enumerate() {
            interp.set(&x, &i.to_string(), JsValue::Number(v));
        }
        assert_eq!(length(&interp, &x), JsValue::Number(3.0));

        let sparse = interp.create_array(vec![]);
        interp.set(&sparse, "2", JsValue::Number(3.0));
        assert_eq!(length(&interp, &sparse), JsValue::Number(3.0));
    }

    #[test]
    fn push_appends_at_length() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(vec![]);
        let result = invoke(&mut interp, &x, "push", &[JsValue::Number(42.0)]);
        assert_eq!(result.into_result().unwrap(), JsValue::Number(1.0));
        assert_eq!(length(&interp, &x), JsValue::Number(1.0));
        assert_eq!(interp.get(&x, "0"), JsValue::Number(42.0));

        let y = interp.create_array(numbers(&[1.0, 2.0, 3.0]));
        invoke(&mut interp, &y, "push", &[JsValue::Number(42.0)]);
        assert_eq!(interp.get(&y, "3"), JsValue::Number(42.0));
    }

    #[test]
    fn repeated_push_prints_in_order() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(vec![]);
        for n in [4.0, 3.0, 2.0, 1.0] {
            invoke(&mut interp, &x, "push", &[JsValue::Number(n)]);
        }
        assert_eq!(printed(&mut interp, &x), "4,3,2,1");
    }

    #[test]
    fn pop_removes_last_element() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(numbers(&[4.0, 3.0, 2.0, 1.0]));
        let popped = invoke(&mut interp, &x, "pop", &[]).into_result().unwrap();
        assert_eq!(popped, JsValue::Number(1.0));
        assert_eq!(length(&interp, &x), JsValue::Number(3.0));
        assert!(!interp.object_of(&x).unwrap().borrow().has_own_property("3"));
    }

    #[test]
    fn pop_until_empty_then_undefined() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(numbers(&[4.0, 3.0, 2.0, 1.0]));
        let popped: Vec<JsValue> = (0..4)
            .map(|_| invoke(&mut interp, &x, "pop", &[]).into_result().unwrap())
            .collect();
        assert_eq!(popped, numbers(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(length(&interp, &x), JsValue::Number(0.0));

        for _ in 0..2 {
            let extra = invoke(&mut interp, &x, "pop", &[]).into_result().unwrap();
            assert_eq!(extra, JsValue::Undefined);
            assert_eq!(length(&interp, &x), JsValue::Number(0.0));
        }
    }

    #[test]
    fn default_sort_is_lexicographic() {
        let mut interp = Interpreter::new();
        for (input, expected) in [
            (vec![5.0, 2.0], "2,5"),
            (vec![1.0, 2.0, 3.0], "1,2,3"),
            (vec![4.0, 3.0, 2.0, 1.0], "1,2,3,4"),
            (vec![10.0, 2.0], "10,2"),
        ] {
            let x = interp.create_array(numbers(&input));
            let result = invoke(&mut interp, &x, "sort", &[]).into_result().unwrap();
            assert_eq!(result, x, "sort returns the receiver");
            assert_eq!(printed(&mut interp, &x), expected);
        }
    }

    #[test]
    fn sort_moves_undefined_and_holes_last() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(vec![
            JsValue::Undefined,
            JsValue::string("b"),
            JsValue::string("a"),
        ]);
        interp.set(&x, "4", JsValue::string("0"));
        invoke(&mut interp, &x, "sort", &[]);
        assert_eq!(interp.get(&x, "0"), JsValue::string("0"));
        assert_eq!(interp.get(&x, "1"), JsValue::string("a"));
        assert_eq!(interp.get(&x, "2"), JsValue::string("b"));
        assert_eq!(interp.get(&x, "3"), JsValue::Undefined);
        assert!(!interp.object_of(&x).unwrap().borrow().has_own_property("4"));
        assert_eq!(length(&interp, &x), JsValue::Number(5.0));
    }

    #[test]
    fn sort_with_comparator() {
        let mut interp = Interpreter::new();
        let numeric = interp.create_function(JsFunction::native("cmp", 2, |_, _, args, _| {
            let a = to_number(&get_arg(args, 0));
            let b = to_number(&get_arg(args, 1));
            Completion::Normal(JsValue::Number(a - b))
        }));
        let x = interp.create_array(numbers(&[10.0, 2.0, 33.0, 4.0]));
        invoke(&mut interp, &x, "sort", &[numeric]);
        assert_eq!(printed(&mut interp, &x), "2,4,10,33");
    }

    #[test]
    fn sort_rejects_bad_comparator_and_propagates_throws() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(numbers(&[2.0, 1.0]));
        let err = invoke(&mut interp, &x, "sort", &[JsValue::Number(1.0)])
            .into_result()
            .unwrap_err();
        assert_eq!(interp.error_name(&err).as_deref(), Some("TypeError"));

        let thrower = interp.create_function(JsFunction::native("cmp", 2, |interp, _, _, _| {
            Completion::Throw(interp.create_reference_error("nope"))
        }));
        let err = invoke(&mut interp, &x, "sort", &[thrower])
            .into_result()
            .unwrap_err();
        assert_eq!(interp.error_name(&err).as_deref(), Some("ReferenceError"));
    }

    #[test]
    fn sort_survives_inconsistent_comparator() {
        let mut interp = Interpreter::new();
        let state = Rc::new(std::cell::Cell::new(0x9e37_79b9_7f4a_7c15_u64));
        let seed = state.clone();
        let coin = interp.create_function(JsFunction::native("coin", 2, move |_, _, _, _| {
            let mut x = seed.get();
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            seed.set(x);
            Completion::Normal(JsValue::Number((x % 3) as f64 - 1.0))
        }));

        let input: Vec<f64> = (0..200).map(|n| ((n * 37) % 200) as f64).collect();
        let x = interp.create_array(numbers(&input));
        let result = invoke(&mut interp, &x, "sort", &[coin]).into_result().unwrap();
        assert_eq!(result, x);
        assert_eq!(length(&interp, &x), JsValue::Number(200.0));

        let mut seen: Vec<f64> = (0..200)
            .map(|i| match interp.get(&x, &i.to_string()) {
                JsValue::Number(n) => n,
                other => panic!("unexpected element {other}"),
            })
            .collect();
        seen.sort_by(f64::total_cmp);
        let mut expected = input;
        expected.sort_by(f64::total_cmp);
        assert_eq!(seen, expected);
    }

    #[test]
    fn sort_stops_comparing_after_a_throw() {
        let mut interp = Interpreter::new();
        let calls = Rc::new(std::cell::Cell::new(0));
        let counter = calls.clone();
        let flaky = interp.create_function(JsFunction::native("cmp", 2, move |interp, _, args, _| {
            counter.set(counter.get() + 1);
            if counter.get() == 10 {
                return Completion::Throw(interp.create_type_error("tenth call"));
            }
            let a = to_number(&get_arg(args, 0));
            let b = to_number(&get_arg(args, 1));
            Completion::Normal(JsValue::Number(a - b))
        }));
        let input: Vec<f64> = (0..50).rev().map(|n| n as f64).collect();
        let x = interp.create_array(numbers(&input));
        let err = invoke(&mut interp, &x, "sort", &[flaky]).into_result().unwrap_err();
        assert_eq!(interp.error_name(&err).as_deref(), Some("TypeError"));
        assert_eq!(calls.get(), 10);
        assert_eq!(interp.get(&x, "0"), JsValue::Number(49.0));
    }

    #[test]
    fn sort_of_sparse_array_with_huge_index() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(numbers(&[2.0]));
        interp.set(&x, &MAX_ARRAY_INDEX.to_string(), JsValue::Number(1.0));
        assert_eq!(length(&interp, &x), JsValue::Number(4294967295.0));

        invoke(&mut interp, &x, "sort", &[]).into_result().unwrap();
        assert_eq!(interp.get(&x, "0"), JsValue::Number(1.0));
        assert_eq!(interp.get(&x, "1"), JsValue::Number(2.0));
        let obj = interp.object_of(&x).unwrap();
        assert!(!obj.borrow().has_own_property(&MAX_ARRAY_INDEX.to_string()));
        assert_eq!(length(&interp, &x), JsValue::Number(4294967295.0));
    }

    #[test]
    fn join_uses_separator_and_blanks_nullish() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(vec![
            JsValue::Number(1.0),
            JsValue::Null,
            JsValue::Undefined,
            JsValue::Boolean(true),
        ]);
        let joined = invoke(&mut interp, &x, "join", &[JsValue::string("-")])
            .into_result()
            .unwrap();
        assert_eq!(joined, JsValue::string("1---true"));
    }

    #[test]
    fn join_cuts_cycles() {
        let mut interp = Interpreter::new();
        let x = interp.create_array(numbers(&[1.0]));
        invoke(&mut interp, &x, "push", &[x.clone()]);
        assert_eq!(printed(&mut interp, &x), "1,");
    }

    #[test]
    fn array_methods_reject_primitive_receiver() {
        let mut interp = Interpreter::new();
        let ctx = interp.global_context();
        let arr = interp.create_array(vec![]);
        let push = interp.get(&arr, "push");
        let err = interp
            .call_function(&push, &JsValue::Number(1.0), &[], &ctx)
            .into_result()
            .unwrap_err();
        assert_eq!(interp.error_name(&err).as_deref(), Some("TypeError"));
    }

    #[test]
    fn push_on_generic_object_maintains_length() {
        let mut interp = Interpreter::new();
        let ctx = interp.global_context();
        let arr = interp.create_array(vec![]);
        let push = interp.get(&arr, "push");
        let obj = interp.create_object();
        interp
            .call_function(&push, &obj, &[JsValue::string("a"), JsValue::string("b")], &ctx)
            .into_result()
            .unwrap();
        assert_eq!(interp.get(&obj, "length"), JsValue::Number(2.0));
        assert_eq!(interp.get(&obj, "1"), JsValue::string("b"));
    }
}
