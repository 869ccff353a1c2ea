use rustc_hash::FxHashMap;

use crate::schema::Slot;
use crate::value::Value;

/// A caller-defined record the evaluator reads attribute values from.
///
/// Values are located by the [`Slot`] each attribute was bound to in the
/// schema. Returning `None` means the record has no value at that slot; any
/// branch testing it simply doesn't match.
pub trait InputRecord {
    fn get(&self, slot: Slot) -> Option<Value>;
}

impl InputRecord for [Value] {
    fn get(&self, slot: Slot) -> Option<Value> {
        <[Value]>::get(self, slot.index()).cloned()
    }
}

impl InputRecord for Vec<Value> {
    fn get(&self, slot: Slot) -> Option<Value> {
        self.as_slice().get(slot.index()).cloned()
    }
}

impl<const N: usize> InputRecord for [Value; N] {
    fn get(&self, slot: Slot) -> Option<Value> {
        self.as_slice().get(slot.index()).cloned()
    }
}

/// Sparse records, where `None` marks a field the caller has no value for.
impl InputRecord for [Option<Value>] {
    fn get(&self, slot: Slot) -> Option<Value> {
        <[Option<Value>]>::get(self, slot.index()).cloned().flatten()
    }
}

impl InputRecord for Vec<Option<Value>> {
    fn get(&self, slot: Slot) -> Option<Value> {
        self.as_slice().get(slot.index()).cloned().flatten()
    }
}

impl InputRecord for FxHashMap<Slot, Value> {
    fn get(&self, slot: Slot) -> Option<Value> {
        FxHashMap::get(self, &slot).cloned()
    }
}

impl<R: InputRecord + ?Sized> InputRecord for &R {
    fn get(&self, slot: Slot) -> Option<Value> {
        (**self).get(slot)
    }
}

/// Adapts a closure into an [`InputRecord`], for records whose fields are
/// plain struct members.
///
/// ```
/// use dtree_engine::{FnRecord, InputRecord, Slot, Value};
///
/// struct Stream { state: i32, volume: u32 }
/// let stream = Stream { state: 2, volume: 80 };
/// let record = FnRecord(|slot: Slot| match slot.index() {
///     0 => Some(Value::Integer(stream.state)),
///     1 => Some(Value::Unsigned(stream.volume)),
///     _ => None,
/// });
/// assert_eq!(record.get(Slot::new(1)), Some(Value::Unsigned(80)));
/// ```
pub struct FnRecord<F>(pub F);

impl<F> InputRecord for FnRecord<F>
where
    F: Fn(Slot) -> Option<Value>,
{
    fn get(&self, slot: Slot) -> Option<Value> {
        (self.0)(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_and_maps() {
        let record = vec![Value::Integer(1), Value::from("x")];
        assert_eq!(InputRecord::get(&record, Slot::new(1)), Some(Value::from("x")));
        assert_eq!(InputRecord::get(&record, Slot::new(2)), None);
        assert_eq!(InputRecord::get(&record, Slot::INVALID), None);

        let sparse = vec![None, Some(Value::Unsigned(3))];
        assert_eq!(InputRecord::get(&sparse, Slot::new(0)), None);
        assert_eq!(InputRecord::get(&sparse, Slot::new(1)), Some(Value::Unsigned(3)));

        let mut map = FxHashMap::default();
        map.insert(Slot::new(9), Value::Floating(0.5));
        assert_eq!(InputRecord::get(&map, Slot::new(9)), Some(Value::Floating(0.5)));
        assert_eq!(InputRecord::get(&map, Slot::new(0)), None);
    }
}
