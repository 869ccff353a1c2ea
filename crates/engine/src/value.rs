use smol_str::SmolStr;
use std::fmt::{self, Write};
use thiserror::Error;

/// The scalar types a [`Value`] can hold.
///
/// Every type except [`ValueType::Bitmask`] is a *basic* type and may be used
/// as the element type of a [`ValueArray`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Integer,
    Unsigned,
    Floating,
    String,
    Bitmask,
}

impl ValueType {
    pub fn is_basic(self) -> bool {
        !matches!(self, ValueType::Bitmask)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Integer | ValueType::Unsigned | ValueType::Floating
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Unsigned => "unsigned",
            ValueType::Floating => "floating",
            ValueType::String => "string",
            ValueType::Bitmask => "bitmask",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full type of a value: a [`ValueType`], optionally lifted to an array
/// of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    pub base: ValueType,
    pub array: bool,
}

impl TypeTag {
    pub fn scalar(base: ValueType) -> Self {
        Self { base, array: false }
    }

    pub fn array(base: ValueType) -> Self {
        Self { base, array: true }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.array {
            write!(f, "{}|array", self.base)
        } else {
            write!(f, "{}", self.base)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("`{0}` can't be used as an array element type")]
    InvalidElementType(ValueType),
    #[error("array of {expected} can't hold a {found} element")]
    ElementTypeMismatch {
        expected: ValueType,
        found: TypeTag,
    },
    #[error("code {0} doesn't fit in a {width}-bit mask", width = Bitmask::WIDTH)]
    BitOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i32),
    Unsigned(u32),
    Floating(f64),
    String(SmolStr),
    Bitmask(Bitmask),
    Array(ValueArray),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Unsigned(_) => ValueType::Unsigned,
            Value::Floating(_) => ValueType::Floating,
            Value::String(_) => ValueType::String,
            Value::Bitmask(_) => ValueType::Bitmask,
            Value::Array(array) => array.elem_type(),
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Array(array) => TypeTag::array(array.elem_type()),
            other => TypeTag::scalar(other.value_type()),
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Render the value into at most `max` bytes.
    ///
    /// Arrays that don't fit are cut after the last element that does and
    /// closed with `...]`. Scalars are always rendered in full.
    pub fn format_bounded(&self, max: usize) -> String {
        let full = self.to_string();
        let Value::Array(array) = self else {
            return full;
        };
        if full.len() <= max {
            return full;
        }

        // Room is always kept for the `, ...]` tail.
        const ELLIPSIS: &str = "...]";
        let mut out = String::from("[");
        for (i, item) in array.items().iter().enumerate() {
            let piece = if i == 0 {
                item.to_string()
            } else {
                format!(", {item}")
            };
            if out.len() + piece.len() + ELLIPSIS.len() + 2 > max {
                break;
            }
            out.push_str(&piece);
        }
        if out.len() > 1 {
            out.push_str(", ");
        }
        out.push_str(ELLIPSIS);
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Unsigned(value) => write!(f, "{value}"),
            Value::Floating(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value:?}"),
            Value::Bitmask(mask) => write!(f, "{mask}"),
            Value::Array(array) => write!(f, "{array}"),
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Unsigned(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Floating(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<Bitmask> for Value {
    fn from(mask: Bitmask) -> Self {
        Value::Bitmask(mask)
    }
}

impl From<ValueArray> for Value {
    fn from(array: ValueArray) -> Self {
        Value::Array(array)
    }
}

/// A fixed-width set of small codes, one bit per code. The width is the
/// platform word size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitmask(usize);

impl Bitmask {
    pub const WIDTH: usize = usize::BITS as usize;

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn from_bits(bits: usize) -> Self {
        Self(bits)
    }

    pub fn from_codes<I>(codes: I) -> Result<Self, ValueError>
    where
        I: IntoIterator<Item = i32>,
    {
        let mut mask = Self::empty();
        for code in codes {
            mask.insert(code)?;
        }
        Ok(mask)
    }

    pub fn insert(&mut self, code: i32) -> Result<(), ValueError> {
        if code < 0 || code as usize >= Self::WIDTH {
            return Err(ValueError::BitOutOfRange(code.into()));
        }
        self.0 |= 1 << code;
        Ok(())
    }

    /// Whether `code` is in the set. Codes outside `0..WIDTH` are never
    /// members.
    pub fn contains(self, code: i64) -> bool {
        (0..Self::WIDTH as i64).contains(&code) && self.0 & (1 << code) != 0
    }

    pub fn bits(self) -> usize {
        self.0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The member codes in ascending order.
    pub fn codes(self) -> impl Iterator<Item = i32> {
        (0..Self::WIDTH)
            .filter(move |bit| self.0 & (1 << bit) != 0)
            .map(|bit| bit as i32)
    }
}

impl fmt::Display for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An ordered sequence of values of one basic type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueArray {
    elem: ValueType,
    items: Vec<Value>,
}

impl ValueArray {
    pub fn new(elem: ValueType, items: Vec<Value>) -> Result<Self, ValueError> {
        if !elem.is_basic() {
            return Err(ValueError::InvalidElementType(elem));
        }
        let expected = TypeTag::scalar(elem);
        if let Some(bad) = items.iter().find(|item| item.type_tag() != expected) {
            return Err(ValueError::ElementTypeMismatch {
                expected: elem,
                found: bad.type_tag(),
            });
        }
        Ok(Self { elem, items })
    }

    pub fn integers<I>(codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        Self {
            elem: ValueType::Integer,
            items: codes.into_iter().map(Value::Integer).collect(),
        }
    }

    pub fn elem_type(&self) -> ValueType {
        self.elem
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any element equals `value`. A value of a different type than
    /// the element type is never contained.
    pub fn contains(&self, value: &Value) -> bool {
        value.type_tag() == TypeTag::scalar(self.elem)
            && self.items.iter().any(|item| item == value)
    }
}

impl fmt::Display for ValueArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_char(']')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_rejects_bad_types() {
        assert_eq!(
            ValueArray::new(ValueType::Bitmask, vec![]),
            Err(ValueError::InvalidElementType(ValueType::Bitmask))
        );
        assert_eq!(
            ValueArray::new(ValueType::Integer, vec![Value::Integer(1), Value::from(2.5)]),
            Err(ValueError::ElementTypeMismatch {
                expected: ValueType::Integer,
                found: TypeTag::scalar(ValueType::Floating),
            })
        );
    }

    #[test]
    fn copies_are_deep() {
        let original = Value::Array(
            ValueArray::new(ValueType::String, vec!["a".into(), "b".into()]).unwrap(),
        );
        let copy = original.clone();
        drop(original);
        assert_eq!(copy.to_string(), r#"["a", "b"]"#);
        assert_eq!(copy.type_tag(), TypeTag::array(ValueType::String));
    }

    #[test]
    fn array_membership_is_typed() {
        let array = ValueArray::integers([1, 3, 5]);
        assert!(array.contains(&Value::Integer(3)));
        assert!(!array.contains(&Value::Integer(2)));
        assert!(!array.contains(&Value::Unsigned(3)));
        assert!(!array.contains(&Value::Floating(3.0)));
    }

    #[test]
    fn bitmask_bounds() {
        let mask = Bitmask::from_codes([0, 2]).unwrap();
        assert!(mask.contains(0));
        assert!(!mask.contains(1));
        assert!(mask.contains(2));
        assert!(!mask.contains(-1));
        assert!(!mask.contains(Bitmask::WIDTH as i64));
        assert_eq!(mask.codes().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(mask.len(), 2);
        assert_eq!(mask.to_string(), "0x5");

        let too_wide = Bitmask::WIDTH as i32;
        assert_eq!(
            Bitmask::from_codes([too_wide]),
            Err(ValueError::BitOutOfRange(too_wide.into()))
        );
    }

    #[test]
    fn format_bounded_truncates_arrays() {
        let value = Value::Array(ValueArray::integers([1, 2, 3, 4]));
        assert_eq!(value.format_bounded(12), "[1, 2, 3, 4]");
        assert_eq!(value.format_bounded(11), "[1, 2, ...]");
        assert_eq!(value.format_bounded(5), "[...]");
        assert_eq!(Value::from("pause").format_bounded(2), "\"pause\"");
    }

    #[test]
    fn type_tags_display() {
        assert_eq!(TypeTag::scalar(ValueType::Unsigned).to_string(), "unsigned");
        assert_eq!(TypeTag::array(ValueType::Integer).to_string(), "integer|array");
    }
}
