use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::value::ValueType;

/// Identity of an attribute within its schema, assigned in definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(u32);

impl AttrId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The location of an attribute in a caller's record layout.
///
/// Attributes start out with [`Slot::INVALID`] and are given a real slot with
/// [`AttributeSchema::bind_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(u32);

impl Slot {
    pub const INVALID: Slot = Slot(u32::MAX);

    /// # Panics
    /// Panics if `index` doesn't fit below the invalid sentinel.
    pub fn new(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "slot index out of range");
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "@{}", self.0)
        } else {
            f.write_str("@unbound")
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Enumerated,
    Continuous,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeKind::Enumerated => "enumerated",
            AttributeKind::Continuous => "continuous",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: SmolStr,
    id: AttrId,
    kind: AttributeKind,
    value_type: ValueType,
    slot: Slot,
    values: IndexMap<SmolStr, i32>,
}

impl Attribute {
    fn new(name: SmolStr, id: AttrId) -> Self {
        Self {
            name,
            id,
            kind: AttributeKind::Continuous,
            value_type: ValueType::Floating,
            slot: Slot::INVALID,
            values: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> AttrId {
        self.id
    }

    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub fn is_enumerated(&self) -> bool {
        self.kind == AttributeKind::Enumerated
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// The code of the enumerated value `name`.
    pub fn code_of(&self, name: &str) -> Option<i32> {
        self.values.get(name).copied()
    }

    /// The name of the enumerated value with `code`.
    pub fn name_of(&self, code: i32) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(name, _)| name.as_str())
    }

    /// The enumerated values, sorted by code.
    pub fn values(&self) -> Vec<(&str, i32)> {
        let mut values: Vec<_> = self
            .values
            .iter()
            .map(|(name, code)| (name.as_str(), *code))
            .collect();
        values.sort_by_key(|(_, code)| *code);
        values
    }

    fn register(&mut self, name: SmolStr, code: i32) {
        if self.kind == AttributeKind::Continuous {
            self.kind = AttributeKind::Enumerated;
            self.value_type = ValueType::Integer;
        }
        self.values.insert(name, code);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("decision attribute `{0}` is not defined")]
    MissingDecision(SmolStr),
    #[error("decision attribute `{0}` must be enumerated")]
    DecisionNotEnumerated(SmolStr),
    #[error("decision attribute `{0}` has no values")]
    EmptyDecision(SmolStr),
    #[error("decision attribute `{attribute}` is missing code {code}")]
    MissingCode { attribute: SmolStr, code: i32 },
    #[error("decision attribute `{attribute}` uses code {code} more than once")]
    DuplicateCode { attribute: SmolStr, code: i32 },
    #[error("value `{value}` of `{attribute}` is already registered")]
    DuplicateValue { attribute: SmolStr, value: SmolStr },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown attribute `{0}`")]
    UnknownAttribute(SmolStr),
    #[error("attribute `{0}` is not enumerated")]
    NotEnumerated(SmolStr),
    #[error("`{value}` is not a value of `{attribute}`")]
    UnknownValue { attribute: SmolStr, value: SmolStr },
    #[error("`{attribute}` has no value with code {code}")]
    UnknownCode { attribute: SmolStr, code: i32 },
}

/// Collects attributes and their values, then validates the decision
/// attribute in [`SchemaBuilder::finish`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    attributes: IndexMap<SmolStr, Attribute>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the id of the attribute `name`, defining it as a continuous
    /// attribute if it doesn't exist yet.
    pub fn attribute(&mut self, name: &str) -> AttrId {
        if let Some(attr) = self.attributes.get(name) {
            return attr.id;
        }
        let id = AttrId(self.attributes.len() as u32);
        self.attributes.insert(name.into(), Attribute::new(name.into(), id));
        id
    }

    /// Registers `value` for `attr` with the next free dense code and returns
    /// the code. Registering a known value returns its existing code.
    pub fn push_value(&mut self, attr: AttrId, value: &str) -> i32 {
        let attr = &mut self.attributes[attr.index()];
        if let Some(code) = attr.code_of(value) {
            return code;
        }
        let code = attr.values.len() as i32;
        attr.register(value.into(), code);
        code
    }

    /// Registers `value` for `attr` under an explicit code.
    pub fn insert_value(
        &mut self,
        attr: AttrId,
        value: &str,
        code: i32,
    ) -> Result<(), SchemaError> {
        let attr = &mut self.attributes[attr.index()];
        if attr.values.contains_key(value) {
            return Err(SchemaError::DuplicateValue {
                attribute: attr.name.clone(),
                value: value.into(),
            });
        }
        attr.register(value.into(), code);
        Ok(())
    }

    /// Designates `decision` as the decision attribute and checks that its
    /// codes are exactly `0..n`.
    pub fn finish(self, decision: &str) -> Result<AttributeSchema, SchemaError> {
        let attr = self
            .attributes
            .get(decision)
            .ok_or_else(|| SchemaError::MissingDecision(decision.into()))?;
        if !attr.is_enumerated() {
            return Err(SchemaError::DecisionNotEnumerated(attr.name.clone()));
        }
        if attr.values.is_empty() {
            return Err(SchemaError::EmptyDecision(attr.name.clone()));
        }

        let mut names: Vec<Option<SmolStr>> = vec![None; attr.values.len()];
        for (name, &code) in &attr.values {
            let slot = usize::try_from(code)
                .ok()
                .and_then(|index| names.get_mut(index))
                .ok_or_else(|| SchemaError::MissingCode {
                    attribute: attr.name.clone(),
                    code: first_gap(&attr.values),
                })?;
            if slot.is_some() {
                return Err(SchemaError::DuplicateCode {
                    attribute: attr.name.clone(),
                    code,
                });
            }
            *slot = Some(name.clone());
        }
        // Every code is in range and unique, so every entry is filled.
        let decision_names = names.into_iter().flatten().collect();

        let decision = attr.id;
        debug!(
            attributes = self.attributes.len(),
            decision = %attr.name,
            "attribute schema finished"
        );
        Ok(AttributeSchema {
            attributes: self.attributes,
            decision,
            decision_names,
        })
    }
}

/// Smallest non-negative code not used by `values`.
fn first_gap(values: &IndexMap<SmolStr, i32>) -> i32 {
    (0..).find(|code| !values.values().any(|c| c == code)).unwrap_or(0)
}

/// A validated set of attributes with one designated decision attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSchema {
    attributes: IndexMap<SmolStr, Attribute>,
    decision: AttrId,
    decision_names: Vec<SmolStr>,
}

impl AttributeSchema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_by_id(&self, id: AttrId) -> Option<&Attribute> {
        self.attributes.get_index(id.index()).map(|(_, attr)| attr)
    }

    /// All attributes, ordered by id.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// All attribute names, ordered by id.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(SmolStr::as_str)
    }

    /// The values of an enumerated attribute, sorted by code. Continuous
    /// attributes have no values.
    pub fn attribute_values(&self, name: &str) -> Result<Vec<(&str, i32)>, LookupError> {
        self.lookup(name).map(Attribute::values)
    }

    pub fn decision_attribute(&self) -> &Attribute {
        &self.attributes[self.decision.index()]
    }

    pub fn decision_name(&self, code: i32) -> Option<&str> {
        let index = usize::try_from(code).ok()?;
        self.decision_names.get(index).map(SmolStr::as_str)
    }

    pub fn decision_code(&self, name: &str) -> Option<i32> {
        self.decision_attribute().code_of(name)
    }

    /// The number of decision values; valid codes are `0..max`.
    pub fn decision_value_max(&self) -> i32 {
        self.decision_names.len() as i32
    }

    /// Translates a value name of an enumerated attribute into its code.
    pub fn integer_value(&self, attribute: &str, value: &str) -> Result<i32, LookupError> {
        let attr = self.enumerated(attribute)?;
        attr.code_of(value).ok_or_else(|| LookupError::UnknownValue {
            attribute: attr.name.clone(),
            value: value.into(),
        })
    }

    /// Translates a code of an enumerated attribute back into its name.
    pub fn value_name(&self, attribute: &str, code: i32) -> Result<&str, LookupError> {
        let attr = self.enumerated(attribute)?;
        attr.name_of(code).ok_or_else(|| LookupError::UnknownCode {
            attribute: attr.name.clone(),
            code,
        })
    }

    /// Binds `attribute` to `slot` in the caller's record layout. Branches
    /// copy the slot when they are built, so this has to happen before the
    /// tree is constructed. Returns `false` for an unknown attribute.
    pub fn bind_slot(&mut self, attribute: &str, slot: Slot) -> bool {
        match self.attributes.get_mut(attribute) {
            Some(attr) => {
                debug!(attribute, %slot, "bound attribute");
                attr.slot = slot;
                true
            }
            None => false,
        }
    }

    /// Binds every attribute to the slot matching its id.
    pub fn bind_slots_by_id(&mut self) {
        for attr in self.attributes.values_mut() {
            attr.slot = Slot::new(attr.id.index());
        }
    }

    fn lookup(&self, name: &str) -> Result<&Attribute, LookupError> {
        self.attribute(name)
            .ok_or_else(|| LookupError::UnknownAttribute(name.into()))
    }

    fn enumerated(&self, name: &str) -> Result<&Attribute, LookupError> {
        let attr = self.lookup(name)?;
        if attr.is_enumerated() {
            Ok(attr)
        } else {
            Err(LookupError::NotEnumerated(attr.name.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback_schema() -> AttributeSchema {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        for value in ["stop", "pause", "play"] {
            builder.push_value(state, value);
        }
        builder.attribute("level");
        let count = builder.attribute("count");
        builder.push_value(count, "low");
        builder.push_value(count, "high");
        builder.finish("state").unwrap()
    }

    #[test]
    fn decision_table() {
        let schema = playback_schema();
        assert_eq!(schema.decision_value_max(), 3);
        assert_eq!(schema.decision_name(1), Some("pause"));
        assert_eq!(schema.decision_name(3), None);
        assert_eq!(schema.decision_name(-1), None);
        assert_eq!(schema.decision_code("play"), Some(2));
    }

    #[test]
    fn kinds_and_types() {
        let schema = playback_schema();
        let level = schema.attribute("level").unwrap();
        assert_eq!(level.kind(), AttributeKind::Continuous);
        assert_eq!(level.value_type(), ValueType::Floating);
        let count = schema.attribute("count").unwrap();
        assert_eq!(count.kind(), AttributeKind::Enumerated);
        assert_eq!(count.value_type(), ValueType::Integer);
        assert_eq!(count.id().index(), 2);
    }

    #[test]
    fn iteration_is_ordered() {
        let schema = playback_schema();
        let names: Vec<_> = schema.attribute_names().collect();
        assert_eq!(names, ["state", "level", "count"]);
        assert_eq!(
            schema.attribute_values("state").unwrap(),
            [("stop", 0), ("pause", 1), ("play", 2)]
        );
        assert!(schema.attribute_values("level").unwrap().is_empty());
    }

    #[test]
    fn names_round_trip() {
        let schema = playback_schema();
        for attr in schema.attributes().filter(|attr| attr.is_enumerated()) {
            for (name, code) in attr.values() {
                assert_eq!(schema.value_name(attr.name(), code), Ok(name));
                assert_eq!(schema.integer_value(attr.name(), name), Ok(code));
            }
        }
        assert_eq!(
            schema.integer_value("level", "x"),
            Err(LookupError::NotEnumerated("level".into()))
        );
        assert_eq!(
            schema.integer_value("count", "medium"),
            Err(LookupError::UnknownValue {
                attribute: "count".into(),
                value: "medium".into()
            })
        );
        assert_eq!(
            schema.value_name("nope", 0),
            Err(LookupError::UnknownAttribute("nope".into()))
        );
    }

    #[test]
    fn non_contiguous_codes_fail() {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        builder.insert_value(state, "stop", 0).unwrap();
        builder.insert_value(state, "play", 2).unwrap();
        assert_eq!(
            builder.finish("state"),
            Err(SchemaError::MissingCode {
                attribute: "state".into(),
                code: 1
            })
        );
    }

    #[test]
    fn duplicate_codes_fail() {
        let mut builder = SchemaBuilder::new();
        let state = builder.attribute("state");
        builder.insert_value(state, "stop", 0).unwrap();
        builder.insert_value(state, "halt", 0).unwrap();
        assert_eq!(
            builder.finish("state"),
            Err(SchemaError::DuplicateCode {
                attribute: "state".into(),
                code: 0
            })
        );
    }

    #[test]
    fn decision_must_be_enumerated() {
        let mut builder = SchemaBuilder::new();
        builder.attribute("level");
        assert_eq!(
            builder.finish("level"),
            Err(SchemaError::DecisionNotEnumerated("level".into()))
        );

        let builder = SchemaBuilder::new();
        assert_eq!(
            builder.finish("state"),
            Err(SchemaError::MissingDecision("state".into()))
        );
    }

    #[test]
    fn binding() {
        let mut schema = playback_schema();
        assert_eq!(schema.attribute("count").unwrap().slot(), Slot::INVALID);
        assert!(schema.bind_slot("count", Slot::new(4)));
        assert!(!schema.bind_slot("volume", Slot::new(5)));
        assert_eq!(schema.attribute("count").unwrap().slot(), Slot::new(4));

        schema.bind_slots_by_id();
        assert_eq!(schema.attribute("count").unwrap().slot(), Slot::new(2));
        assert_eq!(schema.attribute("level").unwrap().slot().to_string(), "@1");
    }
}
