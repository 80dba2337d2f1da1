//! # Type Descriptors
//!
//! A [`Descriptor`] declares the canonical [`TypeTag`] of one model attribute
//! together with its validation policy (`required`, `default`,
//! `acceptedTypes`). An [`AttributeSet`] maps attribute names (camelCase) to
//! descriptors and is what a [`Resource`](crate::model::Resource) returns from
//! `attributes()`.
//!
//! Descriptors can be built in code:
//!
//! ```rust
//! use remodel::descriptor::{AttributeSet, Descriptor, TypeTag};
//!
//! let attributes = AttributeSet::base()
//!     .with("name", Descriptor::new(TypeTag::String).required().accepting([TypeTag::Null]))
//!     .with("age", Descriptor::new(TypeTag::Number));
//! assert!(attributes.get("id").unwrap().is_required());
//! ```
//!
//! or read from JSON with [`describe_type`] / [`AttributeSet::from_json`].

use crate::error::DescriptorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Option keys honoured by [`describe_type`]; everything else is dropped.
const OPTION_WHITELIST: [&str; 3] = ["required", "default", "acceptedTypes"];

/// Closed set of runtime type classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeTag {
    Undefined,
    Null,
    EmptyString,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    Function,
    Class,
    Simple,
}

impl TypeTag {
    pub const ALL: [TypeTag; 12] = [
        TypeTag::Undefined,
        TypeTag::Null,
        TypeTag::EmptyString,
        TypeTag::String,
        TypeTag::Number,
        TypeTag::Boolean,
        TypeTag::Array,
        TypeTag::Object,
        TypeTag::Date,
        TypeTag::Function,
        TypeTag::Class,
        TypeTag::Simple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Undefined => "undefined",
            TypeTag::Null => "null",
            TypeTag::EmptyString => "emptyString",
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Date => "date",
            TypeTag::Function => "function",
            TypeTag::Class => "class",
            TypeTag::Simple => "simple",
        }
    }

    /// Classifies a JSON value. `None` stands for an absent (undefined) attribute.
    pub fn of(value: Option<&Value>) -> TypeTag {
        match value {
            None => TypeTag::Undefined,
            Some(Value::Null) => TypeTag::Null,
            Some(Value::String(s)) if s.is_empty() => TypeTag::EmptyString,
            Some(Value::String(_)) => TypeTag::String,
            Some(Value::Number(_)) => TypeTag::Number,
            Some(Value::Bool(_)) => TypeTag::Boolean,
            Some(Value::Array(_)) => TypeTag::Array,
            Some(Value::Object(_)) => TypeTag::Object,
        }
    }

    /// Tags matched by [`TypeTag::Simple`].
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::EmptyString
                | TypeTag::Number
                | TypeTag::Boolean
                | TypeTag::Date
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| DescriptorError::InvalidTypeName(s.to_string()))
    }
}

/// Expected type and validation policy of one attribute.
///
/// A descriptor without a type is legal; the validator treats the attribute as
/// undescribed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    type_tag: Option<TypeTag>,
    required: bool,
    default: Option<Value>,
    accepted_types: Vec<TypeTag>,
}

impl Descriptor {
    pub fn new(type_tag: TypeTag) -> Self {
        Self {
            type_tag: Some(type_tag),
            ..Self::default()
        }
    }

    /// A descriptor that declares the attribute without enforcing a type.
    pub fn untyped() -> Self {
        Self::default()
    }

    /// Mismatches become hard errors instead of warnings.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value used when the attribute is absent.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Additional tags that pass validation besides the declared type.
    pub fn accepting(mut self, tags: impl IntoIterator<Item = TypeTag>) -> Self {
        self.accepted_types.extend(tags);
        self
    }

    pub fn type_tag(&self) -> Option<TypeTag> {
        self.type_tag
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn accepted_types(&self) -> &[TypeTag] {
        &self.accepted_types
    }

    /// Reads a descriptor shipped as data:
    /// `{ "type": "string", "required": true, "acceptedTypes": ["null"] }`.
    pub fn from_json(attribute: &str, value: &Value) -> Result<Self, DescriptorError> {
        let Value::Object(options) = value else {
            return Err(DescriptorError::MissingTypeDescriptor(attribute.to_string()));
        };
        let type_name = options
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DescriptorError::MissingTypeDescriptor(attribute.to_string()))?;
        describe_type(type_name, options)
    }
}

/// Builds a descriptor from a type name and an options object.
///
/// Only `required`, `default` and `acceptedTypes` are kept; unknown keys are
/// silently dropped. A non-array `acceptedTypes` is ignored.
pub fn describe_type(type_name: &str, options: &Map<String, Value>) -> Result<Descriptor, DescriptorError> {
    let mut descriptor = Descriptor::new(type_name.parse()?);

    for (key, value) in options {
        match key.as_str() {
            "required" => descriptor.required = is_truthy(value),
            "default" => descriptor.default = Some(value.clone()),
            "acceptedTypes" => {
                if let Value::Array(names) = value {
                    for name in names {
                        let name = name.as_str().unwrap_or_default();
                        descriptor.accepted_types.push(name.parse()?);
                    }
                }
            }
            other if other == "type" || OPTION_WHITELIST.contains(&other) => {}
            other => debug!(option = other, type_name, "Dropping unknown descriptor option"),
        }
    }

    Ok(descriptor)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Attribute name (camelCase) to descriptor mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet(BTreeMap<String, Descriptor>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors every model carries: `id`, `createdAt`, `updatedAt`.
    pub fn base() -> Self {
        Self::new()
            .with("id", Descriptor::new(TypeTag::Number).required())
            .with("createdAt", Descriptor::new(TypeTag::Date))
            .with("updatedAt", Descriptor::new(TypeTag::Date))
    }

    pub fn with(mut self, name: impl Into<String>, descriptor: Descriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: Descriptor) {
        self.0.insert(name.into(), descriptor);
    }

    /// Merges `other` on top of `self`; entries of `other` win.
    pub fn merge(mut self, other: AttributeSet) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Descriptor)> {
        self.0.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads `{ "name": { "type": "string", ... }, ... }`.
    pub fn from_json(value: &Value) -> Result<Self, DescriptorError> {
        let Value::Object(entries) = value else {
            return Err(DescriptorError::InvalidSchema(format!(
                "expected an object of descriptors, got {value}"
            )));
        };
        entries
            .iter()
            .map(|(name, descriptor)| Ok((name.clone(), Descriptor::from_json(name, descriptor)?)))
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_describe_type_keeps_whitelisted_options() {
        let descriptor = describe_type(
            "string",
            &options(json!({
                "required": true,
                "default": "n/a",
                "acceptedTypes": ["null", "emptyString"],
                "label": "ignored"
            })),
        )
        .unwrap();

        assert_eq!(descriptor.type_tag(), Some(TypeTag::String));
        assert!(descriptor.is_required());
        assert_eq!(descriptor.default_value(), Some(&json!("n/a")));
        assert_eq!(descriptor.accepted_types(), &[TypeTag::Null, TypeTag::EmptyString]);
    }

    #[test]
    fn test_describe_type_rejects_unknown_type_name() {
        let err = describe_type("integer", &Map::new()).unwrap_err();
        assert_eq!(err, DescriptorError::InvalidTypeName("integer".into()));
        assert_eq!(err.to_string(), "Unexpected \"integer\" passed as \"typeName\"");
    }

    #[test]
    fn test_describe_type_ignores_non_array_accepted_types() {
        let descriptor = describe_type("number", &options(json!({ "acceptedTypes": "null" }))).unwrap();
        assert!(descriptor.accepted_types().is_empty());
    }

    #[test]
    fn test_from_json_requires_type() {
        let err = Descriptor::from_json("name", &json!({ "required": true })).unwrap_err();
        assert_eq!(err, DescriptorError::MissingTypeDescriptor("name".into()));
    }

    #[test]
    fn test_attribute_set_from_json_and_merge() {
        let extra = AttributeSet::from_json(&json!({
            "name": { "type": "string", "required": true },
            "id": { "type": "string" }
        }))
        .unwrap();
        let merged = AttributeSet::base().merge(extra);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged.get("id").unwrap().type_tag(), Some(TypeTag::String));
        assert!(merged.get("createdAt").is_some());
    }

    #[test]
    fn test_type_tag_classification() {
        assert_eq!(TypeTag::of(None), TypeTag::Undefined);
        assert_eq!(TypeTag::of(Some(&json!(""))), TypeTag::EmptyString);
        assert_eq!(TypeTag::of(Some(&json!("a"))), TypeTag::String);
        assert_eq!(TypeTag::of(Some(&json!(1.5))), TypeTag::Number);
        assert_eq!(TypeTag::of(Some(&json!([]))), TypeTag::Array);
        assert_eq!(TypeTag::of(Some(&json!({}))), TypeTag::Object);
        assert_eq!("emptyString".parse::<TypeTag>().unwrap(), TypeTag::EmptyString);
    }
}
