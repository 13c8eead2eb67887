//! Core types for serialization directive resolution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved property carrying an object's reference id.
pub const ID_PROPERTY_NAME: &str = "$id";
/// Reserved property carrying a reference to a previously written object.
pub const REF_PROPERTY_NAME: &str = "$ref";
/// Reserved property carrying a type name.
pub const TYPE_PROPERTY_NAME: &str = "$type";
/// Reserved property wrapping a primitive value that carries type information.
pub const VALUE_PROPERTY_NAME: &str = "$value";
/// Reserved property wrapping an array that carries type or reference information.
pub const ARRAY_VALUES_PROPERTY_NAME: &str = "$values";

/// All reserved structural property names.
pub const RESERVED_PROPERTY_NAMES: &[&str] = &[
    ID_PROPERTY_NAME,
    REF_PROPERTY_NAME,
    TYPE_PROPERTY_NAME,
    VALUE_PROPERTY_NAME,
    ARRAY_VALUES_PROPERTY_NAME,
];

/// Prefix of the boolean member gating serialization of another member.
pub const SHOULD_SERIALIZE_PREFIX: &str = "ShouldSerialize";
/// Suffix of the boolean member gating serialization of another member.
pub const SPECIFIED_SUFFIX: &str = "Specified";

/// Type name members must declare to act as serialization predicates.
pub const BOOLEAN_TYPE_NAME: &str = "bool";

/// Returns true if `name` is one of the reserved structural property names.
pub fn is_reserved_property_name(name: &str) -> bool {
    RESERVED_PROPERTY_NAMES.contains(&name)
}

/// Name of the `ShouldSerialize<X>` predicate member for `member`.
pub fn should_serialize_member_name(member: &str) -> String {
    format!("{}{}", SHOULD_SERIALIZE_PREFIX, member)
}

/// Name of the `<X>Specified` predicate member for `member`.
pub fn specified_member_name(member: &str) -> String {
    format!("{}{}", member, SPECIFIED_SUFFIX)
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Member inclusion policy of an object container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSerializationMode {
    /// All eligible members serialize unless explicitly excluded.
    #[default]
    OptOut,
    /// Only explicitly marked members serialize.
    OptIn,
}

/// Type-level marker selecting member-inclusion mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerAnnotation {
    #[serde(default)]
    pub member_serialization: MemberSerializationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reference: Option<bool>,
}

impl ContainerAnnotation {
    pub fn new(member_serialization: MemberSerializationMode) -> Self {
        Self {
            member_serialization,
            ..Self::default()
        }
    }
}

/// Names a converter in a [`ConverterRegistry`](crate::ConverterRegistry)
/// together with its constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterTypeReference {
    #[serde(rename = "converter")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Value>,
}

impl ConverterTypeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Append a constructor argument.
    pub fn arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }
}

/// Converter directive attached to a type or member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterAnnotation {
    #[serde(flatten)]
    pub converter: ConverterTypeReference,
}

impl ConverterAnnotation {
    pub fn new(converter: ConverterTypeReference) -> Self {
        Self { converter }
    }
}

/// Redirects metadata lookups to a separate buddy type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyAnnotation {
    #[serde(rename = "type")]
    pub buddy_type: String,
}

impl BuddyAnnotation {
    pub fn new(buddy_type: impl Into<String>) -> Self {
        Self {
            buddy_type: buddy_type.into(),
        }
    }
}

/// Member-level naming and requiredness directive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

/// Excludes a member from serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IgnoreAnnotation;

/// Contract-style opt-in marker on a type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataContractAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Marks a member as part of a data contract.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataMemberAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// A declarative directive attached to a type, member or other site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    Container(ContainerAnnotation),
    Converter(ConverterAnnotation),
    Buddy(BuddyAnnotation),
    Property(PropertyAnnotation),
    Ignore,
    DataContract(DataContractAnnotation),
    DataMember(DataMemberAnnotation),
}

/// An annotation kind that can be looked up in an [`AnnotationTable`].
pub trait AnnotationKind: Clone + Sized {
    /// Extracts this kind from an annotation, if it matches.
    fn from_annotation(annotation: &Annotation) -> Option<Self>;
}

macro_rules! annotation_kind {
    ($ty:ty, $variant:ident) => {
        impl AnnotationKind for $ty {
            fn from_annotation(annotation: &Annotation) -> Option<Self> {
                match annotation {
                    Annotation::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Annotation {
            fn from(inner: $ty) -> Self {
                Annotation::$variant(inner)
            }
        }
    };
}

annotation_kind!(ContainerAnnotation, Container);
annotation_kind!(ConverterAnnotation, Converter);
annotation_kind!(BuddyAnnotation, Buddy);
annotation_kind!(PropertyAnnotation, Property);
annotation_kind!(DataContractAnnotation, DataContract);
annotation_kind!(DataMemberAnnotation, DataMember);

impl AnnotationKind for IgnoreAnnotation {
    fn from_annotation(annotation: &Annotation) -> Option<Self> {
        matches!(annotation, Annotation::Ignore).then_some(IgnoreAnnotation)
    }
}

impl From<IgnoreAnnotation> for Annotation {
    fn from(_: IgnoreAnnotation) -> Self {
        Annotation::Ignore
    }
}

/// Ordered direct annotations of a single site.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationTable(Vec<Annotation>);

impl AnnotationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: impl Into<Annotation>) {
        self.0.push(annotation.into());
    }

    /// First direct annotation of kind `K`.
    pub fn find<K: AnnotationKind>(&self) -> Option<K> {
        self.0.iter().find_map(K::from_annotation)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Annotation> for AnnotationTable {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        AnnotationTable(iter.into_iter().collect())
    }
}

/// Options for directive resolution.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Whether the buddy-redirection extension is installed.
    /// When false every buddy lookup resolves to absent.
    pub buddy_extension: bool,
    /// Whether a contract-style marker switches a type without an explicit
    /// container annotation to opt-in member serialization.
    pub contract_opt_in: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverOptions {
    /// Create options with the buddy extension installed and the
    /// contract opt-in default enabled.
    pub fn new() -> Self {
        Self {
            buddy_extension: true,
            contract_opt_in: true,
        }
    }

    pub fn buddy_extension(mut self, enabled: bool) -> Self {
        self.buddy_extension = enabled;
        self
    }

    pub fn contract_opt_in(mut self, enabled: bool) -> Self {
        self.contract_opt_in = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_property_names() {
        for name in ["$id", "$ref", "$type", "$value", "$values"] {
            assert!(is_reserved_property_name(name));
        }
        assert!(!is_reserved_property_name("id"));
        assert!(!is_reserved_property_name("$schema"));
    }

    #[test]
    fn predicate_member_names() {
        assert_eq!(should_serialize_member_name("Name"), "ShouldSerializeName");
        assert_eq!(specified_member_name("Name"), "NameSpecified");
    }

    #[test]
    fn table_find_returns_first_of_kind() {
        let mut table = AnnotationTable::new();
        table.push(IgnoreAnnotation);
        table.push(ContainerAnnotation::new(MemberSerializationMode::OptIn));
        table.push(ContainerAnnotation::new(MemberSerializationMode::OptOut));

        let found = table.find::<ContainerAnnotation>().unwrap();
        assert_eq!(found.member_serialization, MemberSerializationMode::OptIn);
        assert!(table.find::<IgnoreAnnotation>().is_some());
        assert!(table.find::<BuddyAnnotation>().is_none());
    }

    #[test]
    fn annotation_deserializes_tagged() {
        let table: AnnotationTable = serde_json::from_value(json!([
            { "kind": "container", "member_serialization": "opt_in" },
            { "kind": "converter", "converter": "version", "args": [1, "x"] },
            { "kind": "buddy", "type": "PersonMetadata" },
            { "kind": "ignore" }
        ]))
        .unwrap();

        let container = table.find::<ContainerAnnotation>().unwrap();
        assert_eq!(container.member_serialization, MemberSerializationMode::OptIn);

        let converter = table.find::<ConverterAnnotation>().unwrap();
        assert_eq!(converter.converter.name, "version");
        assert_eq!(converter.converter.args, vec![json!(1), json!("x")]);

        let buddy = table.find::<BuddyAnnotation>().unwrap();
        assert_eq!(buddy.buddy_type, "PersonMetadata");
        assert!(table.find::<IgnoreAnnotation>().is_some());
    }

    #[test]
    fn resolver_options_defaults() {
        let opts = ResolverOptions::new();
        assert!(opts.buddy_extension);
        assert!(opts.contract_opt_in);

        let opts = ResolverOptions::new().buddy_extension(false);
        assert!(!opts.buddy_extension);
    }
}
