//! Host type model - the descriptors annotations attach to.
//!
//! A [`TypeModel`] stands in for runtime type introspection: it answers
//! which annotations sit directly on a type or member, which interfaces a
//! type implements (in declared order), and which members a type declares.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{Annotation, AnnotationTable};

/// Whether a descriptor is a class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
}

/// A field or property belonging to exactly one declaring type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    /// Name of the member's value type.
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "AnnotationTable::is_empty")]
    pub annotations: AnnotationTable,
    /// Set when the declaring type is registered in a [`TypeModel`].
    #[serde(skip)]
    declaring_type: String,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            annotations: AnnotationTable::new(),
            declaring_type: String::new(),
        }
    }

    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Name of the type declaring this member.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }
}

/// Identity of a class or interface, with its direct annotations,
/// implemented interfaces and members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "AnnotationTable::is_empty")]
    pub annotations: AnnotationTable,
    /// Directly implemented interfaces, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: AnnotationTable::new(),
            interfaces: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Member declared on this type with the given name.
    pub fn find_member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

fn next_site_id() -> u64 {
    static NEXT_SITE_ID: AtomicU64 = AtomicU64::new(0);
    NEXT_SITE_ID.fetch_add(1, Ordering::Relaxed)
}

/// An annotation-bearing site that is neither a type nor a member,
/// such as a constructor parameter.
///
/// Every constructed site gets its own identity; clones share it. The
/// name is descriptive only and need not be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    #[serde(default)]
    pub annotations: AnnotationTable,
    #[serde(skip, default = "next_site_id")]
    id: u64,
}

impl Site {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: AnnotationTable::new(),
            id: next_site_id(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn annotate(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Cache identity of an annotation-bearing site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SiteKey {
    Type(String),
    Member { declaring_type: String, name: String },
    Other(u64),
}

/// The concrete shape of an [`AnnotationProvider`].
#[derive(Debug, Clone, Copy)]
pub enum ProviderRef<'a> {
    Type(&'a TypeDescriptor),
    Member(&'a MemberDescriptor),
    Other,
}

/// Anything annotations can attach to.
pub trait AnnotationProvider {
    /// Annotations declared directly on this site.
    fn annotations(&self) -> &AnnotationTable;

    /// Identity used for memoized lookups.
    fn site_key(&self) -> SiteKey;

    /// Which kind of site this is. Only types and members take part in
    /// buddy and interface searches.
    fn provider(&self) -> ProviderRef<'_> {
        ProviderRef::Other
    }
}

impl AnnotationProvider for TypeDescriptor {
    fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    fn site_key(&self) -> SiteKey {
        SiteKey::Type(self.name.clone())
    }

    fn provider(&self) -> ProviderRef<'_> {
        ProviderRef::Type(self)
    }
}

impl AnnotationProvider for MemberDescriptor {
    fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    fn site_key(&self) -> SiteKey {
        SiteKey::Member {
            declaring_type: self.declaring_type.clone(),
            name: self.name.clone(),
        }
    }

    fn provider(&self) -> ProviderRef<'_> {
        ProviderRef::Member(self)
    }
}

impl AnnotationProvider for Site {
    fn annotations(&self) -> &AnnotationTable {
        &self.annotations
    }

    fn site_key(&self) -> SiteKey {
        SiteKey::Other(self.id)
    }
}

/// Immutable registry of type descriptors keyed by name.
#[derive(Debug, Default)]
pub struct TypeModel {
    types: HashMap<String, Arc<TypeDescriptor>>,
    order: Vec<String>,
}

impl TypeModel {
    pub fn builder() -> TypeModelBuilder {
        TypeModelBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name).map(Arc::as_ref)
    }

    /// Look up a type, failing with [`ModelError::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&TypeDescriptor, ModelError> {
        self.get(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_string(),
        })
    }

    /// Look up a member on a named type.
    pub fn member(&self, type_name: &str, member: &str) -> Option<&MemberDescriptor> {
        self.get(type_name)?.find_member(member)
    }

    /// Types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.order.iter().filter_map(|name| self.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Collects type descriptors into a [`TypeModel`].
#[derive(Debug, Default)]
pub struct TypeModelBuilder {
    types: Vec<TypeDescriptor>,
}

impl TypeModelBuilder {
    pub fn add(mut self, ty: TypeDescriptor) -> Self {
        self.types.push(ty);
        self
    }

    /// Register all types, stamping each member with its declaring type.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateType` if two types share a name.
    pub fn build(self) -> Result<TypeModel, ModelError> {
        let mut model = TypeModel::default();
        for mut ty in self.types {
            if model.types.contains_key(&ty.name) {
                return Err(ModelError::DuplicateType { name: ty.name });
            }
            for member in &mut ty.members {
                member.declaring_type = ty.name.clone();
            }
            model.order.push(ty.name.clone());
            model.types.insert(ty.name.clone(), Arc::new(ty));
        }
        Ok(model)
    }
}
