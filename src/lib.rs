//! JSON Serialization Directives
//!
//! Resolution of declarative serialization directives for a JSON codec.
//!
//! Given a [`TypeModel`] of classes, interfaces and their members, this
//! library answers which container mode, converter, naming and inclusion
//! directives apply to a type or member. Directives may come from a
//! separate buddy type, from the declaration itself, or from directly
//! implemented interfaces.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use json_directives::{
//!     BuddyAnnotation, ContainerAnnotation, DirectiveResolver, MemberDescriptor,
//!     MemberSerializationMode, TypeDescriptor, TypeModel,
//! };
//!
//! let model = TypeModel::builder()
//!     .add(
//!         TypeDescriptor::class("Person")
//!             .annotate(BuddyAnnotation::new("PersonMetadata"))
//!             .member(MemberDescriptor::new("Name", "string")),
//!     )
//!     .add(
//!         TypeDescriptor::class("PersonMetadata")
//!             .annotate(ContainerAnnotation::new(MemberSerializationMode::OptIn)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let resolver = DirectiveResolver::new(Arc::new(model));
//! let person = resolver.model().get("Person").unwrap();
//!
//! // The buddy type's container annotation applies to Person
//! assert_eq!(
//!     resolver.get_object_member_serialization_mode(person),
//!     MemberSerializationMode::OptIn
//! );
//! ```
//!
//! # Precedence
//!
//! | Site | First | Then | Last |
//! |------|-------|------|------|
//! | Type | buddy type | the type itself | interfaces, in declared order |
//! | Member | same-named buddy member | the member itself | same-named interface members |
//!
//! The first source holding the requested kind wins; sources are never merged.
//!
//! # Model Format
//!
//! ```json
//! { "types": [
//!     { "name": "Person", "kind": "class",
//!       "annotations": [{ "kind": "container", "member_serialization": "opt_in" }],
//!       "interfaces": ["INamed"],
//!       "members": [{ "name": "Born", "type": "datetime",
//!                     "annotations": [{ "kind": "converter", "converter": "iso_datetime" }] }] }
//! ] }
//! ```

mod accessor;
mod cache;
mod capability;
mod converter;
mod error;
mod linter;
mod loader;
mod model;
mod resolver;
mod types;
mod validator;

pub use accessor::{
    get_accessor_factory, select_accessor_factory, AccessorFactory, AccessorStrategy,
    CompiledAccessorFactory, Getter, ReflectiveAccessorFactory, Setter,
};
pub use cache::MemoCache;
pub use capability::{
    evaluate as evaluate_capabilities, supports_dynamic_code_generation, CapabilityFlag,
    CapabilityProbe, HostProbe, Permission, PermissionDenied, DENY_DYNAMIC_CODE_ENV,
    REQUIRED_PERMISSIONS,
};
pub use converter::{
    ConverterRegistry, IsoDateTimeConverter, JsonConverter, RegexConverter,
    UnixDateTimeConverter, ValueConverter, ValueConverterRegistry, VersionConverter,
};
pub use error::{ConfigurationError, ModelError, SchemaError};
pub use linter::{lint, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity};
pub use loader::{load_document, load_model, load_model_str, model_from_value};
pub use model::{
    AnnotationProvider, MemberDescriptor, ProviderRef, Site, SiteKey, TypeDescriptor, TypeKind,
    TypeModel, TypeModelBuilder,
};
pub use resolver::{DirectiveResolver, ExtensionRegistry, MemberPredicates, ResolverStats};
pub use types::{
    is_reserved_property_name, json_type_name, should_serialize_member_name,
    specified_member_name, Annotation, AnnotationKind, AnnotationTable, BuddyAnnotation,
    ContainerAnnotation, ConverterAnnotation, ConverterTypeReference, DataContractAnnotation,
    DataMemberAnnotation, IgnoreAnnotation, MemberSerializationMode, PropertyAnnotation,
    ResolverOptions, ARRAY_VALUES_PROPERTY_NAME, BOOLEAN_TYPE_NAME, ID_PROPERTY_NAME,
    REF_PROPERTY_NAME, RESERVED_PROPERTY_NAMES, SHOULD_SERIALIZE_PREFIX, SPECIFIED_SUFFIX,
    TYPE_PROPERTY_NAME, VALUE_PROPERTY_NAME,
};
pub use validator::{model_document_schema, validate_model_document};
