//! Directive resolution - answers "does annotation kind K apply to site S".
//!
//! Types and members are searched in three tiers, first hit wins:
//!
//! | Tier | Type site | Member site |
//! |------|-----------|-------------|
//! | 1 | buddy type's direct annotations | same-named member on the buddy type |
//! | 2 | the type's own annotations | the member's own annotations |
//! | 3 | each directly implemented interface, in order | same-named member on each interface, in order |
//!
//! A candidate type without a same-named member is skipped. Other sites
//! only see their own annotations.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::MemoCache;
use crate::converter::{ConverterRegistry, JsonConverter, ValueConverter, ValueConverterRegistry};
use crate::error::ConfigurationError;
use crate::model::{
    AnnotationProvider, MemberDescriptor, ProviderRef, SiteKey, TypeDescriptor, TypeModel,
};
use crate::types::{
    should_serialize_member_name, specified_member_name, AnnotationKind, BuddyAnnotation,
    ContainerAnnotation, ConverterAnnotation, ConverterTypeReference, DataContractAnnotation,
    DataMemberAnnotation, IgnoreAnnotation, MemberSerializationMode, PropertyAnnotation,
    ResolverOptions, BOOLEAN_TYPE_NAME,
};

type BuddyHook = Arc<dyn Fn(&TypeDescriptor) -> Option<String> + Send + Sync>;

/// The optional extension supplying buddy-redirection annotations.
///
/// Checked once when the resolver is built. While absent, every type
/// resolves to "no buddy type" and nothing is reported as an error.
#[derive(Clone)]
pub enum ExtensionRegistry {
    Installed(BuddyHook),
    Absent,
}

impl ExtensionRegistry {
    /// The standard extension: reads a [`BuddyAnnotation`] from the type's
    /// own direct annotations.
    pub fn standard() -> Self {
        ExtensionRegistry::Installed(Arc::new(|ty: &TypeDescriptor| {
            ty.annotations
                .find::<BuddyAnnotation>()
                .map(|buddy| buddy.buddy_type)
        }))
    }

    /// An extension backed by a custom lookup.
    pub fn custom<F>(hook: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        ExtensionRegistry::Installed(Arc::new(hook))
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, ExtensionRegistry::Installed(_))
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionRegistry::Installed(_) => f.write_str("ExtensionRegistry::Installed"),
            ExtensionRegistry::Absent => f.write_str("ExtensionRegistry::Absent"),
        }
    }
}

/// Counts of cache entries computed (not served from cache).
#[derive(Debug, Default)]
pub struct ResolverStats {
    buddy_computations: AtomicUsize,
    converter_type_computations: AtomicUsize,
}

impl ResolverStats {
    pub fn buddy_computations(&self) -> usize {
        self.buddy_computations.load(Ordering::Relaxed)
    }

    pub fn converter_type_computations(&self) -> usize {
        self.converter_type_computations.load(Ordering::Relaxed)
    }
}

/// Predicate members gating serialization of a member.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct MemberPredicates {
    /// Boolean `ShouldSerialize<X>` member, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_serialize: Option<String>,
    /// Boolean `<X>Specified` member, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specified: Option<String>,
}

/// Resolves serialization directives over a [`TypeModel`].
///
/// Buddy types and converter references are memoized per site for the
/// life of the resolver, negative results included. All methods take
/// `&self` and may be called from many threads.
pub struct DirectiveResolver {
    model: Arc<TypeModel>,
    options: ResolverOptions,
    extension: ExtensionRegistry,
    converters: ConverterRegistry,
    value_converters: ValueConverterRegistry,
    buddy_types: MemoCache<String, Option<String>>,
    converter_types: MemoCache<SiteKey, Option<ConverterTypeReference>>,
    stats: ResolverStats,
}

impl fmt::Debug for DirectiveResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveResolver")
            .field("types", &self.model.len())
            .field("options", &self.options)
            .field("extension", &self.extension)
            .field("converters", &self.converters)
            .finish()
    }
}

impl DirectiveResolver {
    /// Create a resolver with default options and the built-in converters.
    pub fn new(model: Arc<TypeModel>) -> Self {
        Self::with_options(model, ResolverOptions::new())
    }

    pub fn with_options(model: Arc<TypeModel>, options: ResolverOptions) -> Self {
        let extension = if options.buddy_extension {
            ExtensionRegistry::standard()
        } else {
            log::debug!("buddy extension not installed; buddy lookups resolve to none");
            ExtensionRegistry::Absent
        };
        Self {
            model,
            options,
            extension,
            converters: ConverterRegistry::with_builtins(),
            value_converters: ValueConverterRegistry::new(),
            buddy_types: MemoCache::new(),
            converter_types: MemoCache::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Replace the buddy extension.
    pub fn extension(mut self, extension: ExtensionRegistry) -> Self {
        self.extension = extension;
        self
    }

    pub fn converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = converters;
        self
    }

    pub fn value_converters(mut self, value_converters: ValueConverterRegistry) -> Self {
        self.value_converters = value_converters;
        self
    }

    pub fn model(&self) -> &TypeModel {
        &self.model
    }

    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    // --- Buddy types ---

    /// The buddy type of `ty`, read from its own direct annotations only.
    ///
    /// A buddy naming a type missing from the model resolves to none.
    ///
    /// Only the model's own descriptor for a type is memoized; a descriptor
    /// from elsewhere that happens to share its name is looked up afresh.
    pub fn get_buddy_type(&self, ty: &TypeDescriptor) -> Option<&TypeDescriptor> {
        let compute = |_: &String| {
            self.stats.buddy_computations.fetch_add(1, Ordering::Relaxed);
            match &self.extension {
                ExtensionRegistry::Installed(hook) => hook(ty),
                ExtensionRegistry::Absent => None,
            }
        };
        let found = if self.is_registered_type(ty) {
            self.buddy_types.get_or_compute(&ty.name, compute)
        } else {
            compute(&ty.name)
        };
        let name = found?;

        let buddy = self.model.get(&name);
        if buddy.is_none() {
            log::debug!("buddy type \"{}\" of \"{}\" is not in the model", name, ty.name);
        }
        buddy
    }

    // --- Annotation lookup ---

    /// Resolve annotation kind `K` for any provider.
    ///
    /// Types and members use the tiered search; other sites are direct only.
    pub fn resolve<K, P>(&self, provider: &P) -> Option<K>
    where
        K: AnnotationKind,
        P: AnnotationProvider + ?Sized,
    {
        match provider.provider() {
            ProviderRef::Type(ty) => self.type_annotation(ty),
            ProviderRef::Member(member) => self.member_annotation(member),
            ProviderRef::Other => provider.annotations().find::<K>(),
        }
    }

    /// Tiered lookup of `K` on a type.
    pub fn type_annotation<K: AnnotationKind>(&self, ty: &TypeDescriptor) -> Option<K> {
        if let Some(buddy) = self.get_buddy_type(ty) {
            if let Some(found) = buddy.annotations.find::<K>() {
                return Some(found);
            }
        }

        if let Some(found) = ty.annotations.find::<K>() {
            return Some(found);
        }

        self.interfaces_of(ty)
            .find_map(|interface| interface.annotations.find::<K>())
    }

    /// Tiered lookup of `K` on a member.
    ///
    /// A member not registered in the model only sees its own annotations.
    pub fn member_annotation<K: AnnotationKind>(&self, member: &MemberDescriptor) -> Option<K> {
        let Some(declaring) = self.model.get(member.declaring_type()) else {
            return member.annotations.find::<K>();
        };

        let from_buddy = self
            .get_buddy_type(declaring)
            .and_then(|buddy| buddy.find_member(&member.name))
            .and_then(|counterpart| counterpart.annotations.find::<K>());
        if from_buddy.is_some() {
            return from_buddy;
        }

        if let Some(found) = member.annotations.find::<K>() {
            return Some(found);
        }

        self.interfaces_of(declaring)
            .filter_map(|interface| interface.find_member(&member.name))
            .find_map(|counterpart| counterpart.annotations.find::<K>())
    }

    fn is_registered_type(&self, ty: &TypeDescriptor) -> bool {
        self.model
            .get(&ty.name)
            .is_some_and(|registered| std::ptr::eq(registered, ty))
    }

    fn is_registered_member(&self, member: &MemberDescriptor) -> bool {
        self.model
            .member(member.declaring_type(), &member.name)
            .is_some_and(|registered| std::ptr::eq(registered, member))
    }

    fn interfaces_of<'a>(
        &'a self,
        ty: &'a TypeDescriptor,
    ) -> impl Iterator<Item = &'a TypeDescriptor> + 'a {
        ty.interfaces
            .iter()
            .filter_map(move |name| self.model.get(name))
    }

    // --- Container directives ---

    pub fn get_container_annotation(&self, ty: &TypeDescriptor) -> Option<ContainerAnnotation> {
        self.type_annotation(ty)
    }

    /// Member inclusion mode of an object type.
    ///
    /// An explicit container annotation wins. Without one, a contract-style
    /// marker selects opt-in and everything else is opt-out.
    pub fn get_object_member_serialization_mode(
        &self,
        ty: &TypeDescriptor,
    ) -> MemberSerializationMode {
        match self.get_container_annotation(ty) {
            Some(container) => container.member_serialization,
            None if self.options.contract_opt_in
                && self.type_annotation::<DataContractAnnotation>(ty).is_some() =>
            {
                MemberSerializationMode::OptIn
            }
            None => MemberSerializationMode::OptOut,
        }
    }

    // --- Converters ---

    /// The converter reference in effect at `provider`, memoized per site.
    ///
    /// Types and members are memoized only when they are the model's own
    /// descriptors, so a stray or duplicated descriptor never reads another
    /// site's entry.
    pub fn get_converter_type<P>(&self, provider: &P) -> Option<ConverterTypeReference>
    where
        P: AnnotationProvider + ?Sized,
    {
        let compute = |_: &SiteKey| {
            self.stats
                .converter_type_computations
                .fetch_add(1, Ordering::Relaxed);
            self.resolve::<ConverterAnnotation, P>(provider)
                .map(|annotation| annotation.converter)
        };

        let cacheable = match provider.provider() {
            ProviderRef::Type(ty) => self.is_registered_type(ty),
            ProviderRef::Member(member) => self.is_registered_member(member),
            ProviderRef::Other => true,
        };

        let key = provider.site_key();
        if cacheable {
            self.converter_types.get_or_compute(&key, compute)
        } else {
            compute(&key)
        }
    }

    /// Instantiate the converter in effect at `provider` for `target_type`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if the converter is unknown, cannot be
    /// constructed, or does not convert `target_type`.
    pub fn get_converter<P>(
        &self,
        provider: &P,
        target_type: &str,
    ) -> Result<Option<Arc<dyn JsonConverter>>, ConfigurationError>
    where
        P: AnnotationProvider + ?Sized,
    {
        let Some(reference) = self.get_converter_type(provider) else {
            return Ok(None);
        };

        let converter = self.converters.instantiate(&reference)?;
        if !converter.can_convert(target_type) {
            return Err(ConfigurationError::ConverterRejected {
                converter: reference.name,
                target_type: target_type.to_string(),
            });
        }
        Ok(Some(converter))
    }

    /// Converter for a member's own value type.
    pub fn get_member_converter(
        &self,
        member: &MemberDescriptor,
    ) -> Result<Option<Arc<dyn JsonConverter>>, ConfigurationError> {
        self.get_converter(member, &member.value_type)
    }

    /// General-purpose value converter for a type, from the host registry.
    pub fn get_value_converter(&self, type_name: &str) -> Option<Arc<dyn ValueConverter>> {
        self.value_converters.get(type_name)
    }

    // --- Member directives ---

    /// Whether `member` takes part in serialization under its declaring
    /// type's member serialization mode.
    pub fn is_member_included(&self, member: &MemberDescriptor) -> bool {
        if self.member_annotation::<IgnoreAnnotation>(member).is_some() {
            return false;
        }

        let mode = self
            .model
            .get(member.declaring_type())
            .map(|ty| self.get_object_member_serialization_mode(ty))
            .unwrap_or_default();

        match mode {
            MemberSerializationMode::OptOut => true,
            MemberSerializationMode::OptIn => {
                self.member_annotation::<PropertyAnnotation>(member).is_some()
                    || self.member_annotation::<DataMemberAnnotation>(member).is_some()
            }
        }
    }

    /// Name written to JSON for `member`.
    pub fn serialized_name(&self, member: &MemberDescriptor) -> String {
        self.member_annotation::<PropertyAnnotation>(member)
            .and_then(|p| p.name)
            .or_else(|| {
                self.member_annotation::<DataMemberAnnotation>(member)
                    .and_then(|d| d.name)
            })
            .unwrap_or_else(|| member.name.clone())
    }

    /// Whether the member is marked required.
    pub fn is_member_required(&self, member: &MemberDescriptor) -> bool {
        self.member_annotation::<PropertyAnnotation>(member)
            .map(|p| p.required)
            .or_else(|| {
                self.member_annotation::<DataMemberAnnotation>(member)
                    .map(|d| d.required)
            })
            .unwrap_or(false)
    }

    /// Boolean predicate members declared alongside `member`.
    pub fn member_predicates(&self, member: &MemberDescriptor) -> MemberPredicates {
        let Some(declaring) = self.model.get(member.declaring_type()) else {
            return MemberPredicates::default();
        };

        let boolean_member = |name: String| {
            declaring
                .find_member(&name)
                .filter(|m| m.value_type == BOOLEAN_TYPE_NAME)
                .map(|m| m.name.clone())
        };

        MemberPredicates {
            should_serialize: boolean_member(should_serialize_member_name(&member.name)),
            specified: boolean_member(specified_member_name(&member.name)),
        }
    }
}
