//! Converter instantiation and the general value-conversion registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::types::{json_type_name, ConverterTypeReference};

/// A pluggable codec between an in-memory value and its JSON form.
pub trait JsonConverter: Send + Sync + fmt::Debug {
    /// Registry name of this converter.
    fn name(&self) -> &str;

    /// Whether this converter handles values of `target_type`.
    fn can_convert(&self, target_type: &str) -> bool;
}

type Constructor =
    Arc<dyn Fn(&[Value]) -> Result<Arc<dyn JsonConverter>, String> + Send + Sync>;

/// Maps converter names to constructors.
#[derive(Clone)]
pub struct ConverterRegistry {
    constructors: HashMap<String, Constructor>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.constructors.keys().collect();
        names.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ConverterRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry holding the built-in converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("iso_datetime", |args| {
            let format = match args.first() {
                None => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => {
                    return Err(format!(
                        "format must be a string, got {}",
                        json_type_name(other)
                    ))
                }
            };
            Ok(Arc::new(IsoDateTimeConverter { format }) as Arc<dyn JsonConverter>)
        });
        registry.register("unix_datetime", |args| {
            no_args("unix_datetime", args)?;
            Ok(Arc::new(UnixDateTimeConverter) as Arc<dyn JsonConverter>)
        });
        registry.register("version", |args| {
            no_args("version", args)?;
            Ok(Arc::new(VersionConverter) as Arc<dyn JsonConverter>)
        });
        registry.register("regex", |args| {
            no_args("regex", args)?;
            Ok(Arc::new(RegexConverter) as Arc<dyn JsonConverter>)
        });
        registry
    }

    /// Register (or replace) a converter constructor.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&[Value]) -> Result<Arc<dyn JsonConverter>, String> + Send + Sync + 'static,
    {
        self.constructors.insert(name.into(), Arc::new(constructor));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Construct the converter named by `reference`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnknownConverter` for an unregistered name
    /// and `ConfigurationError::ConverterConstruction` if the constructor
    /// rejects its arguments.
    pub fn instantiate(
        &self,
        reference: &ConverterTypeReference,
    ) -> Result<Arc<dyn JsonConverter>, ConfigurationError> {
        let constructor = self.constructors.get(&reference.name).ok_or_else(|| {
            ConfigurationError::UnknownConverter {
                converter: reference.name.clone(),
            }
        })?;
        constructor(&reference.args).map_err(|message| ConfigurationError::ConverterConstruction {
            converter: reference.name.clone(),
            message,
        })
    }
}

fn no_args(name: &str, args: &[Value]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("{} takes no arguments, got {}", name, args.len()))
    }
}

/// Strips a trailing nullable marker (`datetime?` -> `datetime`).
/// Type names match without regard to ASCII case; a nullable `?` suffix is ignored.
fn is_type(target_type: &str, expected: &[&str]) -> bool {
    let underlying = target_type.strip_suffix('?').unwrap_or(target_type);
    expected.iter().any(|name| underlying.eq_ignore_ascii_case(name))
}

/// Writes date-times as ISO 8601 strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDateTimeConverter {
    pub format: Option<String>,
}

impl JsonConverter for IsoDateTimeConverter {
    fn name(&self) -> &str {
        "iso_datetime"
    }

    fn can_convert(&self, target_type: &str) -> bool {
        is_type(target_type, &["datetime", "datetime_offset"])
    }
}

/// Writes date-times as seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnixDateTimeConverter;

impl JsonConverter for UnixDateTimeConverter {
    fn name(&self) -> &str {
        "unix_datetime"
    }

    fn can_convert(&self, target_type: &str) -> bool {
        is_type(target_type, &["datetime", "datetime_offset"])
    }
}

/// Writes version numbers as dotted strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionConverter;

impl JsonConverter for VersionConverter {
    fn name(&self) -> &str {
        "version"
    }

    fn can_convert(&self, target_type: &str) -> bool {
        is_type(target_type, &["version"])
    }
}

/// Writes regular expressions as pattern strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexConverter;

impl JsonConverter for RegexConverter {
    fn name(&self) -> &str {
        "regex"
    }

    fn can_convert(&self, target_type: &str) -> bool {
        is_type(target_type, &["regex"])
    }
}

/// A general-purpose value converter owned by the host.
pub trait ValueConverter: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
}

/// Host registry of general-purpose value converters, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct ValueConverterRegistry {
    converters: HashMap<String, Arc<dyn ValueConverter>>,
}

impl ValueConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_name: impl Into<String>, converter: Arc<dyn ValueConverter>) {
        self.converters.insert(type_name.into(), converter);
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ValueConverter>> {
        self.converters.get(type_name).cloned()
    }
}
