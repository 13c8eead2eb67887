//! Member accessor factories over JSON object values.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::capability::supports_dynamic_code_generation;
use crate::model::MemberDescriptor;

/// Reads a member from an object value.
pub type Getter = Box<dyn Fn(&Value) -> Option<Value> + Send + Sync>;
/// Writes a member on an object value. Returns false if the target is not an object.
pub type Setter = Box<dyn Fn(&mut Value, Value) -> bool + Send + Sync>;

/// Which accessor construction strategy a factory uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorStrategy {
    Compiled,
    Reflective,
}

/// Builds getters and setters for members.
pub trait AccessorFactory: Send + Sync + fmt::Debug {
    fn strategy(&self) -> AccessorStrategy;

    fn create_getter(&self, member: &MemberDescriptor) -> Getter;

    fn create_setter(&self, member: &MemberDescriptor) -> Setter;
}

/// Accessors bound to their member key when created.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompiledAccessorFactory;

impl AccessorFactory for CompiledAccessorFactory {
    fn strategy(&self) -> AccessorStrategy {
        AccessorStrategy::Compiled
    }

    fn create_getter(&self, member: &MemberDescriptor) -> Getter {
        let key = member.name.clone();
        Box::new(move |target: &Value| target.as_object()?.get(&key).cloned())
    }

    fn create_setter(&self, member: &MemberDescriptor) -> Setter {
        let key = member.name.clone();
        Box::new(move |target: &mut Value, value: Value| match target.as_object_mut() {
            Some(map) => {
                map.insert(key.clone(), value);
                true
            }
            None => false,
        })
    }
}

/// Accessors that go through a generic by-name invocation on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReflectiveAccessorFactory;

fn invoke_get(target: &Value, name: &str) -> Option<Value> {
    match target {
        Value::Object(map) => map
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, value)| value.clone()),
        _ => None,
    }
}

fn invoke_set(target: &mut Value, name: &str, value: Value) -> bool {
    match target {
        Value::Object(map) => {
            map.insert(name.to_string(), value);
            true
        }
        _ => false,
    }
}

impl AccessorFactory for ReflectiveAccessorFactory {
    fn strategy(&self) -> AccessorStrategy {
        AccessorStrategy::Reflective
    }

    fn create_getter(&self, member: &MemberDescriptor) -> Getter {
        let name = member.name.clone();
        Box::new(move |target: &Value| invoke_get(target, &name))
    }

    fn create_setter(&self, member: &MemberDescriptor) -> Setter {
        let name = member.name.clone();
        Box::new(move |target: &mut Value, value: Value| invoke_set(target, &name, value))
    }
}

static COMPILED: CompiledAccessorFactory = CompiledAccessorFactory;
static REFLECTIVE: ReflectiveAccessorFactory = ReflectiveAccessorFactory;

/// Factory for a given capability answer.
pub fn select_accessor_factory(dynamic_code: bool) -> &'static dyn AccessorFactory {
    if dynamic_code {
        &COMPILED
    } else {
        &REFLECTIVE
    }
}

/// Factory for this process, chosen by the dynamic code generation probe.
pub fn get_accessor_factory() -> &'static dyn AccessorFactory {
    select_accessor_factory(supports_dynamic_code_generation())
}
