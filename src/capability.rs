//! Environment capability probe for dynamic code generation.

use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;

/// Environment variable that denies the unrestricted-security check when
/// set to a non-empty value.
pub const DENY_DYNAMIC_CODE_ENV: &str = "JSON_DIRECTIVES_DENY_DYNAMIC_CODE";

/// A permission demanded from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ReflectiveAccess,
    UnmanagedCode,
    UnrestrictedSecurity,
}

/// Demanded in order; all must be granted.
pub const REQUIRED_PERMISSIONS: &[Permission] = &[
    Permission::ReflectiveAccess,
    Permission::UnmanagedCode,
    Permission::UnrestrictedSecurity,
];

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::ReflectiveAccess => "reflective access",
            Permission::UnmanagedCode => "unmanaged code",
            Permission::UnrestrictedSecurity => "unrestricted security",
        };
        f.write_str(name)
    }
}

/// The environment refused a permission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied: {permission}")]
pub struct PermissionDenied {
    pub permission: Permission,
}

/// Environment permission and sandbox queries.
pub trait CapabilityProbe: Send + Sync {
    /// Demand a permission from the environment.
    fn demand(&self, permission: Permission) -> Result<(), PermissionDenied>;

    /// Whether the target platform forbids generated code outright.
    fn platform_restricted(&self) -> bool;
}

/// Probe for the running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl CapabilityProbe for HostProbe {
    fn demand(&self, permission: Permission) -> Result<(), PermissionDenied> {
        let denied = permission == Permission::UnrestrictedSecurity
            && std::env::var_os(DENY_DYNAMIC_CODE_ENV).is_some_and(|v| !v.is_empty());
        if denied {
            Err(PermissionDenied { permission })
        } else {
            Ok(())
        }
    }

    fn platform_restricted(&self) -> bool {
        cfg!(target_family = "wasm")
    }
}

/// Run every check; any denial or platform restriction means unavailable.
pub fn evaluate(probe: &dyn CapabilityProbe) -> bool {
    for &permission in REQUIRED_PERMISSIONS {
        if let Err(denied) = probe.demand(permission) {
            log::debug!("dynamic code generation unavailable: {}", denied);
            return false;
        }
    }

    if probe.platform_restricted() {
        log::debug!("dynamic code generation unavailable: platform restricted");
        return false;
    }

    true
}

/// A capability flag computed once and then fixed.
///
/// No lock is held while probing. Racing first calls may each probe; the
/// first stored answer is returned to everyone.
#[derive(Debug, Default)]
pub struct CapabilityFlag {
    value: OnceLock<bool>,
}

impl CapabilityFlag {
    pub const fn new() -> Self {
        Self {
            value: OnceLock::new(),
        }
    }

    pub fn get(&self, probe: &dyn CapabilityProbe) -> bool {
        if let Some(&value) = self.value.get() {
            return value;
        }
        let computed = evaluate(probe);
        let _ = self.value.set(computed);
        self.value.get().copied().unwrap_or(computed)
    }
}

static DYNAMIC_CODE_GENERATION: CapabilityFlag = CapabilityFlag::new();

/// Whether compiled accessors may be generated in this process.
pub fn supports_dynamic_code_generation() -> bool {
    DYNAMIC_CODE_GENERATION.get(&HostProbe)
}
