use std::fmt;

use host::{HostError, TypeHandle, TypeRegistry};
use tracing::debug;

use super::spec::CapabilitySpec;

/// One way of locating a capability's host type. Strategies run in list
/// order until one returns a handle.
pub trait LookupStrategy: fmt::Debug {
    fn label(&self) -> &'static str;

    /// Slow-path strategies walk every type of every module.
    fn is_slow_path(&self) -> bool {
        false
    }

    fn applies_to(&self, _spec: &CapabilitySpec) -> bool {
        true
    }

    fn locate(
        &self,
        registry: &dyn TypeRegistry,
        spec: &CapabilitySpec,
    ) -> Result<Option<TypeHandle>, HostError>;
}

/// Full-name lookup of the primary name and each alias across all modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectLookup;

impl LookupStrategy for DirectLookup {
    fn label(&self) -> &'static str {
        "direct_lookup"
    }

    fn locate(
        &self,
        registry: &dyn TypeRegistry,
        spec: &CapabilitySpec,
    ) -> Result<Option<TypeHandle>, HostError> {
        let modules = registry.modules()?;
        for name in &spec.type_names {
            for module in &modules {
                if let Some(handle) = registry.type_by_full_name(*module, name)? {
                    return Ok(Some(handle));
                }
            }
        }
        Ok(None)
    }
}

/// Lists every type of every module and compares short names. Modules whose
/// type listing fails are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortNameScan;

impl LookupStrategy for ShortNameScan {
    fn label(&self) -> &'static str {
        "short_name_scan"
    }

    fn is_slow_path(&self) -> bool {
        true
    }

    fn applies_to(&self, spec: &CapabilitySpec) -> bool {
        spec.short_name.is_some()
    }

    fn locate(
        &self,
        registry: &dyn TypeRegistry,
        spec: &CapabilitySpec,
    ) -> Result<Option<TypeHandle>, HostError> {
        let Some(wanted) = spec.short_name.as_deref() else {
            return Ok(None);
        };
        for module in registry.modules()? {
            let types = match registry.types_in(module) {
                Ok(types) => types,
                Err(error) => {
                    let module_name = registry.module_name(module).unwrap_or_default();
                    debug!(module = %module_name, error = %error, "type_listing_skipped");
                    continue;
                }
            };
            for handle in types {
                if registry.short_name(handle).is_ok_and(|name| name == wanted) {
                    return Ok(Some(handle));
                }
            }
        }
        Ok(None)
    }
}

pub fn default_strategies() -> Vec<Box<dyn LookupStrategy>> {
    vec![Box::new(DirectLookup), Box::new(ShortNameScan)]
}
