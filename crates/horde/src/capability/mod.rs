//! Runtime discovery of the host-side features the controller relies on.

mod binder;
mod spec;
mod strategy;

pub use binder::{
    invoke_static, read_instance, read_static, BindError, BinderStats, Binding, BindingRecord,
    CapabilityBinder, Resolution,
};
pub use spec::{AccessStyle, CapabilityId, CapabilitySpec, RecordSpec};
pub use strategy::{default_strategies, DirectLookup, LookupStrategy, ShortNameScan};
