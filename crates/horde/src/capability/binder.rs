use std::collections::HashMap;

use host::{HostError, HostValue, MemberHandle, MemberKind, MemberScope, TypeHandle, TypeRegistry};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::spec::{CapabilityId, CapabilitySpec, RecordSpec};
use super::strategy::{default_strategies, LookupStrategy};
use crate::config::CapabilityNames;

/// A resolved capability: the host type it lives on, the member to read or
/// invoke, and for the enumerator the field holding each character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub capability: CapabilityId,
    pub owner: TypeHandle,
    pub member: MemberHandle,
    pub record_field: Option<MemberHandle>,
    pub located_by: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingRecord {
    #[default]
    Unresolved,
    Bound(Binding),
    PermanentlyFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Bound(Binding),
    Unavailable,
}

impl Resolution {
    pub fn binding(self) -> Option<Binding> {
        match self {
            Self::Bound(binding) => Some(binding),
            Self::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BinderStats {
    pub direct_lookups: u64,
    pub full_scans: u64,
    pub resolution_attempts: u64,
    pub bound: u64,
    pub failed: u64,
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("no host type named {names}")]
    TypeNotFound { names: String },
    #[error("type {type_name} has no member named {members}")]
    MemberNotFound { type_name: String, members: String },
    #[error("type {owner} has no nested record type {record}")]
    RecordTypeNotFound { owner: String, record: String },
    #[error(transparent)]
    Host(#[from] HostError),
}

type LocatedType = Option<(TypeHandle, &'static str)>;

/// Resolves each capability at most once per process and caches the result,
/// failures included.
#[derive(Debug)]
pub struct CapabilityBinder {
    specs: Vec<CapabilitySpec>,
    records: [BindingRecord; CapabilityId::COUNT],
    strategies: Vec<Box<dyn LookupStrategy>>,
    located_types: HashMap<String, LocatedType>,
    stats: BinderStats,
}

impl CapabilityBinder {
    pub fn new(names: &CapabilityNames) -> Self {
        Self::with_strategies(CapabilitySpec::table(names), default_strategies())
    }

    /// `specs` must be ordered by `CapabilityId::index`.
    pub fn with_strategies(
        specs: Vec<CapabilitySpec>,
        strategies: Vec<Box<dyn LookupStrategy>>,
    ) -> Self {
        Self {
            specs,
            records: [BindingRecord::Unresolved; CapabilityId::COUNT],
            strategies,
            located_types: HashMap::new(),
            stats: BinderStats::default(),
        }
    }

    pub fn record(&self, capability: CapabilityId) -> BindingRecord {
        self.records[capability.index()]
    }

    pub fn stats(&self) -> BinderStats {
        self.stats
    }

    pub fn resolve(
        &mut self,
        registry: &dyn TypeRegistry,
        capability: CapabilityId,
    ) -> Resolution {
        match self.records[capability.index()] {
            BindingRecord::Bound(binding) => return Resolution::Bound(binding),
            BindingRecord::PermanentlyFailed => return Resolution::Unavailable,
            BindingRecord::Unresolved => {}
        }

        self.stats.resolution_attempts += 1;
        let Some(spec) = self.specs.get(capability.index()) else {
            warn!(capability = %capability, "capability_spec_missing");
            self.records[capability.index()] = BindingRecord::PermanentlyFailed;
            self.stats.failed += 1;
            return Resolution::Unavailable;
        };

        let outcome = attempt(
            registry,
            spec,
            &self.strategies,
            &mut self.located_types,
            &mut self.stats,
        );
        match outcome {
            Ok(binding) => {
                info!(
                    capability = %capability,
                    located_by = binding.located_by,
                    member_kind = binding.member.kind.as_str(),
                    type_name = %registry.full_name(binding.owner).unwrap_or_default(),
                    "capability_bound"
                );
                self.records[capability.index()] = BindingRecord::Bound(binding);
                self.stats.bound += 1;
                Resolution::Bound(binding)
            }
            Err(error) => {
                warn!(capability = %capability, error = %error, "capability_unavailable");
                self.records[capability.index()] = BindingRecord::PermanentlyFailed;
                self.stats.failed += 1;
                Resolution::Unavailable
            }
        }
    }
}

pub fn read_static(registry: &dyn TypeRegistry, binding: &Binding) -> Result<HostValue, HostError> {
    registry.read_static(binding.member)
}

pub fn invoke_static(
    registry: &dyn TypeRegistry,
    binding: &Binding,
) -> Result<HostValue, HostError> {
    registry.invoke_static(binding.member)
}

pub fn read_instance(
    registry: &dyn TypeRegistry,
    binding: &Binding,
    target: &HostValue,
) -> Result<HostValue, HostError> {
    registry.read_instance(binding.member, target)
}

fn attempt(
    registry: &dyn TypeRegistry,
    spec: &CapabilitySpec,
    strategies: &[Box<dyn LookupStrategy>],
    located_types: &mut HashMap<String, LocatedType>,
    stats: &mut BinderStats,
) -> Result<Binding, BindError> {
    let located = match located_types.get(spec.type_key()) {
        Some(located) => *located,
        None => {
            let located = locate_type(registry, spec, strategies, stats);
            located_types.insert(spec.type_key().to_string(), located);
            located
        }
    };
    let Some((owner, located_by)) = located else {
        return Err(BindError::TypeNotFound {
            names: spec.type_names.join(", "),
        });
    };

    let member = resolve_member(registry, owner, spec)?;
    let record_field = match &spec.record {
        Some(record) => Some(resolve_record_field(registry, owner, record)?),
        None => None,
    };
    Ok(Binding {
        capability: spec.id,
        owner,
        member,
        record_field,
        located_by,
    })
}

fn locate_type(
    registry: &dyn TypeRegistry,
    spec: &CapabilitySpec,
    strategies: &[Box<dyn LookupStrategy>],
    stats: &mut BinderStats,
) -> LocatedType {
    for strategy in strategies {
        if !strategy.applies_to(spec) {
            continue;
        }
        if strategy.is_slow_path() {
            stats.full_scans += 1;
        } else {
            stats.direct_lookups += 1;
        }
        match strategy.locate(registry, spec) {
            Ok(Some(handle)) => return Some((handle, strategy.label())),
            Ok(None) => {
                debug!(capability = %spec.id, strategy = strategy.label(), "type_not_located");
            }
            Err(error) => {
                debug!(
                    capability = %spec.id,
                    strategy = strategy.label(),
                    error = %error,
                    "type_lookup_failed"
                );
            }
        }
    }
    None
}

fn resolve_member(
    registry: &dyn TypeRegistry,
    owner: TypeHandle,
    spec: &CapabilitySpec,
) -> Result<MemberHandle, BindError> {
    for name in &spec.members {
        for kind in spec.access.kinds() {
            if let Some(member) = registry.member(owner, name, *kind, spec.scope)? {
                return Ok(member);
            }
        }
    }
    Err(BindError::MemberNotFound {
        type_name: registry.full_name(owner)?,
        members: spec.members.join(" | "),
    })
}

fn resolve_record_field(
    registry: &dyn TypeRegistry,
    owner: TypeHandle,
    record: &RecordSpec,
) -> Result<MemberHandle, BindError> {
    let record_type = registry
        .nested_type(owner, &record.type_name)?
        .ok_or_else(|| BindError::RecordTypeNotFound {
            owner: registry.full_name(owner).unwrap_or_default(),
            record: record.type_name.clone(),
        })?;
    for kind in [MemberKind::Field, MemberKind::Property] {
        if let Some(member) =
            registry.member(record_type, &record.field, kind, MemberScope::Instance)?
        {
            return Ok(member);
        }
    }
    Err(BindError::MemberNotFound {
        type_name: registry.full_name(record_type)?,
        members: record.field.clone(),
    })
}

#[cfg(test)]
mod tests {
    use host::{HostWorld, MemberDef, MemberSource, ObjectId};

    use super::*;

    fn world_with_character() -> (HostWorld, TypeHandle) {
        let mut world = HostWorld::new();
        let game = world.define_module("Game");
        let character = world
            .define_type(game, "CharacterMainControl")
            .expect("type");
        world.define_member(
            character,
            MemberDef::static_property("Main", MemberSource::Constant(HostValue::Object(ObjectId(7)))),
        );
        world.define_member(
            character,
            MemberDef::instance_property("Team", MemberSource::Attribute("team".to_string())),
        );
        (world, character)
    }

    #[test]
    fn bound_capability_is_reused_without_another_lookup() {
        let (world, character) = world_with_character();
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        let first = binder.resolve(&world, CapabilityId::PlayerAccessor);
        let second = binder.resolve(&world, CapabilityId::PlayerAccessor);

        let binding = first.binding().expect("bound");
        assert_eq!(first, second);
        assert_eq!(binding.owner, character);
        assert_eq!(binding.located_by, "direct_lookup");
        assert_eq!(binder.stats().resolution_attempts, 1);
        assert_eq!(binder.stats().direct_lookups, 1);
        assert_eq!(
            read_static(&world, &binding),
            Ok(HostValue::Object(ObjectId(7)))
        );
    }

    #[test]
    fn field_is_preferred_over_property_then_later_names() {
        let (mut world, character) = world_with_character();
        world.define_member(
            character,
            MemberDef::instance_field("team", MemberSource::Attribute("team".to_string())),
        );
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        let binding = binder
            .resolve(&world, CapabilityId::TeamField)
            .binding()
            .expect("bound");
        assert_eq!(binding.member.kind, MemberKind::Field);
    }

    #[test]
    fn failure_is_cached_and_slow_path_runs_once() {
        let mut world = HostWorld::new();
        let game = world.define_module("Game");
        world.define_type(game, "Unrelated");
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        for _ in 0..100 {
            assert_eq!(
                binder.resolve(&world, CapabilityId::ActorEnumerator),
                Resolution::Unavailable
            );
        }

        let stats = binder.stats();
        assert_eq!(stats.full_scans, 1);
        assert_eq!(stats.resolution_attempts, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(world.type_listing_count(), 1);
        assert_eq!(
            binder.record(CapabilityId::ActorEnumerator),
            BindingRecord::PermanentlyFailed
        );
    }

    #[test]
    fn one_missing_member_does_not_poison_other_capabilities() {
        let (world, _) = world_with_character();
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        assert_eq!(
            binder.resolve(&world, CapabilityId::HealthField),
            Resolution::Unavailable
        );
        assert!(binder
            .resolve(&world, CapabilityId::TeamField)
            .binding()
            .is_some());
        assert!(binder
            .resolve(&world, CapabilityId::PlayerAccessor)
            .binding()
            .is_some());
        assert_eq!(binder.stats().bound, 2);
        assert_eq!(binder.stats().failed, 1);
        // The character type was located once and shared.
        assert_eq!(binder.stats().direct_lookups, 1);
    }

    #[test]
    fn enumerator_binds_nested_record_field() {
        let mut world = HostWorld::new();
        let tools = world.define_module("CheatUI");
        let tracker = world
            .define_type(tools, "DuckovCheatUI.Utiles.EnemyTracker")
            .expect("tracker");
        let record = world
            .define_nested_type(tracker, "EnemyInfo")
            .expect("record");
        world.define_member(
            record,
            MemberDef::instance_field("character", MemberSource::RecordField),
        );
        world.define_member(
            tracker,
            MemberDef::static_method(
                "GetLiveEnemies",
                MemberSource::Roster {
                    record_type: record,
                    field: "character".to_string(),
                },
            ),
        );
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        let binding = binder
            .resolve(&world, CapabilityId::ActorEnumerator)
            .binding()
            .expect("bound");
        let field = binding.record_field.expect("record field");
        assert_eq!(field.owner, record);
        assert_eq!(invoke_static(&world, &binding), Ok(HostValue::List(Vec::new())));
    }

    #[test]
    fn enumerator_without_record_type_fails() {
        let mut world = HostWorld::new();
        let tools = world.define_module("CheatUI");
        let tracker = world
            .define_type(tools, "DuckovCheatUI.Utiles.EnemyTracker")
            .expect("tracker");
        world.define_member(
            tracker,
            MemberDef::static_method("GetLiveEnemies", MemberSource::Constant(HostValue::Null)),
        );
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        assert_eq!(
            binder.resolve(&world, CapabilityId::ActorEnumerator),
            Resolution::Unavailable
        );
        assert_eq!(binder.stats().full_scans, 0);
    }

    #[test]
    fn slow_path_binding_reports_its_strategy() {
        let mut world = HostWorld::new();
        let game = world.define_module("Game");
        let relocated = world
            .define_type(game, "Renamed.CharacterMainControl")
            .expect("type");
        world.define_member(
            relocated,
            MemberDef::static_field("Main", MemberSource::Constant(HostValue::Null)),
        );
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());

        let binding = binder
            .resolve(&world, CapabilityId::PlayerAccessor)
            .binding()
            .expect("bound");
        assert_eq!(binding.located_by, "short_name_scan");
        assert_eq!(binder.stats().full_scans, 1);
    }

    #[test]
    fn faulty_member_read_returns_error() {
        let (mut world, character) = world_with_character();
        world.define_member(
            character,
            MemberDef::instance_field("isDead", MemberSource::Faulty("boom".to_string())),
        );
        let mut binder = CapabilityBinder::new(&CapabilityNames::default());
        let binding = binder
            .resolve(&world, CapabilityId::HealthField)
            .binding()
            .expect("bound");

        let result = read_instance(&world, &binding, &HostValue::Object(ObjectId(1)));
        assert!(matches!(result, Err(HostError::MemberFault { .. })));
    }
}
