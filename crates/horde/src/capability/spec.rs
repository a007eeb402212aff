use std::fmt;

use host::{MemberKind, MemberScope};

use crate::config::CapabilityNames;

/// One host-side feature the controller depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityId {
    PlayerAccessor,
    ActorEnumerator,
    TeamField,
    HealthField,
    IdentityField,
}

impl CapabilityId {
    pub const COUNT: usize = 5;
    pub const ALL: [CapabilityId; Self::COUNT] = [
        Self::PlayerAccessor,
        Self::ActorEnumerator,
        Self::TeamField,
        Self::HealthField,
        Self::IdentityField,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayerAccessor => "player_accessor",
            Self::ActorEnumerator => "actor_enumerator",
            Self::TeamField => "team_field",
            Self::HealthField => "health_field",
            Self::IdentityField => "identity_field",
        }
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStyle {
    /// Try each name as a field, then as a property.
    FieldThenProperty,
    Method,
}

impl AccessStyle {
    pub fn kinds(self) -> &'static [MemberKind] {
        match self {
            Self::FieldThenProperty => &[MemberKind::Field, MemberKind::Property],
            Self::Method => &[MemberKind::Method],
        }
    }
}

/// Nested record type wrapping each enumerated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub type_name: String,
    pub field: String,
}

/// How to find one capability: candidate type names, the short name used by
/// the slow path, and the member names to probe on the located type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySpec {
    pub id: CapabilityId,
    pub type_names: Vec<String>,
    pub short_name: Option<String>,
    pub members: Vec<String>,
    pub scope: MemberScope,
    pub access: AccessStyle,
    pub record: Option<RecordSpec>,
}

impl CapabilitySpec {
    /// Key shared by capabilities living on the same host type.
    pub fn type_key(&self) -> &str {
        self.type_names.first().map_or("", String::as_str)
    }

    /// Specs for every capability, ordered by `CapabilityId::index`.
    pub fn table(names: &CapabilityNames) -> Vec<CapabilitySpec> {
        let character_types = type_names(&names.character_type, &names.character_type_aliases);
        let character_short = short_name(names, &names.character_type);
        let instance_member = |id: CapabilityId, members: &[String]| CapabilitySpec {
            id,
            type_names: character_types.clone(),
            short_name: character_short.clone(),
            members: members.to_vec(),
            scope: MemberScope::Instance,
            access: AccessStyle::FieldThenProperty,
            record: None,
        };

        vec![
            CapabilitySpec {
                id: CapabilityId::PlayerAccessor,
                type_names: character_types.clone(),
                short_name: character_short.clone(),
                members: vec![names.player_accessor.clone()],
                scope: MemberScope::Static,
                access: AccessStyle::FieldThenProperty,
                record: None,
            },
            CapabilitySpec {
                id: CapabilityId::ActorEnumerator,
                type_names: type_names(&names.tracker_type, &names.tracker_type_aliases),
                short_name: short_name(names, &names.tracker_type),
                members: vec![names.live_enemies_method.clone()],
                scope: MemberScope::Static,
                access: AccessStyle::Method,
                record: Some(RecordSpec {
                    type_name: names.enemy_record_type.clone(),
                    field: names.enemy_record_field.clone(),
                }),
            },
            instance_member(CapabilityId::TeamField, &names.team_members),
            instance_member(CapabilityId::HealthField, &names.health_members),
            instance_member(CapabilityId::IdentityField, &names.identity_members),
        ]
    }
}

fn type_names(primary: &str, aliases: &[String]) -> Vec<String> {
    let mut names = vec![primary.to_string()];
    for alias in aliases {
        if !names.contains(alias) {
            names.push(alias.clone());
        }
    }
    names
}

fn short_name(names: &CapabilityNames, full_name: &str) -> Option<String> {
    if !names.allow_short_name_scan {
        return None;
    }
    full_name
        .rsplit(['.', '+'])
        .next()
        .filter(|short| !short.is_empty())
        .map(ToString::to_string)
}
