use std::collections::HashSet;

use host::{HostValue, MemberHandle, ObjectId, Simulation, TypeRegistry};
use tracing::{debug, warn};

use crate::capability::{
    invoke_static, read_instance, read_static, Binding, CapabilityBinder, CapabilityId,
};
use crate::config::HordeConfig;

/// Ordered, duplicate-free set of actor handles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedSet {
    members: Vec<ObjectId>,
    seen: HashSet<ObjectId>,
}

impl TrackedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the handle was already tracked.
    pub fn insert(&mut self, id: ObjectId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.members.iter().copied()
    }

    pub fn as_slice(&self) -> &[ObjectId] {
        &self.members
    }
}

impl FromIterator<ObjectId> for TrackedSet {
    fn from_iter<T: IntoIterator<Item = ObjectId>>(iter: T) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSource {
    Accessor,
    CameraRoot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub invalid: usize,
    pub player: usize,
    pub same_team: usize,
    pub dead: usize,
    pub excluded_name: usize,
    pub duplicate: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub player: Option<ObjectId>,
    pub player_source: Option<PlayerSource>,
    pub tracked: TrackedSet,
    /// Live characters enumerated before filtering.
    pub live_count: usize,
    pub skipped: SkipCounts,
}

impl ScanOutcome {
    pub fn found(&self) -> usize {
        self.tracked.len()
    }
}

/// Builds the tracked set of hostile actors from the host's enumerator.
#[derive(Debug, Clone)]
pub struct EntityScanner {
    exclusion_tags: Vec<String>,
    enumerator_degraded_logged: bool,
}

impl EntityScanner {
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            exclusion_tags: config
                .exclusion_tags
                .iter()
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect(),
            enumerator_degraded_logged: false,
        }
    }

    pub fn scan(&mut self, binder: &mut CapabilityBinder, sim: &dyn Simulation) -> ScanOutcome {
        let registry = sim.registry();
        let mut outcome = ScanOutcome::default();

        if let Some((player, source)) = find_player(binder, sim) {
            outcome.player = Some(player);
            outcome.player_source = Some(source);
        }

        let Some((enumerator, items)) = self.enumerate(binder, registry) else {
            debug!(
                environment = sim.environment_id().as_deref().unwrap_or("<none>"),
                player_found = outcome.player.is_some(),
                "scan_completed_without_enumerator"
            );
            return outcome;
        };
        let record_field = enumerator.record_field;
        let team = binder.resolve(registry, CapabilityId::TeamField).binding();
        let health = binder.resolve(registry, CapabilityId::HealthField).binding();
        let identity = binder
            .resolve(registry, CapabilityId::IdentityField)
            .binding();
        let player_team = outcome
            .player
            .zip(team)
            .and_then(|(player, team)| read_team(registry, &team, player));

        for item in &items {
            let Some(actor) = character_of(registry, item, record_field) else {
                outcome.skipped.invalid += 1;
                continue;
            };
            if !sim.is_alive(actor) {
                outcome.skipped.invalid += 1;
                continue;
            }
            outcome.live_count += 1;

            if let Some(player) = outcome.player {
                if sim.is_in_hierarchy_of(actor, player) || sim.is_in_hierarchy_of(player, actor) {
                    outcome.skipped.player += 1;
                    continue;
                }
            }
            if let (Some(player_team), Some(team)) = (&player_team, team) {
                if read_team(registry, &team, actor).as_ref() == Some(player_team) {
                    outcome.skipped.same_team += 1;
                    continue;
                }
            }
            if health.is_some_and(|health| is_dead(registry, &health, actor)) {
                outcome.skipped.dead += 1;
                continue;
            }
            if identity.is_some_and(|identity| self.is_excluded(registry, &identity, actor)) {
                outcome.skipped.excluded_name += 1;
                continue;
            }
            if !outcome.tracked.insert(actor) {
                outcome.skipped.duplicate += 1;
            }
        }

        debug!(
            environment = sim.environment_id().as_deref().unwrap_or("<none>"),
            live = outcome.live_count,
            unique = outcome.tracked.len(),
            player_found = outcome.player.is_some(),
            "scan_completed"
        );
        outcome
    }

    fn enumerate(
        &mut self,
        binder: &mut CapabilityBinder,
        registry: &dyn TypeRegistry,
    ) -> Option<(Binding, Vec<HostValue>)> {
        let Some(binding) = binder
            .resolve(registry, CapabilityId::ActorEnumerator)
            .binding()
        else {
            self.log_enumerator_degraded("capability_unavailable");
            return None;
        };
        match invoke_static(registry, &binding) {
            Ok(HostValue::List(items)) => Some((binding, items)),
            Ok(HostValue::Null) => Some((binding, Vec::new())),
            Ok(other) => {
                self.log_enumerator_degraded(other.kind_name());
                None
            }
            Err(error) => {
                debug!(error = %error, "actor_enumeration_failed");
                None
            }
        }
    }

    fn log_enumerator_degraded(&mut self, reason: &str) {
        if self.enumerator_degraded_logged {
            return;
        }
        self.enumerator_degraded_logged = true;
        warn!(reason, "actor_enumeration_degraded");
    }

    fn is_excluded(&self, registry: &dyn TypeRegistry, identity: &Binding, actor: ObjectId) -> bool {
        if self.exclusion_tags.is_empty() {
            return false;
        }
        let Ok(value) = read_instance(registry, identity, &HostValue::Object(actor)) else {
            return false;
        };
        let Some(name) = value.as_text().map(str::to_lowercase) else {
            return false;
        };
        self.exclusion_tags.iter().any(|tag| name.contains(tag.as_str()))
    }
}

fn find_player(
    binder: &mut CapabilityBinder,
    sim: &dyn Simulation,
) -> Option<(ObjectId, PlayerSource)> {
    let registry = sim.registry();
    if let Some(binding) = binder
        .resolve(registry, CapabilityId::PlayerAccessor)
        .binding()
    {
        match read_static(registry, &binding) {
            Ok(HostValue::Object(id)) if sim.is_alive(id) => {
                return Some((id, PlayerSource::Accessor));
            }
            Ok(_) => {}
            Err(error) => debug!(error = %error, "player_accessor_read_failed"),
        }
    }
    let camera = sim.main_camera()?;
    let root = sim.root_of(camera)?;
    sim.is_alive(root).then_some((root, PlayerSource::CameraRoot))
}

fn character_of(
    registry: &dyn TypeRegistry,
    item: &HostValue,
    record_field: Option<MemberHandle>,
) -> Option<ObjectId> {
    match item {
        HostValue::Object(id) => Some(*id),
        HostValue::Record { .. } => {
            let field = record_field?;
            registry.read_instance(field, item).ok()?.as_object()
        }
        _ => None,
    }
}

fn read_team(registry: &dyn TypeRegistry, team: &Binding, actor: ObjectId) -> Option<HostValue> {
    read_instance(registry, team, &HostValue::Object(actor))
        .ok()
        .filter(|value| !value.is_null())
}

/// Unreadable health counts as alive.
fn is_dead(registry: &dyn TypeRegistry, health: &Binding, actor: ObjectId) -> bool {
    match read_instance(registry, health, &HostValue::Object(actor)) {
        Ok(HostValue::Bool(dead)) => dead,
        Ok(HostValue::Int(points)) => points <= 0,
        Ok(HostValue::Float(points)) => points <= 0.0,
        _ => false,
    }
}
