//! Headless host layouts shaped like the live game: a character type with a
//! static player accessor and per-character team/health/name members, and a
//! tracker type whose static method lists live characters wrapped in records.

use host::{
    HostValue, HostWorld, MemberDef, MemberSource, ObjectId, Transform, TypeHandle, Vec3,
};

use crate::config::CapabilityNames;

pub const PLAYER_TEAM: i64 = 1;
pub const HOSTILE_TEAM: i64 = 2;

const TEAM_ATTRIBUTE: &str = "team";
const DEAD_ATTRIBUTE: &str = "dead";
const NAME_ATTRIBUTE: &str = "display_name";

#[derive(Debug, Clone, PartialEq)]
pub struct ActorSeed {
    pub name: String,
    pub position: Vec3,
    pub team: i64,
    pub dead: bool,
}

impl ActorSeed {
    pub fn hostile(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
            team: HOSTILE_TEAM,
            dead: false,
        }
    }

    pub fn on_team(mut self, team: i64) -> Self {
        self.team = team;
        self
    }

    pub fn dead(mut self) -> Self {
        self.dead = true;
        self
    }
}

#[derive(Debug)]
pub struct Sandbox {
    pub world: HostWorld,
    pub player: Option<ObjectId>,
    pub camera: Option<ObjectId>,
    pub actors: Vec<ObjectId>,
    pub character_type: Option<TypeHandle>,
    pub tracker_type: Option<TypeHandle>,
}

impl Sandbox {
    pub fn spawn_actor(&mut self, seed: &ActorSeed) -> ObjectId {
        let id = spawn_character(&mut self.world, seed);
        self.world.push_roster(id);
        self.actors.push(id);
        id
    }
}

#[derive(Debug, Clone)]
pub struct SandboxBuilder {
    names: CapabilityNames,
    character_type_name: Option<String>,
    environment_id: Option<String>,
    player: Option<Vec3>,
    actors: Vec<ActorSeed>,
    player_accessor: bool,
    tracker: bool,
    camera: bool,
    filler_modules: usize,
}

impl Default for SandboxBuilder {
    fn default() -> Self {
        Self {
            names: CapabilityNames::default(),
            character_type_name: None,
            environment_id: None,
            player: Some(Vec3::ZERO),
            actors: Vec::new(),
            player_accessor: true,
            tracker: true,
            camera: true,
            filler_modules: 2,
        }
    }
}

impl SandboxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(mut self, names: CapabilityNames) -> Self {
        self.names = names;
        self
    }

    pub fn environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    pub fn without_player(mut self) -> Self {
        self.player = None;
        self
    }

    pub fn without_player_accessor(mut self) -> Self {
        self.player_accessor = false;
        self
    }

    pub fn without_tracker(mut self) -> Self {
        self.tracker = false;
        self
    }

    pub fn without_camera(mut self) -> Self {
        self.camera = false;
        self
    }

    /// Publishes the character type under a name no direct lookup knows.
    pub fn relocated_character_type(mut self, full_name: impl Into<String>) -> Self {
        self.character_type_name = Some(full_name.into());
        self
    }

    pub fn actor(mut self, seed: ActorSeed) -> Self {
        self.actors.push(seed);
        self
    }

    pub fn build(self) -> Sandbox {
        let mut world = HostWorld::new();
        world.set_environment_id(self.environment_id.clone());

        for index in 0..self.filler_modules {
            let module = world.define_module(format!("Engine.Module{index}"));
            for type_name in ["Transform", "Rigidbody", "Animator"] {
                world.define_type(module, format!("Engine.Module{index}.{type_name}"));
            }
        }

        let player = self.player.map(|position| {
            spawn_character(
                &mut world,
                &ActorSeed {
                    name: "Player".to_string(),
                    position,
                    team: PLAYER_TEAM,
                    dead: false,
                },
            )
        });
        let camera = match (player, self.camera) {
            (Some(player), true) => {
                let camera = world.spawn_child(
                    player,
                    "MainCamera",
                    Transform::at(Vec3::new(0.0, 1.6, -3.0)),
                );
                world.set_main_camera(camera);
                camera
            }
            _ => None,
        };
        if let Some(player) = player {
            world.push_roster(player);
        }

        let mut actors = Vec::with_capacity(self.actors.len());
        for seed in &self.actors {
            let id = spawn_character(&mut world, seed);
            world.push_roster(id);
            actors.push(id);
        }

        let game = world.define_module("Assembly-CSharp");
        let character_name = self
            .character_type_name
            .clone()
            .unwrap_or_else(|| self.names.character_type.clone());
        let character_type = world.define_type(game, character_name);
        if let Some(character) = character_type {
            self.define_character_members(&mut world, character, player);
        }

        let tracker_type = if self.tracker {
            let tools = world.define_module("DuckovCheatUI");
            let tracker = world.define_type(tools, self.names.tracker_type.clone());
            if let Some(tracker) = tracker {
                self.define_tracker_members(&mut world, tracker);
            }
            tracker
        } else {
            None
        };

        Sandbox {
            world,
            player,
            camera,
            actors,
            character_type,
            tracker_type,
        }
    }

    fn define_character_members(
        &self,
        world: &mut HostWorld,
        character: TypeHandle,
        player: Option<ObjectId>,
    ) {
        if self.player_accessor {
            let value = player.map_or(HostValue::Null, HostValue::Object);
            world.define_member(
                character,
                MemberDef::static_property(
                    self.names.player_accessor.clone(),
                    MemberSource::Constant(value),
                ),
            );
        }
        let instance_members = [
            (&self.names.team_members, TEAM_ATTRIBUTE),
            (&self.names.health_members, DEAD_ATTRIBUTE),
            (&self.names.identity_members, NAME_ATTRIBUTE),
        ];
        for (candidates, attribute) in instance_members {
            if let Some(name) = candidates.first() {
                world.define_member(
                    character,
                    MemberDef::instance_field(
                        name.clone(),
                        MemberSource::Attribute(attribute.to_string()),
                    ),
                );
            }
        }
    }

    fn define_tracker_members(&self, world: &mut HostWorld, tracker: TypeHandle) {
        let Some(record) = world.define_nested_type(tracker, self.names.enemy_record_type.clone())
        else {
            return;
        };
        world.define_member(
            record,
            MemberDef::instance_field(self.names.enemy_record_field.clone(), MemberSource::RecordField),
        );
        world.define_member(
            tracker,
            MemberDef::static_method(
                self.names.live_enemies_method.clone(),
                MemberSource::Roster {
                    record_type: record,
                    field: self.names.enemy_record_field.clone(),
                },
            ),
        );
    }
}

fn spawn_character(world: &mut HostWorld, seed: &ActorSeed) -> ObjectId {
    let id = world.spawn(seed.name.clone(), Transform::at(seed.position));
    world.set_attribute(id, TEAM_ATTRIBUTE, HostValue::Int(seed.team));
    world.set_attribute(id, DEAD_ATTRIBUTE, HostValue::Bool(seed.dead));
    world.set_attribute(id, NAME_ATTRIBUTE, HostValue::Text(seed.name.clone()));
    id
}
