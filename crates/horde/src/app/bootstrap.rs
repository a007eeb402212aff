use std::path::PathBuf;

use horde::config::{ConfigError, HordeConfig, Settings, CONFIG_PATH_ENV_VAR};
use horde::controller::HordeController;
use horde::sandbox::{ActorSeed, SandboxBuilder, PLAYER_TEAM};
use host::{HostWorld, InputAction, InputScript, LoopConfig, Vec3};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::loop_runner::HordeFrameHandler;

const ENVIRONMENT_ENV_VAR: &str = "HORDE_DEMO_ENVIRONMENT";
const DEFAULT_ENVIRONMENT: &str = "Level_Farm_Main";
const TRIGGER_AT_TICK: u64 = 270;
const QUIT_AT_TICK: u64 = 3_300;

pub(crate) struct AppWiring {
    pub(crate) loop_config: LoopConfig,
    pub(crate) world: HostWorld,
    pub(crate) handler: HordeFrameHandler,
    pub(crate) script: InputScript,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!("=== Horde Demo Startup ===");

    let settings = load_settings()?;
    let environment = parse_environment_from_env();
    info!(environment = %environment, "demo_environment");

    Ok(AppWiring {
        loop_config: settings.loop_config,
        world: demo_world(&settings.horde, &environment),
        handler: HordeFrameHandler::new(HordeController::new(&settings.horde)),
        script: InputScript::new()
            .hold(InputAction::TriggerHorde, TRIGGER_AT_TICK, 3)
            .hold(InputAction::Quit, QUIT_AT_TICK, 1),
    })
}

pub(crate) fn demo_world(config: &HordeConfig, environment: &str) -> HostWorld {
    SandboxBuilder::new()
        .names(config.capabilities.clone())
        .environment(environment)
        .actor(ActorSeed::hostile("Scav_A", Vec3::new(25.0, 0.0, 0.0)))
        .actor(ActorSeed::hostile("Scav_B", Vec3::new(-18.0, 0.0, 12.0)))
        .actor(ActorSeed::hostile("Raider", Vec3::new(0.0, 0.0, -30.0)))
        .actor(ActorSeed::hostile("Guard", Vec3::new(6.0, 0.0, 6.0)).on_team(PLAYER_TEAM))
        .actor(ActorSeed::hostile("Scav_Corpse", Vec3::new(12.0, 0.0, -4.0)).dead())
        .actor(ActorSeed::hostile("Companion Dog", Vec3::new(2.0, 0.0, -2.0)))
        .build()
        .world
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn load_settings() -> Result<Settings, ConfigError> {
    let Some(raw) = std::env::var_os(CONFIG_PATH_ENV_VAR) else {
        return Ok(Settings::default());
    };
    let path = PathBuf::from(raw);
    info!(path = %path.display(), "config_loading");
    Settings::load_from_path(&path)
}

fn parse_environment_from_env() -> String {
    std::env::var(ENVIRONMENT_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
}
