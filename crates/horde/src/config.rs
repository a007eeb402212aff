use std::fs;
use std::path::{Path, PathBuf};

use host::LoopConfig;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV_VAR: &str = "HORDE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DurationOverride {
    pub fragment: String,
    pub seconds: f64,
}

impl DurationOverride {
    fn new(fragment: &str, seconds: f64) -> Self {
        Self {
            fragment: fragment.to_string(),
            seconds,
        }
    }
}

/// Names the controller probes for inside the host's type registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapabilityNames {
    pub character_type: String,
    pub character_type_aliases: Vec<String>,
    pub player_accessor: String,
    pub tracker_type: String,
    pub tracker_type_aliases: Vec<String>,
    pub live_enemies_method: String,
    pub enemy_record_type: String,
    pub enemy_record_field: String,
    pub team_members: Vec<String>,
    pub health_members: Vec<String>,
    pub identity_members: Vec<String>,
    pub allow_short_name_scan: bool,
}

impl Default for CapabilityNames {
    fn default() -> Self {
        Self {
            character_type: "CharacterMainControl".to_string(),
            character_type_aliases: vec!["Duckov.CharacterMainControl".to_string()],
            player_accessor: "Main".to_string(),
            tracker_type: "DuckovCheatUI.Utiles.EnemyTracker".to_string(),
            tracker_type_aliases: Vec::new(),
            live_enemies_method: "GetLiveEnemies".to_string(),
            enemy_record_type: "EnemyInfo".to_string(),
            enemy_record_field: "character".to_string(),
            team_members: vec!["team".to_string(), "Team".to_string()],
            health_members: vec!["isDead".to_string(), "IsDead".to_string(), "Health".to_string()],
            identity_members: vec!["displayName".to_string(), "DisplayName".to_string()],
            allow_short_name_scan: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HordeConfig {
    pub scan_interval_seconds: f64,
    pub trigger_delay_seconds: f64,
    pub base_duration_seconds: f64,
    pub permitted_fragments: Vec<String>,
    pub duration_overrides: Vec<DurationOverride>,
    pub exclusion_tags: Vec<String>,
    pub chase_speed: f32,
    pub stop_distance: f32,
    pub banner_window_seconds: f64,
    pub scan_ui_window_seconds: f64,
    pub ready_quiet_seconds: f64,
    pub capabilities: CapabilityNames,
}

impl Default for HordeConfig {
    fn default() -> Self {
        Self {
            scan_interval_seconds: 3.0,
            trigger_delay_seconds: 1.5,
            base_duration_seconds: 25.0,
            permitted_fragments: [
                "groundzero",
                "base",
                "hiddenwarehouse",
                "farm_01",
                "farm_main",
                "jlab",
                "farm_jlab_facility",
                "stormzone",
            ]
            .into_iter()
            .map(ToString::to_string)
            .collect(),
            duration_overrides: vec![
                DurationOverride::new("farm_01", 45.0),
                DurationOverride::new("farm_main", 45.0),
                DurationOverride::new("stormzone", 40.0),
                DurationOverride::new("hiddenwarehouse", 30.0),
            ],
            exclusion_tags: vec!["companion".to_string(), "pet".to_string()],
            chase_speed: 9.0,
            stop_distance: 2.5,
            banner_window_seconds: 3.0,
            scan_ui_window_seconds: 1.2,
            ready_quiet_seconds: 5.0,
            capabilities: CapabilityNames::default(),
        }
    }
}

/// Everything the installer reads from a settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub horde: HordeConfig,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Settings {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let settings = match serde_path_to_error::deserialize::<_, Settings>(&mut deserializer) {
            Ok(settings) => settings,
            Err(error) => {
                let path = error.path().to_string();
                return Err(ConfigError::Parse {
                    path: if path.is_empty() { ".".to_string() } else { path },
                    source: error.into_inner(),
                });
            }
        };
        settings.horde.validate()?;
        Ok(settings)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

impl HordeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("scan_interval_seconds", self.scan_interval_seconds)?;
        require_non_negative("trigger_delay_seconds", self.trigger_delay_seconds)?;
        require_positive("base_duration_seconds", self.base_duration_seconds)?;
        require_non_negative("banner_window_seconds", self.banner_window_seconds)?;
        require_positive("scan_ui_window_seconds", self.scan_ui_window_seconds)?;
        require_non_negative("ready_quiet_seconds", self.ready_quiet_seconds)?;
        require_positive("chase_speed", f64::from(self.chase_speed))?;
        require_non_negative("stop_distance", f64::from(self.stop_distance))?;
        for entry in &self.duration_overrides {
            require_positive("duration_overrides.seconds", entry.seconds)?;
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            message: format!("expected a finite value > 0, got {value}"),
        })
    }
}

fn require_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            message: format!("expected a finite value >= 0, got {value}"),
        })
    }
}
