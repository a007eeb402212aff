use crate::config::{DurationOverride, HordeConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentVerdict {
    pub permitted: bool,
    pub duration_seconds: f64,
}

/// Decides from the host's environment identifier whether a horde may run
/// there and for how long. Matching is a case-insensitive substring test.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentClassifier {
    permitted_fragments: Vec<String>,
    duration_overrides: Vec<DurationOverride>,
    base_duration_seconds: f64,
}

impl EnvironmentClassifier {
    pub fn new(config: &HordeConfig) -> Self {
        let permitted_fragments = config
            .permitted_fragments
            .iter()
            .filter_map(|fragment| normalize(fragment))
            .collect();
        let duration_overrides = config
            .duration_overrides
            .iter()
            .filter_map(|entry| {
                normalize(&entry.fragment).map(|fragment| DurationOverride {
                    fragment,
                    seconds: entry.seconds,
                })
            })
            .collect();
        Self {
            permitted_fragments,
            duration_overrides,
            base_duration_seconds: config.base_duration_seconds,
        }
    }

    pub fn permits(&self, environment_id: Option<&str>) -> bool {
        self.permitting_fragment(environment_id).is_some()
    }

    /// First permitted fragment contained in the identifier, if any.
    pub fn permitting_fragment(&self, environment_id: Option<&str>) -> Option<&str> {
        let environment = environment_id.and_then(normalize)?;
        self.permitted_fragments
            .iter()
            .find(|fragment| environment.contains(fragment.as_str()))
            .map(String::as_str)
    }

    pub fn duration_for(&self, environment_id: Option<&str>) -> f64 {
        let Some(environment) = environment_id.and_then(normalize) else {
            return self.base_duration_seconds;
        };
        self.duration_overrides
            .iter()
            .find(|entry| environment.contains(entry.fragment.as_str()))
            .map_or(self.base_duration_seconds, |entry| entry.seconds)
    }

    pub fn classify(&self, environment_id: Option<&str>) -> EnvironmentVerdict {
        EnvironmentVerdict {
            permitted: self.permits(environment_id),
            duration_seconds: self.duration_for(environment_id),
        }
    }
}

fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
