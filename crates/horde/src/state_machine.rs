use host::ObjectId;
use tracing::info;

use crate::config::HordeConfig;
use crate::scanner::{ScanOutcome, TrackedSet};
use crate::status::StatusInputs;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HordeState {
    Idle,
    /// Trigger accepted, waiting out the warning delay.
    Armed { trigger_at: f64, activate_at: f64 },
    Active { ends_at: f64 },
}

impl HordeState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed { .. } => "armed",
            Self::Active { .. } => "active",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HordeTimers {
    pub next_scan_at: f64,
    pub horde_end_at: Option<f64>,
    pub warning_banner_until: Option<f64>,
    pub scan_ui_started_at: Option<f64>,
    pub last_enemy_count_increase_at: Option<f64>,
}

/// Found counts from periodic scans. `peak` resets only when a scan finds
/// nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTally {
    pub scans: u64,
    pub last_found: usize,
    pub peak: usize,
    pub last_live: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRejection {
    NotIdle,
    EnvironmentNotPermitted,
    NoPlayer,
    NoTargets,
}

impl TriggerRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotIdle => "not_idle",
            Self::EnvironmentNotPermitted => "environment_not_permitted",
            Self::NoPlayer => "no_player",
            Self::NoTargets => "no_targets",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriggerDecision {
    Accepted { targets: usize, activate_at: f64 },
    Rejected(TriggerRejection),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Activated { duration_seconds: f64, ends_at: f64 },
    Expired,
}

#[derive(Debug, Clone)]
pub struct HordeStateMachine {
    state: HordeState,
    timers: HordeTimers,
    tally: ScanTally,
    tracked: TrackedSet,
    player: Option<ObjectId>,
    scan_interval_seconds: f64,
    trigger_delay_seconds: f64,
    banner_window_seconds: f64,
}

impl HordeStateMachine {
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            state: HordeState::Idle,
            timers: HordeTimers::default(),
            tally: ScanTally::default(),
            tracked: TrackedSet::new(),
            player: None,
            scan_interval_seconds: config.scan_interval_seconds,
            trigger_delay_seconds: config.trigger_delay_seconds,
            banner_window_seconds: config.banner_window_seconds,
        }
    }

    pub fn state(&self) -> HordeState {
        self.state
    }

    pub fn timers(&self) -> HordeTimers {
        self.timers
    }

    pub fn tally(&self) -> ScanTally {
        self.tally
    }

    pub fn tracked(&self) -> &TrackedSet {
        &self.tracked
    }

    pub fn player(&self) -> Option<ObjectId> {
        self.player
    }

    pub fn scan_due(&self, now: f64) -> bool {
        self.state.is_idle() && now >= self.timers.next_scan_at
    }

    /// Stores a completed scan. Ignored outside Idle so the tracked set
    /// stays frozen while a horde is pending or running.
    pub fn record_scan(&mut self, now: f64, outcome: ScanOutcome) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let found = outcome.tracked.len();
        if found == 0 {
            self.tally.peak = 0;
        } else if found > self.tally.peak {
            self.tally.peak = found;
            self.timers.last_enemy_count_increase_at = Some(now);
        }
        self.tally.last_found = found;
        self.tally.last_live = outcome.live_count;
        self.tally.scans += 1;
        self.timers.scan_ui_started_at = Some(now);
        self.timers.next_scan_at = now + self.scan_interval_seconds;
        self.tracked = outcome.tracked;
        self.player = outcome.player;
        true
    }

    pub fn request_trigger(&mut self, now: f64, environment_permitted: bool) -> TriggerDecision {
        let rejection = if !self.state.is_idle() {
            Some(TriggerRejection::NotIdle)
        } else if !environment_permitted {
            Some(TriggerRejection::EnvironmentNotPermitted)
        } else if self.player.is_none() {
            Some(TriggerRejection::NoPlayer)
        } else if self.tracked.is_empty() {
            Some(TriggerRejection::NoTargets)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            info!(
                reason = rejection.as_str(),
                state = self.state.label(),
                "horde_trigger_ignored"
            );
            return TriggerDecision::Rejected(rejection);
        }

        let activate_at = now + self.trigger_delay_seconds;
        self.state = HordeState::Armed {
            trigger_at: now,
            activate_at,
        };
        self.timers.warning_banner_until = Some(now + self.banner_window_seconds);
        let targets = self.tracked.len();
        info!(targets, activate_at, "horde_armed");
        TriggerDecision::Accepted {
            targets,
            activate_at,
        }
    }

    /// Timestamp-gated transitions. `duration_seconds` is asked only when the
    /// horde activates.
    pub fn advance(
        &mut self,
        now: f64,
        duration_seconds: impl FnOnce() -> f64,
    ) -> Option<Transition> {
        match self.state {
            HordeState::Idle => None,
            HordeState::Armed { activate_at, .. } if now >= activate_at => {
                let duration_seconds = duration_seconds();
                let ends_at = now + duration_seconds;
                self.state = HordeState::Active { ends_at };
                self.timers.horde_end_at = Some(ends_at);
                info!(
                    targets = self.tracked.len(),
                    duration_seconds, "horde_activated"
                );
                Some(Transition::Activated {
                    duration_seconds,
                    ends_at,
                })
            }
            HordeState::Active { ends_at } if now > ends_at => {
                self.state = HordeState::Idle;
                self.timers.horde_end_at = None;
                self.timers.next_scan_at = now;
                info!(ended_at = now, "horde_expired");
                Some(Transition::Expired)
            }
            HordeState::Armed { .. } | HordeState::Active { .. } => None,
        }
    }

    pub fn is_chasing(&self) -> bool {
        matches!(self.state, HordeState::Active { .. })
    }

    pub fn status_inputs(&self) -> StatusInputs {
        StatusInputs {
            state: self.state,
            timers: self.timers,
            tally: self.tally,
        }
    }
}
