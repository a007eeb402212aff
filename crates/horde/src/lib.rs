//! Horde mode for a live host simulation: periodic discovery of hostile
//! actors, a trigger-armed timed pursuit of the player, and the on-screen
//! status lines that go with it.

pub mod capability;
pub mod chase;
pub mod config;
pub mod controller;
pub mod environment;
pub mod sandbox;
pub mod scanner;
pub mod state_machine;
pub mod status;

pub use capability::{BinderStats, CapabilityBinder, CapabilityId, Resolution};
pub use chase::{ChaseMover, ChaseReport, Steering};
pub use config::{ConfigError, HordeConfig, Settings};
pub use controller::{HordeController, TickReport};
pub use environment::{EnvironmentClassifier, EnvironmentVerdict};
pub use scanner::{EntityScanner, ScanOutcome, TrackedSet};
pub use state_machine::{HordeState, HordeStateMachine, Transition, TriggerDecision};
pub use status::{StatusInputs, StatusLines, StatusPresenter};
