use thiserror::Error;

pub mod app;
pub mod sim;

pub use app::{
    centered_placement, run_headless, stacked_below, ActionStates, DriverError, EdgeDetector,
    FrameHandler, FrameTime, InputAction, InputScript, InputSnapshot, LoopConfig, LoopSummary,
    OverlayFrame, OverlayLine, OverlaySlot, Placement, ScriptedHold, TextTone,
};
pub use sim::{
    HostObject, HostValue, HostWorld, MemberDef, MemberHandle, MemberKind, MemberScope,
    MemberSource, ModuleId, ObjectId, Simulation, Transform, TypeHandle, TypeRegistry, Vec3,
};

/// Failure surfaced by the host simulation while probing or reading one of
/// its objects. Every variant is recoverable from the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("unknown module handle {0}")]
    UnknownModule(u32),
    #[error("failed to load types from module {module}: {reason}")]
    TypeLoad { module: String, reason: String },
    #[error("unknown type handle {0}")]
    UnknownType(u32),
    #[error("unknown member handle {index} on type {owner}")]
    UnknownMember { owner: u32, index: u32 },
    #[error("member {member} faulted: {reason}")]
    MemberFault { member: String, reason: String },
    #[error("member {member} cannot be used as {expected}")]
    WrongAccess {
        member: String,
        expected: &'static str,
    },
    #[error("member {member} expects a {expected} target, got {actual}")]
    TargetMismatch {
        member: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("object {0} no longer exists")]
    DanglingObject(u64),
    #[error("object {object} has no attribute {attribute}")]
    MissingAttribute { object: u64, attribute: String },
}
