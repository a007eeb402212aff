mod input;
mod loop_runner;
mod overlay;

pub use input::{ActionStates, EdgeDetector, InputAction, InputSnapshot};
pub use loop_runner::{
    run_headless, DriverError, FrameHandler, FrameTime, InputScript, LoopConfig, LoopSummary,
    ScriptedHold,
};
pub use overlay::{
    centered_placement, stacked_below, OverlayFrame, OverlayLine, OverlaySlot, Placement,
    TextTone,
};
