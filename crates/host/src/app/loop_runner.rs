use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use super::input::{ActionStates, EdgeDetector, InputAction, InputSnapshot};
use super::overlay::OverlayFrame;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    pub target_tps: u32,
    /// Duration of one simulated render frame.
    pub frame_time_ms: u64,
    pub max_frame_delta_ms: u64,
    pub max_ticks_per_frame: u32,
    pub max_frames: u64,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            frame_time_ms: 16,
            max_frame_delta_ms: 250,
            max_ticks_per_frame: 5,
            max_frames: 3_750,
            screen_width: 1280,
            screen_height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("target_tps must be greater than zero")]
    ZeroTickRate,
    #[error("frame_time_ms must be greater than zero")]
    ZeroFrameTime,
}

/// Clock values handed to a frame handler. `now_seconds` is monotonic and
/// advances by exactly `dt_seconds` per simulation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    pub tick: u64,
    pub now_seconds: f64,
    pub dt_seconds: f32,
}

pub trait FrameHandler<W: ?Sized> {
    fn update(&mut self, time: FrameTime, input: &InputSnapshot, world: &mut W);
    fn render(&mut self, time: FrameTime, world: &W, overlay: &mut OverlayFrame);
    fn present(&mut self, _time: FrameTime, _overlay: &OverlayFrame) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedHold {
    pub action: InputAction,
    pub from_tick: u64,
    pub until_tick: u64,
}

/// Pre-recorded device input for headless runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    holds: Vec<ScriptedHold>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(mut self, action: InputAction, from_tick: u64, hold_ticks: u64) -> Self {
        self.holds.push(ScriptedHold {
            action,
            from_tick,
            until_tick: from_tick.saturating_add(hold_ticks.max(1)),
        });
        self
    }

    pub fn actions_down(&self, tick: u64) -> ActionStates {
        let mut states = ActionStates::default();
        for hold in &self.holds {
            if tick >= hold.from_tick && tick < hold.until_tick {
                states.set(hold.action, true);
            }
        }
        states
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub frames: u64,
    pub elapsed_seconds: f64,
    pub dropped_backlog_frames: u64,
    pub quit_requested: bool,
}

pub fn run_headless<W: ?Sized, H: FrameHandler<W>>(
    config: &LoopConfig,
    world: &mut W,
    handler: &mut H,
    script: &InputScript,
) -> Result<LoopSummary, DriverError> {
    if config.target_tps == 0 {
        return Err(DriverError::ZeroTickRate);
    }
    if config.frame_time_ms == 0 {
        return Err(DriverError::ZeroFrameTime);
    }

    let fixed_dt = Duration::from_secs_f64(1.0 / config.target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let frame_dt = Duration::from_millis(config.frame_time_ms);
    let max_frame_delta = normalize_non_zero_duration(
        Duration::from_millis(config.max_frame_delta_ms),
        Duration::from_millis(250),
    );
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    info!(
        target_tps = config.target_tps,
        frame_time_ms = config.frame_time_ms,
        max_ticks_per_frame,
        max_frames = config.max_frames,
        "loop_config"
    );

    let mut edges = EdgeDetector::default();
    let mut overlay = OverlayFrame::new(config.screen_width, config.screen_height);
    let mut accumulator = Duration::ZERO;
    let mut summary = LoopSummary::default();

    'frames: for _ in 0..config.max_frames {
        accumulator = accumulator.saturating_add(clamp_frame_delta(frame_dt, max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
        for _ in 0..step_plan.ticks_to_run {
            let input = edges.observe(script.actions_down(summary.ticks));
            summary.ticks = summary.ticks.saturating_add(1);
            let time = FrameTime {
                tick: summary.ticks,
                now_seconds: summary.ticks as f64 * fixed_dt.as_secs_f64(),
                dt_seconds: fixed_dt_seconds,
            };
            handler.update(time, &input, world);
            if input.pressed(InputAction::Quit) {
                info!(tick = summary.ticks, reason = "quit_action", "shutdown_requested");
                summary.quit_requested = true;
                break 'frames;
            }
        }
        accumulator = step_plan.remaining_accumulator;
        if step_plan.dropped_backlog > Duration::ZERO {
            summary.dropped_backlog_frames = summary.dropped_backlog_frames.saturating_add(1);
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame, "sim_clamp_triggered"
            );
        }

        let time = FrameTime {
            tick: summary.ticks,
            now_seconds: summary.ticks as f64 * fixed_dt.as_secs_f64(),
            dt_seconds: fixed_dt_seconds,
        };
        overlay.clear();
        handler.render(time, world, &mut overlay);
        handler.present(time, &overlay);
        summary.frames = summary.frames.saturating_add(1);
    }

    summary.elapsed_seconds = summary.ticks as f64 * fixed_dt.as_secs_f64();
    info!(
        ticks = summary.ticks,
        frames = summary.frames,
        elapsed_seconds = summary.elapsed_seconds,
        "loop_finished"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::overlay::{OverlayLine, OverlaySlot, Placement, TextTone};

    #[derive(Default)]
    struct Recorder {
        updates: Vec<FrameTime>,
        trigger_edges: Vec<u64>,
        renders: u64,
        presented_lines: usize,
    }

    impl FrameHandler<u32> for Recorder {
        fn update(&mut self, time: FrameTime, input: &InputSnapshot, world: &mut u32) {
            *world += 1;
            self.updates.push(time);
            if input.pressed(InputAction::TriggerHorde) {
                self.trigger_edges.push(time.tick);
            }
        }

        fn render(&mut self, _time: FrameTime, _world: &u32, overlay: &mut OverlayFrame) {
            self.renders += 1;
            overlay.show(OverlayLine {
                slot: OverlaySlot::Ready,
                placement: Placement::default(),
                tone: TextTone::Info,
                text: "ok".to_string(),
            });
        }

        fn present(&mut self, _time: FrameTime, overlay: &OverlayFrame) {
            self.presented_lines = overlay.lines().len();
        }
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let config = LoopConfig {
            target_tps: 0,
            ..LoopConfig::default()
        };
        let mut world = 0u32;
        let result = run_headless(&config, &mut world, &mut Recorder::default(), &InputScript::new());
        assert_eq!(result, Err(DriverError::ZeroTickRate));
    }

    #[test]
    fn clock_is_monotonic_and_tick_aligned() {
        let config = LoopConfig {
            target_tps: 10,
            frame_time_ms: 100,
            max_frames: 5,
            ..LoopConfig::default()
        };
        let mut world = 0u32;
        let mut recorder = Recorder::default();

        let summary =
            run_headless(&config, &mut world, &mut recorder, &InputScript::new()).expect("run");

        assert_eq!(summary.ticks, 5);
        assert_eq!(world, 5);
        assert_eq!(recorder.renders, 5);
        assert_eq!(recorder.presented_lines, 1);
        for pair in recorder.updates.windows(2) {
            assert!(pair[1].now_seconds > pair[0].now_seconds);
        }
        assert!((summary.elapsed_seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn held_script_input_fires_one_edge() {
        let config = LoopConfig {
            target_tps: 10,
            frame_time_ms: 100,
            max_frames: 10,
            ..LoopConfig::default()
        };
        let script = InputScript::new().hold(InputAction::TriggerHorde, 2, 4);
        let mut world = 0u32;
        let mut recorder = Recorder::default();

        run_headless(&config, &mut world, &mut recorder, &script).expect("run");

        assert_eq!(recorder.trigger_edges, vec![3]);
    }

    #[test]
    fn quit_action_stops_the_loop() {
        let config = LoopConfig {
            target_tps: 10,
            frame_time_ms: 100,
            max_frames: 10,
            ..LoopConfig::default()
        };
        let script = InputScript::new().hold(InputAction::Quit, 3, 1);
        let mut world = 0u32;
        let mut recorder = Recorder::default();

        let summary = run_headless(&config, &mut world, &mut recorder, &script).expect("run");

        assert!(summary.quit_requested);
        assert_eq!(summary.ticks, 4);
    }
}
