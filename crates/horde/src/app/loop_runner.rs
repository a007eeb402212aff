use std::process::ExitCode;

use horde::controller::HordeController;
use horde::state_machine::{Transition, TriggerDecision};
use host::{run_headless, FrameHandler, FrameTime, HostWorld, InputSnapshot, OverlayFrame};
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;

/// Bridges the fixed-step driver to the controller and logs what a player
/// would have seen on screen.
pub(crate) struct HordeFrameHandler {
    controller: HordeController,
    shown_lines: Vec<String>,
    activations: u32,
    expirations: u32,
}

impl HordeFrameHandler {
    pub(crate) fn new(controller: HordeController) -> Self {
        Self {
            controller,
            shown_lines: Vec::new(),
            activations: 0,
            expirations: 0,
        }
    }
}

impl FrameHandler<HostWorld> for HordeFrameHandler {
    fn update(&mut self, time: FrameTime, input: &InputSnapshot, world: &mut HostWorld) {
        let report = self
            .controller
            .tick(world, input, time.now_seconds, time.dt_seconds);

        match report.transition {
            Some(Transition::Activated { .. }) => self.activations += 1,
            Some(Transition::Expired) => self.expirations += 1,
            None => {}
        }
        if let Some(TriggerDecision::Rejected(reason)) = report.trigger {
            info!(tick = time.tick, reason = reason.as_str(), "demo_trigger_rejected");
        }
        if let Some(chase) = report.chase {
            debug!(
                tick = time.tick,
                moved = chase.moved,
                holding = chase.holding,
                skipped = chase.skipped,
                "chase_step"
            );
        }
    }

    fn render(&mut self, time: FrameTime, _world: &HostWorld, overlay: &mut OverlayFrame) {
        self.controller.render(time.now_seconds, overlay);
    }

    fn present(&mut self, time: FrameTime, overlay: &OverlayFrame) {
        let lines = overlay.text_lines();
        if lines != self.shown_lines {
            info!(tick = time.tick, lines = ?lines, "overlay_changed");
            self.shown_lines = lines;
        }
    }
}

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    match run_headless(&app.loop_config, &mut app.world, &mut app.handler, &app.script) {
        Ok(summary) => {
            let stats = app.handler.controller.binder_stats();
            info!(
                ticks = summary.ticks,
                activations = app.handler.activations,
                expirations = app.handler.expirations,
                bound = stats.bound,
                failed = stats.failed,
                full_scans = stats.full_scans,
                "demo_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "loop_failed");
            ExitCode::FAILURE
        }
    }
}
