use host::{InputAction, InputSnapshot, OverlayFrame, Simulation};
use tracing::debug;

use crate::capability::{BinderStats, CapabilityBinder};
use crate::chase::{ChaseMover, ChaseReport};
use crate::config::HordeConfig;
use crate::environment::EnvironmentClassifier;
use crate::scanner::{EntityScanner, TrackedSet};
use crate::state_machine::{
    HordeState, HordeStateMachine, HordeTimers, ScanTally, Transition, TriggerDecision,
};
use crate::status::{StatusLines, StatusPresenter};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub transition: Option<Transition>,
    pub scanned: bool,
    pub trigger: Option<TriggerDecision>,
    pub chase: Option<ChaseReport>,
}

/// Owns every piece of horde-mode state for one host process. The host calls
/// [`HordeController::tick`] once per simulation step and
/// [`HordeController::render`] once per drawn frame.
#[derive(Debug)]
pub struct HordeController {
    classifier: EnvironmentClassifier,
    binder: CapabilityBinder,
    scanner: EntityScanner,
    machine: HordeStateMachine,
    mover: ChaseMover,
    presenter: StatusPresenter,
}

impl HordeController {
    pub fn new(config: &HordeConfig) -> Self {
        Self::with_binder(config, CapabilityBinder::new(&config.capabilities))
    }

    pub fn with_binder(config: &HordeConfig, binder: CapabilityBinder) -> Self {
        Self {
            classifier: EnvironmentClassifier::new(config),
            binder,
            scanner: EntityScanner::new(config),
            machine: HordeStateMachine::new(config),
            mover: ChaseMover::new(config),
            presenter: StatusPresenter::new(config),
        }
    }

    /// Runs one step: expiry/activation, due scan, trigger, chase.
    pub fn tick(
        &mut self,
        sim: &mut dyn Simulation,
        input: &InputSnapshot,
        now: f64,
        dt: f32,
    ) -> TickReport {
        let mut report = TickReport::default();
        let environment = sim.environment_id();

        report.transition = self
            .machine
            .advance(now, || self.classifier.duration_for(environment.as_deref()));

        if self.machine.scan_due(now) {
            self.run_scan(&*sim, now);
            report.scanned = true;
        }

        if input.pressed(InputAction::TriggerHorde) {
            if self.machine.state().is_idle() && !report.scanned {
                self.run_scan(&*sim, now);
                report.scanned = true;
            }
            let permitted = self.classifier.permits(environment.as_deref());
            report.trigger = Some(self.machine.request_trigger(now, permitted));
        }

        if self.machine.is_chasing() {
            if let Some(player) = self.machine.player() {
                report.chase = Some(self.mover.step(sim, player, self.machine.tracked(), dt));
            }
        }
        report
    }

    pub fn render(&self, now: f64, frame: &mut OverlayFrame) {
        self.presenter
            .present(&self.machine.status_inputs(), now, frame);
    }

    pub fn status_lines(&self, now: f64) -> StatusLines {
        self.presenter.compose(&self.machine.status_inputs(), now)
    }

    pub fn state(&self) -> HordeState {
        self.machine.state()
    }

    pub fn timers(&self) -> HordeTimers {
        self.machine.timers()
    }

    pub fn tally(&self) -> ScanTally {
        self.machine.tally()
    }

    pub fn tracked(&self) -> &TrackedSet {
        self.machine.tracked()
    }

    pub fn binder_stats(&self) -> BinderStats {
        self.binder.stats()
    }

    fn run_scan(&mut self, sim: &dyn Simulation, now: f64) {
        let outcome = self.scanner.scan(&mut self.binder, sim);
        debug!(
            found = outcome.found(),
            live = outcome.live_count,
            at = now,
            "scan_recorded"
        );
        self.machine.record_scan(now, outcome);
    }
}

#[cfg(test)]
mod tests {
    use host::{ActionStates, EdgeDetector, Vec3};

    use super::*;
    use crate::sandbox::{ActorSeed, Sandbox, SandboxBuilder};
    use crate::state_machine::TriggerRejection;

    const DT: f32 = 0.1;

    fn quiet() -> InputSnapshot {
        InputSnapshot::empty()
    }

    fn trigger() -> InputSnapshot {
        InputSnapshot::empty().with_pressed(InputAction::TriggerHorde)
    }

    fn farm_sandbox() -> Sandbox {
        SandboxBuilder::new()
            .environment("Level_Farm_Main")
            .actor(ActorSeed::hostile("Scav", Vec3::new(30.0, 0.0, 0.0)))
            .actor(ActorSeed::hostile("Raider", Vec3::new(0.0, 0.0, -40.0)))
            .actor(ActorSeed::hostile("Scav_B", Vec3::new(-20.0, 0.0, 15.0)))
            .actor(ActorSeed::hostile("Companion", Vec3::new(3.0, 0.0, 3.0)))
            .build()
    }

    #[test]
    fn farm_horde_runs_for_forty_five_seconds() {
        let mut sandbox = farm_sandbox();
        let mut controller = HordeController::new(&HordeConfig::default());

        let first = controller.tick(&mut sandbox.world, &quiet(), 0.0, DT);
        assert!(first.scanned);
        assert_eq!(controller.tracked().len(), 3);

        let armed = controller.tick(&mut sandbox.world, &trigger(), 10.0, DT);
        assert_eq!(
            armed.trigger,
            Some(TriggerDecision::Accepted {
                targets: 3,
                activate_at: 11.5
            })
        );
        assert!(controller.status_lines(10.0).banner);
        assert!(controller.status_lines(13.0).banner);
        assert!(!controller.status_lines(13.1).banner);

        let waiting = controller.tick(&mut sandbox.world, &quiet(), 11.4, DT);
        assert!(waiting.transition.is_none());
        assert!(waiting.chase.is_none());
        assert!(!waiting.scanned);

        let active = controller.tick(&mut sandbox.world, &quiet(), 11.5, DT);
        assert_eq!(
            active.transition,
            Some(Transition::Activated {
                duration_seconds: 45.0,
                ends_at: 56.5
            })
        );
        assert_eq!(active.chase.map(|chase| chase.moved), Some(3));
        let scav = sandbox.actors[0];
        let moved = sandbox.world.position(scav).expect("scav");
        assert!(moved.x < 30.0);

        let still_active = controller.tick(&mut sandbox.world, &quiet(), 56.5, DT);
        assert!(still_active.transition.is_none());
        assert!(!still_active.scanned);

        let expired = controller.tick(&mut sandbox.world, &quiet(), 56.6, DT);
        assert_eq!(expired.transition, Some(Transition::Expired));
        assert!(expired.scanned);
        assert!(expired.chase.is_none());
        assert_eq!(controller.state(), HordeState::Idle);
    }

    #[test]
    fn non_permitted_environment_ignores_trigger() {
        let mut sandbox = SandboxBuilder::new()
            .environment("Level_City")
            .actor(ActorSeed::hostile("Scav", Vec3::new(30.0, 0.0, 0.0)))
            .build();
        let mut controller = HordeController::new(&HordeConfig::default());

        controller.tick(&mut sandbox.world, &quiet(), 0.0, DT);
        let report = controller.tick(&mut sandbox.world, &trigger(), 1.0, DT);

        assert_eq!(
            report.trigger,
            Some(TriggerDecision::Rejected(
                TriggerRejection::EnvironmentNotPermitted
            ))
        );
        assert_eq!(controller.state(), HordeState::Idle);
        assert!(!controller.status_lines(1.0).banner);
        assert_eq!(
            sandbox.world.position(sandbox.actors[0]),
            Some(Vec3::new(30.0, 0.0, 0.0))
        );
    }

    #[test]
    fn ready_indicator_waits_for_a_quiet_period() {
        let mut sandbox = SandboxBuilder::new().environment("Level_Farm_Main").build();
        let mut controller = HordeController::new(&HordeConfig::default());
        let counts = [0usize, 2, 5, 5, 5];

        for (index, count) in counts.into_iter().enumerate() {
            while sandbox.actors.len() < count {
                let offset = sandbox.actors.len() as f32;
                sandbox.spawn_actor(&ActorSeed::hostile(
                    format!("Scav{offset}"),
                    Vec3::new(20.0 + offset, 0.0, 0.0),
                ));
            }
            let now = index as f64 * 3.0;
            let report = controller.tick(&mut sandbox.world, &quiet(), now, DT);
            assert!(report.scanned, "scan due at {now}");
            assert_eq!(controller.tally().last_found, count);
        }

        assert_eq!(controller.tally().peak, 5);
        assert_eq!(controller.timers().last_enemy_count_increase_at, Some(6.0));
        assert_eq!(controller.status_lines(10.9).ready_peak, None);
        assert_eq!(controller.status_lines(11.0).ready_peak, Some(5));
        assert_eq!(controller.status_lines(12.0).ready_peak, Some(5));
    }

    #[test]
    fn held_trigger_fires_once() {
        let mut sandbox = farm_sandbox();
        let mut controller = HordeController::new(&HordeConfig::default());
        let mut edges = EdgeDetector::default();
        let mut held = ActionStates::default();
        held.set(InputAction::TriggerHorde, true);

        let mut decisions = Vec::new();
        for step in 0..5 {
            let input = edges.observe(held);
            let report = controller.tick(&mut sandbox.world, &input, step as f64 * 0.1, DT);
            decisions.extend(report.trigger);
        }

        assert_eq!(decisions.len(), 1);
        assert!(matches!(decisions[0], TriggerDecision::Accepted { .. }));
    }

    #[test]
    fn trigger_rescans_before_deciding() {
        let mut sandbox = SandboxBuilder::new().environment("Level_GroundZero").build();
        let mut controller = HordeController::new(&HordeConfig::default());

        controller.tick(&mut sandbox.world, &quiet(), 0.0, DT);
        assert!(controller.tracked().is_empty());

        sandbox.spawn_actor(&ActorSeed::hostile("Late", Vec3::new(15.0, 0.0, 0.0)));
        let report = controller.tick(&mut sandbox.world, &trigger(), 1.0, DT);

        assert!(report.scanned);
        assert!(matches!(
            report.trigger,
            Some(TriggerDecision::Accepted { targets: 1, .. })
        ));
        assert_eq!(controller.timers().next_scan_at, 4.0);
    }

    #[test]
    fn missing_enumerator_never_triggers_and_never_rescans_types() {
        let mut sandbox = SandboxBuilder::new()
            .environment("Level_Farm_Main")
            .without_tracker()
            .actor(ActorSeed::hostile("Scav", Vec3::new(30.0, 0.0, 0.0)))
            .build();
        let mut controller = HordeController::new(&HordeConfig::default());

        for scan in 0..100 {
            controller.tick(&mut sandbox.world, &quiet(), scan as f64 * 3.0, DT);
        }
        let report = controller.tick(&mut sandbox.world, &trigger(), 301.0, DT);

        assert_eq!(controller.tally().scans, 101);
        assert_eq!(controller.binder_stats().full_scans, 1);
        assert_eq!(
            report.trigger,
            Some(TriggerDecision::Rejected(TriggerRejection::NoTargets))
        );
    }

    #[test]
    fn actors_destroyed_mid_horde_are_skipped() {
        let mut sandbox = farm_sandbox();
        let mut controller = HordeController::new(&HordeConfig::default());

        controller.tick(&mut sandbox.world, &quiet(), 0.0, DT);
        controller.tick(&mut sandbox.world, &trigger(), 0.5, DT);
        sandbox.world.despawn(sandbox.actors[1]);
        let report = controller.tick(&mut sandbox.world, &quiet(), 2.0, DT);

        assert_eq!(
            report.chase,
            Some(ChaseReport {
                moved: 2,
                holding: 0,
                skipped: 1
            })
        );
    }

    #[test]
    fn render_fills_overlay_slots() {
        let mut sandbox = farm_sandbox();
        let mut controller = HordeController::new(&HordeConfig::default());
        controller.tick(&mut sandbox.world, &quiet(), 0.0, DT);
        controller.tick(&mut sandbox.world, &trigger(), 0.5, DT);

        let mut frame = OverlayFrame::new(1280, 720);
        controller.render(0.6, &mut frame);

        let text = frame.text_lines();
        assert!(text.iter().any(|line| line.contains("Something is approaching!")));
        assert!(text.iter().any(|line| line.contains("(3 found)")));
    }
}
