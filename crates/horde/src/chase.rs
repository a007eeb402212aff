use glam::Vec3;
use host::{ObjectId, Simulation};

use crate::config::HordeConfig;
use crate::scanner::TrackedSet;

const MIN_STEER_DISTANCE_SQ: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    /// Within stop distance of the player.
    Hold,
    /// Degenerate direction; neither position nor facing changes.
    Stall,
    Advance { position: Vec3, facing: Vec3 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChaseReport {
    pub moved: usize,
    pub holding: usize,
    pub skipped: usize,
}

/// Direct planar pursuit of the player, one fixed-speed step per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChaseMover {
    speed: f32,
    stop_distance: f32,
}

impl ChaseMover {
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            speed: config.chase_speed,
            stop_distance: config.stop_distance,
        }
    }

    pub fn steer(&self, actor: Vec3, player: Vec3, dt: f32) -> Steering {
        let mut offset = player - actor;
        offset.y = 0.0;
        let distance_sq = offset.length_squared();
        if distance_sq <= self.stop_distance * self.stop_distance {
            return Steering::Hold;
        }
        if distance_sq <= MIN_STEER_DISTANCE_SQ {
            return Steering::Stall;
        }
        let direction = offset / distance_sq.sqrt();
        Steering::Advance {
            position: actor + direction * self.speed * dt,
            facing: direction,
        }
    }

    pub fn step(
        &self,
        sim: &mut dyn Simulation,
        player: ObjectId,
        tracked: &TrackedSet,
        dt: f32,
    ) -> ChaseReport {
        let mut report = ChaseReport::default();
        let Some(target) = sim.position(player) else {
            report.skipped = tracked.len();
            return report;
        };
        for actor in tracked.iter() {
            let Some(position) = sim.position(actor) else {
                report.skipped += 1;
                continue;
            };
            match self.steer(position, target, dt) {
                Steering::Hold => report.holding += 1,
                Steering::Stall => {}
                Steering::Advance { position, facing } => {
                    if sim.set_position(actor, position) {
                        sim.set_forward(actor, facing);
                        report.moved += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
            }
        }
        report
    }
}
