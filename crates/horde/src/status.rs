use host::{centered_placement, stacked_below, OverlayFrame, OverlayLine, OverlaySlot, TextTone};

use crate::config::HordeConfig;
use crate::state_machine::{HordeState, HordeTimers, ScanTally};

pub const WARNING_BANNER_TEXT: &str = "Something is approaching!";

const BANNER_WIDTH: f32 = 600.0;
const BANNER_HEIGHT: f32 = 60.0;
const BANNER_TOP: f32 = 80.0;
const STATUS_LINE_HEIGHT: f32 = 30.0;
const STATUS_LINE_GAP: f32 = 4.0;

/// Snapshot of controller state the presenter reads from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusInputs {
    pub state: HordeState,
    pub timers: HordeTimers,
    pub tally: ScanTally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub percent: u8,
    pub found: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLines {
    pub banner: bool,
    pub scan_progress: Option<ScanProgress>,
    pub ready_peak: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusPresenter {
    scan_ui_window_seconds: f64,
    ready_quiet_seconds: f64,
}

impl StatusPresenter {
    pub fn new(config: &HordeConfig) -> Self {
        Self {
            scan_ui_window_seconds: config.scan_ui_window_seconds,
            ready_quiet_seconds: config.ready_quiet_seconds,
        }
    }

    pub fn compose(&self, inputs: &StatusInputs, now: f64) -> StatusLines {
        let banner = inputs
            .timers
            .warning_banner_until
            .is_some_and(|until| now <= until);

        let scan_progress = inputs.timers.scan_ui_started_at.and_then(|started| {
            let elapsed = now - started;
            (elapsed <= self.scan_ui_window_seconds).then(|| ScanProgress {
                percent: progress_percent(elapsed, self.scan_ui_window_seconds),
                found: inputs.tally.last_found,
            })
        });

        let quiet = inputs
            .timers
            .last_enemy_count_increase_at
            .is_some_and(|increased| now - increased >= self.ready_quiet_seconds);
        let ready_peak = (inputs.state.is_idle() && inputs.tally.peak > 0 && quiet)
            .then_some(inputs.tally.peak);

        StatusLines {
            banner,
            scan_progress,
            ready_peak,
        }
    }

    /// Writes the visible lines into `frame`, laid out from its screen size.
    pub fn present(&self, inputs: &StatusInputs, now: f64, frame: &mut OverlayFrame) {
        let lines = self.compose(inputs, now);
        let (screen_width, _) = frame.screen_size();
        let banner_at = centered_placement(screen_width, BANNER_WIDTH, BANNER_HEIGHT, BANNER_TOP);
        let scan_at = stacked_below(banner_at, STATUS_LINE_HEIGHT, STATUS_LINE_GAP);
        let ready_at = stacked_below(scan_at, STATUS_LINE_HEIGHT, STATUS_LINE_GAP);

        if lines.banner {
            frame.show(OverlayLine {
                slot: OverlaySlot::Banner,
                placement: banner_at,
                tone: TextTone::Alert,
                text: WARNING_BANNER_TEXT.to_string(),
            });
        }
        if let Some(progress) = lines.scan_progress {
            frame.show(OverlayLine {
                slot: OverlaySlot::ScanProgress,
                placement: scan_at,
                tone: TextTone::Info,
                text: format_scan_progress(progress),
            });
        }
        if let Some(peak) = lines.ready_peak {
            frame.show(OverlayLine {
                slot: OverlaySlot::Ready,
                placement: ready_at,
                tone: TextTone::Highlight,
                text: format_ready(peak),
            });
        }
    }
}

pub fn progress_percent(elapsed_seconds: f64, window_seconds: f64) -> u8 {
    if window_seconds <= 0.0 {
        return 100;
    }
    let ratio = (elapsed_seconds / window_seconds).clamp(0.0, 1.0);
    (ratio * 100.0).round() as u8
}

pub fn format_scan_progress(progress: ScanProgress) -> String {
    format!("Scanning... {}% ({} found)", progress.percent, progress.found)
}

pub fn format_ready(peak: usize) -> String {
    format!("Horde ready: {peak}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presenter() -> StatusPresenter {
        StatusPresenter::new(&HordeConfig::default())
    }

    fn idle_inputs() -> StatusInputs {
        StatusInputs {
            state: HordeState::Idle,
            timers: HordeTimers::default(),
            tally: ScanTally::default(),
        }
    }

    #[test]
    fn progress_ramps_linearly_and_clamps() {
        assert_eq!(progress_percent(0.0, 1.2), 0);
        assert_eq!(progress_percent(0.6, 1.2), 50);
        assert_eq!(progress_percent(1.2, 1.2), 100);
        assert_eq!(progress_percent(5.0, 1.2), 100);
        assert_eq!(progress_percent(-1.0, 1.2), 0);
    }

    #[test]
    fn scan_line_shows_only_inside_the_window() {
        let mut inputs = idle_inputs();
        inputs.timers.scan_ui_started_at = Some(10.0);
        inputs.tally.last_found = 4;

        let lines = presenter().compose(&inputs, 10.6);
        assert_eq!(
            lines.scan_progress,
            Some(ScanProgress {
                percent: 50,
                found: 4
            })
        );
        assert!(presenter().compose(&inputs, 11.3).scan_progress.is_none());
    }

    #[test]
    fn banner_is_bounded_by_its_deadline() {
        let mut inputs = idle_inputs();
        inputs.timers.warning_banner_until = Some(13.0);
        assert!(presenter().compose(&inputs, 13.0).banner);
        assert!(!presenter().compose(&inputs, 13.01).banner);
    }

    #[test]
    fn ready_needs_idle_peak_and_quiet_period() {
        let mut inputs = idle_inputs();
        inputs.tally.peak = 5;
        inputs.timers.last_enemy_count_increase_at = Some(6.0);

        assert_eq!(presenter().compose(&inputs, 10.9).ready_peak, None);
        assert_eq!(presenter().compose(&inputs, 11.0).ready_peak, Some(5));

        inputs.state = HordeState::Active { ends_at: 40.0 };
        assert_eq!(presenter().compose(&inputs, 11.0).ready_peak, None);

        inputs.state = HordeState::Idle;
        inputs.tally.peak = 0;
        assert_eq!(presenter().compose(&inputs, 11.0).ready_peak, None);
    }

    #[test]
    fn present_lays_lines_out_beneath_the_banner() {
        let mut inputs = idle_inputs();
        inputs.timers.warning_banner_until = Some(5.0);
        inputs.timers.scan_ui_started_at = Some(4.4);
        inputs.tally.last_found = 3;
        let mut frame = OverlayFrame::new(1280, 720);

        presenter().present(&inputs, 5.0, &mut frame);

        let banner = frame.line(OverlaySlot::Banner).expect("banner");
        assert_eq!(banner.text, WARNING_BANNER_TEXT);
        assert_eq!(banner.placement.x, 340.0);
        assert_eq!(banner.placement.y, 80.0);
        assert_eq!(banner.placement.width, 600.0);
        assert_eq!(banner.placement.height, 60.0);

        let scan = frame.line(OverlaySlot::ScanProgress).expect("scan");
        assert_eq!(scan.text, "Scanning... 50% (3 found)");
        assert!(scan.placement.y >= banner.placement.y + banner.placement.height);
        assert!(frame.line(OverlaySlot::Ready).is_none());
    }

    #[test]
    fn ready_text_uses_peak() {
        assert_eq!(format_ready(5), "Horde ready: 5");
    }
}
