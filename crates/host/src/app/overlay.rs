//! Text overlay frame handed to the host's renderer once per rendered frame.
//!
//! Producers only describe what to show and where; fonts, colors and drawing
//! belong to the renderer collaborator.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlaySlot {
    Banner,
    ScanProgress,
    Ready,
}

impl OverlaySlot {
    pub fn label(self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::ScanProgress => "scan",
            Self::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTone {
    Alert,
    Info,
    Highlight,
}

/// Screen-space rectangle in pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn centered_placement(screen_width: u32, width: f32, height: f32, top: f32) -> Placement {
    Placement {
        x: (screen_width as f32 - width) / 2.0,
        y: top,
        width,
        height,
    }
}

pub fn stacked_below(above: Placement, height: f32, gap: f32) -> Placement {
    Placement {
        x: above.x,
        y: above.y + above.height + gap,
        width: above.width,
        height,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub slot: OverlaySlot,
    pub placement: Placement,
    pub tone: TextTone,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    screen_width: u32,
    screen_height: u32,
    lines: Vec<OverlayLine>,
}

impl OverlayFrame {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            screen_width,
            screen_height,
            lines: Vec::new(),
        }
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    /// Adds a line, replacing whatever already occupies the same slot.
    pub fn show(&mut self, line: OverlayLine) {
        match self.lines.iter_mut().find(|existing| existing.slot == line.slot) {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
    }

    pub fn line(&self, slot: OverlaySlot) -> Option<&OverlayLine> {
        self.lines.iter().find(|line| line.slot == slot)
    }

    pub fn lines(&self) -> &[OverlayLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Plain-text rendering, one `[slot] text` entry per line in slot order.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = self.lines.iter().collect::<Vec<_>>();
        lines.sort_by_key(|line| line.slot);
        lines
            .into_iter()
            .map(|line| format!("[{}] {}", line.slot.label(), line.text))
            .collect()
    }
}
