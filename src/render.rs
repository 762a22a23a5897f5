//! Outward interface to whatever draws the overlay.
//!
//! The core never reads anything back from the renderer: every redraw carries
//! the displayed coordinates recomputed from the raw series, offset and scale.

use crate::alignment::transform::Viewport;

/// One plotted stream, already windowed to the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotLine {
    pub label: String,
    pub times: Vec<f64>,
    pub amplitudes: Vec<f64>,
}

pub trait Renderer {
    fn redraw(&mut self, viewport: Viewport, lines: &[PlotLine], centerline: f64, title: &str);

    fn set_amplitude_range(&mut self, ymin: f64, ymax: f64);

    /// Called once the queue is exhausted.
    fn show_complete(&mut self) {}
}

/// Renderer for headless runs: reports each frame through the `log` facade.
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn redraw(&mut self, viewport: Viewport, lines: &[PlotLine], centerline: f64, title: &str) {
        self.frames += 1;
        let samples: Vec<String> = lines
            .iter()
            .map(|line| format!("{}={}", line.label, line.times.len()))
            .collect();
        log::debug!(
            "frame {}: {} [{:.3}, {:.3}] s, centre {:.3} s, samples {}",
            self.frames,
            title,
            viewport.start(),
            viewport.end(),
            centerline,
            samples.join(" ")
        );
    }

    fn set_amplitude_range(&mut self, ymin: f64, ymax: f64) {
        log::debug!("amplitude range [{:.4}, {:.4}]", ymin, ymax);
    }

    fn show_complete(&mut self) {
        log::info!("Alignment complete. Enter to finish, backspace to go back");
    }
}
