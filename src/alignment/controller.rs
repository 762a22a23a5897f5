use serde::Serialize;

use crate::{
    alignment::{
        commands::Command,
        result::AlignmentResult,
        state::{Alignment, AlignmentSession, Cursor, Hypothesis, WarningFlags},
        transform::{amplitude_range, auto_scale, round_offset, Viewport},
    },
    error::Result,
    render::{PlotLine, Renderer},
    series::{prepare_all, RawSeries},
    settings::AlignerSettings,
};
use crate::{log_debug, log_info, log_warn};

const ENABLE_LOGS: bool = true;

const REFERENCE_LABEL: &str = "reference";

/// Where the operator stands after a command.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "state", content = "index")]
pub enum Progress {
    Pending,
    Aligning(usize),
    Done,
    /// Advance was pressed on the completion screen; the caller should
    /// collect the result.
    Terminated,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentSnapshot {
    pub progress: Progress,
    pub stream: Option<String>,
    pub total: usize,
    pub working: Option<Hypothesis>,
    pub flags: WarningFlags,
    pub comment: String,
}

/// Drives one alignment session: consumes operator commands, keeps the
/// working hypothesis and viewport, commits on navigation and pushes every
/// change to the renderer.
pub struct AlignmentController<R: Renderer> {
    session: AlignmentSession,
    renderer: R,
    settings: AlignerSettings,
    initial_scale: Option<f64>,
    amplitude_range: Option<(f64, f64)>,
    terminated: bool,
}

impl<R: Renderer> AlignmentController<R> {
    pub fn new(session: AlignmentSession, renderer: R, settings: AlignerSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            session,
            renderer,
            settings,
            initial_scale: None,
            amplitude_range: None,
            terminated: false,
        })
    }

    /// Prepare raw recordings against the reference's origin and build a
    /// controller over them.
    pub fn from_raw(
        reference: &RawSeries,
        candidates: &[RawSeries],
        renderer: R,
        settings: AlignerSettings,
    ) -> Result<Self> {
        let prepared = prepare_all(reference, candidates)?;
        let session = AlignmentSession::new(prepared.reference, prepared.candidates)?;
        log_info!(
            "Prepared reference '{}' and {} stream(s) to align",
            reference.name,
            session.len()
        );
        Self::new(session, renderer, settings)
    }

    /// Fixed scale for the first stream. Without one, the first stream is
    /// auto-rescaled once when alignment begins.
    pub fn with_initial_scale(mut self, scale: Option<f64>) -> Self {
        self.initial_scale = scale.filter(|s| s.is_finite() && *s > 0.0);
        if scale.is_some() && self.initial_scale.is_none() {
            log_warn!("Ignoring non-positive initial scale {:?}", scale);
        }
        self
    }

    pub fn session(&self) -> &AlignmentSession {
        &self.session
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn settings(&self) -> &AlignerSettings {
        &self.settings
    }

    pub fn working(&self) -> Option<&Hypothesis> {
        self.session.working()
    }

    /// Last amplitude range sent to the renderer.
    pub fn amplitude_range(&self) -> Option<(f64, f64)> {
        self.amplitude_range
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn progress(&self) -> Progress {
        if self.terminated {
            return Progress::Terminated;
        }
        match self.session.cursor() {
            Cursor::Pending => Progress::Pending,
            Cursor::Aligning(index) => Progress::Aligning(index),
            Cursor::Done => Progress::Done,
        }
    }

    pub fn snapshot(&self) -> AlignmentSnapshot {
        AlignmentSnapshot {
            progress: self.progress(),
            stream: self.session.current().map(|(_, name, _)| name.to_string()),
            total: self.session.len(),
            working: self.session.working().copied(),
            flags: self.session.flags(),
            comment: self.session.comment().to_string(),
        }
    }

    /// Result from whatever has been committed so far.
    pub fn result(&self) -> AlignmentResult {
        AlignmentResult::from_session(&self.session)
    }

    pub fn finish(self) -> AlignmentResult {
        if !self.terminated {
            log_warn!(
                "Collecting alignment result before completion (at {:?})",
                self.session.cursor()
            );
        }
        self.result()
    }

    pub fn apply(&mut self, command: &Command) -> Progress {
        if self.terminated {
            log_debug!("Ignoring {:?}: session terminated", command);
            return Progress::Terminated;
        }

        match command {
            Command::Begin => return self.begin(),
            Command::Advance => return self.advance(),
            Command::Retreat => return self.retreat(),
            Command::ResetViewport => self.reset_viewport(),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::LookLeft => self.look_left(),
            Command::LookRight => self.look_right(),
            Command::ShiftLeft => self.shift_left(),
            Command::ShiftRight => self.shift_right(),
            Command::FineShiftLeft => self.fine_shift_left(),
            Command::FineShiftRight => self.fine_shift_right(),
            Command::ScaleUp => self.scale_up(),
            Command::ScaleDown => self.scale_down(),
            Command::AutoRescale => self.auto_rescale(),
            Command::ToggleGeneralWarning => self.toggle_general_warning(),
            Command::ToggleShiftWarning => self.toggle_shift_warning(),
            Command::ToggleDataMissing => self.toggle_data_missing(),
            Command::SetComment(text) => self.set_comment(text.clone()),
        }
        self.progress()
    }

    // Navigation

    pub fn begin(&mut self) -> Progress {
        if self.terminated || self.session.cursor() != Cursor::Pending {
            log_debug!("begin ignored at {:?}", self.session.cursor());
            return self.progress();
        }

        self.enter(0, Alignment::default());
        match self.initial_scale {
            Some(scale) => {
                if let Some(working) = self.session.working_mut() {
                    working.scale = scale;
                }
                self.refresh();
            }
            None => self.auto_rescale(),
        }
        self.progress()
    }

    pub fn advance(&mut self) -> Progress {
        if self.terminated {
            return Progress::Terminated;
        }

        match self.session.cursor() {
            Cursor::Pending => self.begin(),
            Cursor::Aligning(index) => {
                self.commit_working(index);
                let next = index + 1;
                if next == self.session.len() {
                    self.session.set_cursor(Cursor::Done);
                    self.session.set_working(None);
                    log_info!("All {} alignments complete", self.session.len());
                    self.renderer.show_complete();
                } else {
                    self.enter(next, Alignment::default());
                }
                self.progress()
            }
            Cursor::Done => {
                self.terminated = true;
                log_info!("Alignment session terminated");
                Progress::Terminated
            }
        }
    }

    pub fn retreat(&mut self) -> Progress {
        if self.terminated {
            return Progress::Terminated;
        }

        let target = match self.session.cursor() {
            Cursor::Pending => {
                log_debug!("retreat ignored before alignment began");
                return Progress::Pending;
            }
            Cursor::Aligning(index) => {
                // Keep the edits to the stream being left.
                self.commit_working(index);
                index.saturating_sub(1)
            }
            Cursor::Done => self.session.len() - 1,
        };

        let restored = self.session.committed(target).unwrap_or_default();
        self.enter(target, restored);
        self.progress()
    }

    // Viewport

    pub fn zoom_in(&mut self) {
        let factor = self.settings.zoom_factor;
        self.update_viewport(|view| view.zoomed_in(factor));
    }

    pub fn zoom_out(&mut self) {
        let factor = self.settings.zoom_factor;
        self.update_viewport(|view| view.zoomed_out(factor));
    }

    pub fn look_left(&mut self) {
        let factor = self.settings.look_factor;
        self.update_viewport(|view| view.panned(-view.look_step(factor)));
    }

    pub fn look_right(&mut self) {
        let factor = self.settings.look_factor;
        self.update_viewport(|view| view.panned(view.look_step(factor)));
    }

    /// Full extent of the reference and the (offset) aligning stream. Keeps
    /// the working offset and scale.
    pub fn reset_viewport(&mut self) {
        let Some((index, offset)) = self.active().map(|(index, working)| (index, working.offset_seconds)) else {
            log_debug!("reset-viewport ignored outside alignment");
            return;
        };
        let full = self.full_range(index, offset);
        self.update_viewport(|_| full);
    }

    // Offset

    pub fn shift_left(&mut self) {
        if let Some((_, working)) = self.active() {
            let step = working.viewport.shift_step(self.settings.shift_factor);
            self.shift_by(-step);
        }
    }

    pub fn shift_right(&mut self) {
        if let Some((_, working)) = self.active() {
            let step = working.viewport.shift_step(self.settings.shift_factor);
            self.shift_by(step);
        }
    }

    pub fn fine_shift_left(&mut self) {
        if let Some(step) = self.fine_shift_step() {
            self.shift_by(-step);
        }
    }

    pub fn fine_shift_right(&mut self) {
        if let Some(step) = self.fine_shift_step() {
            self.shift_by(step);
        }
    }

    // Scale

    pub fn scale_up(&mut self) {
        let factor = self.settings.scale_factor;
        self.rescale(factor);
    }

    pub fn scale_down(&mut self) {
        let factor = self.settings.scale_factor;
        self.rescale(1.0 / factor);
    }

    /// One-shot: match the aligning stream's visible spread to the reference's.
    pub fn auto_rescale(&mut self) {
        let Some((index, working)) = self.active() else {
            log_debug!("auto-rescale ignored outside alignment");
            return;
        };
        let view = working.viewport;
        let Some((_, aligning)) = self.session.stream(index) else {
            return;
        };

        let reference_visible = self
            .session
            .reference()
            .visible(0.0, view.start(), view.end())
            .map(|(_, value)| value);
        let aligning_visible = aligning
            .visible(working.offset_seconds, view.start(), view.end())
            .map(|(_, value)| value);

        match auto_scale(reference_visible, aligning_visible) {
            Some(scale) => {
                if let Some(working) = self.session.working_mut() {
                    working.scale = scale;
                }
                log_debug!("auto-rescale set scale to {:.4}", scale);
            }
            None => {
                log_warn!("auto-rescale skipped: no usable amplitude in view");
            }
        }
        self.refresh();
    }

    // Flags

    pub fn toggle_general_warning(&mut self) {
        if self.active().is_some() {
            let raised = self.session.toggle_general_warning();
            log_debug!("general warning {}", if raised { "raised" } else { "cleared" });
        }
    }

    pub fn toggle_shift_warning(&mut self) {
        if self.active().is_some() {
            let raised = self.session.toggle_shift_warning();
            log_debug!("shift warning {}", if raised { "raised" } else { "cleared" });
        }
    }

    pub fn toggle_data_missing(&mut self) {
        if self.active().is_some() {
            let raised = self.session.toggle_data_missing();
            log_debug!("data missing {}", if raised { "raised" } else { "cleared" });
        }
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        if self.active().is_some() {
            self.session.set_comment(comment);
        }
    }

    // Internals

    /// Cursor index and working hypothesis while aligning and not terminated.
    fn active(&self) -> Option<(usize, Hypothesis)> {
        if self.terminated {
            return None;
        }
        match (self.session.cursor(), self.session.working()) {
            (Cursor::Aligning(index), Some(working)) => Some((index, *working)),
            _ => None,
        }
    }

    fn commit_working(&mut self, index: usize) {
        if let Some(working) = self.session.working() {
            let mut alignment = working.alignment();
            alignment.offset_seconds =
                round_offset(alignment.offset_seconds, self.settings.offset_decimals);
            self.session.commit(index, alignment);
            if let Some((name, _)) = self.session.stream(index) {
                log_info!(
                    "Committed '{}': offset {:.4} s, scale {:.4}",
                    name,
                    alignment.offset_seconds,
                    alignment.scale
                );
            }
        }
    }

    fn enter(&mut self, index: usize, alignment: Alignment) {
        let viewport = self.full_range(index, alignment.offset_seconds);
        self.session.set_cursor(Cursor::Aligning(index));
        self.session
            .set_working(Some(Hypothesis::from_alignment(alignment, viewport)));
        if let Some((name, _)) = self.session.stream(index) {
            log_info!(
                "Aligning '{}' ({}/{})",
                name,
                index + 1,
                self.session.len()
            );
        }
        self.refresh();
    }

    fn full_range(&self, index: usize, offset: f64) -> Viewport {
        let reference = self.session.reference();
        let reference_span = (reference.first_time(), reference.last_time());
        let aligning_span = self
            .session
            .stream(index)
            .map(|(_, series)| (series.first_time() + offset, series.last_time() + offset))
            .unwrap_or(reference_span);
        Viewport::covering(reference_span, aligning_span)
    }

    fn update_viewport<F>(&mut self, change: F)
    where
        F: FnOnce(Viewport) -> Viewport,
    {
        if self.active().is_none() {
            log_debug!("viewport command ignored outside alignment");
            return;
        }
        if let Some(working) = self.session.working_mut() {
            working.viewport = change(working.viewport);
        }
        self.refresh();
    }

    fn shift_by(&mut self, delta: f64) {
        if self.active().is_none() {
            return;
        }
        if let Some(working) = self.session.working_mut() {
            working.offset_seconds += delta;
            log_debug!("offset now {} s", working.offset_seconds);
        }
        self.refresh();
    }

    fn fine_shift_step(&self) -> Option<f64> {
        let (index, _) = self.active()?;
        let (name, series) = self.session.stream(index)?;
        let step = series.median_interval(self.settings.fine_shift_samples);
        if step.is_none() {
            log_warn!("'{}' has too few samples for a fine shift", name);
        }
        step
    }

    fn rescale(&mut self, multiplier: f64) {
        if self.active().is_none() {
            log_debug!("scale command ignored outside alignment");
            return;
        }
        if let Some(working) = self.session.working_mut() {
            working.scale *= multiplier;
            log_debug!("scale now {:.4}", working.scale);
        }
        self.refresh();
    }

    /// Recompute displayed coordinates from the raw series and push them out.
    fn refresh(&mut self) {
        let Some((index, working)) = self.active() else {
            return;
        };
        let Some((name, aligning)) = self.session.stream(index) else {
            return;
        };
        let view = working.viewport;

        let (ref_times, ref_amplitudes): (Vec<f64>, Vec<f64>) = self
            .session
            .reference()
            .visible(0.0, view.start(), view.end())
            .unzip();
        let (times, amplitudes): (Vec<f64>, Vec<f64>) = aligning
            .visible(working.offset_seconds, view.start(), view.end())
            .map(|(t, value)| (t, value * working.scale))
            .unzip();

        let lines = [
            PlotLine {
                label: REFERENCE_LABEL.to_string(),
                times: ref_times,
                amplitudes: ref_amplitudes,
            },
            PlotLine {
                label: name.to_string(),
                times,
                amplitudes,
            },
        ];
        let title = format!("Aligning {} ({}/{})", name, index + 1, self.session.len());

        match amplitude_range(lines.iter().map(|line| line.amplitudes.as_slice())) {
            Ok((ymin, ymax)) => {
                self.amplitude_range = Some((ymin, ymax));
                self.renderer.set_amplitude_range(ymin, ymax);
            }
            Err(err) => {
                log_debug!("{}; keeping previous amplitude range", err);
            }
        }
        self.renderer
            .redraw(view, &lines, view.center(), &title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;

    #[derive(Default)]
    struct Frames {
        redraws: Vec<(Viewport, Vec<PlotLine>, f64, String)>,
        ranges: Vec<(f64, f64)>,
        completed: usize,
    }

    impl Renderer for Frames {
        fn redraw(&mut self, viewport: Viewport, lines: &[PlotLine], centerline: f64, title: &str) {
            self.redraws
                .push((viewport, lines.to_vec(), centerline, title.to_string()));
        }

        fn set_amplitude_range(&mut self, ymin: f64, ymax: f64) {
            self.ranges.push((ymin, ymax));
        }

        fn show_complete(&mut self) {
            self.completed += 1;
        }
    }

    fn wave(len: usize, dt: f64, amplitude: f64) -> TimeSeries {
        let times: Vec<f64> = (0..len).map(|i| i as f64 * dt).collect();
        let values = times.iter().map(|t| amplitude * (t * 3.0).sin()).collect();
        TimeSeries::new(times, values).unwrap()
    }

    fn controller(streams: usize) -> AlignmentController<Frames> {
        let queue = (0..streams)
            .map(|i| (format!("stream_{}", i), wave(200, 0.05, 2.0)))
            .collect();
        let session = AlignmentSession::new(wave(200, 0.05, 1.0), queue).unwrap();
        AlignmentController::new(session, Frames::default(), AlignerSettings::default())
            .unwrap()
            .with_initial_scale(Some(1.0))
    }

    #[test]
    fn rejects_invalid_settings() {
        let session =
            AlignmentSession::new(wave(10, 0.1, 1.0), vec![("a".into(), wave(10, 0.1, 1.0))]).unwrap();
        let mut settings = AlignerSettings::default();
        settings.zoom_factor = 1.0;
        assert!(AlignmentController::new(session, Frames::default(), settings).is_err());
    }

    #[test]
    fn begin_loads_defaults_with_full_range() {
        let mut controller = controller(2);
        assert_eq!(controller.begin(), Progress::Aligning(0));

        let working = controller.working().copied().unwrap();
        assert_eq!(working.offset_seconds, 0.0);
        assert_eq!(working.scale, 1.0);
        assert_eq!(working.viewport.start(), 0.0);
        assert!((working.viewport.end() - 199.0 * 0.05).abs() < 1e-9);

        let frames = controller.renderer();
        let (_, lines, centerline, title) = frames.redraws.last().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "reference");
        assert_eq!(lines[1].label, "stream_0");
        assert!((centerline - working.viewport.center()).abs() < 1e-12);
        assert_eq!(title, "Aligning stream_0 (1/2)");
    }

    #[test]
    fn auto_rescale_on_begin_without_fixed_scale() {
        let mut controller = controller(1).with_initial_scale(None);
        controller.begin();
        let scale = controller.working().unwrap().scale;
        assert!((scale - 0.5).abs() < 0.01, "scale {}", scale);

        // Later streams are not auto-rescaled.
        controller.advance();
        assert_eq!(controller.progress(), Progress::Done);
    }

    #[test]
    fn coarse_shift_uses_viewport_width() {
        let mut controller = controller(1);
        controller.begin();
        let width = controller.working().unwrap().viewport.width();

        controller.shift_right();
        let expected = width / 30.0;
        assert!((controller.working().unwrap().offset_seconds - expected).abs() < 1e-12);

        controller.shift_left();
        controller.shift_left();
        assert!((controller.working().unwrap().offset_seconds + expected).abs() < 1e-12);
    }

    #[test]
    fn fine_shift_moves_high_rate_streams() {
        let dt = 2.5e-5;
        let session =
            AlignmentSession::new(wave(400, dt, 1.0), vec![("fast".into(), wave(400, dt, 1.0))])
                .unwrap();
        let mut controller = AlignmentController::new(session, Frames::default(), AlignerSettings::default())
            .unwrap()
            .with_initial_scale(Some(1.0));
        controller.begin();
        for _ in 0..5 {
            controller.fine_shift_right();
        }
        let offset = controller.working().unwrap().offset_seconds;
        assert!((offset - 5.0 * dt).abs() < 1e-12, "offset {}", offset);

        // Rounded to the configured precision only when committed.
        controller.advance();
        let committed = controller.session().committed_by_name("fast").unwrap();
        assert_eq!(committed.offset_seconds, 0.0001);
    }

    #[test]
    fn fine_shift_moves_one_sample() {
        let mut controller = controller(1);
        controller.begin();
        controller.fine_shift_right();
        controller.fine_shift_right();
        assert!((controller.working().unwrap().offset_seconds - 0.1).abs() < 1e-9);

        // Viewport is untouched by shifts.
        let view = controller.working().unwrap().viewport;
        assert_eq!(view.start(), 0.0);
    }

    #[test]
    fn shifted_stream_is_redrawn_from_raw_data() {
        let mut controller = controller(1);
        controller.begin();
        controller.fine_shift_right();

        let (_, lines, _, _) = controller.renderer().redraws.last().unwrap();
        // First displayed sample of the aligning stream moved by one interval.
        assert!((lines[1].times[0] - 0.05).abs() < 1e-9);
    }

    #[test]
    fn scale_commands_rescale_amplitude_and_range() {
        let mut controller = controller(1);
        controller.begin();
        let before = controller.amplitude_range().unwrap();

        controller.scale_up();
        assert!((controller.working().unwrap().scale - 1.1).abs() < 1e-12);
        let after = controller.amplitude_range().unwrap();
        assert!(after.1 > before.1);

        controller.scale_down();
        assert!((controller.working().unwrap().scale - 1.0).abs() < 1e-12);
    }

    #[test]
    fn reset_viewport_keeps_offset_and_scale() {
        let mut controller = controller(1);
        controller.begin();
        controller.shift_right();
        controller.scale_up();
        controller.zoom_in();
        controller.look_left();

        let before = controller.working().copied().unwrap();
        controller.reset_viewport();
        let after = controller.working().copied().unwrap();

        assert_eq!(after.offset_seconds, before.offset_seconds);
        assert_eq!(after.scale, before.scale);
        assert_eq!(after.viewport.start(), 0.0);
        assert!((after.viewport.end() - (199.0 * 0.05 + before.offset_seconds)).abs() < 1e-9);
    }

    #[test]
    fn commands_do_not_commit() {
        let mut controller = controller(1);
        controller.begin();
        controller.shift_right();
        controller.toggle_general_warning();
        assert_eq!(controller.session().committed(0), Some(Alignment::default()));
        assert_eq!(controller.session().cursor(), Cursor::Aligning(0));
        assert!(controller.session().flags().general_warning);
    }

    #[test]
    fn commands_are_no_ops_before_begin_and_after_done() {
        let mut controller = controller(1);
        controller.zoom_in();
        controller.toggle_shift_warning();
        assert!(controller.working().is_none());
        assert!(!controller.session().flags().shift_warning);

        controller.begin();
        controller.advance();
        assert_eq!(controller.progress(), Progress::Done);
        assert_eq!(controller.renderer().completed, 1);

        let frames = controller.renderer().redraws.len();
        controller.shift_right();
        controller.set_comment("late");
        assert_eq!(controller.renderer().redraws.len(), frames);
        assert_eq!(controller.session().comment(), "");
    }

    #[test]
    fn retreat_from_first_stream_stays_put() {
        let mut controller = controller(2);
        controller.begin();
        controller.fine_shift_left();
        let offset = round_offset(controller.working().unwrap().offset_seconds, 4);

        assert_eq!(controller.retreat(), Progress::Aligning(0));
        assert_eq!(controller.working().unwrap().offset_seconds, offset);
        assert_eq!(controller.session().committed(0).unwrap().offset_seconds, offset);
    }

    #[test]
    fn retreat_before_begin_is_ignored() {
        let mut controller = controller(1);
        assert_eq!(controller.retreat(), Progress::Pending);
        assert!(controller.renderer().redraws.is_empty());
    }

    #[test]
    fn advance_on_done_terminates_and_sticks() {
        let mut controller = controller(1);
        controller.advance();
        controller.advance();
        assert_eq!(controller.advance(), Progress::Terminated);
        assert_eq!(controller.retreat(), Progress::Terminated);
        assert_eq!(controller.apply(&Command::ZoomIn), Progress::Terminated);
        assert!(controller.is_terminated());
    }

    #[test]
    fn snapshot_reports_current_stream() {
        let mut controller = controller(2);
        controller.begin();
        controller.advance();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.progress, Progress::Aligning(1));
        assert_eq!(snapshot.stream.as_deref(), Some("stream_1"));
        assert_eq!(snapshot.total, 2);
    }
}
