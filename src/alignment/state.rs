use serde::Serialize;

use crate::alignment::transform::Viewport;
use crate::error::{AlignError, Result};
use crate::series::TimeSeries;

/// Names the result structure already uses for its own keys.
pub const RESERVED_NAMES: [&str; 2] = ["warnings", "comment"];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "state", content = "index")]
pub enum Cursor {
    Pending,
    Aligning(usize),
    Done,
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Pending
    }
}

/// Offset/scale pair recorded for a stream.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    pub offset_seconds: f64,
    pub scale: f64,
}

impl Default for Alignment {
    fn default() -> Self {
        Self {
            offset_seconds: 0.0,
            scale: 1.0,
        }
    }
}

/// Live, uncommitted hypothesis for the stream under the cursor.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub offset_seconds: f64,
    pub scale: f64,
    pub viewport: Viewport,
}

impl Hypothesis {
    pub fn fresh(viewport: Viewport) -> Self {
        Self::from_alignment(Alignment::default(), viewport)
    }

    pub fn from_alignment(alignment: Alignment, viewport: Viewport) -> Self {
        Self {
            offset_seconds: alignment.offset_seconds,
            scale: alignment.scale,
            viewport,
        }
    }

    pub fn alignment(&self) -> Alignment {
        Alignment {
            offset_seconds: self.offset_seconds,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WarningFlags {
    pub general_warning: bool,
    pub shift_warning: bool,
    pub data_missing: bool,
}

/// Everything one alignment run owns: the streams, where the operator is in
/// the queue, what has been committed so far, and the session-wide notes.
#[derive(Debug, Clone)]
pub struct AlignmentSession {
    reference: TimeSeries,
    queue: Vec<(String, TimeSeries)>,
    cursor: Cursor,
    committed: Vec<Alignment>,
    working: Option<Hypothesis>,
    flags: WarningFlags,
    comment: String,
}

impl AlignmentSession {
    pub fn new(reference: TimeSeries, queue: Vec<(String, TimeSeries)>) -> Result<Self> {
        if queue.is_empty() {
            return Err(AlignError::EmptyQueue);
        }
        for (idx, (name, _)) in queue.iter().enumerate() {
            if RESERVED_NAMES.contains(&name.as_str()) {
                return Err(AlignError::ReservedStreamName(name.clone()));
            }
            if queue[..idx].iter().any(|(earlier, _)| earlier == name) {
                return Err(AlignError::DuplicateStreamName(name.clone()));
            }
        }

        let committed = vec![Alignment::default(); queue.len()];
        Ok(Self {
            reference,
            queue,
            cursor: Cursor::Pending,
            committed,
            working: None,
            flags: WarningFlags::default(),
            comment: String::new(),
        })
    }

    pub fn reference(&self) -> &TimeSeries {
        &self.reference
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|(name, _)| name.as_str())
    }

    pub fn stream(&self, index: usize) -> Option<(&str, &TimeSeries)> {
        self.queue
            .get(index)
            .map(|(name, series)| (name.as_str(), series))
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    /// Index and stream currently being aligned.
    pub fn current(&self) -> Option<(usize, &str, &TimeSeries)> {
        match self.cursor {
            Cursor::Aligning(index) => self
                .stream(index)
                .map(|(name, series)| (index, name, series)),
            Cursor::Pending | Cursor::Done => None,
        }
    }

    pub fn working(&self) -> Option<&Hypothesis> {
        self.working.as_ref()
    }

    pub(crate) fn working_mut(&mut self) -> Option<&mut Hypothesis> {
        self.working.as_mut()
    }

    pub(crate) fn set_working(&mut self, working: Option<Hypothesis>) {
        self.working = working;
    }

    pub fn committed(&self, index: usize) -> Option<Alignment> {
        self.committed.get(index).copied()
    }

    pub fn committed_by_name(&self, name: &str) -> Option<Alignment> {
        self.queue
            .iter()
            .position(|(queued, _)| queued == name)
            .and_then(|index| self.committed(index))
    }

    /// `(name, alignment)` for every queued stream, in queue order.
    pub fn committed_entries(&self) -> impl Iterator<Item = (&str, Alignment)> {
        self.queue
            .iter()
            .zip(&self.committed)
            .map(|((name, _), alignment)| (name.as_str(), *alignment))
    }

    /// Record `alignment` for the stream at `index`. Replaces, never appends.
    pub(crate) fn commit(&mut self, index: usize, alignment: Alignment) {
        debug_assert!(index < self.committed.len(), "commit outside the queue");
        if let Some(slot) = self.committed.get_mut(index) {
            *slot = alignment;
        }
    }

    pub fn flags(&self) -> WarningFlags {
        self.flags
    }

    pub fn toggle_general_warning(&mut self) -> bool {
        self.flags.general_warning = !self.flags.general_warning;
        self.flags.general_warning
    }

    pub fn toggle_shift_warning(&mut self) -> bool {
        self.flags.shift_warning = !self.flags.shift_warning;
        self.flags.shift_warning
    }

    pub fn toggle_data_missing(&mut self) -> bool {
        self.flags.data_missing = !self.flags.data_missing;
        self.flags.data_missing
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap()
    }

    #[test]
    fn empty_queue_fails_fast() {
        let err = AlignmentSession::new(series(), Vec::new()).unwrap_err();
        assert_eq!(err, AlignError::EmptyQueue);
    }

    #[test]
    fn rejects_reserved_and_duplicate_names() {
        let reserved = AlignmentSession::new(series(), vec![("warnings".into(), series())]);
        assert_eq!(
            reserved.unwrap_err(),
            AlignError::ReservedStreamName("warnings".into())
        );

        let duplicate = AlignmentSession::new(
            series(),
            vec![("left".into(), series()), ("left".into(), series())],
        );
        assert_eq!(
            duplicate.unwrap_err(),
            AlignError::DuplicateStreamName("left".into())
        );
    }

    #[test]
    fn committed_prepopulated_with_zero_offsets() {
        let session = AlignmentSession::new(
            series(),
            vec![("left".into(), series()), ("right".into(), series())],
        )
        .unwrap();

        let entries: Vec<_> = session.committed_entries().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("left", Alignment::default()));
        assert_eq!(entries[1].0, "right");
        assert_eq!(session.cursor(), Cursor::Pending);
        assert!(session.working().is_none());
    }

    #[test]
    fn flags_toggle_and_comment_replaces() {
        let mut session = AlignmentSession::new(series(), vec![("left".into(), series())]).unwrap();

        assert!(session.toggle_shift_warning());
        assert!(!session.toggle_shift_warning());
        assert!(session.toggle_data_missing());
        assert_eq!(
            session.flags(),
            WarningFlags {
                general_warning: false,
                shift_warning: false,
                data_missing: true,
            }
        );

        session.set_comment("first");
        session.set_comment("gait peaks line up");
        assert_eq!(session.comment(), "gait peaks line up");
    }
}
