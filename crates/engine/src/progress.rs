//! Progress reporting for a diff run.
//!
//! The engine reports discrete phases only. Callers that want a progress bar
//! or cancellation wrap the whole call themselves.

use std::cell::RefCell;

/// Sides above this many rows trigger a [`ProgressEvent::SizeWarning`].
pub const LARGE_SHEET_ROWS: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ReadingFiles,
    ExtractingDiff,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::ReadingFiles => "reading files",
            Phase::ExtractingDiff => "extracting diff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Phase(Phase),
    SizeWarning { left_rows: usize, right_rows: usize },
}

pub trait ProgressSink {
    fn report(&self, event: ProgressEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Sink that keeps every event, in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: RefCell<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.borrow().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event);
    }
}

/// True when either side is large enough to warrant a warning.
pub fn exceeds_size_limit(left_rows: usize, right_rows: usize) -> bool {
    left_rows > LARGE_SHEET_ROWS || right_rows > LARGE_SHEET_ROWS
}
