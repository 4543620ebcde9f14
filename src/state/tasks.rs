//! Deferred work run on the next loop iteration.

use std::path::PathBuf;

/// Work a session can defer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Load this image and its annotations.
    LoadImage(PathBuf),
    /// Navigate to the next image
    OpenNext,
    /// Navigate to the previous image
    OpenPrev,
    /// Jump to a 1-based image position
    GoTo(usize),
    /// Save the current annotations
    Save,
    /// Run the auto-annotation hook on the current image
    AutoAnnotate,
}

/// FIFO of deferred tasks.
///
/// [`TaskQueue::take`] hands out the tasks queued so far, so anything queued
/// while they run waits for the next iteration.
#[derive(Clone, Debug, Default)]
pub struct TaskQueue {
    pending: Vec<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: Task) {
        log::trace!("Queued {:?}", task);
        self.pending.push(task);
    }

    /// Remove and return every queued task, oldest first.
    pub fn take(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
