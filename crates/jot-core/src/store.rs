//! The ordered task list and the operations that mutate it.
//!
//! A task is addressed by its zero-based position. Every operation either
//! applies completely or leaves the list untouched, and reports which of the
//! two happened so the caller knows whether to persist. Positions that do
//! not exist are treated as no-ops rather than errors.

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::task::{Priority, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, position: usize) -> Option<&Task> {
        self.tasks.get(position)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Appends a new open task. Blank text is rejected.
    #[instrument(skip(self, text))]
    pub fn create(&mut self, text: &str, priority: Priority, deadline: Option<NaiveDate>) -> bool {
        let Some(task) = Task::new(text, priority, deadline) else {
            debug!("rejected blank task text");
            return false;
        };
        self.tasks.push(task);
        debug!(len = self.tasks.len(), "task created");
        true
    }

    #[instrument(skip(self))]
    pub fn toggle_complete(&mut self, position: usize) -> bool {
        let Some(task) = self.tasks.get_mut(position) else {
            debug!(len = self.tasks.len(), "toggle ignored, position out of range");
            return false;
        };
        task.completed = !task.completed;
        debug!(completed = task.completed, "task toggled");
        true
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, position: usize) -> bool {
        if position >= self.tasks.len() {
            debug!(len = self.tasks.len(), "delete ignored, position out of range");
            return false;
        }
        self.tasks.remove(position);
        debug!(len = self.tasks.len(), "task deleted");
        true
    }

    /// Replaces the text at `position` with the trimmed `text`.
    #[instrument(skip(self, text))]
    pub fn update_text(&mut self, position: usize, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            debug!("rejected blank replacement text");
            return false;
        }
        let Some(task) = self.tasks.get_mut(position) else {
            debug!(len = self.tasks.len(), "update ignored, position out of range");
            return false;
        };
        text.clone_into(&mut task.text);
        true
    }

    /// Splices the task at `from` out and back in at `to`, where `to` indexes
    /// the shortened list. A target past the end lands at the end.
    #[instrument(skip(self))]
    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        if from >= self.tasks.len() {
            debug!(len = self.tasks.len(), "move ignored, source out of range");
            return false;
        }
        let task = self.tasks.remove(from);
        let to = to.min(self.tasks.len());
        self.tasks.insert(to, task);
        if to == from {
            return false;
        }
        debug!(to, "task moved");
        true
    }
}
