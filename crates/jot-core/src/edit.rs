use tracing::{debug, instrument};

use crate::store::TaskStore;

/// In-progress text editing of a single task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        position: usize,
        scratch: String,
    },
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing { .. })
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            EditSession::Editing { position, .. } => Some(*position),
            EditSession::Idle => None,
        }
    }

    pub fn scratch(&self) -> Option<&str> {
        match self {
            EditSession::Editing { scratch, .. } => Some(scratch),
            EditSession::Idle => None,
        }
    }

    /// Opens the editor on `position` with its current text. Leaves the
    /// session alone when there is no such task.
    #[instrument(skip(self, store))]
    pub fn start(&mut self, store: &TaskStore, position: usize) -> bool {
        let Some(task) = store.get(position) else {
            debug!("edit ignored, position out of range");
            return false;
        };
        *self = EditSession::Editing {
            position,
            scratch: task.text.clone(),
        };
        true
    }

    pub fn change_scratch(&mut self, text: &str) {
        if let EditSession::Editing { scratch, .. } = self {
            text.clone_into(scratch);
        }
    }

    /// Writes the scratch text back and closes the editor. Returns whether
    /// the task list changed; a blank scratch closes without changing it.
    #[instrument(skip(self, store))]
    pub fn commit(&mut self, store: &mut TaskStore) -> bool {
        match std::mem::take(self) {
            EditSession::Editing { position, scratch } => {
                let applied = store.update_text(position, &scratch);
                debug!(position, applied, "edit committed");
                applied
            }
            EditSession::Idle => false,
        }
    }

    pub fn cancel(&mut self) {
        if self.is_editing() {
            debug!("edit cancelled");
        }
        *self = EditSession::Idle;
    }
}
