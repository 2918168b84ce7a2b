use chrono::NaiveDate;
use tracing::instrument;

use crate::store::TaskStore;
use crate::task::Priority;

/// Draft fields for the next task to add.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub text: String,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
}

impl Composer {
    pub fn set_text(&mut self, text: &str) {
        text.clone_into(&mut self.text);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn set_deadline(&mut self, deadline: NaiveDate) {
        self.deadline = Some(deadline);
    }

    pub fn clear_deadline(&mut self) {
        self.deadline = None;
    }

    /// Creates a task from the drafts. The drafts reset only when the task
    /// was actually created.
    #[instrument(skip(self, store), fields(priority = %self.priority))]
    pub fn submit(&mut self, store: &mut TaskStore) -> bool {
        let created = store.create(&self.text, self.priority, self.deadline);
        if created {
            *self = Composer::default();
        }
        created
    }
}
