use tracing::{debug, instrument};

use crate::store::TaskStore;

/// Drag gesture messages over the task rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMsg {
    PickUp(usize),
    DragOver(usize),
    Drop(usize),
    Release,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderHandler {
    source: Option<usize>,
}

impl ReorderHandler {
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    /// Returns whether the task list changed. Only a drop onto a different
    /// row after a pick-up moves anything.
    #[instrument(skip(self, store))]
    pub fn handle(&mut self, store: &mut TaskStore, msg: DragMsg) -> bool {
        match msg {
            DragMsg::PickUp(position) => {
                self.source = Some(position);
                false
            }
            DragMsg::DragOver(_) => false,
            DragMsg::Release => {
                self.source = None;
                false
            }
            DragMsg::Drop(target) => {
                let Some(source) = self.source.take() else {
                    debug!("drop without pick-up ignored");
                    return false;
                };
                if source == target {
                    return false;
                }
                store.move_task(source, target)
            }
        }
    }
}
