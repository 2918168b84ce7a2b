//! Top-level controller: owns the task list with its transient editing
//! state and applies one event at a time.
//!
//! An event that changes the task list is followed by a write of the whole
//! list through the [`PersistenceBridge`]; composer, edit and drag state are
//! never written.

use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::composer::Composer;
use crate::edit::EditSession;
use crate::persist::PersistenceBridge;
use crate::reorder::{DragMsg, ReorderHandler};
use crate::store::TaskStore;
use crate::task::Priority;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    DraftText(String),
    DraftPriority(Priority),
    DraftDeadline(Option<NaiveDate>),
    Submit,
    Toggle(usize),
    Delete(usize),
    StartEdit(usize),
    EditText(String),
    /// Enter in the edit field.
    CommitEdit,
    /// The edit field lost focus.
    Blur,
    /// Escape in the edit field.
    CancelEdit,
    Drag(DragMsg),
}

impl Event {
    /// Events that interact with something other than the edit field, and
    /// so take focus away from it.
    fn steals_focus(&self) -> bool {
        !matches!(
            self,
            Event::EditText(_)
                | Event::CommitEdit
                | Event::Blur
                | Event::CancelEdit
                | Event::Drag(DragMsg::DragOver(_))
        )
    }
}

pub struct App {
    store: TaskStore,
    composer: Composer,
    edit: EditSession,
    reorder: ReorderHandler,
    bridge: PersistenceBridge,
}

impl App {
    /// Rehydrates the task list from the bridge's slot.
    #[instrument(skip(bridge), fields(key = %bridge.key()))]
    pub fn open(bridge: PersistenceBridge) -> Self {
        let store = bridge.load();
        Self {
            store,
            composer: Composer::default(),
            edit: EditSession::default(),
            reorder: ReorderHandler::default(),
            bridge,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    pub fn reorder(&self) -> &ReorderHandler {
        &self.reorder
    }

    /// Applies `event` and persists if the task list changed. Returns
    /// whether it changed. Errors only come from the persistence write; the
    /// in-memory state has already been updated by then.
    #[instrument(skip(self))]
    pub fn handle(&mut self, event: Event) -> anyhow::Result<bool> {
        let mut changed = false;
        if self.edit.is_editing() && event.steals_focus() {
            debug!("focus left the edit field, committing");
            changed |= self.edit.commit(&mut self.store);
        }

        changed |= match event {
            Event::DraftText(text) => {
                self.composer.set_text(&text);
                false
            }
            Event::DraftPriority(priority) => {
                self.composer.set_priority(priority);
                false
            }
            Event::DraftDeadline(Some(deadline)) => {
                self.composer.set_deadline(deadline);
                false
            }
            Event::DraftDeadline(None) => {
                self.composer.clear_deadline();
                false
            }
            Event::Submit => self.composer.submit(&mut self.store),
            Event::Toggle(position) => self.store.toggle_complete(position),
            Event::Delete(position) => self.store.delete(position),
            Event::StartEdit(position) => {
                self.edit.start(&self.store, position);
                false
            }
            Event::EditText(text) => {
                self.edit.change_scratch(&text);
                false
            }
            Event::CommitEdit | Event::Blur => self.edit.commit(&mut self.store),
            Event::CancelEdit => {
                self.edit.cancel();
                false
            }
            Event::Drag(msg) => self.reorder.handle(&mut self.store, msg),
        };

        if changed {
            self.bridge.save(&self.store)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::persist::{MemorySlots, SlotStorage};

    /// Slot storage that counts writes and shares its contents with the test.
    #[derive(Clone, Default)]
    struct Recorder {
        writes: Rc<RefCell<Vec<String>>>,
    }

    impl SlotStorage for Recorder {
        fn read(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(self.writes.borrow().last().cloned())
        }

        fn write(&mut self, _key: &str, value: &str) -> anyhow::Result<()> {
            self.writes.borrow_mut().push(value.to_string());
            Ok(())
        }
    }

    struct FailingSlots;

    impl SlotStorage for FailingSlots {
        fn read(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn write(&mut self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn app_with_recorder() -> (App, Recorder) {
        let recorder = Recorder::default();
        let app = App::open(PersistenceBridge::new(Box::new(recorder.clone()), "tasks"));
        (app, recorder)
    }

    fn run(app: &mut App, events: Vec<Event>) {
        for event in events {
            app.handle(event).expect("handle event");
        }
    }

    fn add(text: &str) -> Vec<Event> {
        vec![Event::DraftText(text.to_string()), Event::Submit]
    }

    fn texts(app: &App) -> Vec<&str> {
        app.store().tasks().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn only_task_list_changes_are_written() {
        let (mut app, recorder) = app_with_recorder();
        run(
            &mut app,
            vec![
                Event::DraftText("Buy milk".to_string()),
                Event::DraftPriority(Priority::High),
                Event::DraftDeadline(NaiveDate::from_ymd_opt(2024, 1, 1)),
            ],
        );
        assert!(recorder.writes.borrow().is_empty());

        assert!(app.handle(Event::Submit).expect("submit"));
        assert_eq!(recorder.writes.borrow().len(), 1);
        assert_eq!(app.composer(), &Composer::default());

        run(&mut app, vec![Event::StartEdit(0), Event::EditText("x".to_string())]);
        run(&mut app, vec![Event::CancelEdit, Event::Toggle(9), Event::Submit]);
        assert_eq!(recorder.writes.borrow().len(), 1);

        run(&mut app, vec![Event::Toggle(0)]);
        assert_eq!(recorder.writes.borrow().len(), 2);
    }

    #[test]
    fn written_value_rehydrates_equal_list() {
        let (mut app, recorder) = app_with_recorder();
        run(&mut app, add("A"));
        run(&mut app, add("B"));
        run(&mut app, vec![Event::Toggle(1)]);

        let reopened = App::open(PersistenceBridge::new(Box::new(recorder), "tasks"));
        assert_eq!(reopened.store(), app.store());
    }

    #[test]
    fn enter_commits_and_escape_cancels() {
        let (mut app, _) = app_with_recorder();
        run(&mut app, add("Buy milk"));

        run(
            &mut app,
            vec![Event::StartEdit(0), Event::EditText("Buy oat milk".to_string()), Event::CommitEdit],
        );
        assert_eq!(texts(&app), vec!["Buy oat milk"]);
        assert!(!app.edit().is_editing());

        run(
            &mut app,
            vec![Event::StartEdit(0), Event::EditText("Nope".to_string()), Event::CancelEdit],
        );
        assert_eq!(texts(&app), vec!["Buy oat milk"]);
        assert!(!app.edit().is_editing());
    }

    #[test]
    fn blank_commit_still_closes_editor() {
        let (mut app, _) = app_with_recorder();
        run(&mut app, add("Buy milk"));
        run(&mut app, vec![Event::StartEdit(0), Event::EditText("  ".to_string())]);
        assert!(!app.handle(Event::Blur).expect("blur"));
        assert_eq!(texts(&app), vec!["Buy milk"]);
        assert_eq!(app.edit(), &EditSession::Idle);
    }

    #[test]
    fn acting_elsewhere_commits_open_edit_first() {
        let (mut app, recorder) = app_with_recorder();
        run(&mut app, add("A"));
        run(&mut app, add("B"));
        run(&mut app, vec![Event::StartEdit(0), Event::EditText("A2".to_string())]);

        assert!(app.handle(Event::Delete(1)).expect("delete"));
        assert_eq!(texts(&app), vec!["A2"]);
        assert!(!app.edit().is_editing());
        assert_eq!(recorder.writes.borrow().len(), 3);
    }

    #[test]
    fn drag_over_keeps_edit_open() {
        let (mut app, _) = app_with_recorder();
        run(&mut app, add("A"));
        run(&mut app, vec![Event::StartEdit(0), Event::Drag(DragMsg::DragOver(0))]);
        assert!(app.edit().is_editing());
    }

    #[test]
    fn drag_gesture_moves_task() {
        let (mut app, recorder) = app_with_recorder();
        for text in ["A", "B", "C"] {
            run(&mut app, add(text));
        }
        run(
            &mut app,
            vec![
                Event::Drag(DragMsg::PickUp(0)),
                Event::Drag(DragMsg::DragOver(1)),
                Event::Drag(DragMsg::DragOver(2)),
            ],
        );
        assert_eq!(recorder.writes.borrow().len(), 3);

        assert!(app.handle(Event::Drag(DragMsg::Drop(2))).expect("drop"));
        assert_eq!(texts(&app), vec!["B", "C", "A"]);
        assert_eq!(recorder.writes.borrow().len(), 4);
    }

    #[test]
    fn corrupted_slot_opens_empty() {
        let slots = MemorySlots::with_slot("tasks", "[{\"text\": oops");
        let app = App::open(PersistenceBridge::new(Box::new(slots), "tasks"));
        assert!(app.store().is_empty());
    }

    #[test]
    fn write_failure_surfaces_but_keeps_state() {
        let mut app = App::open(PersistenceBridge::new(Box::new(FailingSlots), "tasks"));
        app.handle(Event::DraftText("A".to_string())).expect("draft");
        let err = app.handle(Event::Submit).expect_err("write should fail");
        assert!(format!("{err:#}").contains("disk full"));
        assert_eq!(texts(&app), vec!["A"]);
    }
}
