//! The record list controller.
//!
//! [`RecordListController`] owns the screen state of the user manager: the
//! local mirror of the remote collection, the new-record draft, the optional
//! edit draft and the busy/error status. Views read it through
//! [`RecordListController::snapshot`] and [`RecordListController::view`];
//! the only way to change it is through the named operations.
//!
//! The local record list is never patched. It is replaced by a full fetch on
//! mount and after every successful mutation.
//!
//! # Concurrency
//!
//! The controller is single-threaded: state sits in a [`RefCell`] and no
//! borrow is held across an `.await`, so several operations can be in flight
//! on one task (for example under `tokio::join!`). By default overlapping
//! operations are not guarded and whichever reload finishes last decides the
//! displayed list. With `single_flight` enabled, an operation started while
//! another is outstanding is refused with [`ActionError::Rejected`].

use std::cell::{Cell, RefCell};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Action, ActionError, Error};
use crate::privacy::Redactor;
use crate::record::{Draft, EditDraft, Field, Record};
use crate::store::DocumentCollection;
use crate::view::ViewState;

/// Outcome of a controller operation.
///
/// The state already reflects the outcome when this is returned; callers
/// only need it to react (exit codes, prompts).
pub type ActionResult = std::result::Result<(), ActionError>;

/// A read-only copy of the controller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ControllerState {
    /// Local mirror of the remote collection.
    pub records: Vec<Record>,
    /// Fields typed for the next record to create.
    pub new_draft: Draft,
    /// The record being edited, if any.
    pub edit_draft: Option<EditDraft>,
    /// True while any remote call is outstanding.
    pub busy: bool,
    /// Message of the last failed action.
    pub error: Option<String>,
}

/// Controller binding a form and a record list to a [`DocumentCollection`].
#[derive(Debug)]
pub struct RecordListController<C> {
    store: C,
    state: RefCell<ControllerState>,
    in_flight: Cell<usize>,
    single_flight: bool,
    redactor: Redactor,
}

/// Marks one action as outstanding for as long as it is alive.
struct InFlight<'a, C> {
    controller: &'a RecordListController<C>,
}

impl<C> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        let remaining = self.controller.in_flight.get().saturating_sub(1);
        self.controller.in_flight.set(remaining);
        self.controller.state.borrow_mut().busy = remaining > 0;
    }
}

impl<C: DocumentCollection> RecordListController<C> {
    /// Create a controller with an empty list and no guard on overlapping
    /// actions. Nothing is fetched until [`mount`](Self::mount) or
    /// [`load`](Self::load) is called.
    #[must_use]
    pub fn new(store: C) -> Self {
        Self {
            store,
            state: RefCell::new(ControllerState::default()),
            in_flight: Cell::new(0),
            single_flight: false,
            redactor: Redactor::default(),
        }
    }

    /// Create a controller configured from `config`.
    #[must_use]
    pub fn from_config(store: C, config: &Config) -> Self {
        Self::new(store)
            .with_single_flight(config.controller.single_flight)
            .with_redactor(Redactor::new(config.logging.redact_personal_data))
    }

    /// Refuse actions started while another one is outstanding.
    #[must_use]
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Use `redactor` for personal data in log lines.
    #[must_use]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// The underlying document collection.
    #[must_use]
    pub fn store(&self) -> &C {
        &self.store
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// What the screen should show right now.
    #[must_use]
    pub fn view(&self) -> ViewState {
        ViewState::from_state(&self.state.borrow())
    }

    /// Whether any remote call is outstanding.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    /// Message of the last failed action.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Look up a record of the local list by identifier.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<Record> {
        self.state
            .borrow()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Initial fetch when the screen appears.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn mount(&self) -> ActionResult {
        debug!(collection = %self.store.name(), "Mounting record list");
        self.load().await
    }

    /// Fetch the whole collection and replace the local list.
    ///
    /// On failure the previous list is kept and the load message is set.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the fetch failed or was refused.
    pub async fn load(&self) -> ActionResult {
        let _guard = self.begin(Action::Load)?;
        self.reload().await
    }

    /// Insert the new-record draft.
    ///
    /// On success the draft is cleared and the list reloaded. On failure the
    /// draft is kept as typed so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the insert or the reload after it failed.
    pub async fn create(&self) -> ActionResult {
        let _guard = self.begin(Action::Create)?;
        let draft = self.state.borrow().new_draft.clone();

        match self.store.insert(&draft).await {
            Ok(id) => {
                info!(id = %id, "User added");
                self.state.borrow_mut().new_draft = Draft::default();
                self.reload().await
            }
            Err(source) => {
                let shown = self.redactor.redact(&format!("{draft:?}"));
                error!(draft = %shown, "Failed to add user: {source}");
                Err(self.fail(Action::Create, source))
            }
        }
    }

    /// Update one field of the new-record draft.
    pub fn set_new_field(&self, field: Field, value: impl Into<String>) {
        self.state.borrow_mut().new_draft.set(field, value);
    }

    /// Replace the new-record draft as a whole.
    pub fn set_new_draft(&self, draft: Draft) {
        self.state.borrow_mut().new_draft = draft;
    }

    /// Start editing a copy of `record`.
    ///
    /// Any unsaved edit of another record is silently discarded.
    pub fn begin_edit(&self, record: &Record) {
        let mut state = self.state.borrow_mut();
        if let Some(previous) = &state.edit_draft {
            if previous.id != record.id {
                debug!(discarded = %previous.id, "Discarding unsaved edit");
            }
        }
        state.edit_draft = Some(EditDraft::from(record));
        debug!(id = %record.id, "Editing user");
    }

    /// Start editing the listed record with identifier `id`.
    ///
    /// Returns `false` if the local list holds no such record.
    pub fn begin_edit_id(&self, id: &str) -> bool {
        match self.record(id) {
            Some(record) => {
                self.begin_edit(&record);
                true
            }
            None => false,
        }
    }

    /// Update one field of the edit draft.
    ///
    /// Returns `false` if no record is being edited.
    pub fn set_edit_field(&self, field: Field, value: impl Into<String>) -> bool {
        match self.state.borrow_mut().edit_draft.as_mut() {
            Some(edit) => {
                edit.fields.set(field, value);
                true
            }
            None => false,
        }
    }

    /// Drop the edit draft without touching the store.
    pub fn cancel_edit(&self) {
        if let Some(edit) = self.state.borrow_mut().edit_draft.take() {
            debug!(id = %edit.id, "Edit cancelled");
        }
    }

    /// Replace all fields of record `id` with the edit draft.
    ///
    /// On success the edit draft is dropped and the list reloaded. On failure
    /// the edit draft is kept.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if nothing is being edited, or the update or
    /// the reload after it failed.
    pub async fn save_edit(&self, id: &str) -> ActionResult {
        let _guard = self.begin(Action::SaveEdit)?;
        let editing = self
            .state
            .borrow()
            .edit_draft
            .as_ref()
            .map(|edit| edit.fields.clone());
        let Some(fields) = editing else {
            warn!(id = %id, "Save requested with no edit in progress");
            return Err(self.fail(Action::SaveEdit, Error::NoEditInProgress));
        };

        match self.store.update(id, &fields).await {
            Ok(()) => {
                info!(id = %id, "User updated");
                self.state.borrow_mut().edit_draft = None;
                self.reload().await
            }
            Err(source) => {
                let shown = self.redactor.redact(&format!("{fields:?}"));
                error!(id = %id, draft = %shown, "Failed to update user: {source}");
                Err(self.fail(Action::SaveEdit, source))
            }
        }
    }

    /// Delete record `id`, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] if the delete or the reload after it failed.
    pub async fn delete(&self, id: &str) -> ActionResult {
        let _guard = self.begin(Action::Delete)?;

        match self.store.delete(id).await {
            Ok(()) => {
                info!(id = %id, "User deleted");
                self.reload().await
            }
            Err(source) => {
                error!(id = %id, "Failed to delete user: {source}");
                Err(self.fail(Action::Delete, source))
            }
        }
    }

    /// Mark `action` as outstanding, clearing the previous error.
    fn begin(&self, action: Action) -> Result<InFlight<'_, C>, ActionError> {
        let outstanding = self.in_flight.get();
        if self.single_flight && outstanding > 0 {
            warn!(action = %action, outstanding, "Action rejected while busy");
            return Err(ActionError::Rejected { action });
        }

        self.in_flight.set(outstanding + 1);
        let mut state = self.state.borrow_mut();
        state.busy = true;
        state.error = None;
        debug!(action = %action, "Action started");

        Ok(InFlight { controller: self })
    }

    /// Fetch the collection and replace the local list.
    async fn reload(&self) -> ActionResult {
        match self.store.list().await {
            Ok(records) => {
                debug!(count = records.len(), "Record list refreshed");
                let mut state = self.state.borrow_mut();
                state.records = records;
                state.error = None;
                Ok(())
            }
            Err(source) => {
                error!("Failed to load users: {source}");
                Err(self.fail(Action::Load, source))
            }
        }
    }

    fn fail(&self, action: Action, source: Error) -> ActionError {
        self.state.borrow_mut().error = Some(action.failure_message().to_string());
        ActionError::Failed { action, source }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::error::Result;
    use crate::store::MemoryCollection;

    /// Which store call a fault applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        List,
        Insert,
        Update,
        Delete,
    }

    /// Memory collection that counts calls and fails on demand.
    #[derive(Debug)]
    struct ScriptedCollection {
        inner: MemoryCollection,
        calls: AtomicUsize,
        failing: Mutex<Vec<Op>>,
    }

    impl ScriptedCollection {
        fn new(inner: MemoryCollection) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
                failing: Mutex::new(Vec::new()),
            }
        }

        fn fail_next(&self, op: Op) {
            self.failing.lock().unwrap().push(op);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn check(&self, op: Op) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failing = self.failing.lock().unwrap();
            if let Some(pos) = failing.iter().position(|f| *f == op) {
                failing.remove(pos);
                return Err(Error::unavailable(format!("injected {op:?} failure")));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DocumentCollection for ScriptedCollection {
        fn name(&self) -> &str {
            self.inner.name()
        }

        async fn list(&self) -> Result<Vec<Record>> {
            self.check(Op::List)?;
            self.inner.list().await
        }

        async fn insert(&self, fields: &Draft) -> Result<String> {
            self.check(Op::Insert)?;
            self.inner.insert(fields).await
        }

        async fn update(&self, id: &str, fields: &Draft) -> Result<()> {
            self.check(Op::Update)?;
            self.inner.update(id, fields).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.check(Op::Delete)?;
            self.inner.delete(id).await
        }
    }

    fn seeded() -> MemoryCollection {
        MemoryCollection::with_records(
            "users",
            vec![
                Record::new("u1", Draft::new("Ann", "ann@x.com", "31")),
                Record::new("u2", Draft::new("Bao", "bao@x.com", "27")),
                Record::new("u3", Draft::new("Chi", "chi@x.com", "45")),
            ],
        )
    }

    async fn mounted(store: MemoryCollection) -> RecordListController<ScriptedCollection> {
        let controller = RecordListController::new(ScriptedCollection::new(store));
        controller.mount().await.unwrap();
        controller
    }

    fn as_set(records: &[Record]) -> HashSet<Record> {
        records.iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_new_controller_is_idle_and_empty() {
        let controller = RecordListController::new(MemoryCollection::new("users"));
        let state = controller.snapshot();
        assert!(state.records.is_empty());
        assert!(state.new_draft.is_empty());
        assert!(state.edit_draft.is_none());
        assert!(!state.busy);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_load_mirrors_remote_collection() {
        let controller = mounted(seeded()).await;
        let remote = controller.store().list().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(as_set(&state.records), as_set(&remote));
        assert!(!state.busy);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_list() {
        crate::logging::init_test_logging();
        let controller = mounted(seeded()).await;
        let before = controller.snapshot().records;

        controller.store().fail_next(Op::List);
        let err = controller.load().await.unwrap_err();

        assert_eq!(err.action(), Action::Load);
        let state = controller.snapshot();
        assert_eq!(state.records, before);
        assert_eq!(state.error.as_deref(), Some(Action::Load.failure_message()));
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_create_adds_one_record() {
        let controller = mounted(seeded()).await;
        let before: HashSet<_> = controller.snapshot().records.into_iter().map(|r| r.id).collect();

        controller.set_new_field(Field::Name, "A");
        controller.set_new_field(Field::Email, "a@x.com");
        controller.set_new_field(Field::Age, "30");
        controller.create().await.unwrap();

        let state = controller.snapshot();
        let added: Vec<_> = state
            .records
            .iter()
            .filter(|r| !before.contains(&r.id))
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].fields, Draft::new("A", "a@x.com", "30"));
        assert!(!added[0].id.is_empty());
        assert!(state.new_draft.is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_keeps_draft_and_list() {
        let controller = mounted(seeded()).await;
        let before = controller.snapshot().records;

        controller.set_new_draft(Draft::new("A", "a@x.com", "30"));
        controller.store().fail_next(Op::Insert);
        let err = controller.create().await.unwrap_err();

        assert_eq!(err.action(), Action::Create);
        assert_eq!(err.to_string(), Action::Create.failure_message());
        let state = controller.snapshot();
        assert_eq!(state.new_draft, Draft::new("A", "a@x.com", "30"));
        assert_eq!(state.records, before);
        assert!(state.error.as_deref().is_some_and(|m| !m.is_empty()));
        assert_eq!(controller.store().inner.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_create_retry_after_failure() {
        let controller = mounted(MemoryCollection::new("users")).await;
        controller.set_new_draft(Draft::new("A", "a@x.com", "30"));

        controller.store().fail_next(Op::Insert);
        assert!(controller.create().await.is_err());
        controller.create().await.unwrap();

        let state = controller.snapshot();
        assert_eq!(state.records.len(), 1);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_reload_failure_after_create_reports_load() {
        let controller = mounted(MemoryCollection::new("users")).await;
        controller.set_new_draft(Draft::new("A", "", ""));

        controller.store().fail_next(Op::List);
        let err = controller.create().await.unwrap_err();

        assert_eq!(err.action(), Action::Load);
        let state = controller.snapshot();
        assert!(state.new_draft.is_empty());
        assert!(state.records.is_empty());
        assert_eq!(state.error.as_deref(), Some(Action::Load.failure_message()));
        assert_eq!(controller.store().inner.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_edit_replaces_only_target() {
        let controller = mounted(seeded()).await;
        let before = controller.snapshot().records;

        assert!(controller.begin_edit_id("u2"));
        assert!(controller.set_edit_field(Field::Name, "B"));
        controller.save_edit("u2").await.unwrap();

        let state = controller.snapshot();
        assert!(state.edit_draft.is_none());
        for record in &state.records {
            if record.id == "u2" {
                assert_eq!(record.fields, Draft::new("B", "bao@x.com", "27"));
            } else {
                assert!(before.contains(record));
            }
        }
        assert_eq!(state.records.len(), before.len());
    }

    #[tokio::test]
    async fn test_save_edit_failure_keeps_edit_draft() {
        let controller = mounted(seeded()).await;
        controller.begin_edit_id("u1");
        controller.set_edit_field(Field::Age, "32");

        controller.store().fail_next(Op::Update);
        let err = controller.save_edit("u1").await.unwrap_err();

        assert_eq!(err.action(), Action::SaveEdit);
        let state = controller.snapshot();
        let edit = state.edit_draft.expect("edit draft kept");
        assert_eq!(edit.id, "u1");
        assert_eq!(edit.fields.age, "32");
        assert_eq!(controller.record("u1").unwrap().fields.age, "31");
        assert_eq!(state.error.as_deref(), Some(Action::SaveEdit.failure_message()));
    }

    #[tokio::test]
    async fn test_save_edit_of_vanished_record_fails() {
        let controller = mounted(seeded()).await;
        controller.begin_edit_id("u3");
        controller.store().inner.delete("u3").await.unwrap();

        let err = controller.save_edit("u3").await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::Failed { source: Error::DocumentNotFound { .. }, .. }
        ));
        assert!(controller.snapshot().edit_draft.is_some());
    }

    #[tokio::test]
    async fn test_save_without_edit_fails() {
        let controller = mounted(seeded()).await;
        let calls = controller.store().calls();

        let err = controller.save_edit("u1").await.unwrap_err();

        assert!(matches!(
            err,
            ActionError::Failed { source: Error::NoEditInProgress, .. }
        ));
        assert_eq!(controller.store().calls(), calls);
        assert!(controller.error().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_only_target() {
        let controller = mounted(seeded()).await;
        let before = controller.snapshot().records;

        controller.delete("u1").await.unwrap();

        let state = controller.snapshot();
        assert!(state.records.iter().all(|r| r.id != "u1"));
        let expected: Vec<_> = before.into_iter().filter(|r| r.id != "u1").collect();
        assert_eq!(as_set(&state.records), as_set(&expected));
    }

    #[tokio::test]
    async fn test_second_delete_fails_without_changing_list() {
        let controller = mounted(seeded()).await;

        controller.delete("u2").await.unwrap();
        let after_first = controller.snapshot().records;

        let err = controller.delete("u2").await.unwrap_err();
        assert_eq!(err.action(), Action::Delete);

        let state = controller.snapshot();
        assert_eq!(state.records, after_first);
        assert_eq!(state.error.as_deref(), Some(Action::Delete.failure_message()));
    }

    #[tokio::test]
    async fn test_cancel_edit_makes_no_remote_calls() {
        let controller = mounted(seeded()).await;
        let calls = controller.store().calls();
        let before = controller.snapshot().records;

        controller.begin_edit_id("u1");
        controller.set_edit_field(Field::Name, "Changed");
        controller.cancel_edit();

        assert_eq!(controller.store().calls(), calls);
        let state = controller.snapshot();
        assert!(state.edit_draft.is_none());
        assert_eq!(state.records, before);
        assert_eq!(controller.store().inner.list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_begin_edit_replaces_previous_edit() {
        let controller = mounted(seeded()).await;

        controller.begin_edit_id("u1");
        controller.set_edit_field(Field::Name, "Unsaved");
        controller.begin_edit_id("u2");

        let edit = controller.snapshot().edit_draft.unwrap();
        assert_eq!(edit.id, "u2");
        assert_eq!(edit.fields.name, "Bao");
    }

    #[tokio::test]
    async fn test_begin_edit_unknown_id() {
        let controller = mounted(seeded()).await;
        assert!(!controller.begin_edit_id("nope"));
        assert!(!controller.set_edit_field(Field::Name, "x"));
        assert!(controller.snapshot().edit_draft.is_none());
    }

    #[tokio::test]
    async fn test_next_attempt_clears_error() {
        let controller = mounted(seeded()).await;
        controller.store().fail_next(Op::Delete);
        assert!(controller.delete("u1").await.is_err());
        assert!(controller.error().is_some());

        controller.delete("u1").await.unwrap();
        assert!(controller.error().is_none());
    }

    #[tokio::test]
    async fn test_busy_while_call_outstanding() {
        let controller = RecordListController::new(
            MemoryCollection::new("users").with_latency(Duration::from_millis(20)),
        );

        let (result, busy_during) = tokio::join!(controller.load(), async {
            tokio::task::yield_now().await;
            controller.is_busy()
        });

        result.unwrap();
        assert!(busy_during);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_overlapping_actions_run_unguarded() {
        let store = seeded().with_latency(Duration::from_millis(10));
        let controller = RecordListController::new(store);
        controller.mount().await.unwrap();

        let (a, b) = tokio::join!(controller.delete("u1"), controller.delete("u2"));
        a.unwrap();
        b.unwrap();

        let ids: Vec<_> = controller.snapshot().records.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["u3".to_string()]);
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_single_flight_rejects_overlap() {
        let store = seeded().with_latency(Duration::from_millis(10));
        let controller = RecordListController::new(store).with_single_flight(true);
        controller.mount().await.unwrap();

        let (a, b) = tokio::join!(controller.delete("u1"), controller.delete("u2"));
        a.unwrap();
        let err = b.unwrap_err();
        assert!(err.is_rejected());
        assert_eq!(err.action(), Action::Delete);

        let state = controller.snapshot();
        assert!(state.error.is_none());
        assert_eq!(state.records.len(), 2);
        assert!(controller.record("u2").is_some());
    }

    #[tokio::test]
    async fn test_from_config() {
        let mut config = Config::default();
        config.controller.single_flight = true;
        config.logging.redact_personal_data = false;

        let controller = RecordListController::from_config(MemoryCollection::new("users"), &config);
        assert!(controller.single_flight);
        assert!(!controller.redactor.is_enabled());
    }
}
