//! Note list consistency controller.
//!
//! # Responsibility
//! - Mirror one user's remote note collection into an ordered cache.
//! - Translate position-addressed edits/deletes into id-addressed store ops.
//! - Route store events to the presentation observer.
//!
//! # Invariants
//! - Cache order is the order of the latest snapshot; local edits never
//!   reorder it.
//! - Every snapshot replaces the cache wholesale; there is no diffing.
//! - Creates are never inserted speculatively; the next snapshot carries them.
//! - Successful updates/deletes apply to the cache immediately, before the
//!   next snapshot. Whichever of completion or snapshot lands last wins.
//! - Events from a subscription other than the current one are ignored.
//! - After `unsubscribe` the observer hears nothing about earlier writes.

use super::error::{SyncError, SyncResult};
use super::observer::{FailureKind, ListObserver, Notice};
use crate::form::{prepare_create, prepare_edit, FormReport};
use crate::model::note::{Note, NoteFields, NoteId};
use crate::session::{AuthProvider, Session};
use crate::store::{
    Completion, NoteStore, RequestId, StoreError, StoreErrorKind, StoreEvent, StoreOp,
    StoreResult, SubscriptionId,
};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Subscription lifecycle of one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Unsubscribed,
    /// Subscribed, waiting for the first snapshot.
    Syncing,
    Synced,
    /// Subscription ended with an error; cache keeps its last value.
    Failed,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsubscribed => "unsubscribed",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }
}

/// In-flight write waiting for its completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingOp {
    Create,
    Update {
        position: usize,
        id: NoteId,
        fields: NoteFields,
    },
    Delete {
        position: usize,
        id: NoteId,
    },
}

/// Keeps a note cache consistent with a `NoteStore` subscription.
pub struct NoteListController<S: NoteStore, O: ListObserver> {
    session: Session,
    store: S,
    observer: O,
    state: SyncState,
    subscription: Option<SubscriptionId>,
    cache: Vec<Note>,
    pending: BTreeMap<RequestId, PendingOp>,
    next_request: u64,
}

impl<S: NoteStore, O: ListObserver> NoteListController<S, O> {
    /// Creates an unsubscribed controller scoped to `session`.
    pub fn new(session: Session, store: S, observer: O) -> Self {
        Self {
            session,
            store,
            observer,
            state: SyncState::Unsubscribed,
            subscription: None,
            cache: Vec::new(),
            pending: BTreeMap::new(),
            next_request: 1,
        }
    }

    /// Creates a controller for the auth collaborator's current user.
    ///
    /// # Errors
    /// - `AuthRequired` when nobody is signed in.
    pub fn from_auth(auth: &impl AuthProvider, store: S, observer: O) -> SyncResult<Self> {
        let session = Session::from_auth(auth)?;
        Ok(Self::new(session, store, observer))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Current cache in snapshot order.
    pub fn notes(&self) -> &[Note] {
        &self.cache
    }

    pub fn note(&self, position: usize) -> Option<&Note> {
        self.cache.get(position)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of writes still waiting for a completion.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Opens the snapshot subscription.
    ///
    /// Idempotent while `Syncing`/`Synced`. From `Failed` it drops the dead
    /// subscription and starts a new one.
    pub fn subscribe(&mut self) -> SubscriptionId {
        if let (Some(subscription), SyncState::Syncing | SyncState::Synced) =
            (self.subscription, self.state)
        {
            return subscription;
        }

        if let Some(stale) = self.subscription.take() {
            self.store.unsubscribe(stale);
        }

        let subscription = self.store.subscribe(self.session.user_id());
        self.subscription = Some(subscription);
        self.state = SyncState::Syncing;
        info!(
            "event=sync_subscribe module=sync status=ok subscription={}",
            subscription.0
        );
        subscription
    }

    /// Tears the subscription down and discards the cache.
    ///
    /// In-flight writes are forgotten; their late completions are ignored.
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.store.unsubscribe(subscription);
            info!(
                "event=sync_unsubscribe module=sync status=ok subscription={}",
                subscription.0
            );
        }
        self.cache.clear();
        self.pending.clear();
        self.state = SyncState::Unsubscribed;
    }

    /// Validates a new note (raw emptiness) and submits it.
    ///
    /// The cache is left untouched; the note appears with the next snapshot.
    ///
    /// # Errors
    /// - `Validation` when a field is empty; the store is not called.
    pub fn create(&mut self, title: &str, description: &str) -> SyncResult<RequestId> {
        let fields = prepare_create(title, description).map_err(|report| self.reject(report))?;
        Ok(self.submit(PendingOp::Create, StoreOp::Create(fields)))
    }

    /// Validates an edit (trimmed emptiness) and submits it for the note at
    /// `position`.
    ///
    /// `expected_id` is the caller's last-known id for that position; when
    /// given it must still match.
    ///
    /// # Errors
    /// - `Validation` when a trimmed field is empty.
    /// - `NotFoundInCache` when `position` is out of range.
    /// - `StalePosition` when `expected_id` does not match.
    pub fn update(
        &mut self,
        position: usize,
        expected_id: Option<&NoteId>,
        title: &str,
        description: &str,
    ) -> SyncResult<RequestId> {
        let fields = prepare_edit(title, description).map_err(|report| self.reject(report))?;
        let id = self.resolve(position, expected_id)?;
        let op = StoreOp::Update {
            id: id.clone(),
            fields: fields.clone(),
        };
        Ok(self.submit(
            PendingOp::Update {
                position,
                id,
                fields,
            },
            op,
        ))
    }

    /// Submits a delete for the note at `position`.
    ///
    /// # Errors
    /// - `NotFoundInCache` when `position` is out of range or the cache is
    ///   empty; the observer gets `Notice::NothingToDelete`.
    /// - `StalePosition` when `expected_id` does not match.
    pub fn delete(
        &mut self,
        position: usize,
        expected_id: Option<&NoteId>,
    ) -> SyncResult<RequestId> {
        let id = match self.resolve(position, expected_id) {
            Ok(id) => id,
            Err(err @ SyncError::NotFoundInCache { .. }) => {
                self.observer.on_notice(&Notice::NothingToDelete);
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let op = StoreOp::Delete { id: id.clone() };
        Ok(self.submit(PendingOp::Delete { position, id }, op))
    }

    /// Drains store events and applies them in delivery order.
    ///
    /// Returns the number of events handled.
    pub fn pump(&mut self) -> usize {
        let events = self.store.poll_events();
        let count = events.len();
        for event in events {
            self.handle_event(event);
        }
        count
    }

    /// Applies one store event.
    pub fn handle_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot {
                subscription,
                notes,
            } => self.apply_snapshot(subscription, notes),
            StoreEvent::SubscriptionCancelled {
                subscription,
                error,
            } => self.apply_cancellation(subscription, &error),
            StoreEvent::Completed { request, outcome } => self.apply_completion(request, outcome),
        }
    }

    fn reject(&mut self, report: FormReport) -> SyncError {
        debug!(
            "event=sync_validate module=sync status=rejected mode={:?} missing={}",
            report.mode,
            report.missing_fields().len()
        );
        self.observer
            .on_notice(&Notice::InvalidForm(report.clone()));
        SyncError::Validation(report)
    }

    fn resolve(&self, position: usize, expected_id: Option<&NoteId>) -> SyncResult<NoteId> {
        let note = self
            .cache
            .get(position)
            .ok_or(SyncError::NotFoundInCache {
                position,
                len: self.cache.len(),
            })?;

        if let Some(expected) = expected_id {
            if *expected != note.id {
                return Err(SyncError::StalePosition {
                    position,
                    expected: expected.clone(),
                    actual: note.id.clone(),
                });
            }
        }
        Ok(note.id.clone())
    }

    fn submit(&mut self, pending: PendingOp, op: StoreOp) -> RequestId {
        let request = RequestId(self.next_request);
        self.next_request += 1;
        info!(
            "event=sync_mutation module=sync status=submitted op={} request={}",
            op.name(),
            request.0
        );
        self.store.submit(request, self.session.user_id(), op);
        self.pending.insert(request, pending);
        request
    }

    fn apply_snapshot(&mut self, subscription: SubscriptionId, notes: Vec<Note>) {
        if self.subscription != Some(subscription) {
            debug!(
                "event=sync_snapshot module=sync status=ignored subscription={}",
                subscription.0
            );
            return;
        }

        debug!(
            "event=sync_snapshot module=sync status=ok subscription={} count={}",
            subscription.0,
            notes.len()
        );
        self.cache = notes;
        self.state = SyncState::Synced;
        self.observer.on_replaced(&self.cache);
    }

    fn apply_cancellation(&mut self, subscription: SubscriptionId, error: &StoreError) {
        if self.subscription != Some(subscription) {
            return;
        }

        warn!(
            "event=sync_subscribe module=sync status=cancelled subscription={} error_code={}",
            subscription.0,
            error.kind.as_str()
        );
        self.state = SyncState::Failed;
        self.observer.on_failure(
            FailureKind::LoadFailed,
            &SyncError::StoreSubscription(error.clone()),
        );
    }

    fn apply_completion(&mut self, request: RequestId, outcome: StoreResult<Completion>) {
        let Some(pending) = self.pending.remove(&request) else {
            warn!(
                "event=sync_mutation module=sync status=unknown_request request={}",
                request.0
            );
            return;
        };

        match (pending, outcome) {
            (PendingOp::Create, Ok(Completion::Created(id))) => {
                info!(
                    "event=sync_mutation module=sync status=ok op=create request={} note_id={}",
                    request.0, id
                );
                self.observer.on_notice(&Notice::Created(id));
            }
            (
                PendingOp::Update {
                    position,
                    id,
                    fields,
                },
                Ok(Completion::Updated),
            ) => {
                self.apply_local_update(position, &id, &fields);
                self.observer.on_notice(&Notice::Updated(id));
            }
            (PendingOp::Delete { position, id }, Ok(Completion::Deleted)) => {
                self.apply_local_delete(position, &id);
                self.observer.on_notice(&Notice::Deleted(id));
            }
            (pending, Ok(completion)) => {
                let error = StoreError::new(
                    StoreErrorKind::Backend,
                    format!("unexpected completion {completion:?}"),
                );
                self.report_write_failure(request, &pending, &error);
            }
            (pending, Err(error)) => self.report_write_failure(request, &pending, &error),
        }
    }

    fn report_write_failure(
        &mut self,
        request: RequestId,
        pending: &PendingOp,
        error: &StoreError,
    ) {
        let kind = match pending {
            PendingOp::Create => FailureKind::CreateFailed,
            PendingOp::Update { .. } => FailureKind::UpdateFailed,
            PendingOp::Delete { .. } => FailureKind::DeleteFailed,
        };
        warn!(
            "event=sync_mutation module=sync status=error kind={} request={} error_code={}",
            kind.as_str(),
            request.0,
            error.kind.as_str()
        );
        self.observer
            .on_failure(kind, &SyncError::StoreWrite(error.clone()));
    }

    fn apply_local_update(&mut self, position: usize, id: &NoteId, fields: &NoteFields) {
        let Some(index) = self.locate(position, id) else {
            debug!("event=sync_mutation module=sync status=skipped op=update note_id={id}");
            return;
        };
        let note = &mut self.cache[index];
        note.apply_fields(fields);
        self.observer.on_changed(index, note);
    }

    fn apply_local_delete(&mut self, position: usize, id: &NoteId) {
        let Some(index) = self.locate(position, id) else {
            debug!("event=sync_mutation module=sync status=skipped op=delete note_id={id}");
            return;
        };
        let removed = self.cache.remove(index);
        self.observer.on_removed(index, &removed.id);
    }

    // Recorded position first; a snapshot may have moved the note since.
    fn locate(&self, position: usize, id: &NoteId) -> Option<usize> {
        match self.cache.get(position) {
            Some(note) if note.id == *id => Some(position),
            _ => self.cache.iter().position(|note| note.id == *id),
        }
    }
}
