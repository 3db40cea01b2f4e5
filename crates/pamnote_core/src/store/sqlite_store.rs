//! SQLite-backed note store.
//!
//! # Responsibility
//! - Persist notes under `notes/{userId}/{noteId}` in the `notes` table.
//! - Emulate a realtime store: queued completions plus full snapshots
//!   re-delivered to every live subscription after each change.
//!
//! # Invariants
//! - Work runs only inside `poll_events`, in submission order.
//! - A successful write queues `Completed` first, then one snapshot per live
//!   subscription of the same user.
//! - Snapshot order is insertion order (`seq ASC`).
//! - `update`/`delete` of a missing id complete with `NotFound`.

use super::{
    Completion, NoteStore, RequestId, StoreError, StoreErrorKind, StoreEvent, StoreOp,
    StoreResult, SubscriptionId,
};
use crate::db::{DbError, DbResult};
use crate::model::note::{Note, NoteFields, NoteId, NotePath, UserId};
use log::{debug, error, info, warn};
use rusqlite::{params, Connection};
use std::collections::{BTreeMap, VecDeque};
use uuid::Uuid;

#[derive(Debug)]
enum Work {
    InitialSnapshot(SubscriptionId),
    Write {
        request: RequestId,
        user_id: UserId,
        op: StoreOp,
    },
}

/// Note store over a migrated SQLite connection.
pub struct SqliteNoteStore {
    conn: Connection,
    subscriptions: BTreeMap<SubscriptionId, UserId>,
    next_subscription: u64,
    work: VecDeque<Work>,
    events: VecDeque<StoreEvent>,
}

impl SqliteNoteStore {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - Returns an error when the `notes` table is missing.
    pub fn try_new(conn: Connection) -> DbResult<Self> {
        ensure_store_connection_ready(&conn)?;
        Ok(Self {
            conn,
            subscriptions: BTreeMap::new(),
            next_subscription: 1,
            work: VecDeque::new(),
            events: VecDeque::new(),
        })
    }

    /// Returns the underlying connection for read-only inspection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Cancels every live subscription of `user_id` with `PermissionDenied`.
    ///
    /// Returns the number of cancelled subscriptions.
    pub fn revoke_access(&mut self, user_id: &UserId, reason: &str) -> usize {
        let revoked = self
            .subscriptions
            .iter()
            .filter(|(_, owner)| *owner == user_id)
            .map(|(subscription, _)| *subscription)
            .collect::<Vec<_>>();

        for subscription in &revoked {
            self.subscriptions.remove(subscription);
            self.events.push_back(StoreEvent::SubscriptionCancelled {
                subscription: *subscription,
                error: StoreError::new(StoreErrorKind::PermissionDenied, reason),
            });
        }

        if !revoked.is_empty() {
            warn!(
                "event=store_revoke module=store status=ok path={} cancelled={}",
                NotePath::collection(user_id),
                revoked.len()
            );
        }
        revoked.len()
    }

    /// Reads the current collection of `user_id` directly, in snapshot order.
    pub fn load_notes(&self, user_id: &UserId) -> DbResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, title, description
             FROM notes
             WHERE user_id = ?1
             ORDER BY seq ASC;",
        )?;
        let rows = stmt.query_map([user_id.as_str()], |row| {
            Ok(Note {
                id: NoteId::new(row.get::<_, String>("note_id")?),
                title: row.get("title")?,
                description: row.get("description")?,
            })
        })?;

        let mut notes = Vec::new();
        for row in rows {
            notes.push(row?);
        }
        Ok(notes)
    }

    fn run_work(&mut self, work: Work) {
        match work {
            Work::InitialSnapshot(subscription) => {
                if let Some(user_id) = self.subscriptions.get(&subscription).cloned() {
                    self.deliver_snapshot(subscription, &user_id);
                }
            }
            Work::Write {
                request,
                user_id,
                op,
            } => {
                let op_name = op.name();
                let outcome = self.apply_write(&user_id, op);
                match &outcome {
                    Ok(_) => debug!(
                        "event=store_write module=store status=ok op={} request={}",
                        op_name, request.0
                    ),
                    Err(err) => warn!(
                        "event=store_write module=store status=error op={} request={} error_code={}",
                        op_name,
                        request.0,
                        err.kind.as_str()
                    ),
                }
                let changed = outcome.is_ok();
                self.events
                    .push_back(StoreEvent::Completed { request, outcome });
                if changed {
                    self.notify_user(&user_id);
                }
            }
        }
    }

    fn apply_write(&self, user_id: &UserId, op: StoreOp) -> StoreResult<Completion> {
        match op {
            StoreOp::Create(fields) => self.insert_note(user_id, &fields).map(Completion::Created),
            StoreOp::Update { id, fields } => self
                .update_note(user_id, &id, &fields)
                .map(|()| Completion::Updated),
            StoreOp::Delete { id } => self.delete_note(user_id, &id).map(|()| Completion::Deleted),
        }
    }

    fn insert_note(&self, user_id: &UserId, fields: &NoteFields) -> StoreResult<NoteId> {
        let id = NoteId::new(Uuid::new_v4().to_string());
        self.conn
            .execute(
                "INSERT INTO notes (user_id, note_id, title, description)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    user_id.as_str(),
                    id.as_str(),
                    fields.title.as_str(),
                    fields.description.as_str(),
                ],
            )
            .map_err(backend_error)?;
        Ok(id)
    }

    fn update_note(&self, user_id: &UserId, id: &NoteId, fields: &NoteFields) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE notes
                 SET
                    title = ?3,
                    description = ?4,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE user_id = ?1
                   AND note_id = ?2;",
                params![
                    user_id.as_str(),
                    id.as_str(),
                    fields.title.as_str(),
                    fields.description.as_str(),
                ],
            )
            .map_err(backend_error)?;

        if changed == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    fn delete_note(&self, user_id: &UserId, id: &NoteId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM notes WHERE user_id = ?1 AND note_id = ?2;",
                params![user_id.as_str(), id.as_str()],
            )
            .map_err(backend_error)?;

        if changed == 0 {
            return Err(StoreError::not_found(id));
        }
        Ok(())
    }

    fn notify_user(&mut self, user_id: &UserId) {
        let targets = self
            .subscriptions
            .iter()
            .filter(|(_, owner)| *owner == user_id)
            .map(|(subscription, _)| *subscription)
            .collect::<Vec<_>>();
        for subscription in targets {
            self.deliver_snapshot(subscription, user_id);
        }
    }

    fn deliver_snapshot(&mut self, subscription: SubscriptionId, user_id: &UserId) {
        match self.load_notes(user_id) {
            Ok(notes) => {
                debug!(
                    "event=store_snapshot module=store status=ok subscription={} count={}",
                    subscription.0,
                    notes.len()
                );
                self.events.push_back(StoreEvent::Snapshot {
                    subscription,
                    notes,
                });
            }
            Err(err) => {
                error!(
                    "event=store_snapshot module=store status=error subscription={} error={}",
                    subscription.0, err
                );
                self.subscriptions.remove(&subscription);
                self.events.push_back(StoreEvent::SubscriptionCancelled {
                    subscription,
                    error: StoreError::new(StoreErrorKind::Backend, err.to_string()),
                });
            }
        }
    }
}

impl NoteStore for SqliteNoteStore {
    fn subscribe(&mut self, user_id: &UserId) -> SubscriptionId {
        let subscription = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(subscription, user_id.clone());
        self.work.push_back(Work::InitialSnapshot(subscription));
        info!(
            "event=store_subscribe module=store status=ok path={} subscription={}",
            NotePath::collection(user_id),
            subscription.0
        );
        subscription
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        if self.subscriptions.remove(&subscription).is_some() {
            self.events.retain(|event| match event {
                StoreEvent::Snapshot {
                    subscription: target,
                    ..
                }
                | StoreEvent::SubscriptionCancelled {
                    subscription: target,
                    ..
                } => *target != subscription,
                StoreEvent::Completed { .. } => true,
            });
            info!(
                "event=store_unsubscribe module=store status=ok subscription={}",
                subscription.0
            );
        }
    }

    fn submit(&mut self, request: RequestId, user_id: &UserId, op: StoreOp) {
        self.work.push_back(Work::Write {
            request,
            user_id: user_id.clone(),
            op,
        });
    }

    fn poll_events(&mut self) -> Vec<StoreEvent> {
        while let Some(work) = self.work.pop_front() {
            self.run_work(work);
        }
        self.events.drain(..).collect()
    }
}

fn backend_error(err: rusqlite::Error) -> StoreError {
    StoreError::new(StoreErrorKind::Backend, err.to_string())
}

fn ensure_store_connection_ready(conn: &Connection) -> DbResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'notes';",
        [],
        |row| row.get(0),
    )?;
    if exists == 0 {
        return Err(DbError::MissingTable("notes"));
    }
    Ok(())
}
