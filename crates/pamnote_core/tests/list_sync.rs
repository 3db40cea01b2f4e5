use pamnote_core::{
    Completion, FailureKind, ListEvent, ListEventLog, Note, NoteFields, NoteId, NoteListController,
    NoteStore, Notice, RequestId, Session, StoreError, StoreErrorKind, StoreEvent, StoreOp,
    SubscriptionId, SyncError, SyncState, UserId,
};

/// Store fake that records calls; tests deliver events by hand.
#[derive(Default)]
struct ScriptedStore {
    subscribed: Vec<(SubscriptionId, UserId)>,
    unsubscribed: Vec<SubscriptionId>,
    submitted: Vec<(RequestId, UserId, StoreOp)>,
    queued: Vec<StoreEvent>,
    next_subscription: u64,
}

impl NoteStore for ScriptedStore {
    fn subscribe(&mut self, user_id: &UserId) -> SubscriptionId {
        self.next_subscription += 1;
        let subscription = SubscriptionId(self.next_subscription);
        self.subscribed.push((subscription, user_id.clone()));
        subscription
    }

    fn unsubscribe(&mut self, subscription: SubscriptionId) {
        self.unsubscribed.push(subscription);
    }

    fn submit(&mut self, request: RequestId, user_id: &UserId, op: StoreOp) {
        self.submitted.push((request, user_id.clone(), op));
    }

    fn poll_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.queued)
    }
}

type Controller = NoteListController<ScriptedStore, ListEventLog>;

fn controller() -> Controller {
    let session = Session::new("u1", None).unwrap();
    NoteListController::new(session, ScriptedStore::default(), ListEventLog::new())
}

fn note(id: &str, title: &str, description: &str) -> Note {
    Note::from_fields(NoteId::new(id), NoteFields::new(title, description))
}

fn snapshot(subscription: SubscriptionId, notes: Vec<Note>) -> StoreEvent {
    StoreEvent::Snapshot {
        subscription,
        notes,
    }
}

fn synced(notes: Vec<Note>) -> (Controller, SubscriptionId) {
    let mut controller = controller();
    let subscription = controller.subscribe();
    controller.handle_event(snapshot(subscription, notes));
    controller.observer_mut().drain();
    (controller, subscription)
}

#[test]
fn subscribe_moves_to_syncing_then_synced_on_first_snapshot() {
    let mut controller = controller();
    assert_eq!(controller.state(), SyncState::Unsubscribed);

    let subscription = controller.subscribe();
    assert_eq!(controller.state(), SyncState::Syncing);
    assert_eq!(
        controller.store().subscribed,
        vec![(subscription, UserId::new("u1"))]
    );

    let notes = vec![note("a", "T1", "D1"), note("b", "T2", "D2")];
    controller.handle_event(snapshot(subscription, notes.clone()));
    assert_eq!(controller.state(), SyncState::Synced);
    assert_eq!(controller.notes(), notes.as_slice());
    assert_eq!(
        controller.observer().events(),
        &[ListEvent::Replaced(notes)]
    );
}

#[test]
fn subscribe_is_idempotent_while_live() {
    let mut controller = controller();
    let first = controller.subscribe();
    let second = controller.subscribe();
    assert_eq!(first, second);
    assert_eq!(controller.store().subscribed.len(), 1);
}

#[test]
fn snapshot_order_is_kept_as_delivered() {
    let (mut controller, subscription) = synced(vec![note("a", "A", "a")]);
    let reordered = vec![note("c", "C", "c"), note("a", "A", "a"), note("b", "B", "b")];
    controller.handle_event(snapshot(subscription, reordered.clone()));
    assert_eq!(controller.notes(), reordered.as_slice());
}

#[test]
fn replaying_identical_snapshot_is_observationally_a_no_op() {
    let notes = vec![note("a", "T1", "D1")];
    let (mut controller, subscription) = synced(notes.clone());
    let before = controller.notes().to_vec();

    controller.handle_event(snapshot(subscription, notes.clone()));
    assert_eq!(controller.notes(), before.as_slice());
    assert_eq!(controller.state(), SyncState::Synced);
    assert_eq!(controller.observer().events(), &[ListEvent::Replaced(notes)]);
}

#[test]
fn create_with_empty_title_fails_validation_without_store_call() {
    let mut controller = controller();
    let err = controller.create("", "X").unwrap_err();
    match err {
        SyncError::Validation(report) => {
            assert!(report.title_missing);
            assert!(!report.description_missing);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(controller.store().submitted.is_empty());
    assert!(matches!(
        controller.observer().events(),
        [ListEvent::Notice(Notice::InvalidForm(_))]
    ));
}

#[test]
fn create_accepts_whitespace_only_fields() {
    let mut controller = controller();
    controller.create("  ", " ").unwrap();
    assert_eq!(
        controller.store().submitted[0].2,
        StoreOp::Create(NoteFields::new("  ", " "))
    );
}

#[test]
fn successful_create_does_not_touch_cache_until_snapshot() {
    let (mut controller, subscription) = synced(vec![note("a", "T1", "D1")]);
    let request = controller.create("New", "Body").unwrap();
    assert_eq!(controller.pending_count(), 1);

    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Created(NoteId::new("b"))),
    });
    assert_eq!(controller.len(), 1);
    assert_eq!(controller.pending_count(), 0);
    assert_eq!(
        controller.observer_mut().drain(),
        vec![ListEvent::Notice(Notice::Created(NoteId::new("b")))]
    );

    controller.handle_event(snapshot(
        subscription,
        vec![note("a", "T1", "D1"), note("b", "New", "Body")],
    ));
    assert_eq!(controller.len(), 2);
    assert_eq!(controller.notes()[1].id, NoteId::new("b"));
}

#[test]
fn failed_create_reports_create_failed_and_keeps_cache() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);
    let request = controller.create("New", "Body").unwrap();
    let error = StoreError::new(StoreErrorKind::Disconnected, "offline");
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Err(error.clone()),
    });

    assert_eq!(controller.notes(), &[note("a", "T1", "D1")]);
    assert_eq!(
        controller.observer().events(),
        &[ListEvent::Failed {
            kind: FailureKind::CreateFailed,
            error: SyncError::StoreWrite(error),
        }]
    );
}

#[test]
fn update_applies_in_place_and_notifies_before_next_snapshot() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);

    let request = controller.update(0, None, "T2", "D2").unwrap();
    let (_, user, op) = controller.store().submitted[0].clone();
    assert_eq!(user, UserId::new("u1"));
    assert_eq!(
        op,
        StoreOp::Update {
            id: NoteId::new("a"),
            fields: NoteFields::new("T2", "D2"),
        }
    );
    // Nothing changes before the completion.
    assert_eq!(controller.notes()[0].title, "T1");

    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Updated),
    });
    assert_eq!(controller.notes(), &[note("a", "T2", "D2")]);
    assert_eq!(
        controller.observer().events(),
        &[
            ListEvent::Changed {
                position: 0,
                note: note("a", "T2", "D2"),
            },
            ListEvent::Notice(Notice::Updated(NoteId::new("a"))),
        ]
    );
}

#[test]
fn update_trims_fields_and_rejects_whitespace_only_input() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);

    let err = controller.update(0, None, "   ", "D2").unwrap_err();
    assert!(matches!(err, SyncError::Validation(report) if report.title_missing));
    assert!(controller.store().submitted.is_empty());

    controller.update(0, None, "  T2 ", " D2 ").unwrap();
    assert_eq!(
        controller.store().submitted[0].2,
        StoreOp::Update {
            id: NoteId::new("a"),
            fields: NoteFields::new("T2", "D2"),
        }
    );
}

#[test]
fn failed_update_leaves_cache_untouched() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);
    let request = controller.update(0, None, "T2", "D2").unwrap();
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Err(StoreError::not_found(&NoteId::new("a"))),
    });

    assert_eq!(controller.notes(), &[note("a", "T1", "D1")]);
    assert!(matches!(
        controller.observer().events(),
        [ListEvent::Failed {
            kind: FailureKind::UpdateFailed,
            error: SyncError::StoreWrite(err),
        }] if err.kind == StoreErrorKind::NotFound
    ));
}

#[test]
fn update_out_of_range_or_stale_id_is_rejected() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);

    let err = controller.update(3, None, "T", "D").unwrap_err();
    assert_eq!(err, SyncError::NotFoundInCache { position: 3, len: 1 });

    let err = controller
        .update(0, Some(&NoteId::new("zz")), "T", "D")
        .unwrap_err();
    assert!(matches!(err, SyncError::StalePosition { position: 0, .. }));
    assert!(controller.store().submitted.is_empty());
}

#[test]
fn delete_in_range_calls_store_with_id_and_removes_on_success() {
    let (mut controller, _) = synced(vec![note("a", "A", "a"), note("b", "B", "b")]);

    let request = controller.delete(1, Some(&NoteId::new("b"))).unwrap();
    assert_eq!(
        controller.store().submitted[0].2,
        StoreOp::Delete {
            id: NoteId::new("b")
        }
    );
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Deleted),
    });

    assert!(controller.notes().iter().all(|n| n.id != NoteId::new("b")));
    assert_eq!(
        controller.observer().events(),
        &[
            ListEvent::Removed {
                position: 1,
                id: NoteId::new("b"),
            },
            ListEvent::Notice(Notice::Deleted(NoteId::new("b"))),
        ]
    );
}

#[test]
fn delete_on_empty_cache_reports_nothing_to_delete() {
    let mut controller = controller();
    let err = controller.delete(0, None).unwrap_err();
    assert_eq!(err, SyncError::NotFoundInCache { position: 0, len: 0 });
    assert!(controller.store().submitted.is_empty());
    assert_eq!(
        controller.observer().events(),
        &[ListEvent::Notice(Notice::NothingToDelete)]
    );
}

#[test]
fn delete_out_of_range_never_calls_store() {
    let (mut controller, _) = synced(vec![note("a", "A", "a")]);
    assert!(controller.delete(1, None).is_err());
    assert!(controller.store().submitted.is_empty());
}

#[test]
fn failed_delete_leaves_cache_untouched() {
    let (mut controller, _) = synced(vec![note("a", "A", "a")]);
    let request = controller.delete(0, None).unwrap();
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Err(StoreError::new(StoreErrorKind::PermissionDenied, "denied")),
    });
    assert_eq!(controller.len(), 1);
    assert!(matches!(
        controller.observer().events(),
        [ListEvent::Failed {
            kind: FailureKind::DeleteFailed,
            error: SyncError::StoreWrite(err),
        }] if err.kind == StoreErrorKind::PermissionDenied
    ));
}

#[test]
fn snapshot_after_local_update_wins() {
    let (mut controller, subscription) = synced(vec![note("a", "T1", "D1")]);
    let request = controller.update(0, None, "T2", "D2").unwrap();
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Updated),
    });
    controller.handle_event(snapshot(subscription, vec![note("a", "T3", "D3")]));
    assert_eq!(controller.notes(), &[note("a", "T3", "D3")]);
}

#[test]
fn completion_after_snapshot_moved_note_applies_by_id() {
    let (mut controller, subscription) = synced(vec![note("a", "A", "a"), note("b", "B", "b")]);
    let request = controller.update(1, None, "B2", "b2").unwrap();
    controller.handle_event(snapshot(
        subscription,
        vec![note("b", "B", "b"), note("a", "A", "a")],
    ));
    controller.observer_mut().drain();

    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Updated),
    });
    assert_eq!(controller.notes()[0], note("b", "B2", "b2"));
    assert_eq!(controller.notes()[1], note("a", "A", "a"));
    assert!(matches!(
        controller.observer().events()[0],
        ListEvent::Changed { position: 0, .. }
    ));
}

#[test]
fn delete_completion_after_snapshot_already_removed_note_is_skipped() {
    let (mut controller, subscription) = synced(vec![note("a", "A", "a"), note("b", "B", "b")]);
    let request = controller.delete(0, None).unwrap();
    controller.handle_event(snapshot(subscription, vec![note("b", "B", "b")]));
    controller.observer_mut().drain();

    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Deleted),
    });
    assert_eq!(controller.notes(), &[note("b", "B", "b")]);
    assert_eq!(
        controller.observer().events(),
        &[ListEvent::Notice(Notice::Deleted(NoteId::new("a")))]
    );
}

#[test]
fn subscription_error_moves_to_failed_and_keeps_cache() {
    let (mut controller, subscription) = synced(vec![note("a", "A", "a")]);
    let error = StoreError::new(StoreErrorKind::PermissionDenied, "revoked");
    controller.handle_event(StoreEvent::SubscriptionCancelled {
        subscription,
        error: error.clone(),
    });

    assert_eq!(controller.state(), SyncState::Failed);
    assert_eq!(controller.notes(), &[note("a", "A", "a")]);
    assert_eq!(
        controller.observer().events(),
        &[ListEvent::Failed {
            kind: FailureKind::LoadFailed,
            error: SyncError::StoreSubscription(error),
        }]
    );
    assert!(controller.store().unsubscribed.is_empty());
}

#[test]
fn resubscribe_after_failure_starts_new_subscription() {
    let (mut controller, first) = synced(vec![note("a", "A", "a")]);
    controller.handle_event(StoreEvent::SubscriptionCancelled {
        subscription: first,
        error: StoreError::new(StoreErrorKind::Disconnected, "lost"),
    });

    let second = controller.subscribe();
    assert_ne!(first, second);
    assert_eq!(controller.state(), SyncState::Syncing);
    assert_eq!(controller.store().unsubscribed, vec![first]);

    // Late events of the dead subscription are ignored.
    controller.handle_event(snapshot(first, vec![]));
    assert_eq!(controller.state(), SyncState::Syncing);
    assert_eq!(controller.len(), 1);
}

#[test]
fn unsubscribe_clears_cache_and_ignores_later_snapshots() {
    let (mut controller, subscription) = synced(vec![note("a", "A", "a")]);
    controller.unsubscribe();
    assert_eq!(controller.state(), SyncState::Unsubscribed);
    assert!(controller.is_empty());
    assert_eq!(controller.store().unsubscribed, vec![subscription]);

    controller.handle_event(snapshot(subscription, vec![note("a", "A", "a")]));
    assert!(controller.is_empty());
}

#[test]
fn pump_dispatches_queued_events_in_order() {
    let mut controller = controller();
    let subscription = controller.subscribe();
    let request = controller.create("T", "D").unwrap();
    controller.store_mut().queued = vec![
        StoreEvent::Completed {
            request,
            outcome: Ok(Completion::Created(NoteId::new("a"))),
        },
        snapshot(subscription, vec![note("a", "T", "D")]),
    ];

    assert_eq!(controller.pump(), 2);
    assert_eq!(controller.state(), SyncState::Synced);
    assert_eq!(
        controller.observer().events(),
        &[
            ListEvent::Notice(Notice::Created(NoteId::new("a"))),
            ListEvent::Replaced(vec![note("a", "T", "D")]),
        ]
    );
}

#[test]
fn unknown_completion_is_ignored() {
    let (mut controller, _) = synced(vec![note("a", "A", "a")]);
    controller.handle_event(StoreEvent::Completed {
        request: RequestId(99),
        outcome: Ok(Completion::Deleted),
    });
    assert_eq!(controller.len(), 1);
    assert!(controller.observer().events().is_empty());
}

#[test]
fn unsubscribe_forgets_in_flight_writes() {
    let (mut controller, _) = synced(vec![note("a", "T1", "D1")]);
    let request = controller.update(0, None, "T2", "D2").unwrap();
    assert_eq!(controller.pending_count(), 1);

    controller.unsubscribe();
    assert_eq!(controller.pending_count(), 0);

    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Ok(Completion::Updated),
    });
    assert!(controller.observer().events().is_empty());
    assert!(controller.is_empty());
}

#[test]
fn failure_errors_keep_store_cause_as_source() {
    use std::error::Error;

    let (mut controller, subscription) = synced(vec![note("a", "A", "a")]);
    let request = controller.delete(0, None).unwrap();
    controller.handle_event(StoreEvent::Completed {
        request,
        outcome: Err(StoreError::new(StoreErrorKind::Disconnected, "offline")),
    });
    controller.handle_event(StoreEvent::SubscriptionCancelled {
        subscription,
        error: StoreError::new(StoreErrorKind::Disconnected, "offline"),
    });

    let errors = controller
        .observer()
        .events()
        .iter()
        .filter_map(|event| match event {
            ListEvent::Failed { error, .. } => Some(error.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(errors.len(), 2);
    assert!(matches!(errors[0], SyncError::StoreWrite(_)));
    assert!(matches!(errors[1], SyncError::StoreSubscription(_)));
    for error in &errors {
        let source = error.source().expect("store cause should be kept");
        assert_eq!(source.to_string(), "disconnected: offline");
    }
}
