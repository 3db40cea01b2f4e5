//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the note list session to Dart via FRB.
//! - Pump store events on every call so results are visible on return.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - At most one note list session is open per process.
//! - Calls are serialized through one mutex.

use log::warn;
use pamnote_core::db::open_db;
use pamnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ListEvent, ListEventLog, Note, NoteId, NoteListController, Session, SqliteNoteStore, SyncError,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const NOTES_DB_FILE_NAME: &str = "pamnote.sqlite3";
static NOTES_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static NOTE_LIST: Mutex<Option<NoteList>> = Mutex::new(None);

type NoteList = NoteListController<SqliteNoteStore, ListEventLog>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Response envelope for every note list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteListResponse {
    /// Whether the requested operation succeeded.
    pub ok: bool,
    /// Short toast-style message.
    pub message: String,
    /// Sync state (`unsubscribed|syncing|synced|failed`).
    pub state: String,
    /// Current cache in display order.
    pub items: Vec<NoteItem>,
    /// Signed-in user id of the open list, for the account header.
    pub user_id: Option<String>,
    /// Signed-in user email of the open list, when known.
    pub email: Option<String>,
}

impl NoteListResponse {
    fn closed(ok: bool, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
            state: "unsubscribed".to_string(),
            items: Vec::new(),
            user_id: None,
            email: None,
        }
    }
}

/// Opens the note list for `user_id`, replacing any open session.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Blank `user_id` fails with an auth error; nothing is opened.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_open(user_id: String, email: Option<String>) -> NoteListResponse {
    let session = match Session::new(user_id, email) {
        Ok(session) => session,
        Err(err) => return NoteListResponse::closed(false, format!("notes_open failed: {err}")),
    };
    let store = match open_db(resolve_notes_db_path())
        .and_then(SqliteNoteStore::try_new)
    {
        Ok(store) => store,
        Err(err) => return NoteListResponse::closed(false, format!("notes_open failed: {err}")),
    };

    let mut guard = match lock_note_list() {
        Ok(guard) => guard,
        Err(message) => return NoteListResponse::closed(false, message),
    };
    if let Some(previous) = guard.as_mut() {
        previous.unsubscribe();
    }

    let mut list = NoteListController::new(session, store, ListEventLog::new());
    list.subscribe();
    let response = settle(&mut list, Ok(()));
    *guard = Some(list);
    response
}

/// Re-reads pending store events and returns the current list.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_refresh() -> NoteListResponse {
    with_note_list(|_| Ok(()))
}

/// Submits a new note (fields checked for raw emptiness).
#[flutter_rust_bridge::frb(sync)]
pub fn notes_create(title: String, description: String) -> NoteListResponse {
    with_note_list(|list| list.create(&title, &description).map(drop))
}

/// Edits the note at `position` (fields trimmed before submit).
///
/// `expected_id`, when set, must match the note currently at `position`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_update(
    position: u32,
    title: String,
    description: String,
    expected_id: Option<String>,
) -> NoteListResponse {
    let expected = expected_id.map(NoteId::new);
    with_note_list(|list| {
        list.update(position as usize, expected.as_ref(), &title, &description)
            .map(drop)
    })
}

/// Deletes the note at `position`.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_delete(position: u32, expected_id: Option<String>) -> NoteListResponse {
    let expected = expected_id.map(NoteId::new);
    with_note_list(|list| list.delete(position as usize, expected.as_ref()).map(drop))
}

/// Closes the open note list, if any.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_close() -> NoteListResponse {
    match lock_note_list() {
        Ok(mut guard) => {
            if let Some(mut list) = guard.take() {
                list.unsubscribe();
            }
            NoteListResponse::closed(true, "Note list closed.")
        }
        Err(message) => NoteListResponse::closed(false, message),
    }
}

fn with_note_list(f: impl FnOnce(&mut NoteList) -> Result<(), SyncError>) -> NoteListResponse {
    let mut guard = match lock_note_list() {
        Ok(guard) => guard,
        Err(message) => return NoteListResponse::closed(false, message),
    };
    match guard.as_mut() {
        Some(list) => {
            let result = f(list);
            settle(list, result)
        }
        None => NoteListResponse::closed(false, "No note list is open."),
    }
}

// Pumps store events, then folds operation result and observer events into
// one response.
fn settle(list: &mut NoteList, result: Result<(), SyncError>) -> NoteListResponse {
    list.pump();
    let events = list.observer_mut().drain();

    let mut ok = result.is_ok();
    let mut message = None;
    for event in &events {
        match event {
            ListEvent::Failed { kind, .. } => {
                ok = false;
                message = Some(kind.user_message().to_string());
            }
            ListEvent::Notice(notice) if ok || message.is_none() => {
                message = Some(notice.user_message().to_string());
            }
            _ => {}
        }
    }
    if let Err(err) = &result {
        warn!("event=ffi_call module=ffi status=error error={err}");
        message.get_or_insert_with(|| err.to_string());
    }

    let items = list.notes().iter().map(to_note_item).collect::<Vec<_>>();
    NoteListResponse {
        ok,
        message: message.unwrap_or_else(|| format!("{} note(s).", items.len())),
        state: list.state().as_str().to_string(),
        items,
        user_id: Some(list.session().user_id().to_string()),
        email: list.session().email().map(str::to_string),
    }
}

fn lock_note_list() -> Result<MutexGuard<'static, Option<NoteList>>, String> {
    NOTE_LIST
        .lock()
        .map_err(|_| "note list state is poisoned".to_string())
}

fn resolve_notes_db_path() -> PathBuf {
    NOTES_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PAMNOTE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(NOTES_DB_FILE_NAME)
        })
        .clone()
}

fn to_note_item(note: &Note) -> NoteItem {
    NoteItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        description: note.description.clone(),
    }
}
