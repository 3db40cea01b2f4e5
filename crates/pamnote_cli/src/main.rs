//! CLI smoke entry point.
//!
//! Verifies `pamnote_core` linkage and that a migrated in-memory note store
//! can be opened.

use pamnote_core::db::open_db_in_memory;
use pamnote_core::SqliteNoteStore;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("pamnote_core ping={}", pamnote_core::ping());
    println!("pamnote_core version={}", pamnote_core::core_version());

    match open_db_in_memory().and_then(SqliteNoteStore::try_new) {
        Ok(_) => {
            println!("pamnote_core store=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("pamnote_core store=error {err}");
            ExitCode::FAILURE
        }
    }
}
