//! Per-invocation diagnostic context
//!
//! Work running concurrently on behalf of different databases interleaves its
//! log output. A [`DiagnosticScope`] tags everything executed while it is alive
//! with the database identity: it enters a `tracing` span carrying the name and
//! publishes the name on the current thread so the work itself can read it
//! through [`current_database`]. Dropping the scope restores whatever was there
//! before, on every exit path including unwinding.

use std::cell::RefCell;

/// Database identity used when the caller does not supply one.
pub const SYSTEM_DATABASE: &str = "<system>";

thread_local! {
    static CURRENT_DATABASE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Scoped database tag for the current thread.
#[must_use = "the diagnostic context is cleared as soon as the scope is dropped"]
pub struct DiagnosticScope {
    previous: Option<String>,
    _span: tracing::span::EnteredSpan,
}

impl DiagnosticScope {
    pub fn enter(database: &str) -> Self {
        let previous = CURRENT_DATABASE.with(|current| current.replace(Some(database.to_owned())));
        let span = tracing::info_span!("database", name = %database).entered();
        Self {
            previous,
            _span: span,
        }
    }
}

impl Drop for DiagnosticScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_DATABASE.with(|current| *current.borrow_mut() = previous);
    }
}

/// Database tag of the innermost live scope on this thread, if any.
pub fn current_database() -> Option<String> {
    CURRENT_DATABASE.with(|current| current.borrow().clone())
}
