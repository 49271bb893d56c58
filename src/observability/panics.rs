//! Panic reporting.
//!
//! Handler and background task panics are caught and logged as one `ERROR`
//! record by whoever catches them. The hook installed here keeps Rust's
//! default stderr report out of the log stream on runtime threads, and
//! remembers where the panic happened so the catch point can include it.

use std::any::Any;
use std::cell::RefCell;
use std::panic;
use std::sync::Once;

use crate::observability::logging::Properties;

thread_local! {
    static LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL: Once = Once::new();

/// Replace the process panic hook. Only the first call has an effect.
///
/// Panics on threads outside a Tokio runtime still reach the previous hook.
pub fn install_hook() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
            LOCATION.with(|cell| *cell.borrow_mut() = location);

            if tokio::runtime::Handle::try_current().is_err() {
                previous(info);
            }
        }));
    });
}

/// Location of the last panic on this thread, if the hook saw one.
pub fn take_location() -> Option<String> {
    LOCATION.with(|cell| cell.borrow_mut().take())
}

/// Add `panic_location` to `properties` when it is known.
pub fn with_location(mut properties: Properties) -> Properties {
    if let Some(location) = take_location() {
        properties.insert("panic_location".to_string(), location);
    }
    properties
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
