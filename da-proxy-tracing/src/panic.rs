// std
use std::{
    any::Any,
    backtrace::{Backtrace, BacktraceStatus},
    panic::PanicHookInfo,
};
// crates
// internal

/// Message a panic was raised with, for the `&str` and `String` payloads `panic!` produces.
pub fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    match payload.downcast_ref::<&'static str>() {
        Some(message) => Some(*message),
        None => payload.downcast_ref::<String>().map(String::as_str),
    }
}

/// Report panics through `tracing` so they reach the configured logger.
pub fn panic_hook(info: &PanicHookInfo) {
    let thread = std::thread::current();
    let backtrace = Backtrace::capture();
    let backtrace = match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    };

    tracing::error!(
        panic.message = panic_message(info.payload()),
        panic.thread = thread.name().unwrap_or("<unnamed>"),
        panic.location = info.location().map(ToString::to_string),
        panic.backtrace = backtrace,
        "Thread panicked",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_literal_and_formatted_panics() {
        let literal = std::panic::catch_unwind(|| panic!("store closed")).unwrap_err();
        assert_eq!(panic_message(literal.as_ref()), Some("store closed"));

        let attempts = 3;
        let formatted =
            std::panic::catch_unwind(|| panic!("gave up after {attempts} polls")).unwrap_err();
        assert_eq!(panic_message(formatted.as_ref()), Some("gave up after 3 polls"));
    }

    #[test]
    fn other_payloads_have_no_message() {
        let payload: Box<dyn Any + Send> = Box::new(42u64);
        assert_eq!(panic_message(payload.as_ref()), None);
    }
}
