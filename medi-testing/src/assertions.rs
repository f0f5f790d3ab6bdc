// Test assertions for spies and captured log lines

use crate::HandlerSpy;
use medi_log::{Level, MemoryLogger};
use std::fmt::Debug;

/// Assert that a spy received a specific payload
#[track_caller]
pub fn assert_called_with<P, R>(spy: &HandlerSpy<P, R>, expected: &P)
where
    P: Clone + PartialEq + Debug,
{
    assert!(
        spy.was_called_with(expected),
        "Expected handler to be called with {:?}, calls were {:?}",
        expected,
        spy.calls()
    );
}

/// Assert that a spy was never called
#[track_caller]
pub fn assert_not_called<P, R>(spy: &HandlerSpy<P, R>)
where
    P: Clone + Debug,
{
    assert!(
        !spy.was_called(),
        "Expected handler not to be called, calls were {:?}",
        spy.calls()
    );
}

/// Assert that a spy was called exactly `expected` times
#[track_caller]
pub fn assert_call_count<P: Clone, R>(spy: &HandlerSpy<P, R>, expected: usize) {
    let actual = spy.call_count();
    assert_eq!(
        actual, expected,
        "Expected {} call(s), got {}",
        expected, actual
    );
}

/// Assert that a warning containing `needle` was logged
#[track_caller]
pub fn assert_warned(logger: &MemoryLogger, needle: &str) {
    assert!(
        logger.contains(Level::Warn, needle),
        "Expected a warning containing '{}', warnings were {:?}",
        needle,
        logger.messages(Level::Warn)
    );
}
