//! Tests for tracing initialization.

use std::sync::Mutex;

use revcycle_core::tracing::setup::init_tracing;

/// Serializes tests that touch REVCYCLE_LOG.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_per_module_filter_accepted() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("REVCYCLE_LOG", "revcycle_storage=debug,revcycle_core=warn");
    init_tracing();
    std::env::remove_var("REVCYCLE_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("REVCYCLE_LOG", "=====not[a]filter");
    init_tracing();
    std::env::remove_var("REVCYCLE_LOG");
}
