//! Shared test support.

/// Route tracing output through the test harness so recovery and
/// rotation logs show up in failing-test output. Safe to call from
/// every test; only the first call installs the subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
