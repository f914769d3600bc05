//! Test utilities and shared test helpers for the relay workspace.
//!
//! Enabled for unit tests and, through the `testing` feature, for the
//! integration tests of the other crates.

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        // Another test harness may already own the global subscriber.
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Identity fixtures shared by relay tests.
pub mod fixtures {
    use crate::types::{ConversationId, RequesterId};

    /// A user id as it appears in direct chats.
    pub const fn test_requester() -> RequesterId {
        RequesterId(424_242_424)
    }

    /// A supergroup id (negative, as the platform assigns them).
    pub const fn test_group() -> ConversationId {
        ConversationId(-1_001_234_567_890)
    }
}
