//! Local session persistence.

mod session_storage;

pub use session_storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

#[cfg(any(test, feature = "test-utils"))]
pub use session_storage::MockSessionStorage;
