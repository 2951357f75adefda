//! Service layer - profile use cases.

mod profile_sync;

pub use profile_sync::{ProfileSync, ProfileSynchronizer};

#[cfg(any(test, feature = "test-utils"))]
pub use profile_sync::MockProfileSynchronizer;
