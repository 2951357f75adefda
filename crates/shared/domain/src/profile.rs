//! Profile linked to an authenticated user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-user record holding the linked external account identifier.
///
/// The identifier is opaque: it is stored and displayed, never checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same identifier as the owning user
    pub id: Uuid,
    /// Linked wallet/account (None = not linked)
    pub external_account_id: Option<String>,
}
