//! Domain-level constants.
//!
//! These constants define the form validation rules, client routes and the
//! shape of the simulated ledger identifiers.

// =============================================================================
// Credential Validation
// =============================================================================

/// Maximum email length after trimming
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 100;

/// Maximum display name length after trimming
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Routes
// =============================================================================

/// Unauthenticated entry route
pub const AUTH_ROUTE: &str = "/auth";

/// Authenticated main screen route
pub const MAIN_ROUTE: &str = "/";

// =============================================================================
// Sessions
// =============================================================================

/// Refresh a session this many seconds before it expires
pub const SESSION_REFRESH_MARGIN_SECONDS: i64 = 30;

/// User metadata key holding the display name given at sign-up
pub const FULL_NAME_METADATA_KEY: &str = "full_name";

// =============================================================================
// Ledger (simulated)
// =============================================================================

/// Shard and realm prefix of ledger account and token identifiers
pub const LEDGER_ID_PREFIX: &str = "0.0.";

/// Lowest simulated account number (inclusive)
pub const MIN_SIMULATED_ACCOUNT: u32 = 100_000;

/// Highest simulated account number (exclusive)
pub const MAX_SIMULATED_ACCOUNT: u32 = 1_000_000;

/// Highest simulated token number (exclusive)
pub const MAX_SIMULATED_TOKEN: u32 = 1_000_000;

/// Highest simulated NFT serial number (exclusive)
pub const MAX_SIMULATED_SERIAL: u32 = 10_000;

/// Build a ledger identifier (`0.0.N`) from its entity number
pub fn ledger_id(number: u32) -> String {
    format!("{}{}", LEDGER_ID_PREFIX, number)
}
