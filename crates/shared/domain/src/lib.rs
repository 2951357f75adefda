//! Domain layer - Credentials, sessions, profiles and tokenization values.
//!
//! This crate contains pure domain logic with no infrastructure dependencies.
//! Nothing here performs IO; validation failures never reach the network.

pub mod asset;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod profile;
pub mod session;

pub use asset::{Gallons, MintReceipt};
pub use constants::*;
pub use credentials::{Email, FullName, Password, SignInCredentials, SignUpCredentials};
pub use error::{Field, ValidationError};
pub use profile::Profile;
pub use session::{AuthUser, Session};
