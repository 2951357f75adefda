//! Water-rights tokenization values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Field, ValidationError};

/// Positive, finite amount of water to tokenize.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Gallons(f64);

impl Gallons {
    /// Parse a user-entered amount.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let amount: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidFormat(Field::Gallons))?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::InvalidFormat(Field::Gallons));
        }

        Ok(Self(amount))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Gallons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of minting a water-rights NFT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub token_id: String,
    pub serial: u32,
    pub gallons: Gallons,
}

impl MintReceipt {
    /// One-line summary shown with the success notification
    pub fn summary(&self) -> String {
        format!(
            "NFT ID: {} | Serial: {} | {} gallons",
            self.token_id, self.serial, self.gallons
        )
    }
}
