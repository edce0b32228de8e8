//! Email addresses, normalized for case-insensitive matching.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// A validated, lowercased email address.
///
/// Email is the natural key across the provisioning boundary and all
/// matching is case-insensitive, so the address is normalized once at
/// construction and compared by value afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse and normalize an email address.
    ///
    /// Shape check only (non-empty local and domain parts around one `@`,
    /// no whitespace); deliverability is the mail layer's problem.
    pub fn parse(raw: &str) -> Result<Self, AccessError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AccessError::validation("email must not be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(AccessError::validation(format!(
                "email must not contain whitespace: {trimmed}"
            )));
        }
        match trimmed.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(trimmed.to_lowercase()))
            }
            _ => Err(AccessError::validation(format!("invalid email: {trimmed}"))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmailAddress {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
