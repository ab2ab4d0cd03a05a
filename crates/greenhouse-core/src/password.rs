//! Local password policy and suggestion generator.
//!
//! The policy is enforced client-side before any network call:
//! minimum 8 characters, at least one uppercase letter, one digit,
//! and one special character. The backend may apply its own rules on
//! top; this module only guards what the client sends.

use core::fmt;

use rand::Rng;

use crate::error::{Error, Result};

/// Character set used for suggested passwords.
const SUGGESTION_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()_+";

/// Length of suggested passwords.
const SUGGESTION_LEN: usize = 12;

/// Attempt budget for the generate-then-validate loop. A 12-character
/// draw from the charset fails the policy rarely enough that this cap
/// is unreachable in practice, but it bounds pathological RNG streams.
const MAX_SUGGESTION_ATTEMPTS: u32 = 32;

/// An unmet password policy requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordIssue {
    /// Fewer than 8 characters.
    TooShort,
    /// No uppercase letter.
    MissingUppercase,
    /// No digit.
    MissingDigit,
    /// No special character.
    MissingSpecial,
}

impl fmt::Display for PasswordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordIssue::TooShort => write!(f, "minimum 8 characters"),
            PasswordIssue::MissingUppercase => write!(f, "at least 1 uppercase letter"),
            PasswordIssue::MissingDigit => write!(f, "at least 1 digit"),
            PasswordIssue::MissingSpecial => write!(f, "at least 1 special character"),
        }
    }
}

/// Check a password against the local policy.
///
/// Returns every unmet requirement, so a form can show all of them at
/// once. An empty result means the password is acceptable.
#[must_use]
pub fn validate_password(password: &str) -> Vec<PasswordIssue> {
    let mut issues = Vec::new();
    if password.chars().count() < 8 {
        issues.push(PasswordIssue::TooShort);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push(PasswordIssue::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push(PasswordIssue::MissingDigit);
    }
    if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        issues.push(PasswordIssue::MissingSpecial);
    }
    issues
}

/// Check a password, returning an error listing every violation.
pub fn require_valid_password(password: &str) -> Result<()> {
    let issues = validate_password(password);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::PasswordPolicy { issues })
    }
}

/// Generate a random password that satisfies the policy.
///
/// Draws candidates from the fixed charset and validates each one,
/// retrying up to a fixed attempt budget rather than looping
/// unboundedly.
pub fn suggest_password() -> Result<String> {
    let mut rng = rand::rng();
    for _ in 0..MAX_SUGGESTION_ATTEMPTS {
        let candidate: String = (0..SUGGESTION_LEN)
            .map(|_| SUGGESTION_CHARSET[rng.random_range(0..SUGGESTION_CHARSET.len())] as char)
            .collect();
        if validate_password(&candidate).is_empty() {
            return Ok(candidate);
        }
    }
    Err(Error::PasswordSuggestion {
        attempts: MAX_SUGGESTION_ATTEMPTS,
    })
}
