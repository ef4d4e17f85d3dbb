//! Phone numbers in E.164 form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A phone number normalized to `+<country code><subscriber number>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneNumberError {
    #[error("phone number is empty")]
    Empty,
    #[error("phone number contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("phone number has {0} digits, expected 8 to 15")]
    InvalidLength(usize),
}

/// Local numbers carry this many digits before a country code is prepended.
const NATIONAL_NUMBER_LEN: usize = 10;

impl PhoneNumber {
    /// Normalize raw user input, prepending `default_country_code` to bare national numbers.
    ///
    /// Accepts `+`, `00` international prefixes and a single national trunk `0`.
    /// Spaces, dashes, dots and parentheses are ignored.
    pub fn normalize(raw: &str, default_country_code: &str) -> Result<Self, PhoneNumberError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let (explicit_plus, rest) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(rest.len());
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneNumberError::InvalidCharacter(other)),
            }
        }
        if digits.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        let international = if explicit_plus {
            digits
        } else if let Some(stripped) = digits.strip_prefix("00") {
            stripped.to_owned()
        } else {
            let national = digits.strip_prefix('0').unwrap_or(&digits);
            if national.len() == NATIONAL_NUMBER_LEN {
                format!("{default_country_code}{national}")
            } else {
                digits
            }
        };

        if !(8..=15).contains(&international.len()) {
            return Err(PhoneNumberError::InvalidLength(international.len()));
        }
        Ok(Self(format!("+{international}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
