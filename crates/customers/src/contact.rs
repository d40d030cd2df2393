//! Contact details: validated value objects.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use shopledger_core::{DomainError, DomainResult, ValueObject};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

// International number: optional '+', no leading zero, 2..=15 digits.
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

/// Minimum address length, counted in characters after trimming.
pub const MIN_ADDRESS_LEN: usize = 5;

/// E-mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if !EMAIL_REGEX.is_match(&value) {
            return Err(DomainError::validation(
                "email",
                format!("{value:?} is not an e-mail address"),
            ));
        }
        Ok(Self(value))
    }
}

/// Phone number in international notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if !PHONE_REGEX.is_match(&value) {
            return Err(DomainError::validation(
                "phone",
                format!("{value:?} is not an international phone number"),
            ));
        }
        Ok(Self(value))
    }
}

/// Postal address. Free text; only its length is checked.
///
/// The value is kept as entered (not trimmed), the length rule applies to the
/// trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.trim().chars().count() < MIN_ADDRESS_LEN {
            return Err(DomainError::validation(
                "address",
                format!("too short (at least {MIN_ADDRESS_LEN} characters required)"),
            ));
        }
        Ok(Self(value))
    }

    /// City heuristic: the text before the first comma, or the whole address.
    pub fn city(&self) -> &str {
        match self.0.split_once(',') {
            Some((city, _)) => city.trim(),
            None => self.0.trim(),
        }
    }
}

macro_rules! impl_contact_value {
    ($t:ty) => {
        impl ValueObject for $t {
            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_contact_value!(Email);
impl_contact_value!(Phone);
impl_contact_value!(Address);
