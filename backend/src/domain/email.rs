//! Email address value type with domain-casing normalization.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`EmailAddress::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailValidationError {
    Empty,
    MissingAtSign,
    EmptyLocalPart,
    EmptyDomain,
    TooLong { max: usize },
}

impl fmt::Display for EmailValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "email must not be empty"),
            Self::MissingAtSign => write!(f, "email must contain an '@' sign"),
            Self::EmptyLocalPart => write!(f, "email local part must not be empty"),
            Self::EmptyDomain => write!(f, "email domain must not be empty"),
            Self::TooLong { max } => write!(f, "email must be at most {max} characters"),
        }
    }
}

impl std::error::Error for EmailValidationError {}

/// Maximum accepted email length, matching the database column.
pub const EMAIL_MAX: usize = 255;

/// A validated email address.
///
/// The domain part is lower-cased on construction; the local part keeps its
/// original casing. `a@X.com` and `a@x.com` therefore compare equal, while
/// `A@x.com` and `a@x.com` remain distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalize an email address.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, EmailValidationError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if raw.chars().count() > EMAIL_MAX {
            return Err(EmailValidationError::TooLong { max: EMAIL_MAX });
        }
        // Split on the last '@' so quoted local parts containing '@' keep working.
        let (local, domain) = raw
            .rsplit_once('@')
            .ok_or(EmailValidationError::MissingAtSign)?;
        if local.is_empty() {
            return Err(EmailValidationError::EmptyLocalPart);
        }
        if domain.is_empty() {
            return Err(EmailValidationError::EmptyDomain);
        }
        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }

    /// The normalized address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
