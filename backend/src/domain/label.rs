//! Labels attached to recipes: tags and ingredients.
//!
//! Tags and ingredients share one shape — a per-user named label with a
//! many-to-many link to recipes — so the domain models them with a single
//! [`Label`] type. The two collections stay distinct at the storage and API
//! level; [`LabelKind`] names which one an operation is acting on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which label collection an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    /// Singular noun for error messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Ingredient => "ingredient",
        }
    }
}

/// Stable label identifier (database surrogate key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelId(i64);

impl LabelId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors returned by [`LabelName::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValidationError {
    EmptyName,
    NameTooLong { max: usize },
}

impl fmt::Display for LabelValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
        }
    }
}

impl std::error::Error for LabelValidationError {}

/// Maximum accepted label name length, matching the database column.
pub const LABEL_NAME_MAX: usize = 255;

/// A validated label name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LabelName(String);

impl LabelName {
    /// Validate and construct a label name.
    pub fn new(name: impl Into<String>) -> Result<Self, LabelValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(LabelValidationError::EmptyName);
        }
        if name.chars().count() > LABEL_NAME_MAX {
            return Err(LabelValidationError::NameTooLong {
                max: LABEL_NAME_MAX,
            });
        }
        Ok(Self(name))
    }

    /// The raw name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for LabelName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<LabelName> for String {
    fn from(value: LabelName) -> Self {
        value.0
    }
}

impl TryFrom<String> for LabelName {
    type Error = LabelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A persisted tag or ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: LabelId,
    pub name: LabelName,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn label_displays_its_name() {
        let label = Label {
            id: LabelId::new(7),
            name: LabelName::new("Vegan").expect("valid name"),
        };
        assert_eq!(label.to_string(), "Vegan");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_blank_names(#[case] raw: &str) {
        assert_eq!(LabelName::new(raw), Err(LabelValidationError::EmptyName));
    }

    #[test]
    fn rejects_overlong_names() {
        let raw = "a".repeat(LABEL_NAME_MAX + 1);
        assert_eq!(
            LabelName::new(raw),
            Err(LabelValidationError::NameTooLong {
                max: LABEL_NAME_MAX
            })
        );
    }

    #[test]
    fn kind_names_read_naturally() {
        assert_eq!(LabelKind::Tag.as_str(), "tag");
        assert_eq!(LabelKind::Ingredient.as_str(), "ingredient");
    }
}
