//! Recipe aggregate and its write payloads.

use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use super::label::{Label, LabelId, LabelName};

/// Stable recipe identifier (database surrogate key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(i64);

impl RecipeId {
    /// Wrap a raw identifier.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for recipe payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    NegativePrice,
    PriceOutOfRange,
}

impl fmt::Display for RecipeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::PriceOutOfRange => {
                write!(f, "price must fit five digits with two decimal places")
            }
        }
    }
}

impl std::error::Error for RecipeValidationError {}

/// Maximum accepted title length, matching the database column.
pub const TITLE_MAX: usize = 255;

/// Validate a recipe title.
pub fn validate_title(title: &str) -> Result<(), RecipeValidationError> {
    if title.trim().is_empty() {
        return Err(RecipeValidationError::EmptyTitle);
    }
    if title.chars().count() > TITLE_MAX {
        return Err(RecipeValidationError::TitleTooLong { max: TITLE_MAX });
    }
    Ok(())
}

/// Validate a price against the `NUMERIC(5, 2)` storage column.
pub fn validate_price(price: &BigDecimal) -> Result<(), RecipeValidationError> {
    if price < &BigDecimal::zero() {
        return Err(RecipeValidationError::NegativePrice);
    }
    // Round to the stored scale first so `5.50` and `5.5` are judged alike.
    let normalized = price.with_scale(2);
    if normalized.digits() > 5 {
        return Err(RecipeValidationError::PriceOutOfRange);
    }
    Ok(())
}

/// A persisted recipe with its resolved label associations.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: BigDecimal,
    pub link: String,
    pub image_path: Option<String>,
    pub tags: Vec<Label>,
    pub ingredients: Vec<Label>,
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title.as_str())
    }
}

/// Validated payload for creating a recipe.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub time_minutes: i32,
    pub price: BigDecimal,
    pub link: String,
    pub tags: Vec<LabelName>,
    pub ingredients: Vec<LabelName>,
}

impl RecipeDraft {
    /// Validate scalar fields and construct a draft.
    pub fn new(
        title: String,
        description: String,
        time_minutes: i32,
        price: BigDecimal,
        link: String,
        tags: Vec<LabelName>,
        ingredients: Vec<LabelName>,
    ) -> Result<Self, RecipeValidationError> {
        validate_title(&title)?;
        validate_price(&price)?;
        Ok(Self {
            title,
            description,
            time_minutes,
            price,
            link,
            tags,
            ingredients,
        })
    }
}

/// Partial update of a recipe.
///
/// Scalar `None` fields are left untouched. For `tags` and `ingredients`,
/// `None` means "do not touch the associations" while `Some(vec![])`
/// deliberately clears them.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<BigDecimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<LabelName>>,
    pub ingredients: Option<Vec<LabelName>>,
}

impl RecipePatch {
    /// Validate whichever scalar fields are present.
    pub fn validate(&self) -> Result<(), RecipeValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(price) = &self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    /// Whether any scalar column would change.
    pub fn has_scalar_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.time_minutes.is_some()
            || self.price.is_some()
            || self.link.is_some()
    }
}

/// Optional association filters for recipe listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Option<Vec<LabelId>>,
    pub ingredients: Option<Vec<LabelId>>,
}
