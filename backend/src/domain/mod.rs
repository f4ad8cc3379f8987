//! Domain primitives and aggregates.
//!
//! Purpose: define strongly typed entities used by the HTTP and persistence
//! layers. Types here are transport and driver agnostic; invariants are
//! documented on each type.

pub mod auth;
pub mod email;
pub mod error;
pub mod label;
pub mod ports;
pub mod recipe;
pub mod user;

pub use self::auth::{AccessToken, PasswordHash, TokenDigest, check_password_policy};
pub use self::email::{EmailAddress, EmailValidationError};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::label::{Label, LabelId, LabelKind, LabelName, LabelValidationError};
pub use self::recipe::{
    Recipe, RecipeDraft, RecipeFilter, RecipeId, RecipePatch, RecipeValidationError,
};
pub use self::user::{NewUser, ProfileUpdate, User, UserId};
