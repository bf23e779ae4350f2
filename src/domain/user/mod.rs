//! User domain
//!
//! This module provides the user record, the request payload, the validation
//! rule set, JSON Patch documents and the repository trait.

mod entity;
mod patch;
mod repository;
mod validation;

pub use entity::{parse_lenient_date, User, UserField, UserId, UserRequest};
pub use patch::{PatchDocument, PatchOperation, PatchOperationKind, PatchPath, PatchedView};
pub use repository::UserRepository;
pub use validation::{
    is_decimal, utc_today, validate_field, validate_user_request, validate_user_request_at,
    ValidationErrors, AMOUNT_UPPER_BOUND, PASSWORD_MIN_LENGTH, USERNAME_MIN_LENGTH,
};
