//! User request validation rules
//!
//! Every rule of a field is evaluated, so a single request can report several
//! messages for the same field.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

use super::entity::{UserField, UserRequest};

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const AMOUNT_UPPER_BOUND: f64 = 50.0;

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").unwrap());
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").unwrap());
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").unwrap());
static SPECIAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).unwrap());

/// Armenian small letters, capital letters and the `և` ligature
static ARMENIAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ա-ֆԱ-Ֆև]").unwrap());

/// Optional sign, digits with optional `,` group separators and fraction, no exponent
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[+-]?([0-9][0-9,]*(\.[0-9]*)?|\.[0-9]+)\s*$").unwrap());

/// Field-scoped validation messages, keyed by JSON field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn extend(&mut self, field: UserField, messages: Vec<String>) {
        if messages.is_empty() {
            return;
        }

        self.fields
            .entry(field.json_name().to_string())
            .or_default()
            .extend(messages);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for a field (empty when the field is valid)
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();

        write!(f, "{}", parts.join("; "))
    }
}

/// Validate a full request against today's UTC date
pub fn validate_user_request(request: &UserRequest) -> Result<(), ValidationErrors> {
    validate_user_request_at(request, utc_today())
}

/// Validate a full request against an explicit reference date
pub fn validate_user_request_at(
    request: &UserRequest,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for field in UserField::ALL {
        errors.extend(field, validate_field(request, field, today));
    }

    errors.into_result()
}

/// Run the rules of a single field in isolation
pub fn validate_field(request: &UserRequest, field: UserField, today: NaiveDate) -> Vec<String> {
    match field {
        UserField::Username => username_rules(&request.username),
        UserField::Email => email_rules(&request.email),
        UserField::Password => password_rules(&request.password, &request.username),
        UserField::DateOfBirth => date_of_birth_rules(request.date_of_birth, today),
        UserField::Quantity => quantity_rules(request.quantity),
        UserField::Price => price_rules(&request.price),
        UserField::Amount => amount_rules(request.amount),
    }
}

pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Check that a textual value parses as a decimal number
pub fn is_decimal(value: &str) -> bool {
    DECIMAL.is_match(value)
}

fn required(field: UserField) -> String {
    format!("{} is required.", field.display_name())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn username_rules(username: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if is_blank(username) {
        messages.push(required(UserField::Username));
    }

    if username.chars().count() < USERNAME_MIN_LENGTH {
        messages.push(format!(
            "Username must be at least {} characters.",
            USERNAME_MIN_LENGTH
        ));
    }

    messages
}

fn email_rules(email: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if is_blank(email) {
        messages.push(required(UserField::Email));
    }

    if !email.validate_email() {
        messages.push("Email is not valid.".to_string());
    }

    messages
}

fn password_rules(password: &str, username: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if is_blank(password) {
        messages.push(required(UserField::Password));
    }

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        messages.push(format!(
            "Password must be at least {} characters.",
            PASSWORD_MIN_LENGTH
        ));
    }

    // An empty username would be contained in every password.
    if !username.is_empty() && password.to_lowercase().contains(&username.to_lowercase()) {
        messages.push("Password must not contain the username.".to_string());
    }

    let character_classes: [(&Lazy<Regex>, &str); 5] = [
        (&UPPERCASE, "Password must contain at least one uppercase letter."),
        (&LOWERCASE, "Password must contain at least one lowercase letter."),
        (&DIGIT, "Password must contain at least one number."),
        (&SPECIAL, "Password must contain at least one special character."),
        (&ARMENIAN, "Password must contain at least one Armenian letter."),
    ];

    for (pattern, message) in character_classes {
        if !pattern.is_match(password) {
            messages.push(message.to_string());
        }
    }

    messages
}

fn date_of_birth_rules(date_of_birth: Option<NaiveDate>, today: NaiveDate) -> Vec<String> {
    match date_of_birth {
        None => vec![required(UserField::DateOfBirth)],
        Some(date) if date >= today => vec!["Date of birth must be in the past.".to_string()],
        Some(_) => Vec::new(),
    }
}

fn quantity_rules(quantity: i32) -> Vec<String> {
    let mut messages = Vec::new();

    if quantity == 0 {
        messages.push(required(UserField::Quantity));
    }

    if quantity <= 0 {
        messages.push("Quantity must be a positive number.".to_string());
    }

    messages
}

fn price_rules(price: &str) -> Vec<String> {
    let mut messages = Vec::new();

    if is_blank(price) {
        messages.push(required(UserField::Price));
    }

    if !is_decimal(price) {
        messages.push("Price must be a decimal value.".to_string());
    }

    messages
}

fn amount_rules(amount: f64) -> Vec<String> {
    let mut messages = Vec::new();

    if amount == 0.0 {
        messages.push(required(UserField::Amount));
    }

    if amount.is_nan() || amount >= AMOUNT_UPPER_BOUND {
        messages.push(format!("Amount must be less than {}.", AMOUNT_UPPER_BOUND));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn valid_request() -> UserRequest {
        UserRequest {
            username: "new".to_string(),
            email: "a@a.com".to_string(),
            password: "Abc123!Ֆ".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 12),
            quantity: 1,
            price: "9.99".to_string(),
            amount: 10.0,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(validate_user_request_at(&valid_request(), today()).is_ok());
    }

    #[test]
    fn test_short_password_reports_every_rule() {
        let request = UserRequest {
            password: "short".to_string(),
            ..Default::default()
        };

        let errors = validate_user_request_at(&request, today()).unwrap_err();
        let password = errors.get("password");

        assert!(password.contains(&"Password must be at least 6 characters.".to_string()));
        assert!(password.contains(&"Password must contain at least one uppercase letter.".to_string()));
        assert!(password.contains(&"Password must contain at least one number.".to_string()));
        assert!(password.contains(&"Password must contain at least one special character.".to_string()));
        assert!(password.contains(&"Password must contain at least one Armenian letter.".to_string()));
        assert!(!password.contains(&"Password must contain at least one lowercase letter.".to_string()));
        assert!(!password.contains(&"Password must not contain the username.".to_string()));
        assert_eq!(password.len(), 5);
    }

    #[test]
    fn test_empty_request_reports_required_fields() {
        let errors = validate_user_request_at(&UserRequest::default(), today()).unwrap_err();

        assert!(errors.get("username").contains(&"Username is required.".to_string()));
        assert!(errors.get("email").contains(&"Email is required.".to_string()));
        assert!(errors.get("password").contains(&"Password is required.".to_string()));
        assert_eq!(errors.get("dateOfBirth"), ["DateOfBirth is required.".to_string()]);
        assert!(errors.get("quantity").contains(&"Quantity is required.".to_string()));
        assert!(errors.get("price").contains(&"Price is required.".to_string()));
        assert_eq!(errors.get("amount"), ["Amount is required.".to_string()]);
    }

    #[test]
    fn test_username_too_short() {
        let request = UserRequest {
            username: "ab".to_string(),
            ..valid_request()
        };

        let messages = validate_field(&request, UserField::Username, today());
        assert_eq!(messages, vec!["Username must be at least 3 characters."]);
    }

    #[test]
    fn test_invalid_email() {
        let request = UserRequest {
            email: "not-an-email".to_string(),
            ..valid_request()
        };

        let messages = validate_field(&request, UserField::Email, today());
        assert_eq!(messages, vec!["Email is not valid."]);
    }

    #[test]
    fn test_password_containing_username_ignores_case() {
        let request = UserRequest {
            username: "john".to_string(),
            password: "xJOHNx1!Ֆ".to_string(),
            ..valid_request()
        };

        let messages = validate_field(&request, UserField::Password, today());
        assert_eq!(messages, vec!["Password must not contain the username."]);
    }

    #[test]
    fn test_password_requires_armenian_letter() {
        let request = UserRequest {
            password: "Abc123!x".to_string(),
            ..valid_request()
        };

        let messages = validate_field(&request, UserField::Password, today());
        assert_eq!(messages, vec!["Password must contain at least one Armenian letter."]);
    }

    #[test]
    fn test_password_accepts_armenian_ligature() {
        let request = UserRequest {
            password: "Abc123!և".to_string(),
            ..valid_request()
        };

        assert!(validate_field(&request, UserField::Password, today()).is_empty());
    }

    #[test]
    fn test_date_of_birth_must_be_before_today() {
        let mut request = valid_request();

        request.date_of_birth = Some(today());
        assert_eq!(
            validate_field(&request, UserField::DateOfBirth, today()),
            vec!["Date of birth must be in the past."]
        );

        request.date_of_birth = today().pred_opt();
        assert!(validate_field(&request, UserField::DateOfBirth, today()).is_empty());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        let request = UserRequest {
            quantity: -2,
            ..valid_request()
        };

        assert_eq!(
            validate_field(&request, UserField::Quantity, today()),
            vec!["Quantity must be a positive number."]
        );
    }

    #[test]
    fn test_zero_quantity_reports_both_rules() {
        let request = UserRequest {
            quantity: 0,
            ..valid_request()
        };

        assert_eq!(validate_field(&request, UserField::Quantity, today()).len(), 2);
    }

    #[test]
    fn test_price_must_be_decimal() {
        assert!(is_decimal("9.99"));
        assert!(is_decimal("-3"));
        assert!(is_decimal(" .5 "));
        assert!(is_decimal("1,000.50"));
        assert!(!is_decimal(",5"));
        assert!(!is_decimal("19.99m"));
        assert!(!is_decimal("1e5"));
        assert!(!is_decimal("abc"));

        let request = UserRequest {
            price: "cheap".to_string(),
            ..valid_request()
        };
        assert_eq!(
            validate_field(&request, UserField::Price, today()),
            vec!["Price must be a decimal value."]
        );
    }

    #[test]
    fn test_amount_must_be_below_bound() {
        let mut request = valid_request();

        request.amount = 50.0;
        assert_eq!(
            validate_field(&request, UserField::Amount, today()),
            vec!["Amount must be less than 50."]
        );

        request.amount = 49.99;
        assert!(validate_field(&request, UserField::Amount, today()).is_empty());
    }

    #[test]
    fn test_validation_errors_display() {
        let mut errors = ValidationErrors::new();
        errors.add("amount", "Amount must be less than 50.");
        errors.add("quantity", "Quantity is required.");

        assert_eq!(
            errors.to_string(),
            "amount: Amount must be less than 50.; quantity: Quantity is required."
        );
    }

    #[test]
    fn test_validation_errors_serialize_as_map() {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email is not valid.");

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!({"email": ["Email is not valid."]}));
    }
}
