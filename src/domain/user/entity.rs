//! User entity and related types

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Numeric user identifier, assigned by the store and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// First identifier handed out by an empty store
    pub const FIRST: UserId = UserId(1);

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Identifier following this one
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable fields of a user, addressable by validation and patch paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserField {
    Username,
    Email,
    Password,
    DateOfBirth,
    Quantity,
    Price,
    Amount,
}

impl UserField {
    pub const ALL: [UserField; 7] = [
        UserField::Username,
        UserField::Email,
        UserField::Password,
        UserField::DateOfBirth,
        UserField::Quantity,
        UserField::Price,
        UserField::Amount,
    ];

    /// Field name as it appears in JSON payloads
    pub fn json_name(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Password => "password",
            Self::DateOfBirth => "dateOfBirth",
            Self::Quantity => "quantity",
            Self::Price => "price",
            Self::Amount => "amount",
        }
    }

    /// Field name used in "is required" messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Username => "Username",
            Self::Email => "Email",
            Self::Password => "Password",
            Self::DateOfBirth => "DateOfBirth",
            Self::Quantity => "Quantity",
            Self::Price => "Price",
            Self::Amount => "Amount",
        }
    }

    /// Resolve a field by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.json_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for UserField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.json_name())
    }
}

/// Incoming create/replace payload. Also the shape patches are applied to.
///
/// Missing JSON fields deserialize to empty values so that the rule set
/// reports them as required instead of failing to parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_lenient_date")]
    #[schema(value_type = Option<String>, format = Date, example = "1990-05-12")]
    pub date_of_birth: Option<NaiveDate>,
    pub quantity: i32,
    /// Decimal value carried as text
    #[schema(example = "19.99")]
    pub price: String,
    pub amount: f64,
}

/// Stored user record
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    username: String,
    email: String,
    /// Argon2 hash; the plaintext is never stored
    password_hash: String,
    date_of_birth: Option<NaiveDate>,
    quantity: i32,
    price: String,
    amount: f64,
}

impl User {
    /// Create a record from a request payload.
    ///
    /// The plaintext password of the request is dropped in favour of
    /// `password_hash`.
    pub fn from_request(id: UserId, request: UserRequest, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: request.username,
            email: request.email,
            password_hash: password_hash.into(),
            date_of_birth: request.date_of_birth,
            quantity: request.quantity,
            price: request.price,
            amount: request.amount,
        }
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    // Mutators

    /// Overwrite every mutable field; the id is left untouched
    pub fn replace_fields(&mut self, request: UserRequest, password_hash: impl Into<String>) {
        self.username = request.username;
        self.email = request.email;
        self.password_hash = password_hash.into();
        self.date_of_birth = request.date_of_birth;
        self.quantity = request.quantity;
        self.price = request.price;
        self.amount = request.amount;
    }

    /// Plaintext password a patched view carries, if it no longer holds the stored hash
    pub fn changed_password<'a>(&self, view: &'a UserRequest) -> Option<&'a str> {
        (view.password != self.password_hash).then_some(view.password.as_str())
    }

    /// Request-shaped view of the mutable fields.
    ///
    /// The password slot carries the stored hash.
    pub fn to_request(&self) -> UserRequest {
        UserRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password_hash.clone(),
            date_of_birth: self.date_of_birth,
            quantity: self.quantity,
            price: self.price.clone(),
            amount: self.amount,
        }
    }
}

/// Parse a date given either as `YYYY-MM-DD` or as a full timestamp
pub fn parse_lenient_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;

    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_lenient_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", s))),
    }
}
