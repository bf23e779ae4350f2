//! JSON Patch documents over user fields
//!
//! Paths are JSON Pointers resolved against [`UserField`] names, ignoring
//! case. Operations are applied in order to a [`UserRequest`]-shaped target.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use super::entity::{parse_lenient_date, User, UserField, UserId, UserRequest};
use crate::domain::DomainError;

/// Kind of a single patch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PatchOperationKind {
    Add,
    Remove,
    Replace,
    Move,
    Copy,
    Test,
}

/// Parsed JSON Pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatchPath {
    segments: Vec<String>,
}

impl PatchPath {
    /// Path addressing a single user field
    pub fn field(field: UserField) -> Self {
        Self {
            segments: vec![field.json_name().to_string()],
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve to a user field; only single-segment paths are addressable
    pub fn resolve(&self) -> Result<UserField, DomainError> {
        match self.segments.as_slice() {
            [] => Err(DomainError::invalid_patch(
                "The root path cannot be patched",
            )),
            [name] => UserField::from_name(name).ok_or_else(|| {
                DomainError::invalid_patch(format!("Unknown field '{}' in path '{}'", name, self))
            }),
            _ => Err(DomainError::invalid_patch(format!(
                "Path '{}' does not target a user field",
                self
            ))),
        }
    }

    /// Whether this path resolves to the given field
    pub fn targets(&self, field: UserField) -> bool {
        self.resolve().is_ok_and(|resolved| resolved == field)
    }
}

impl FromStr for PatchPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| format!("Path '{}' must start with '/'", s))?;

        let segments = rest
            .split('/')
            .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
            .collect();

        Ok(Self { segments })
    }
}

impl TryFrom<String> for PatchPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatchPath> for String {
    fn from(path: PatchPath) -> Self {
        path.to_string()
    }
}

impl std::fmt::Display for PatchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// A single patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatchOperation {
    pub op: PatchOperationKind,
    #[schema(value_type = String, example = "/username")]
    pub path: PatchPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub from: Option<PatchPath>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
}

impl PatchOperation {
    pub fn new(op: PatchOperationKind, path: PatchPath, value: Value) -> Self {
        Self {
            op,
            path,
            from: None,
            value,
        }
    }

    pub fn replace(field: UserField, value: Value) -> Self {
        Self::new(PatchOperationKind::Replace, PatchPath::field(field), value)
    }

    pub fn remove(field: UserField) -> Self {
        Self::new(PatchOperationKind::Remove, PatchPath::field(field), Value::Null)
    }

    pub fn test(field: UserField, value: Value) -> Self {
        Self::new(PatchOperationKind::Test, PatchPath::field(field), value)
    }

    pub fn copy(from: UserField, to: UserField) -> Self {
        Self {
            op: PatchOperationKind::Copy,
            path: PatchPath::field(to),
            from: Some(PatchPath::field(from)),
            value: Value::Null,
        }
    }

    pub fn moved(from: UserField, to: UserField) -> Self {
        Self {
            op: PatchOperationKind::Move,
            ..Self::copy(from, to)
        }
    }

    /// Apply this operation to a request-shaped target
    pub fn apply_to(&self, target: &mut UserRequest) -> Result<(), DomainError> {
        let field = self.path.resolve()?;

        match self.op {
            PatchOperationKind::Add | PatchOperationKind::Replace => {
                let value = FieldValue::parse(field, &self.value)?;
                value.write(target, field);
            }
            PatchOperationKind::Remove => {
                FieldValue::cleared(field).write(target, field);
            }
            PatchOperationKind::Test => {
                self.ensure_readable(field)?;
                let expected = FieldValue::parse(field, &self.value)?;
                let actual = FieldValue::read(target, field);

                if expected != actual {
                    return Err(DomainError::invalid_patch(format!(
                        "Test failed for path '{}'",
                        self.path
                    )));
                }
            }
            PatchOperationKind::Copy | PatchOperationKind::Move => {
                let source = self.source()?;
                self.ensure_readable(source)?;
                let value = FieldValue::read(target, source).convert(field)?;

                if self.op == PatchOperationKind::Move && source != field {
                    FieldValue::cleared(source).write(target, source);
                }
                value.write(target, field);
            }
        }

        Ok(())
    }

    /// Fields written by this operation
    pub fn written_fields(&self) -> Vec<UserField> {
        let Ok(field) = self.path.resolve() else {
            return Vec::new();
        };

        match self.op {
            PatchOperationKind::Test => Vec::new(),
            PatchOperationKind::Move => match self.source() {
                Ok(source) if source != field => vec![field, source],
                _ => vec![field],
            },
            _ => vec![field],
        }
    }

    /// The password slot holds a stored hash, so it can be written but never read
    fn ensure_readable(&self, field: UserField) -> Result<(), DomainError> {
        if field == UserField::Password {
            return Err(DomainError::invalid_patch(format!(
                "Operation '{:?}' cannot read write-only field '{}'",
                self.op, field
            )));
        }
        Ok(())
    }

    fn source(&self) -> Result<UserField, DomainError> {
        self.from
            .as_ref()
            .ok_or_else(|| {
                DomainError::invalid_patch(format!(
                    "Operation '{:?}' on '{}' requires a 'from' path",
                    self.op, self.path
                ))
            })?
            .resolve()
    }
}

/// Ordered list of patch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every field the document writes
    pub fn touched_fields(&self) -> BTreeSet<UserField> {
        self.0
            .iter()
            .flat_map(PatchOperation::written_fields)
            .collect()
    }

    /// Usernames the target would carry while the document is applied.
    ///
    /// The document is replayed on a scratch copy, so a value is reported for
    /// add/replace as well as for copy, move and remove into the username.
    /// Replay stops at the first failing operation, matching what a real
    /// application leaves behind.
    pub fn username_changes(&self, current: &UserRequest) -> Vec<String> {
        let mut scratch = current.clone();
        let mut proposed: Vec<String> = Vec::new();

        for operation in &self.0 {
            if operation.apply_to(&mut scratch).is_err() {
                break;
            }

            if scratch.username != current.username && !proposed.contains(&scratch.username) {
                proposed.push(scratch.username.clone());
            }
        }

        proposed
    }

    /// Apply every operation in order.
    ///
    /// Operations that succeeded before a failing one stay applied.
    pub fn apply_to(&self, target: &mut UserRequest) -> Result<(), DomainError> {
        for operation in &self.0 {
            operation.apply_to(target)?;
        }
        Ok(())
    }

    /// Replay the document on the request view of a stored user.
    ///
    /// The stored user is not touched; the view keeps whatever the operations
    /// before a failing one wrote.
    pub fn replay_on_user(
        &self,
        id: UserId,
        user: Option<&User>,
    ) -> Result<PatchedView, DomainError> {
        let user = user.ok_or(DomainError::InvalidPatchTarget { id })?;

        let mut view = user.to_request();
        let outcome = self.apply_to(&mut view);

        Ok(PatchedView { view, outcome })
    }
}

/// Request view after a replay, together with how the replay ended
#[derive(Debug, Clone, PartialEq)]
pub struct PatchedView {
    pub view: UserRequest,
    pub outcome: Result<(), DomainError>,
}

impl From<Vec<PatchOperation>> for PatchDocument {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }
}

/// Typed value of a single user field
#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Date(Option<NaiveDate>),
    Integer(i32),
    Decimal(f64),
}

impl FieldValue {
    fn parse(field: UserField, value: &Value) -> Result<Self, DomainError> {
        let mismatch = || {
            DomainError::invalid_patch(format!(
                "Value {} is not valid for field '{}'",
                value, field
            ))
        };

        match field {
            UserField::Username | UserField::Email | UserField::Password | UserField::Price => {
                match value {
                    Value::Null => Ok(Self::Text(String::new())),
                    Value::String(s) => Ok(Self::Text(s.clone())),
                    Value::Number(n) => Ok(Self::Text(n.to_string())),
                    _ => Err(mismatch()),
                }
            }
            UserField::DateOfBirth => match value {
                Value::Null => Ok(Self::Date(None)),
                Value::String(s) => parse_lenient_date(s)
                    .map(|date| Self::Date(Some(date)))
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
            UserField::Quantity => match value {
                Value::Number(n) => n
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .map(Self::Integer)
                    .ok_or_else(mismatch),
                Value::String(s) => s.trim().parse().map(Self::Integer).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            UserField::Amount => match value {
                Value::Number(n) => n.as_f64().map(Self::Decimal).ok_or_else(mismatch),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Self::Decimal)
                    .ok_or_else(mismatch),
                _ => Err(mismatch()),
            },
        }
    }

    fn cleared(field: UserField) -> Self {
        match field {
            UserField::Username | UserField::Email | UserField::Password | UserField::Price => {
                Self::Text(String::new())
            }
            UserField::DateOfBirth => Self::Date(None),
            UserField::Quantity => Self::Integer(0),
            UserField::Amount => Self::Decimal(0.0),
        }
    }

    fn read(target: &UserRequest, field: UserField) -> Self {
        match field {
            UserField::Username => Self::Text(target.username.clone()),
            UserField::Email => Self::Text(target.email.clone()),
            UserField::Password => Self::Text(target.password.clone()),
            UserField::Price => Self::Text(target.price.clone()),
            UserField::DateOfBirth => Self::Date(target.date_of_birth),
            UserField::Quantity => Self::Integer(target.quantity),
            UserField::Amount => Self::Decimal(target.amount),
        }
    }

    /// Re-interpret a value read from one field for another field
    fn convert(self, field: UserField) -> Result<Self, DomainError> {
        let json = match self {
            Self::Text(s) => Value::String(s),
            Self::Date(date) => date
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null),
            Self::Integer(n) => Value::from(n),
            Self::Decimal(n) => Value::from(n),
        };

        Self::parse(field, &json)
    }

    fn write(self, target: &mut UserRequest, field: UserField) {
        match (field, self) {
            (UserField::Username, Self::Text(s)) => target.username = s,
            (UserField::Email, Self::Text(s)) => target.email = s,
            (UserField::Password, Self::Text(s)) => target.password = s,
            (UserField::Price, Self::Text(s)) => target.price = s,
            (UserField::DateOfBirth, Self::Date(date)) => target.date_of_birth = date,
            (UserField::Quantity, Self::Integer(n)) => target.quantity = n,
            (UserField::Amount, Self::Decimal(n)) => target.amount = n,
            // parse/cleared/convert always produce the variant matching the field
            (field, value) => unreachable!("value {:?} does not fit field {}", value, field),
        }
    }
}
