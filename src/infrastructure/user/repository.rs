//! In-memory user repository implementation

use chrono::NaiveDate;

use super::password::PasswordHasher;
use crate::domain::user::{User, UserId, UserRepository, UserRequest};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository, ordered by insertion
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Vec<User>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Create a repository holding the fixture users
    pub fn seeded(hasher: &dyn PasswordHasher) -> Result<Self, DomainError> {
        Ok(Self::with_users(seed_users(hasher)?))
    }
}

impl UserRepository for InMemoryUserRepository {
    fn list_all(&self) -> Vec<User> {
        self.users.clone()
    }

    fn find_by_id(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id() == id)
    }

    fn find_by_id_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id() == id)
    }

    fn find_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username() == username)
    }

    fn append(&mut self, user: User) {
        self.users.push(user);
    }

    fn max_id(&self) -> Option<UserId> {
        self.users.iter().map(User::id).max()
    }

    fn count(&self) -> usize {
        self.users.len()
    }
}

/// Fixture users loaded at start-up.
///
/// Values are kept as-is; they are not run through the validation rules.
/// Passwords are hashed like any other stored password.
pub fn seed_users(hasher: &dyn PasswordHasher) -> Result<Vec<User>, DomainError> {
    Ok(vec![
        seed_user(
            hasher,
            1,
            "john_doe",
            "john.doe@example.com",
            "Password123!",
            (1990, 5, 12),
            3,
            "19.99m",
            59.97,
        )?,
        seed_user(
            hasher,
            2,
            "jane_smith",
            "jane.smith@example.com",
            "Secure*456",
            (1985, 8, 22),
            2,
            "25.50m",
            51.00,
        )?,
        seed_user(
            hasher,
            3,
            "max_muster",
            "max.muster@example.com",
            "MyPass!789",
            (2000, 1, 1),
            1,
            "99.99m",
            99.99,
        )?,
    ])
}

#[allow(clippy::too_many_arguments)]
fn seed_user(
    hasher: &dyn PasswordHasher,
    id: u64,
    username: &str,
    email: &str,
    password: &str,
    (year, month, day): (i32, u32, u32),
    quantity: i32,
    price: &str,
    amount: f64,
) -> Result<User, DomainError> {
    Ok(User::from_request(
        UserId::new(id),
        UserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(year, month, day),
            quantity,
            price: price.to_string(),
            amount,
        },
        hasher.hash(password)?,
    ))
}
