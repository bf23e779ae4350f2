//! User repository trait

use std::fmt::Debug;

use super::entity::{User, UserId};

/// Ordered user storage.
///
/// Implementations are synchronous and hold no locks of their own; callers
/// serialize access (see `UserService`), so a check followed by a mutation
/// observes a consistent store.
pub trait UserRepository: Send + Sync + Debug {
    /// All users in insertion order
    fn list_all(&self) -> Vec<User>;

    /// Get a user by id
    fn find_by_id(&self, id: UserId) -> Option<&User>;

    /// Get a user by id for in-place mutation
    fn find_by_id_mut(&mut self, id: UserId) -> Option<&mut User>;

    /// Get a user by username (exact, case-sensitive match)
    fn find_by_username(&self, username: &str) -> Option<&User>;

    /// Append a user at the end of the collection
    fn append(&mut self, user: User);

    /// Highest id currently stored
    fn max_id(&self) -> Option<UserId>;

    /// Number of stored users
    fn count(&self) -> usize {
        self.list_all().len()
    }

    /// Id for the next user: highest id + 1, or 1 when empty
    fn next_id(&self) -> UserId {
        self.max_id().map(|id| id.next()).unwrap_or(UserId::FIRST)
    }

    /// Whether a user other than `except` already uses the username
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.find_by_username(username)
            .is_some_and(|user| Some(user.id()) != except)
    }
}
