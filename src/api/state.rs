//! Application state for shared services

use std::sync::Arc;

use crate::domain::{DomainError, PatchDocument, User, UserId, UserRepository, UserRequest};
use crate::infrastructure::user::{PasswordHasher, UserService};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
}

impl AppState {
    pub fn new(user_service: Arc<dyn UserServiceTrait>) -> Self {
        Self { user_service }
    }
}

/// Trait for user lifecycle operations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, DomainError>;
    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
    async fn create(&self, request: UserRequest) -> Result<User, DomainError>;
    async fn replace(&self, id: UserId, request: UserRequest) -> Result<User, DomainError>;
    /// Apply the document only if every operation succeeds and the touched fields validate
    async fn patch_validated(
        &self,
        id: UserId,
        document: PatchDocument,
    ) -> Result<User, DomainError>;
}

#[async_trait::async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn list(&self) -> Result<Vec<User>, DomainError> {
        UserService::list(self).await
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        UserService::get(self, id).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        UserService::count(self).await
    }

    async fn create(&self, request: UserRequest) -> Result<User, DomainError> {
        UserService::create(self, request).await
    }

    async fn replace(&self, id: UserId, request: UserRequest) -> Result<User, DomainError> {
        UserService::replace(self, id, request).await
    }

    async fn patch_validated(
        &self,
        id: UserId,
        document: PatchDocument,
    ) -> Result<User, DomainError> {
        UserService::patch_validated(self, id, &document).await
    }
}
