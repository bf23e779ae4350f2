//! User service: create, replace and patch with duplicate-username enforcement

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::domain::user::{
    utc_today, validate_field, validate_user_request, PatchDocument, PatchedView, User, UserId,
    UserRepository, UserRequest, ValidationErrors,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Store handle shared between the service and whoever constructed it
pub type SharedUserRepository<R> = Arc<RwLock<R>>;

/// How a patch treats an operation that fails midway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchMode {
    /// Operations before the failing one stay applied
    InPlace,
    /// Every operation must succeed and the touched fields must validate
    Validated,
}

/// Password hashed while the store lock was released
struct HashedPassword {
    plaintext: String,
    hash: String,
}

/// User lifecycle service.
///
/// Every mutation holds the repository write lock from the duplicate check
/// through the write, so concurrent callers cannot both claim a username.
/// Passwords are hashed on the blocking pool with no lock held.
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: SharedUserRepository<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository, H: PasswordHasher + 'static> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: SharedUserRepository<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Create a service owning a fresh repository
    pub fn with_repository(repository: R, hasher: H) -> Self {
        Self::new(Arc::new(RwLock::new(repository)), Arc::new(hasher))
    }

    /// Handle to the underlying store
    pub fn repository(&self) -> SharedUserRepository<R> {
        Arc::clone(&self.repository)
    }

    /// List all users in insertion order
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        debug!("Retrieving all users");
        Ok(self.repository.read().await.list_all())
    }

    /// Get a user by id
    pub async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        debug!(%id, "Looking up user");
        Ok(self.repository.read().await.find_by_id(id).cloned())
    }

    /// Number of stored users
    pub async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.repository.read().await.count())
    }

    /// Create a new user with the next free id
    pub async fn create(&self, request: UserRequest) -> Result<User, DomainError> {
        debug!(username = %request.username, "Creating user");

        validate(&request)?;
        let password_hash = self.hash_password(&request.password).await?;

        let mut repository = self.repository.write().await;

        if repository.username_taken(&request.username, None) {
            warn!(username = %request.username, "Rejected create: username already exists");
            return Err(DomainError::duplicate_username(request.username));
        }

        let user = User::from_request(repository.next_id(), request, password_hash);
        repository.append(user.clone());

        info!(id = %user.id(), username = %user.username(), "User created");
        Ok(user)
    }

    /// Overwrite every mutable field of an existing user
    pub async fn replace(&self, id: UserId, request: UserRequest) -> Result<User, DomainError> {
        debug!(%id, username = %request.username, "Replacing user");

        validate(&request)?;
        let password_hash = self.hash_password(&request.password).await?;

        let mut repository = self.repository.write().await;

        if repository.find_by_id(id).is_none() {
            warn!(%id, "User to replace not found");
            return Err(DomainError::not_found(id));
        }

        if repository.username_taken(&request.username, Some(id)) {
            warn!(%id, username = %request.username, "Rejected replace: username already exists");
            return Err(DomainError::duplicate_username(request.username));
        }

        let user = repository
            .find_by_id_mut(id)
            .ok_or_else(|| DomainError::not_found(id))?;
        user.replace_fields(request, password_hash);

        info!(%id, username = %user.username(), "User updated");
        Ok(user.clone())
    }

    /// Apply a patch document to an existing user.
    ///
    /// Username changes are checked against the other users before anything
    /// is written. Operations are then applied in order; if one fails, the
    /// operations before it stay applied.
    pub async fn patch(&self, id: UserId, document: &PatchDocument) -> Result<User, DomainError> {
        debug!(%id, operations = document.operations().len(), "Patching user");
        self.run_patch(id, document, PatchMode::InPlace).await
    }

    /// Apply a patch document only if all of it succeeds.
    ///
    /// The replay, the validation of touched fields, the username check and
    /// the write share one write lock, so a failure stores nothing.
    pub async fn patch_validated(
        &self,
        id: UserId,
        document: &PatchDocument,
    ) -> Result<User, DomainError> {
        debug!(%id, operations = document.operations().len(), "Patching user with validation");
        self.run_patch(id, document, PatchMode::Validated).await
    }

    /// Dry-run a patch and validate the fields it writes.
    ///
    /// Nothing is stored; the patched request view is returned.
    pub async fn preview_patch(
        &self,
        id: UserId,
        document: &PatchDocument,
    ) -> Result<UserRequest, DomainError> {
        let repository = self.repository.read().await;

        let PatchedView { view, outcome } = document
            .replay_on_user(id, repository.find_by_id(id))
            .map_err(|_| DomainError::not_found(id))?;
        drop(repository);

        outcome?;
        validate_touched(id, document, &view)?;

        Ok(view)
    }

    async fn run_patch(
        &self,
        id: UserId,
        document: &PatchDocument,
        mode: PatchMode,
    ) -> Result<User, DomainError> {
        let mut hashed: Option<HashedPassword> = None;

        loop {
            let mut repository = self.repository.write().await;

            let Some(user) = repository.find_by_id(id) else {
                warn!(%id, "User to patch not found");
                return Err(DomainError::not_found(id));
            };

            for username in document.username_changes(&user.to_request()) {
                if repository.username_taken(&username, Some(id)) {
                    warn!(%id, %username, "Rejected patch: username already exists");
                    return Err(DomainError::duplicate_username(username));
                }
            }

            let PatchedView { view, outcome } = document.replay_on_user(id, Some(user))?;

            if mode == PatchMode::Validated {
                if let Err(err) = &outcome {
                    warn!(%id, error = %err, "Patch operation failed");
                    return Err(err.clone());
                }
                validate_touched(id, document, &view)?;
            }

            let password_hash = match user.changed_password(&view) {
                None => user.password_hash().to_string(),
                Some(plaintext) => match hashed.take() {
                    Some(ready) if ready.plaintext == plaintext => ready.hash,
                    _ => {
                        // Hash without the lock, then replay against the current store
                        let plaintext = plaintext.to_string();
                        drop(repository);
                        let hash = self.hash_password(&plaintext).await?;
                        hashed = Some(HashedPassword { plaintext, hash });
                        continue;
                    }
                },
            };

            let user = repository
                .find_by_id_mut(id)
                .ok_or_else(|| DomainError::not_found(id))?;
            user.replace_fields(view, password_hash);
            let user = user.clone();

            return match outcome {
                Ok(()) => {
                    info!(%id, username = %user.username(), "User patched");
                    Ok(user)
                }
                Err(err) => {
                    warn!(%id, error = %err, "Patch operation failed");
                    Err(err)
                }
            };
        }
    }

    async fn hash_password(&self, password: &str) -> Result<String, DomainError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("Password hashing task failed: {}", e)))?
    }
}

fn validate(request: &UserRequest) -> Result<(), DomainError> {
    validate_user_request(request).map_err(|errors| {
        warn!(username = %request.username, %errors, "Request validation failed");
        DomainError::ValidationFailed(errors)
    })
}

fn validate_touched(
    id: UserId,
    document: &PatchDocument,
    view: &UserRequest,
) -> Result<(), DomainError> {
    let today = utc_today();
    let mut errors = ValidationErrors::new();

    for field in document.touched_fields() {
        errors.extend(field, validate_field(view, field, today));
    }

    errors.into_result().map_err(|errors| {
        warn!(%id, %errors, "Patch validation failed");
        DomainError::ValidationFailed(errors)
    })
}
