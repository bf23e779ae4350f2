//! User infrastructure: in-memory storage, password hashing and the lifecycle service

pub mod password;
pub mod repository;
pub mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use repository::{seed_users, InMemoryUserRepository};
pub use service::{SharedUserRepository, UserService};
