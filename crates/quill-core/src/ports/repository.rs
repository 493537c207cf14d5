use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Post, PostChanges, PostStatus, User};
use crate::error::RepoError;

/// Generic repository trait defining the single-record operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Persist a new entity and return the stored record.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. `RepoError::NotFound` if nothing was removed.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Sort order for status listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOrder {
    /// Newest publication first; posts never published sort last.
    PublishedDesc,
    /// Most recently modified first.
    UpdatedDesc,
}

/// Post store consumed by the lifecycle service.
///
/// Every operation is atomic for a single record only. Concurrent updates
/// to the same post are last-write-wins, except through
/// [`update_if`](PostRepository::update_if), which checks and writes in one step.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Posts owned by `owner_id`, newest update first, optionally filtered by status.
    async fn find_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, RepoError>;

    async fn find_by_status(
        &self,
        status: PostStatus,
        order: PostOrder,
    ) -> Result<Vec<Post>, RepoError>;

    /// Posts carrying exactly `tag`, newest publication first.
    async fn find_by_tag(&self, tag: &str, status: PostStatus) -> Result<Vec<Post>, RepoError>;

    /// Unique tags across posts with `status`, sorted ascending.
    async fn distinct_tags(&self, status: PostStatus) -> Result<Vec<String>, RepoError>;

    /// Apply `changes` through [`Post::apply_changes`] and return the stored record.
    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;

    /// Like [`update`](PostRepository::update), but only while the post is
    /// owned by `owner_id` and still has `status`. The check and the write are
    /// a single atomic step; `RepoError::NotFound` when nothing matched.
    async fn update_if(
        &self,
        id: Uuid,
        owner_id: Uuid,
        status: PostStatus,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError>;
}
