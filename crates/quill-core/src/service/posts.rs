//! Post lifecycle: the draft/publish state machine and ownership rules.

use std::sync::Arc;

use mockable::Clock;
use uuid::Uuid;

use crate::domain::{Post, PostChanges, PostDraft, PostFields, PostStatus};
use crate::error::{DomainError, RepoError};
use crate::ports::{BaseRepository, PostOrder, PostRepository};

/// Coordinates every post mutation and read on behalf of a caller.
///
/// Posts move only between `Draft` and `Published`. Mutations require the
/// caller to own the post; reads hide drafts from everyone but their owner.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { posts, clock }
    }

    /// Create a new draft owned by `owner`.
    pub async fn create_draft(&self, owner: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        self.create(owner, draft, PostStatus::Draft).await
    }

    /// Create a post that is published immediately.
    pub async fn create_published(
        &self,
        owner: Uuid,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        self.create(owner, draft, PostStatus::Published).await
    }

    /// Create-or-publish: publish a brand new post, or overwrite and publish
    /// an existing one owned by `owner`.
    pub async fn publish(
        &self,
        owner: Uuid,
        id: Option<Uuid>,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let Some(id) = id else {
            return self.create_published(owner, draft).await;
        };

        let changes = draft.validate()?.with_status(PostStatus::Published);
        self.owned(id, owner).await?;
        let post = self.apply(id, changes).await?;
        tracing::info!(post_id = %post.id, owner_id = %owner, "Post published");
        Ok(post)
    }

    /// Autosave path. The post must exist, belong to `owner` and still be a
    /// draft; any mismatch is reported as `NotFoundOrForbidden` so the caller
    /// never learns which condition failed and never forks a second draft.
    pub async fn update_draft(
        &self,
        id: Uuid,
        owner: Uuid,
        fields: PostFields,
    ) -> Result<Post, DomainError> {
        let changes = fields.validate()?;

        let post = self
            .posts
            .update_if(id, owner, PostStatus::Draft, changes, self.clock.utc())
            .await
            .map_err(|err| match err {
                RepoError::NotFound => {
                    tracing::debug!(post_id = %id, owner_id = %owner, "Draft update rejected");
                    DomainError::NotFoundOrForbidden
                }
                other => other.into(),
            })?;
        tracing::debug!(post_id = %id, "Draft updated");
        Ok(post)
    }

    /// Update title, content and/or tags regardless of status.
    pub async fn update_fields(
        &self,
        id: Uuid,
        owner: Uuid,
        fields: PostFields,
    ) -> Result<Post, DomainError> {
        let changes = fields.validate()?;
        self.owned(id, owner).await?;
        let post = self.apply(id, changes).await?;
        tracing::debug!(post_id = %id, "Post fields updated");
        Ok(post)
    }

    /// Move a post between `draft` and `published`.
    pub async fn set_status(
        &self,
        id: Uuid,
        owner: Uuid,
        status: &str,
    ) -> Result<Post, DomainError> {
        let status: PostStatus = status.parse()?;
        self.owned(id, owner).await?;
        let post = self
            .apply(id, PostChanges::default().with_status(status))
            .await?;
        tracing::info!(post_id = %id, status = %status, "Post status changed");
        Ok(post)
    }

    /// Permanently remove a post.
    pub async fn delete_by_id(&self, id: Uuid, owner: Uuid) -> Result<(), DomainError> {
        self.owned(id, owner).await?;
        self.posts.delete(id).await.map_err(|err| match err {
            RepoError::NotFound => DomainError::post_not_found(id),
            other => other.into(),
        })?;
        tracing::info!(post_id = %id, owner_id = %owner, "Post deleted");
        Ok(())
    }

    /// Fetch a post. Drafts are only returned to their owner.
    pub async fn get_by_id(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Post, DomainError> {
        let post = self.find(id).await?;
        if !post.is_visible_to(viewer) {
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    /// Published posts, newest publication first.
    pub async fn list_published(&self) -> Result<Vec<Post>, DomainError> {
        Ok(self
            .posts
            .find_by_status(PostStatus::Published, PostOrder::PublishedDesc)
            .await?)
    }

    /// All posts of `owner`, most recently updated first.
    pub async fn list_by_owner(
        &self,
        owner: Uuid,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, DomainError> {
        Ok(self.posts.find_by_owner(owner, status).await?)
    }

    /// Published posts carrying `tag`.
    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<Post>, DomainError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.posts.find_by_tag(tag, PostStatus::Published).await?)
    }

    /// Distinct tags in use by published posts, sorted.
    pub async fn list_tags(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.posts.distinct_tags(PostStatus::Published).await?)
    }

    async fn create(
        &self,
        owner: Uuid,
        draft: PostDraft,
        status: PostStatus,
    ) -> Result<Post, DomainError> {
        let changes = draft.validate()?;
        let post = Post::new(
            owner,
            changes.title.unwrap_or_default(),
            changes.content.unwrap_or_default(),
            changes.tags.unwrap_or_default(),
            status,
            self.clock.utc(),
        );

        let post = self.posts.insert(post).await?;
        tracing::info!(post_id = %post.id, owner_id = %owner, status = %status, "Post created");
        Ok(post)
    }

    async fn find(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    async fn owned(&self, id: Uuid, owner: Uuid) -> Result<Post, DomainError> {
        let post = self.find(id).await?;
        if !post.is_owned_by(owner) {
            tracing::warn!(post_id = %id, caller = %owner, "Rejected mutation by non-owner");
            return Err(DomainError::Forbidden);
        }
        Ok(post)
    }

    async fn apply(&self, id: Uuid, changes: PostChanges) -> Result<Post, DomainError> {
        self.posts
            .update(id, changes, self.clock.utc())
            .await
            .map_err(|err| match err {
                RepoError::NotFound => DomainError::post_not_found(id),
                other => other.into(),
            })
    }
}
