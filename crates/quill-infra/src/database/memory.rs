//! In-memory stores - used when no database is configured and in tests.
//!
//! Data is lost on process restart.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges, PostStatus, User};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostOrder, PostRepository, UserRepository};

/// Post store backed by a `HashMap` behind an async `RwLock`.
#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, keep: F) -> Vec<Post>
    where
        F: Fn(&Post) -> bool,
    {
        let posts = self.posts.read().await;
        posts.values().filter(|post| keep(post)).cloned().collect()
    }
}

fn sort_by_updated(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse(post.updated_at));
}

/// `None` sorts below any timestamp, so unpublished posts land last.
fn sort_by_published(posts: &mut [Post]) {
    posts.sort_by_key(|post| Reverse((post.published_at, post.updated_at)));
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepoError::Constraint(format!("post {} already exists", post.id)));
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.posts
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts = self
            .collect(|post| {
                post.owner_id == owner_id && status.is_none_or(|status| post.status == status)
            })
            .await;
        sort_by_updated(&mut posts);
        Ok(posts)
    }

    async fn find_by_status(
        &self,
        status: PostStatus,
        order: PostOrder,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.collect(|post| post.status == status).await;
        match order {
            PostOrder::PublishedDesc => sort_by_published(&mut posts),
            PostOrder::UpdatedDesc => sort_by_updated(&mut posts),
        }
        Ok(posts)
    }

    async fn find_by_tag(&self, tag: &str, status: PostStatus) -> Result<Vec<Post>, RepoError> {
        let mut posts = self
            .collect(|post| post.status == status && post.tags.iter().any(|t| t == tag))
            .await;
        sort_by_published(&mut posts);
        Ok(posts)
    }

    async fn distinct_tags(&self, status: PostStatus) -> Result<Vec<String>, RepoError> {
        let posts = self.posts.read().await;
        let tags: BTreeSet<&String> = posts
            .values()
            .filter(|post| post.status == status)
            .flat_map(|post| post.tags.iter())
            .collect();
        Ok(tags.into_iter().cloned().collect())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.apply_changes(changes, now);
        Ok(post.clone())
    }

    async fn update_if(
        &self,
        id: Uuid,
        owner_id: Uuid,
        status: PostStatus,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut posts = self.posts.write().await;
        let post = posts
            .get_mut(&id)
            .filter(|post| post.owner_id == owner_id && post.status == status)
            .ok_or(RepoError::NotFound)?;
        post.apply_changes(changes, now);
        Ok(post.clone())
    }
}

/// User store backed by a `HashMap`; emails are unique.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepoError::Constraint("Email already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn post(owner: Uuid, tags: &[&str], status: PostStatus, at: DateTime<Utc>) -> Post {
        Post::new(
            owner,
            "title".to_string(),
            "content".to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
            status,
            at,
        )
    }

    #[tokio::test]
    async fn test_distinct_tags_sorted_and_unique() {
        let repo = InMemoryPostRepository::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        repo.insert(post(owner, &["web", "rust"], PostStatus::Published, now))
            .await
            .unwrap();
        repo.insert(post(owner, &["rust", "async"], PostStatus::Published, now))
            .await
            .unwrap();
        repo.insert(post(owner, &["secret"], PostStatus::Draft, now))
            .await
            .unwrap();

        let tags = repo.distinct_tags(PostStatus::Published).await.unwrap();

        assert_eq!(tags, vec!["async", "rust", "web"]);
    }

    #[tokio::test]
    async fn test_find_by_status_orders_by_publication() {
        let repo = InMemoryPostRepository::new();
        let owner = Uuid::new_v4();
        let t0 = Utc::now();
        let older = repo
            .insert(post(owner, &[], PostStatus::Published, t0))
            .await
            .unwrap();
        let newer = repo
            .insert(post(owner, &[], PostStatus::Published, t0 + TimeDelta::minutes(5)))
            .await
            .unwrap();

        let listed = repo
            .find_by_status(PostStatus::Published, PostOrder::PublishedDesc)
            .await
            .unwrap();

        let ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn test_find_by_owner_filters_status() {
        let repo = InMemoryPostRepository::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        repo.insert(post(owner, &[], PostStatus::Draft, now))
            .await
            .unwrap();
        repo.insert(post(owner, &[], PostStatus::Published, now))
            .await
            .unwrap();
        repo.insert(post(Uuid::new_v4(), &[], PostStatus::Draft, now))
            .await
            .unwrap();

        assert_eq!(repo.find_by_owner(owner, None).await.unwrap().len(), 2);
        let drafts = repo
            .find_by_owner(owner, Some(PostStatus::Draft))
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_update_if_requires_owner_and_status() {
        let repo = InMemoryPostRepository::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let published = repo
            .insert(post(owner, &[], PostStatus::Published, now))
            .await
            .unwrap();
        let changes = PostChanges {
            content: Some("rewritten".to_string()),
            ..PostChanges::default()
        };

        let wrong_status = repo
            .update_if(published.id, owner, PostStatus::Draft, changes.clone(), now)
            .await;
        let wrong_owner = repo
            .update_if(published.id, Uuid::new_v4(), PostStatus::Published, changes.clone(), now)
            .await;
        let matched = repo
            .update_if(published.id, owner, PostStatus::Published, changes, now)
            .await
            .unwrap();

        assert!(matches!(wrong_status, Err(RepoError::NotFound)));
        assert!(matches!(wrong_owner, Err(RepoError::NotFound)));
        assert_eq!(matched.content, "rewritten");
        assert_eq!(matched.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_post() {
        let repo = InMemoryPostRepository::new();

        let updated = repo
            .update(Uuid::new_v4(), PostChanges::default(), Utc::now())
            .await;
        assert!(matches!(updated, Err(RepoError::NotFound)));
        assert!(matches!(
            repo.delete(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(User::new("A", "a@example.com", "h".into()))
            .await
            .unwrap();

        let second = repo
            .insert(User::new("B", "A@example.com", "h".into()))
            .await;

        assert!(matches!(second, Err(RepoError::Constraint(_))));
        assert!(repo.find_by_email("a@example.com").await.unwrap().is_some());
    }
}
