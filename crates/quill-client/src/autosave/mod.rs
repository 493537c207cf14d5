//! Editor autosave coordination.
//!
//! [`Autosave`] decides *when* and *what* to save; [`AutosaveHandle`] runs it
//! on a tokio task against a [`DraftSink`].

mod driver;
mod machine;

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::domain::TagInput;
use quill_shared::dto::{CreatePostRequest, UpdatePostRequest};

use crate::client::PostsClient;
use crate::error::ClientError;

pub use driver::AutosaveHandle;
pub use machine::{
    Autosave, AutosaveConfig, DraftPayload, EditorFields, SaveOutcome, SaveRequest, SaveStatus,
};

/// Where autosaved drafts are written.
#[async_trait]
pub trait DraftSink: Send + Sync {
    type Error: Display + Send;

    /// Create a new draft and return its id.
    async fn create_draft(&self, payload: &DraftPayload) -> Result<Uuid, Self::Error>;

    /// Update a draft; must fail instead of creating a post when `id` is stale.
    async fn update_draft(&self, id: Uuid, payload: &DraftPayload) -> Result<(), Self::Error>;

    /// Update an existing post's fields, keeping its status.
    async fn update_fields(&self, id: Uuid, payload: &DraftPayload) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T: DraftSink + ?Sized> DraftSink for Arc<T> {
    type Error = T::Error;

    async fn create_draft(&self, payload: &DraftPayload) -> Result<Uuid, Self::Error> {
        (**self).create_draft(payload).await
    }

    async fn update_draft(&self, id: Uuid, payload: &DraftPayload) -> Result<(), Self::Error> {
        (**self).update_draft(id, payload).await
    }

    async fn update_fields(&self, id: Uuid, payload: &DraftPayload) -> Result<(), Self::Error> {
        (**self).update_fields(id, payload).await
    }
}

fn update_request(payload: &DraftPayload) -> UpdatePostRequest {
    UpdatePostRequest {
        title: Some(payload.title.clone()),
        content: Some(payload.content.clone()),
        tags: Some(TagInput::List(payload.tags.clone())),
    }
}

#[async_trait]
impl DraftSink for PostsClient {
    type Error = ClientError;

    async fn create_draft(&self, payload: &DraftPayload) -> Result<Uuid, ClientError> {
        let req = CreatePostRequest {
            title: payload.title.clone(),
            content: payload.content.clone(),
            tags: TagInput::List(payload.tags.clone()),
        };
        let post = PostsClient::create_draft(self, &req).await?;
        Ok(post.id)
    }

    async fn update_draft(&self, id: Uuid, payload: &DraftPayload) -> Result<(), ClientError> {
        PostsClient::update_draft(self, id, &update_request(payload)).await?;
        Ok(())
    }

    async fn update_fields(&self, id: Uuid, payload: &DraftPayload) -> Result<(), ClientError> {
        PostsClient::update_fields(self, id, &update_request(payload)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use mockable::DefaultClock;
    use tokio::time;

    use quill_core::domain::{PostDraft, PostFields, PostStatus};
    use quill_core::{DomainError, PostService};
    use quill_infra::InMemoryPostRepository;

    use super::*;

    /// Writes straight into the post service as a signed-in author.
    struct ServiceSink {
        posts: PostService,
        owner: Uuid,
    }

    fn draft(payload: &DraftPayload) -> PostDraft {
        PostDraft::new(
            payload.title.clone(),
            payload.content.clone(),
            TagInput::List(payload.tags.clone()),
        )
    }

    #[async_trait]
    impl DraftSink for ServiceSink {
        type Error = DomainError;

        async fn create_draft(&self, payload: &DraftPayload) -> Result<Uuid, DomainError> {
            let post = self.posts.create_draft(self.owner, draft(payload)).await?;
            Ok(post.id)
        }

        async fn update_draft(&self, id: Uuid, payload: &DraftPayload) -> Result<(), DomainError> {
            let fields = PostFields::from(draft(payload));
            self.posts.update_draft(id, self.owner, fields).await?;
            Ok(())
        }

        async fn update_fields(&self, id: Uuid, payload: &DraftPayload) -> Result<(), DomainError> {
            let fields = PostFields::from(draft(payload));
            self.posts.update_fields(id, self.owner, fields).await?;
            Ok(())
        }
    }

    fn sink() -> Arc<ServiceSink> {
        Arc::new(ServiceSink {
            posts: PostService::new(
                Arc::new(InMemoryPostRepository::new()),
                Arc::new(DefaultClock),
            ),
            owner: Uuid::new_v4(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_editing_session_produces_a_single_draft() {
        let sink = sink();
        let handle = AutosaveHandle::spawn(Autosave::new(AutosaveConfig::default()), sink.clone());

        handle.edit(EditorFields::new("Hello", "first", "")).await;
        time::sleep(Duration::from_secs(6)).await;
        handle.edit(EditorFields::new("Hello", "second", "rust, web")).await;
        time::sleep(Duration::from_secs(6)).await;
        handle.edit(EditorFields::new("Hello", "third", "rust, web")).await;
        let autosave = handle.close().await.unwrap();

        let posts = sink.posts.list_by_owner(sink.owner, None).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(Some(posts[0].id), autosave.post_id());
        assert_eq!(posts[0].content, "third");
        assert_eq!(posts[0].tags, vec!["rust", "web"]);
        assert_eq!(posts[0].status, PostStatus::Draft);
    }

    #[tokio::test(start_paused = true)]
    async fn test_published_draft_is_never_forked() {
        let sink = sink();
        let handle = AutosaveHandle::spawn(Autosave::new(AutosaveConfig::default()), sink.clone());

        handle.edit(EditorFields::new("Hello", "body", "")).await;
        time::sleep(Duration::from_secs(6)).await;

        let posts = sink.posts.list_by_owner(sink.owner, None).await.unwrap();
        sink.posts
            .set_status(posts[0].id, sink.owner, "published")
            .await
            .unwrap();

        handle.edit(EditorFields::new("Hello", "edited", "")).await;
        time::sleep(Duration::from_secs(6)).await;

        assert!(matches!(handle.status(), SaveStatus::Failed { .. }));
        handle.close().await.unwrap();

        let posts = sink.posts.list_by_owner(sink.owner, None).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "body");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumed_post_keeps_its_status() {
        let sink = sink();
        let post = sink
            .posts
            .create_published(sink.owner, PostDraft::new("Live", "body", TagInput::default()))
            .await
            .unwrap();
        let saved = DraftPayload {
            title: post.title.clone(),
            content: post.content.clone(),
            tags: post.tags.clone(),
        };
        let handle = AutosaveHandle::spawn(
            Autosave::resume(AutosaveConfig::default(), post.id, saved),
            sink.clone(),
        );

        handle.edit(EditorFields::new("Live", "fixed typo", "")).await;
        handle.close().await.unwrap();

        let stored = sink.posts.get_by_id(post.id, None).await.unwrap();
        assert_eq!(stored.content, "fixed typo");
        assert_eq!(stored.status, PostStatus::Published);
    }

    #[test]
    fn test_update_request_sends_full_payload() {
        let payload = EditorFields::new("T", "c", "a, b").payload();

        let req = update_request(&payload);

        assert_eq!(req.title.as_deref(), Some("T"));
        assert_eq!(req.content.as_deref(), Some("c"));
        assert!(matches!(req.tags, Some(TagInput::List(ref tags)) if tags == &["a", "b"]));
    }
}
