use chrono::{TimeDelta, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges, PostStatus};
use quill_core::error::RepoError;
use quill_core::ports::{BaseRepository, PostRepository};

use crate::database::entity::post;
use crate::database::postgres_repo::PostgresPostRepository;

fn model(status: post::Status) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        tags: vec!["rust".to_owned(), "web".to_owned()],
        status,
        created_at: now.into(),
        updated_at: now.into(),
        published_at: None,
        read_time: 1,
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let row = model(post::Status::Draft);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row.clone()]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::find_by_id(&repo, row.id)
        .await
        .unwrap();

    let post = result.expect("post should be found");
    assert_eq!(post.id, row.id);
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.tags, vec!["rust", "web"]);
}

#[tokio::test]
async fn test_update_applies_publication_rules() {
    let row = model(post::Status::Draft);
    let published_at = Utc::now() + TimeDelta::seconds(5);
    let mut stored = row.clone();
    stored.status = post::Status::Published;
    stored.published_at = Some(published_at.into());
    stored.updated_at = published_at.into();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row.clone()], vec![stored]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let changes = PostChanges::default().with_status(PostStatus::Published);

    let post = repo.update(row.id, changes, published_at).await.unwrap();

    assert_eq!(post.status, PostStatus::Published);
    assert_eq!(post.published_at, Some(published_at));
}

#[tokio::test]
async fn test_update_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = repo
        .update(Uuid::new_v4(), PostChanges::default(), Utc::now())
        .await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_conditional_update_skips_non_matching_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let changes = PostChanges {
        content: Some("autosaved".to_owned()),
        ..PostChanges::default()
    };

    let result = repo
        .update_if(Uuid::new_v4(), Uuid::new_v4(), PostStatus::Draft, changes, Utc::now())
        .await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_conditional_update_writes_matching_draft() {
    let row = model(post::Status::Draft);
    let mut stored = row.clone();
    stored.content = "autosaved".to_owned();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![row.clone()], vec![stored]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let changes = PostChanges {
        content: Some("autosaved".to_owned()),
        ..PostChanges::default()
    };

    let post = repo
        .update_if(row.id, row.owner_id, PostStatus::Draft, changes, Utc::now())
        .await
        .unwrap();

    assert_eq!(post.content, "autosaved");
    assert_eq!(post.status, PostStatus::Draft);
}

#[tokio::test]
async fn test_delete_without_rows_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}
