//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::extension::postgres::PgFunc;
use sea_orm::sea_query::{Expr, NullOrdering};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbBackend, EntityTrait, FromQueryResult, Order, QueryFilter,
    QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Post, PostChanges, PostStatus, User};
use quill_core::error::RepoError;
use quill_core::ports::{PostOrder, PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

#[derive(Debug, FromQueryResult)]
struct TagRow {
    tag: String,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = match email.split_once('@') {
            Some((local, domain)) => {
                let first = local.chars().next().map(String::from).unwrap_or_default();
                format!("{first}***@{domain}")
            }
            None => "***".to_string(),
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<PostStatus>,
    ) -> Result<Vec<Post>, RepoError> {
        let mut query = PostEntity::find().filter(post::Column::OwnerId.eq(owner_id));
        if let Some(status) = status {
            query = query.filter(post::Column::Status.eq(post::Status::from(status)));
        }

        let result = query
            .order_by_desc(post::Column::UpdatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_status(
        &self,
        status: PostStatus,
        order: PostOrder,
    ) -> Result<Vec<Post>, RepoError> {
        let query = PostEntity::find().filter(post::Column::Status.eq(post::Status::from(status)));
        let query = match order {
            PostOrder::PublishedDesc => query
                .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
                .order_by_desc(post::Column::UpdatedAt),
            PostOrder::UpdatedDesc => query.order_by_desc(post::Column::UpdatedAt),
        };

        let result = query.all(&self.db).await.map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_tag(&self, tag: &str, status: PostStatus) -> Result<Vec<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Status.eq(post::Status::from(status)))
            .filter(Expr::val(tag).eq(PgFunc::any(Expr::col(post::Column::Tags))))
            .order_by_with_nulls(post::Column::PublishedAt, Order::Desc, NullOrdering::Last)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn distinct_tags(&self, status: PostStatus) -> Result<Vec<String>, RepoError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"SELECT DISTINCT unnest("tags") AS "tag" FROM "posts" WHERE "status" = $1 ORDER BY "tag""#,
            [status.as_str().into()],
        );

        let rows = TagRow::find_by_statement(stmt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|row| row.tag).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let model = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut post: Post = model.into();
        post.apply_changes(changes, now);

        let active: post::ActiveModel = post.into();
        let updated = active.update(&self.db).await.map_err(map_db_err)?;

        Ok(updated.into())
    }

    /// `SELECT ... FOR UPDATE` on the matching row inside a transaction, so a
    /// concurrent status change cannot land between the check and the write.
    async fn update_if(
        &self,
        id: Uuid,
        owner_id: Uuid,
        status: PostStatus,
        changes: PostChanges,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let model = PostEntity::find_by_id(id)
            .filter(post::Column::OwnerId.eq(owner_id))
            .filter(post::Column::Status.eq(post::Status::from(status)))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut post: Post = model.into();
        post.apply_changes(changes, now);

        let active: post::ActiveModel = post.into();
        let updated = active.update(&txn).await.map_err(map_db_err)?;
        txn.commit().await.map_err(map_db_err)?;

        Ok(updated.into())
    }
}
