//! Post handlers.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{Post, PostDraft, PostFields, PostStatus};
use quill_shared::dto::{
    CreatePostRequest, MessageResponse, MyPostsResponse, PostListQuery, PostResponse,
    PublishPostRequest, StatusRequest, UpdatePostRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn post_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id,
        owner_id: post.owner_id,
        title: post.title,
        content: post.content,
        tags: post.tags,
        status: post.status.to_string(),
        created_at: post.created_at,
        updated_at: post.updated_at,
        published_at: post.published_at,
        read_time: post.read_time,
    }
}

fn post_list(posts: Vec<Post>) -> Vec<PostResponse> {
    posts.into_iter().map(post_response).collect()
}

fn fields(req: UpdatePostRequest) -> PostFields {
    PostFields {
        title: req.title,
        content: req.content,
        tags: req.tags,
    }
}

/// POST /api/posts - create a draft.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let draft = PostDraft::new(req.title, req.content, req.tags);

    let post = state.posts.create_draft(identity.user_id, draft).await?;

    Ok(HttpResponse::Created().json(post_response(post)))
}

/// POST /api/posts/publish - publish a new post, or overwrite and publish `id`.
pub async fn publish(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PublishPostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let draft = PostDraft::new(req.title, req.content, req.tags);

    let post = state.posts.publish(identity.user_id, req.id, draft).await?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PATCH /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update_fields(path.into_inner(), identity.user_id, fields(body.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PUT /api/posts/{id}/draft - autosave target; never creates a post.
pub async fn update_draft(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .update_draft(path.into_inner(), identity.user_id, fields(body.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// PATCH /api/posts/{id}/status
pub async fn set_status(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<StatusRequest>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .set_status(path.into_inner(), identity.user_id, &body.status)
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_by_id(path.into_inner(), identity.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully")))
}

/// GET /api/posts?status=published|draft
///
/// Drafts are always the caller's own and require a credential.
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PostListQuery>,
) -> AppResult<HttpResponse> {
    let status = match query.status.as_deref() {
        None => PostStatus::Published,
        Some(raw) => raw.parse::<PostStatus>()?,
    };

    let posts = match status {
        PostStatus::Published => state.posts.list_published().await?,
        PostStatus::Draft => {
            let owner = identity.user_id().ok_or(AppError::Unauthorized)?;
            state
                .posts
                .list_by_owner(owner, Some(PostStatus::Draft))
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(post_list(posts)))
}

/// GET /api/posts/mine
pub async fn mine(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.list_by_owner(identity.user_id, None).await?;
    let (published, drafts): (Vec<Post>, Vec<Post>) =
        posts.into_iter().partition(Post::is_published);

    Ok(HttpResponse::Ok().json(MyPostsResponse {
        drafts: post_list(drafts),
        published: post_list(published),
    }))
}

/// GET /api/posts/{id} - drafts only for their owner.
pub async fn get(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state
        .posts
        .get_by_id(path.into_inner(), identity.user_id())
        .await?;

    Ok(HttpResponse::Ok().json(post_response(post)))
}

/// GET /api/posts/tag/{tag}
pub async fn by_tag(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let posts = state.posts.list_by_tag(&path).await?;

    Ok(HttpResponse::Ok().json(post_list(posts)))
}

/// GET /api/posts/tags
pub async fn tags(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.posts.list_tags().await?))
}
