//! HTTP client for the Quill API.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use quill_shared::dto::{
    AuthResponse, CreatePostRequest, LoginRequest, MessageResponse, MyPostsResponse,
    PostResponse, PublishPostRequest, RegisterUserRequest, StatusRequest, UpdatePostRequest,
    UserResponse,
};

use crate::error::ClientError;
use crate::session::Session;

/// Typed wrapper over every `/api` endpoint.
#[derive(Debug, Clone)]
pub struct PostsClient {
    http: Client,
    session: Session,
}

impl PostsClient {
    pub fn new(session: Session) -> Self {
        Self::with_http(Client::new(), session)
    }

    pub fn with_http(http: Client, session: Session) -> Self {
        Self { http, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Create an account and keep the issued credential in the session.
    pub async fn register(
        &mut self,
        req: &RegisterUserRequest,
    ) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.http.post(self.session.url("/auth/register")).json(req))
            .await?;
        self.session.token = Some(auth.access_token.clone());
        Ok(auth)
    }

    /// Sign in and keep the issued credential in the session.
    pub async fn login(&mut self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.http.post(self.session.url("/auth/login")).json(req))
            .await?;
        self.session.token = Some(auth.access_token.clone());
        Ok(auth)
    }

    pub fn logout(&mut self) {
        self.session.sign_out();
    }

    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let req = self.http.get(self.session.url("/auth/me"));
        self.send(self.authed(req)?).await
    }

    pub async fn create_draft(&self, req: &CreatePostRequest) -> Result<PostResponse, ClientError> {
        let builder = self.http.post(self.session.url("/posts"));
        self.send(self.authed(builder)?.json(req)).await
    }

    /// Create-or-publish; set `req.id` to publish an existing post.
    pub async fn publish(&self, req: &PublishPostRequest) -> Result<PostResponse, ClientError> {
        let builder = self.http.post(self.session.url("/posts/publish"));
        self.send(self.authed(builder)?.json(req)).await
    }

    pub async fn update_fields(
        &self,
        id: Uuid,
        req: &UpdatePostRequest,
    ) -> Result<PostResponse, ClientError> {
        let url = self.session.url(&format!("/posts/{id}"));
        self.send(self.authed(self.http.patch(url))?.json(req)).await
    }

    /// Update an existing draft; fails with 404 rather than creating a post.
    pub async fn update_draft(
        &self,
        id: Uuid,
        req: &UpdatePostRequest,
    ) -> Result<PostResponse, ClientError> {
        let url = self.session.url(&format!("/posts/{id}/draft"));
        self.send(self.authed(self.http.put(url))?.json(req)).await
    }

    pub async fn set_status(&self, id: Uuid, status: &str) -> Result<PostResponse, ClientError> {
        let url = self.session.url(&format!("/posts/{id}/status"));
        let body = StatusRequest {
            status: status.to_string(),
        };
        self.send(self.authed(self.http.patch(url))?.json(&body)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<MessageResponse, ClientError> {
        let url = self.session.url(&format!("/posts/{id}"));
        self.send(self.authed(self.http.delete(url))?).await
    }

    /// Published posts, newest first.
    pub async fn list_published(&self) -> Result<Vec<PostResponse>, ClientError> {
        self.send(self.http.get(self.session.url("/posts"))).await
    }

    /// The caller's drafts.
    pub async fn list_drafts(&self) -> Result<Vec<PostResponse>, ClientError> {
        let req = self
            .http
            .get(self.session.url("/posts"))
            .query(&[("status", "draft")]);
        self.send(self.authed(req)?).await
    }

    pub async fn my_posts(&self) -> Result<MyPostsResponse, ClientError> {
        let req = self.http.get(self.session.url("/posts/mine"));
        self.send(self.authed(req)?).await
    }

    /// Fetch a post; the credential is sent when present so owners can read drafts.
    pub async fn get(&self, id: Uuid) -> Result<PostResponse, ClientError> {
        let req = self.http.get(self.session.url(&format!("/posts/{id}")));
        self.send(self.maybe_authed(req)).await
    }

    pub async fn list_by_tag(&self, tag: &str) -> Result<Vec<PostResponse>, ClientError> {
        let mut url = reqwest::Url::parse(&self.session.url("/posts/tag"))
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl("base URL cannot take a path".to_string()))?
            .push(tag);
        self.send(self.http.get(url)).await
    }

    pub async fn tags(&self) -> Result<Vec<String>, ClientError> {
        self.send(self.http.get(self.session.url("/posts/tags"))).await
    }

    fn authed(&self, req: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self
            .session
            .token
            .as_deref()
            .ok_or(ClientError::Unauthenticated)?;
        Ok(req.bearer_auth(token))
    }

    fn maybe_authed(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.token.as_deref() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "API request failed");
        Err(ClientError::from_response(status.as_u16(), &body))
    }
}
