//! Account handlers.

use std::sync::Arc;

use actix_web::{HttpResponse, web};

use quill_core::domain::{User, normalize_email};
use quill_core::ports::{BaseRepository, PasswordService, TokenService};
use quill_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn auth_response(tokens: &Arc<dyn TokenService>, user: &User) -> AppResult<AuthResponse> {
    let access_token = tokens.generate_token(user.id, &user.email, vec!["author".to_string()])?;

    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);

    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password_service.hash(&req.password)?;
    let user = state.users.insert(User::new(&req.name, &email, password_hash)).await?;
    tracing::info!(user_id = %user.id, "Author registered");

    Ok(HttpResponse::Created().json(auth_response(&token_service, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let email = normalize_email(&req.email);

    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !password_service.verify(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(auth_response(&token_service, &user)?))
}

/// GET /api/auth/me
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity.user_id)))?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::json;

    use quill_infra::{Argon2PasswordService, JwtConfig, JwtTokenService};

    use super::*;
    use crate::handlers::configure_routes;

    macro_rules! app {
        () => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(AppState::in_memory()))
                    .app_data(web::Data::new(Arc::new(JwtTokenService::new(JwtConfig {
                        secret: "auth-test-secret".to_string(),
                        expiration_hours: 2,
                        issuer: "quill-test".to_string(),
                    })) as Arc<dyn TokenService>))
                    .app_data(web::Data::new(
                        Arc::new(Argon2PasswordService::new()) as Arc<dyn PasswordService>
                    ))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn register_body(email: &str) -> serde_json::Value {
        json!({ "name": "Ada", "email": email, "password": "long-enough" })
    }

    #[actix_web::test]
    async fn test_register_login_me() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("ada@example.com"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let registered: AuthResponse = test::read_body_json(res).await;
        assert_eq!(registered.token_type, "Bearer");
        assert_eq!(registered.expires_in, 7200);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "ADA@example.com", "password": "long-enough" }))
            .to_request();
        let login: AuthResponse = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", login.access_token)))
            .to_request();
        let me: UserResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me.name, "Ada");
        assert_eq!(me.email, "ada@example.com");
    }

    #[actix_web::test]
    async fn test_duplicate_email_conflicts() {
        let app = app!();

        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(register_body("dup@example.com"))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body("bob@example.com"))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "bob@example.com", "password": "not-the-one" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_short_password_is_bad_request() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({ "name": "Eve", "email": "eve@example.com", "password": "short" }))
            .to_request();

        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
