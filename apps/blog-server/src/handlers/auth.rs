//! Registration and login sessions.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use std::sync::Arc;

use blogicum_core::domain::User;
use blogicum_core::forms::FieldErrors;
use blogicum_core::navigation::Destination;
use blogicum_core::ports::{PasswordService, TokenService};
use blogicum_shared::dto::{AuthResponse, LoginPageContext, LoginRequest, RegisterUserRequest};

use crate::middleware::auth::AUTH_COOKIE;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::form::FormBody;
use crate::presenters::registration;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Only same-site paths are followed after login.
/// Browsers read `\` as `/`, so a backslash anywhere could turn the path
/// into a protocol-relative URL.
fn local_path(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

fn issue_token(
    token_service: &dyn TokenService,
    user: &User,
) -> AppResult<(AuthResponse, Cookie<'static>)> {
    let token = token_service
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let cookie = Cookie::build(AUTH_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    Ok((
        AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: token_service.expiration_seconds().max(0) as u64,
            username: user.username.clone(),
        },
        cookie,
    ))
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: FormBody<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let registration = registration(&req);
    let users = &state.service.repositories().users;

    let mut errors = registration.validate();
    if !errors.contains("username") && users.find_by_username(&registration.username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    // Never echo the password back.
    let echo = RegisterUserRequest {
        password: String::new(),
        ..req
    };
    errors.into_result().map_err(|e| AppError::invalid(&echo, e))?;

    let password_hash = password_service
        .hash(&registration.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = User::new(registration.username, registration.email, password_hash);
    let user = users.insert(user).await.map_err(|e| match e {
        blogicum_core::error::RepoError::Constraint(_) => {
            let mut errors = FieldErrors::new();
            errors.add("username", "A user with that username already exists.");
            AppError::invalid(&echo, errors)
        }
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let (response, cookie) = issue_token(token_service.get_ref().as_ref(), &user)?;
    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

/// GET /auth/login/
///
/// Entry point of the login redirect. The `next` path is echoed so the form
/// can post back to `/auth/login/?next=...`.
pub async fn login_form(query: web::Query<LoginQuery>) -> HttpResponse {
    HttpResponse::Ok().json(LoginPageContext {
        form: LoginRequest::default(),
        next: local_path(query.next.as_deref()).map(str::to_string),
    })
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    query: web::Query<LoginQuery>,
    body: FormBody<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .service
        .repositories()
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        tracing::info!(username = %user.username, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    let (response, cookie) = issue_token(token_service.get_ref().as_ref(), &user)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(match local_path(query.next.as_deref()) {
        Some(next) => HttpResponse::SeeOther()
            .insert_header((header::LOCATION, next))
            .cookie(cookie)
            .finish(),
        None => HttpResponse::Ok().cookie(cookie).json(response),
    })
}

/// POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(AUTH_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, Destination::Index.path()))
        .cookie(cookie)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_local_next_is_followed() {
        assert_eq!(local_path(Some("/posts/create/")), Some("/posts/create/"));
        assert_eq!(local_path(Some("//evil.example")), None);
        assert_eq!(local_path(Some("/\\evil.example")), None);
        assert_eq!(local_path(Some("/posts/\\x")), None);
        assert_eq!(local_path(Some("https://evil.example")), None);
        assert_eq!(local_path(None), None);
    }
}
